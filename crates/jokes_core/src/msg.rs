use crate::{FetchError, Joke};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Cycle begins; sent before the first fetch is issued.
    Started,
    /// The page source delivered its next page.
    PageReceived(Vec<Joke>),
    /// The page source raised an error. No further pages follow.
    Failed(FetchError),
    /// The page source finished normally.
    Completed,
    /// The cycle was superseded by a newer search.
    Cancelled,
}

impl Msg {
    /// True for messages after which the cycle accepts nothing else.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Msg::Failed(_) | Msg::Completed | Msg::Cancelled)
    }
}
