use crate::JokeView;

/// Durable state observed by the presentation layer. Each value replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenState {
    /// The search finished with nothing to show.
    Empty,
    Result(Vec<JokeView>),
    NetworkError,
    HttpError,
}

impl ScreenState {
    pub fn jokes(&self) -> &[JokeView] {
        match self {
            ScreenState::Result(views) => views,
            _ => &[],
        }
    }
}

/// Transient loading indicator edge. Not part of [`ScreenState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    Show,
    Hide,
}
