use crate::{FetchError, ScreenState};

/// Side effects requested by [`crate::update`]; the engine carries them out in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowProgress,
    HideProgress,
    Publish(ScreenState),
    /// Unclassified failure that must leave the core untouched.
    Escalate(FetchError),
}
