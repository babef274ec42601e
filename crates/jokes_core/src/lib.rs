//! Jokes core: pure data model, failure taxonomy and the search-cycle state machine.
mod effect;
mod failure;
mod joke;
mod msg;
mod screen;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{classify, Classification, FailureKind, FetchError};
pub use joke::{Joke, Query, QueryError};
pub use msg::Msg;
pub use screen::{ProgressSignal, ScreenState};
pub use state::SearchCycle;
pub use update::update;
pub use view_model::{JokeView, JokeViewMapper, TextSize, LONG_JOKE_CHARS, UNCATEGORIZED};
