//! Jokes engine: joke sources, the screen-state store and the aggregation engine.
mod api;
mod engine;
mod fetch;
mod ports;
mod store;

pub use engine::{EngineConfig, FaultPolicy, JokesEngine, UnhandledFailure, DEFAULT_RANDOM_COUNT};
pub use fetch::{FetchSettings, ReqwestJokeFetcher};
pub use ports::{JokeFetchPort, PageStream, RandomJokeFetchPort};
pub use store::{ProgressEvents, ScreenStateStore, ScreenStateWatch};

pub use jokes_core::{
    FailureKind, FetchError, Joke, JokeView, ProgressSignal, Query, QueryError, ScreenState,
    TextSize,
};
