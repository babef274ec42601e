use futures_util::stream::BoxStream;
use jokes_core::{FetchError, Joke, Query};

/// Lazy, finite page sequence. Yields nothing after the first error.
pub type PageStream = BoxStream<'static, Result<Vec<Joke>, FetchError>>;

/// Source of paginated search results.
pub trait JokeFetchPort: Send + Sync {
    /// Starts a fresh page sequence for `query`. Each call is independent.
    fn fetch_pages(&self, query: &Query) -> PageStream;
}

/// Source of single-shot random batches.
#[async_trait::async_trait]
pub trait RandomJokeFetchPort: Send + Sync {
    async fn fetch_random(&self, count: usize) -> Result<Vec<Joke>, FetchError>;
}
