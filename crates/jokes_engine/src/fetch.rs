use std::time::Duration;

use futures_util::{stream, StreamExt};
use jokes_core::{FailureKind, FetchError, Joke, Query};
use jokes_logging::{jokes_debug, jokes_warn};

use crate::api::{decode, ApiJoke, SearchResponse};
use crate::ports::{JokeFetchPort, PageStream, RandomJokeFetchPort};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Jokes per page when a search result is handed out incrementally.
    pub page_size: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.chucknorris.io".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_size: 5,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// HTTP joke source backing both ports.
#[derive(Debug, Clone)]
pub struct ReqwestJokeFetcher {
    settings: FetchSettings,
}

enum Cursor {
    Request(Query),
    Pages(std::vec::IntoIter<Vec<Joke>>),
}

impl ReqwestJokeFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, FetchError> {
        let raw = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        reqwest::Url::parse(&raw).map_err(|err| FetchError::new(FailureKind::Other, err.to_string()))
    }

    async fn get_body(&self, client: &reqwest::Client, url: reqwest::Url) -> Result<Vec<u8>, FetchError> {
        jokes_debug!("GET {}", url);
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn search(&self, query: &Query) -> Result<Vec<Joke>, FetchError> {
        let client = self.build_client()?;
        let mut url = self.endpoint("jokes/search")?;
        url.query_pairs_mut().append_pair("query", query.as_str());

        let body = self.get_body(&client, url).await?;
        let response: SearchResponse = decode(&body)?;
        if response.total != response.result.len() {
            jokes_warn!(
                "search for {:?} reported {} jokes but returned {}",
                query.as_str(),
                response.total,
                response.result.len()
            );
        }
        Ok(response.result.into_iter().map(Joke::from).collect())
    }

    async fn advance(
        &self,
        cursor: Cursor,
    ) -> Option<(Result<Vec<Joke>, FetchError>, Option<Cursor>)> {
        match cursor {
            Cursor::Request(query) => match self.search(&query).await {
                Ok(jokes) => {
                    let mut pages = paginate(jokes, self.settings.page_size).into_iter();
                    pages
                        .next()
                        .map(|first| (Ok(first), Some(Cursor::Pages(pages))))
                }
                Err(err) => Some((Err(err), None)),
            },
            Cursor::Pages(mut pages) => pages
                .next()
                .map(|page| (Ok(page), Some(Cursor::Pages(pages)))),
        }
    }
}

impl JokeFetchPort for ReqwestJokeFetcher {
    fn fetch_pages(&self, query: &Query) -> PageStream {
        let fetcher = self.clone();
        stream::unfold(Some(Cursor::Request(query.clone())), move |cursor| {
            let fetcher = fetcher.clone();
            async move {
                match cursor {
                    Some(cursor) => fetcher.advance(cursor).await,
                    None => None,
                }
            }
        })
        .boxed()
    }
}

#[async_trait::async_trait]
impl RandomJokeFetchPort for ReqwestJokeFetcher {
    async fn fetch_random(&self, count: usize) -> Result<Vec<Joke>, FetchError> {
        let client = self.build_client()?;
        let mut jokes = Vec::with_capacity(count);
        for _ in 0..count {
            let url = self.endpoint("jokes/random")?;
            let body = self.get_body(&client, url).await?;
            let joke: ApiJoke = decode(&body)?;
            jokes.push(Joke::from(joke));
        }
        Ok(jokes)
    }
}

/// Splits a result into pages. An empty result is a single empty page.
fn paginate(jokes: Vec<Joke>, page_size: usize) -> Vec<Vec<Joke>> {
    if jokes.is_empty() {
        return vec![Vec::new()];
    }
    jokes
        .chunks(page_size.max(1))
        .map(<[Joke]>::to_vec)
        .collect()
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::InvalidResponse, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
