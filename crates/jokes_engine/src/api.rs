//! Wire format of the chucknorris.io JSON API.

use jokes_core::{FailureKind, FetchError, Joke};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiJoke {
    id: String,
    value: String,
    url: Option<String>,
    icon_url: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

impl From<ApiJoke> for Joke {
    fn from(api: ApiJoke) -> Self {
        Joke {
            id: api.id,
            text: api.value,
            url: api.url,
            icon_url: api.icon_url,
            categories: api.categories,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) total: usize,
    pub(crate) result: Vec<ApiJoke>,
}

pub(crate) fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body)
        .map_err(|err| FetchError::new(FailureKind::InvalidResponse, err.to_string()))
}
