use jokes_engine::{EngineConfig, FetchSettings};
use jokes_logging::LogDestination;

pub const ENV_API_URL: &str = "JOKES_API_URL";
pub const ENV_LOG: &str = "JOKES_LOG";
pub const ENV_PAGE_SIZE: &str = "JOKES_PAGE_SIZE";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub fetch: FetchSettings,
    pub engine: EngineConfig,
    pub log_destination: LogDestination,
    /// Environment entries that were present but could not be used, as `KEY="value"`.
    pub ignored: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unknown or malformed values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            config.fetch.base_url = url;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            match raw.parse::<usize>() {
                Ok(size) if size > 0 => config.fetch.page_size = size,
                _ => config.ignore(ENV_PAGE_SIZE, &raw),
            }
        }
        if let Some(raw) = lookup(ENV_LOG) {
            match LogDestination::parse(&raw) {
                Some(destination) => config.log_destination = destination,
                None => config.ignore(ENV_LOG, &raw),
            }
        }
        config
    }

    fn ignore(&mut self, key: &str, raw: &str) {
        self.ignored.push(format!("{key}={raw:?}"));
    }
}
