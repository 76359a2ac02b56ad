//! External lookups available to the reasoning loop. Every failure is folded
//! into the returned text so the model can read it like any other result.

mod search;
mod weather;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

use crate::http::client::HttpClient;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.tavily.com";

pub trait LookupProvider: Send + Sync {
    fn weather(&self, city: &str) -> impl Future<Output = String> + Send;
    fn search(&self, query: &str) -> impl Future<Output = String> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub search_api_key: Option<String>,
    pub search_base_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            search_api_key: None,
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lookups {
    http: HttpClient,
    config: LookupConfig,
}

impl Lookups {
    pub fn new(http: HttpClient, config: LookupConfig) -> Self {
        Self { http, config }
    }
}

impl LookupProvider for Lookups {
    async fn weather(&self, city: &str) -> String {
        weather::current_weather(
            &self.http,
            &self.config.weather_base_url,
            self.config.weather_api_key.as_deref(),
            city,
        )
        .await
        .unwrap_or_else(|err| err.to_string())
    }

    async fn search(&self, query: &str) -> String {
        search::web_search(
            &self.http,
            &self.config.search_base_url,
            self.config.search_api_key.as_deref(),
            query,
        )
        .await
        .unwrap_or_else(|err| err.to_string())
    }
}

/// Internal failure of one lookup. Its `Display` output is what the caller
/// ultimately receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    CredentialMissing { provider: &'static str },
    Transport(String),
    Provider(String),
    Parse { subject: &'static str, detail: String },
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CredentialMissing { provider } => {
                write!(f, "Error: {provider} API key not found in configuration.")
            }
            Self::Transport(msg) => write!(f, "Error making API request: {msg}"),
            Self::Provider(msg) => write!(f, "Error: {msg}"),
            Self::Parse { subject, detail } => write!(f, "Error parsing {subject}: {detail}"),
        }
    }
}

impl Error for LookupError {}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

fn require_key<'a>(key: Option<&'a str>, provider: &'static str) -> LookupResult<&'a str> {
    key.map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(LookupError::CredentialMissing { provider })
}

// reqwest includes the request URL in its message, which may carry the key.
fn transport_error(err: reqwest::Error) -> LookupError {
    LookupError::Transport(err.without_url().to_string())
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}
