//! Purpose: Explicit client configuration (project URL, API key, optional session and schema).
//! Exports: `ClientConfig`.
//! Role: Handed to `RestClient`; replaces any global config singleton.
//! Invariants: The project URL is http(s), carries no query or fragment, and has no trailing slash.
//! Invariants: Environment and file loading never mutate process state.
#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::core::error::{Error, ErrorKind};

type ApiResult<T> = Result<T, Error>;

pub const ENV_URL: &str = "BASALT_URL";
pub const ENV_API_KEY: &str = "BASALT_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "BASALT_ACCESS_TOKEN";
pub const ENV_SCHEMA: &str = "BASALT_SCHEMA";
pub const ENV_TIMEOUT_MS: &str = "BASALT_TIMEOUT_MS";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    url: Url,
    api_key: String,
    access_token: Option<String>,
    schema: Option<String>,
    timeout: Option<Duration>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    url: String,
    api_key: String,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> ApiResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("api key must not be empty"));
        }
        Ok(Self {
            url: normalize_project_url(url.into())?,
            api_key,
            access_token: None,
            schema: None,
            timeout: None,
        })
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL).ok_or_else(|| missing_setting(ENV_URL))?;
        let api_key = lookup(ENV_API_KEY).ok_or_else(|| missing_setting(ENV_API_KEY))?;
        let mut config = Self::new(url, api_key)?;
        config.access_token = lookup(ENV_ACCESS_TOKEN).filter(|token| !token.is_empty());
        config.schema = lookup(ENV_SCHEMA).filter(|schema| !schema.is_empty());
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("{ENV_TIMEOUT_MS} must be a whole number of milliseconds"))
                    .with_source(err)
            })?;
            config.timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read config file {}", path.display()))
                .with_source(err)
        })?;
        let file: ConfigFile = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid config file {}", path.display()))
                .with_hint("Expected {\"url\": \"https://...\", \"api_key\": \"...\"}.")
                .with_source(err)
        })?;
        let mut config = Self::new(file.url, file.api_key)?;
        config.access_token = file.access_token;
        config.schema = file.schema;
        config.timeout = file.timeout_ms.map(Duration::from_millis);
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn missing_setting(name: &str) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(format!("missing {name}"))
        .with_hint(format!("Set {name} or pass the matching command-line flag."))
}

fn normalize_project_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid project url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(
            Error::new(ErrorKind::Usage).with_message("project url must use http or https scheme")
        );
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("project url must not include a query or fragment"));
    }
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("project url cannot be a base"))?
        .pop_if_empty();
    Ok(url)
}
