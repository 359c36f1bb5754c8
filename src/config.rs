//! Guard configuration parsed from environment variables.

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Errors produced while building configuration or the HTTP client from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Identity provider origin, without a trailing slash.
    pub api_base_url: String,
    /// Raw `Cookie` header forwarded on identity queries.
    pub session_cookie: Option<String>,
    pub timeouts: Timeouts,
    pub max_redirects: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            session_cookie: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl GuardConfig {
    /// Build typed guard config from environment variables.
    ///
    /// Optional:
    /// - `NAVGUARD_API_BASE_URL`: default `http://localhost:5001`
    /// - `NAVGUARD_SESSION_COOKIE`: cookie header sent with `/api/me`
    /// - `NAVGUARD_REQUEST_TIMEOUT_SECS`: default 10
    /// - `NAVGUARD_CONNECT_TIMEOUT_SECS`: default 5
    /// - `NAVGUARD_MAX_REDIRECTS`: default 5
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigParse` if the base URL is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GuardConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigParse` if the base URL is not http(s).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(lookup("NAVGUARD_API_BASE_URL").as_deref())?;
        let session_cookie = non_blank(lookup("NAVGUARD_SESSION_COOKIE"));
        let timeouts = Timeouts {
            request_secs: parse_or(lookup("NAVGUARD_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("NAVGUARD_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let max_redirects = parse_or(lookup("NAVGUARD_MAX_REDIRECTS"), DEFAULT_MAX_REDIRECTS);

        Ok(Self { api_base_url, session_cookie, timeouts, max_redirects })
    }

    /// Replace the base URL, applying the same validation as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigParse` if the URL is not http(s).
    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url(Some(raw))?;
        Ok(self)
    }

    /// Replace the session cookie. A blank value clears it.
    #[must_use]
    pub fn with_session_cookie(mut self, raw: String) -> Self {
        self.session_cookie = non_blank(Some(raw));
        self
    }

    /// Full URL of the identity endpoint.
    #[must_use]
    pub fn me_url(&self) -> String {
        format!("{}/api/me", self.api_base_url)
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|c| !c.trim().is_empty())
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_BASE_URL).trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ConfigParse(format!(
            "unsupported api base url '{url}' (expected http:// or https://)"
        )));
    }
    Ok(url.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
