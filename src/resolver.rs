//! Session resolution — who is navigating, asked fresh for every attempt.
//!
//! ERROR HANDLING
//! ==============
//! Resolution never fails from the caller's point of view. A non-success
//! status, a transport error, a timeout or an unparseable body all collapse
//! to `Identity::Absent`, so an unreachable identity provider makes navigation
//! more restrictive rather than broken. The cause is still classified
//! internally: a provider that answered "no session" logs at debug, anything
//! else logs a warning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;

use crate::config::{ConfigError, GuardConfig};
use crate::identity::{Identity, SessionUser};

/// Source of the caller's identity for one navigation attempt.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve the current identity. Infallible: failures yield `Absent`.
    async fn resolve(&self) -> Identity;
}

#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error("identity request failed: {0}")]
    Request(String),

    /// The provider answered, and there is no session.
    #[error("identity provider returned status {status}")]
    NoSession { status: u16 },

    #[error("identity response parse failed: {0}")]
    Parse(String),
}

// =============================================================================
// HTTP RESOLVER
// =============================================================================

/// Queries `GET {base}/api/me`, forwarding the configured session cookie.
pub struct HttpSessionResolver {
    http: reqwest::Client,
    me_url: String,
    session_cookie: Option<String>,
}

impl HttpSessionResolver {
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClientBuild` if the HTTP client cannot be built.
    pub fn new(config: &GuardConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, me_url: config.me_url(), session_cookie: config.session_cookie.clone() })
    }

    #[must_use]
    pub fn me_url(&self) -> &str {
        &self.me_url
    }

    async fn fetch(&self) -> Result<Option<SessionUser>, ResolveError> {
        let mut request = self.http.get(&self.me_url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolveError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::NoSession { status: status.as_u16() });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ResolveError::Request(e.to_string()))?;
        parse_identity(&text)
    }
}

#[async_trait]
impl SessionResolver for HttpSessionResolver {
    async fn resolve(&self) -> Identity {
        match self.fetch().await {
            Ok(user) => {
                let identity = Identity::from(user);
                tracing::debug!(identity = identity.label(), "session resolved");
                identity
            }
            Err(e @ ResolveError::NoSession { .. }) => {
                tracing::debug!(error = %e, "no session");
                Identity::Absent
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %self.me_url, "identity resolution failed; treating as signed out");
                Identity::Absent
            }
        }
    }
}

/// A JSON `null` body means no session; anything else must be a profile object.
fn parse_identity(body: &str) -> Result<Option<SessionUser>, ResolveError> {
    serde_json::from_str(body).map_err(|e| ResolveError::Parse(e.to_string()))
}

// =============================================================================
// STATIC RESOLVER
// =============================================================================

/// Always yields the same identity. Used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    identity: Identity,
}

impl StaticResolver {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl SessionResolver for StaticResolver {
    async fn resolve(&self) -> Identity {
        self.identity.clone()
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
