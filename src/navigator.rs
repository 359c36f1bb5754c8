//! Navigator — applies guard verdicts the way a client router would.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each attempt resolves identity (suspending until the resolver settles),
//! runs the guard once on that snapshot, then applies the verdict. A redirect
//! starts a brand-new attempt at the target, with its own identity
//! resolution, so a protected redirect target is re-checked rather than
//! trusted. Alias routes (`/` → `/login`) are rewritten before the guard runs.
//!
//! Concurrent `navigate` calls share only the immutable route table and the
//! resolver; nothing is serialized or cancelled here.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::DEFAULT_MAX_REDIRECTS;
use crate::guard::{self, Decision, NavigationAttempt, Verdict};
use crate::resolver::SessionResolver;
use crate::routes::{RouteSpec, RouteTable, normalize_path};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("redirect limit of {limit} exceeded navigating to {requested} ({})", .trail.join(" -> "))]
    RedirectLoop { requested: String, limit: usize, trail: Vec<String> },
}

/// One step of a navigation: the path tried and what happened there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub path: String,
    pub rule: &'static str,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Completed navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub requested: String,
    /// Path the caller ends up on.
    pub destination: String,
    /// Parameters captured from the destination's route pattern.
    pub params: BTreeMap<String, String>,
    pub hops: Vec<Hop>,
}

impl Navigation {
    #[must_use]
    pub fn was_redirected(&self) -> bool {
        self.hops.len() > 1
    }
}

#[derive(Clone)]
pub struct Navigator {
    routes: Arc<RouteTable>,
    resolver: Arc<dyn SessionResolver>,
    max_redirects: usize,
}

impl Navigator {
    pub fn new(routes: RouteTable, resolver: impl SessionResolver + 'static) -> Self {
        Self { routes: Arc::new(routes), resolver: Arc::new(resolver), max_redirects: DEFAULT_MAX_REDIRECTS }
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Run a single attempt: resolve identity once, then decide.
    pub async fn attempt(&self, to: &str, from: Option<&str>) -> Decision {
        let path = normalize_path(to);
        let to_spec = self.routes.spec_for(&path);
        self.decide_hop(&path, &to_spec, from).await
    }

    async fn decide_hop(&self, path: &str, to: &RouteSpec, from: Option<&str>) -> Decision {
        let identity = self.resolver.resolve().await;

        let from_spec = from.map(|p| self.routes.spec_for(p));
        let attempt = NavigationAttempt::new(path, to, from_spec.as_deref());
        let decision = guard::evaluate(&attempt, &identity);

        tracing::debug!(
            attempt = %attempt.id,
            path = attempt.path,
            route = %attempt.to.path,
            from = attempt.from.map_or("-", |f| f.path.as_str()),
            identity = identity.label(),
            rule = decision.rule,
            verdict = %decision.verdict,
            "guard decision"
        );
        decision
    }

    /// Navigate to `to`, following alias and guard redirects until a
    /// destination is allowed.
    ///
    /// # Errors
    ///
    /// Returns `NavError::RedirectLoop` if more than `max_redirects`
    /// redirects are needed.
    pub async fn navigate(&self, to: &str, from: Option<&str>) -> Result<Navigation, NavError> {
        let requested = normalize_path(to);
        let mut current = requested.clone();
        let mut previous = from.map(normalize_path);
        let mut hops = Vec::new();

        loop {
            let found = self.routes.resolve(&current);
            let alias = found.as_ref().and_then(|m| m.spec.redirect.clone());

            let next = if let Some(target) = alias {
                hops.push(Hop { path: current.clone(), rule: "alias", verdict: Verdict::Redirect(target.clone()) });
                target
            } else {
                let to_spec = found
                    .as_ref()
                    .map_or_else(|| Cow::Owned(RouteSpec::public(current.clone())), |m| Cow::Borrowed(m.spec));
                let decision = self.decide_hop(&current, &to_spec, previous.as_deref()).await;
                hops.push(Hop { path: current.clone(), rule: decision.rule, verdict: decision.verdict.clone() });
                match decision.verdict {
                    Verdict::Allow => {
                        let params = found.map(|m| m.params).unwrap_or_default();
                        tracing::info!(%requested, destination = %current, hops = hops.len(), "navigation allowed");
                        return Ok(Navigation { requested, destination: current, params, hops });
                    }
                    Verdict::Redirect(target) => target,
                }
            };

            if hops.len() > self.max_redirects {
                let trail = hops.iter().map(|h| h.path.clone()).chain(std::iter::once(next)).collect();
                tracing::warn!(%requested, limit = self.max_redirects, "redirect loop");
                return Err(NavError::RedirectLoop { requested, limit: self.max_redirects, trail });
            }

            previous = Some(std::mem::replace(&mut current, normalize_path(&next)));
        }
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
