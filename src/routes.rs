//! Route table — declarative access requirements per client path.
//!
//! DESIGN
//! ======
//! Each `RouteSpec` is immutable data: a path pattern plus the two flags the
//! guard reads. Policy never lives here. Patterns use `:name` segments for
//! parameters (`/quiz/:quizId/attempt`), and matching is first-match in table
//! order, like the client router it describes.
//!
//! Paths that match no entry are not an error: `spec_for` hands back an
//! unprotected spec so the guard always has something to decide on.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const USER_DASHBOARD_PATH: &str = "/user-dashboard";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin-dashboard";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while building a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Every admin route must also require authentication.
    #[error("route {path} is admin-only but does not require auth")]
    AdminWithoutAuth { path: String },

    #[error("route path must start with '/': {path:?}")]
    InvalidPath { path: String },

    #[error("duplicate route path: {path}")]
    Duplicate { path: String },
}

// =============================================================================
// ROUTE SPEC
// =============================================================================

/// Immutable access declaration for one client path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSpec {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub requires_auth: bool,
    pub admin_only: bool,
    /// Router-level alias: navigating here is rewritten to this path before
    /// the guard runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl RouteSpec {
    /// Route anyone may open.
    #[must_use]
    pub fn public(path: impl Into<String>) -> Self {
        Self { path: path.into(), name: None, requires_auth: false, admin_only: false, redirect: None }
    }

    /// Route that needs a session of any role.
    #[must_use]
    pub fn authenticated(path: impl Into<String>) -> Self {
        Self { requires_auth: true, ..Self::public(path) }
    }

    /// Route restricted to admins. Implies `requires_auth`.
    #[must_use]
    pub fn admin(path: impl Into<String>) -> Self {
        Self { requires_auth: true, admin_only: true, ..Self::public(path) }
    }

    /// Alias route that forwards to `target`.
    #[must_use]
    pub fn alias(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self { redirect: Some(target.into()), ..Self::public(path) }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn validate(&self) -> Result<(), RouteError> {
        if !self.path.starts_with('/') {
            return Err(RouteError::InvalidPath { path: self.path.clone() });
        }
        if self.admin_only && !self.requires_auth {
            return Err(RouteError::AdminWithoutAuth { path: self.path.clone() });
        }
        Ok(())
    }

    /// Match a normalized concrete path against this spec's pattern,
    /// returning captured `:param` values on success.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern: Vec<&str> = segments(&self.path).collect();
        let concrete: Vec<&str> = segments(path).collect();
        if pattern.len() != concrete.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (want, got) in pattern.iter().zip(&concrete) {
            if let Some(name) = want.strip_prefix(':') {
                params.insert(name.to_owned(), (*got).to_owned());
            } else if !want.eq_ignore_ascii_case(got) {
                return None;
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strip query and fragment, resolve `.` and `..`, ensure a leading slash,
/// drop trailing slashes. `..` never climbs above the root.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let mut resolved: Vec<&str> = Vec::new();
    for segment in segments(&raw[..end]) {
        match segment {
            "." => {}
            ".." => {
                resolved.pop();
            }
            _ => resolved.push(segment),
        }
    }
    format!("/{}", resolved.join("/"))
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// A route lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub spec: &'a RouteSpec,
    pub params: BTreeMap<String, String>,
}

/// Ordered, validated list of route specs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    /// Build a table, rejecting entries that break the route invariants.
    ///
    /// # Errors
    ///
    /// Returns a `RouteError` for a malformed path, an admin route that does
    /// not require auth, or a repeated path.
    pub fn new(routes: Vec<RouteSpec>) -> Result<Self, RouteError> {
        let mut seen = std::collections::HashSet::new();
        for spec in &routes {
            spec.validate()?;
            if !seen.insert(spec.path.to_ascii_lowercase()) {
                return Err(RouteError::Duplicate { path: spec.path.clone() });
            }
        }
        Ok(Self { routes })
    }

    /// The quiz application's client routes.
    #[must_use]
    pub fn quiz_app() -> Self {
        Self {
            routes: vec![
                RouteSpec::alias(ROOT_PATH, LOGIN_PATH),
                RouteSpec::public(LOGIN_PATH).named("Login"),
                RouteSpec::public("/register").named("Register"),
                // Admin
                RouteSpec::admin(ADMIN_DASHBOARD_PATH).named("AdminDashboard"),
                RouteSpec::admin("/manage-subjects").named("ManageSubjects"),
                RouteSpec::admin("/manage-chapters").named("ManageChapters"),
                RouteSpec::admin("/create-quiz").named("CreateQuiz"),
                RouteSpec::admin("/manage-quizzes").named("ManageQuizzes"),
                RouteSpec::admin("/manage-questions/:quizId").named("ManageQuestions"),
                RouteSpec::admin("/admin/quizzes/:quizId/results").named("ViewResults"),
                RouteSpec::admin("/export-scores").named("ExportScores"),
                // User
                RouteSpec::authenticated(USER_DASHBOARD_PATH).named("UserDashboard"),
                RouteSpec::authenticated("/quiz/:quizId/attempt").named("QuizAttempt"),
                RouteSpec::authenticated("/user-scores").named("UserScores"),
            ],
        }
    }

    /// First entry whose pattern matches `path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find_map(|spec| spec.match_path(&path).map(|params| RouteMatch { spec, params }))
    }

    /// Spec governing `path`; unknown paths get an unprotected spec.
    #[must_use]
    pub fn spec_for(&self, path: &str) -> Cow<'_, RouteSpec> {
        match self.resolve(path) {
            Some(found) => Cow::Borrowed(found.spec),
            None => Cow::Owned(RouteSpec::public(normalize_path(path))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteSpec> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::quiz_app()
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
