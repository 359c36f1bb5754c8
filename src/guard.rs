//! Navigation guard — the allow/redirect decision for one attempt.
//!
//! DESIGN
//! ======
//! The guard is a pure function of the destination spec and an identity
//! snapshot. Policy is an ordered rule table evaluated top to bottom; the
//! first rule that yields a verdict wins. Rules overlap (an admin route is
//! also an auth route), so the order is part of the policy:
//!
//! 1. `auth-required`: no session on an auth route goes to `/login`, except
//!    `/login` itself, which is always let through to avoid a redirect loop.
//! 2. `admin-only`: non-admins on admin routes go to `/user-dashboard`.
//! 3. `already-signed-in`: a session landing on `/login` or `/` goes to the
//!    dashboard for its role.
//! 4. `allow`: everything else proceeds.

use serde::Serialize;
use uuid::Uuid;

use crate::identity::Identity;
use crate::routes::{ADMIN_DASHBOARD_PATH, LOGIN_PATH, ROOT_PATH, RouteSpec, USER_DASHBOARD_PATH};

// =============================================================================
// VERDICT
// =============================================================================

/// Outcome of the guard for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "target", rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    /// Abort this transition and start a new one at the given path.
    Redirect(String),
}

impl Verdict {
    fn redirect(path: &str) -> Self {
        Self::Redirect(path.to_owned())
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Redirect(path) => write!(f, "redirect {path}"),
        }
    }
}

// =============================================================================
// NAVIGATION ATTEMPT
// =============================================================================

/// One requested transition. Lives only for the duration of a decision.
#[derive(Debug, Clone, Copy)]
pub struct NavigationAttempt<'a> {
    /// Correlation id for logs.
    pub id: Uuid,
    /// Concrete path requested, e.g. `/manage-questions/7`.
    pub path: &'a str,
    /// Spec whose pattern matched `path`.
    pub to: &'a RouteSpec,
    pub from: Option<&'a RouteSpec>,
}

impl<'a> NavigationAttempt<'a> {
    #[must_use]
    pub fn new(path: &'a str, to: &'a RouteSpec, from: Option<&'a RouteSpec>) -> Self {
        Self { id: Uuid::new_v4(), path, to, from }
    }
}

// =============================================================================
// RULES
// =============================================================================

type RuleCheck = fn(&RouteSpec, &Identity) -> Option<Verdict>;

/// A named policy rule. Returns `None` when it does not apply.
pub struct Rule {
    pub name: &'static str,
    check: RuleCheck,
}

impl Rule {
    #[must_use]
    pub fn check(&self, to: &RouteSpec, identity: &Identity) -> Option<Verdict> {
        (self.check)(to, identity)
    }
}

/// Policy rules in precedence order.
pub const RULES: [Rule; 4] = [
    Rule { name: "auth-required", check: auth_required },
    Rule { name: "admin-only", check: admin_only },
    Rule { name: "already-signed-in", check: already_signed_in },
    Rule { name: "allow", check: allow },
];

fn auth_required(to: &RouteSpec, identity: &Identity) -> Option<Verdict> {
    if !to.requires_auth || identity.is_present() {
        return None;
    }
    if to.path == LOGIN_PATH {
        return Some(Verdict::Allow);
    }
    Some(Verdict::redirect(LOGIN_PATH))
}

fn admin_only(to: &RouteSpec, identity: &Identity) -> Option<Verdict> {
    (to.admin_only && !identity.is_admin()).then(|| Verdict::redirect(USER_DASHBOARD_PATH))
}

fn already_signed_in(to: &RouteSpec, identity: &Identity) -> Option<Verdict> {
    if !identity.is_present() || (to.path != LOGIN_PATH && to.path != ROOT_PATH) {
        return None;
    }
    let home = if identity.is_admin() { ADMIN_DASHBOARD_PATH } else { USER_DASHBOARD_PATH };
    Some(Verdict::redirect(home))
}

#[allow(clippy::unnecessary_wraps)]
fn allow(_to: &RouteSpec, _identity: &Identity) -> Option<Verdict> {
    Some(Verdict::Allow)
}

// =============================================================================
// DECISION
// =============================================================================

/// A verdict together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub rule: &'static str,
    pub verdict: Verdict,
}

/// Evaluate the rule table for an attempt.
#[must_use]
pub fn evaluate(attempt: &NavigationAttempt<'_>, identity: &Identity) -> Decision {
    for rule in &RULES {
        if let Some(verdict) = rule.check(attempt.to, identity) {
            return Decision { rule: rule.name, verdict };
        }
    }
    // Unreachable while `allow` closes the table.
    Decision { rule: "allow", verdict: Verdict::Allow }
}

/// Decide whether navigation to `to` proceeds for `identity`.
///
/// `from` is accepted for parity with router guards; no rule reads it.
#[must_use]
pub fn decide(to: &RouteSpec, from: Option<&RouteSpec>, identity: &Identity) -> Verdict {
    evaluate(&NavigationAttempt::new(&to.path, to, from), identity).verdict
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
