//! Caller identity as seen by one navigation attempt.
//!
//! DESIGN
//! ======
//! `Identity` is a snapshot handed to the guard as a plain value. It is never
//! cached or stored globally; the navigator resolves a fresh one for every
//! attempt and drops it once the verdict is produced.

use serde::{Deserialize, Serialize};

// =============================================================================
// ROLE
// =============================================================================

/// Account role carried in the identity provider's session profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Anything other than the literal `"admin"` is a regular user. The provider
/// stores `"user"` as the column default, so a null or missing role lands here too.
impl From<Option<String>> for Role {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            Some("admin") => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SESSION USER
// =============================================================================

/// Profile body returned by `GET /api/me`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl SessionUser {
    #[must_use]
    pub fn with_role(role: Role) -> Self {
        Self { role, ..Self::default() }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Resolved caller state for one navigation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    /// No valid session, or the session could not be determined.
    #[default]
    Absent,
    Present(SessionUser),
}

impl Identity {
    /// Present identity with only a role, for callers that have no profile.
    #[must_use]
    pub fn with_role(role: Role) -> Self {
        Self::Present(SessionUser::with_role(role))
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Absent => None,
            Self::Present(user) => Some(user.role),
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Short label for logs: `absent`, `user` or `admin`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.role().map_or("absent", Role::as_str)
    }
}

impl From<Option<SessionUser>> for Identity {
    fn from(user: Option<SessionUser>) -> Self {
        user.map_or(Self::Absent, Self::Present)
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
