//! # navguard
//!
//! Navigation authorization for the quiz client. Every attempted navigation
//! resolves the caller's session from the identity provider, runs the route
//! guard on that snapshot, and either proceeds or redirects.
//!
//! - `identity`: the per-attempt caller snapshot (`Absent` or a role).
//! - `routes`: the declarative route table the guard reads.
//! - `guard`: the pure, ordered allow/redirect policy.
//! - `resolver`: fail-closed session lookup over HTTP.
//! - `navigator`: applies verdicts and re-checks redirect targets.
//! - `config`: environment-driven settings.

pub mod config;
pub mod guard;
pub mod identity;
pub mod navigator;
pub mod resolver;
pub mod routes;
