//! Data models for the application.
//!
//! These models represent the entities stored in SQLite and the aggregates
//! returned to callers. Row types derive `FromRow` for SQLx queries; the
//! aggregates derive `Serialize` with the field names used on the wire.

pub mod pull_request;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{now_millis, PrStatus, PullRequest, PullRequestRow, PullRequestShort};
pub use team::{active_members_except, Team};
pub use user::{TeamMember, User};
