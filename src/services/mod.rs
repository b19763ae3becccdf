//! Business logic services.
//!
//! Services own the reviewer-assignment rules and drive the store through
//! explicit connections; every multi-step write goes through
//! [`crate::db::transaction::run_atomic`]. They hold no mutable in-process
//! state, so one instance is shared by all requests.

pub mod pull_requests;
pub mod selector;
pub mod teams;
pub mod users;

pub use pull_requests::{
    CreatePullRequestInput, MergePullRequestInput, PullRequestService, ReassignReviewerInput,
    Reassignment,
};
pub use selector::{select_random, EntropySource, RandomSource, SeededSource};
pub use teams::{CreateTeamInput, TeamService};
pub use users::{SetUserActiveInput, UserReviews, UserService};

use crate::error::{AppError, ErrorClass};

/// Log a failed operation at a level matching its cause.
///
/// Rejected business rules are warnings; store and internal failures are
/// errors.
pub(crate) fn log_failure(operation: &str, err: &AppError) {
    match err.class() {
        ErrorClass::Internal => log::error!("{} failed: {}", operation, err),
        _ => log::warn!("{} rejected: {}", operation, err),
    }
}

/// Reject an empty (or whitespace-only) required field.
pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::missing_field(field));
    }
    Ok(())
}
