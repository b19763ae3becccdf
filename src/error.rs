//! Application error types.
//!
//! Every business failure is a distinct variant so the HTTP layer can map it
//! to a stable machine-readable code. Store constraint violations are
//! translated into these variants inside the `db` layer; anything the store
//! reports that is not a recognised constraint ends up as `Database`.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of an error, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something it can correct.
    BadRequest,
    /// The request conflicts with the current state.
    Conflict,
    /// A referenced resource does not exist.
    NotFound,
    /// Unexpected failure on our side.
    Internal,
}

/// Application-level errors.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// A team with this name already exists.
    #[error("team {team_name} already exists")]
    TeamExists { team_name: String },

    /// Requested team does not exist.
    #[error("team {team_name} not found")]
    TeamNotFound { team_name: String },

    /// Requested user does not exist.
    #[error("user {user_id} not found")]
    UserNotFound { user_id: String },

    /// A user with this id already exists.
    #[error("user {user_id} already exists")]
    UserAlreadyExists { user_id: String },

    /// A pull request with this id already exists.
    #[error("pull request {pr_id} already exists")]
    PrAlreadyExists { pr_id: String },

    /// Requested pull request does not exist.
    #[error("pull request {pr_id} not found")]
    PrNotFound { pr_id: String },

    /// Mutation attempted on a merged pull request.
    #[error("cannot modify merged pull request {pr_id}")]
    PrMerged { pr_id: String },

    /// The user is not currently a reviewer of the pull request.
    #[error("reviewer {user_id} is not assigned to pull request {pr_id}")]
    ReviewerNotAssigned { pr_id: String, user_id: String },

    /// The user is already a reviewer of the pull request.
    #[error("reviewer {user_id} is already assigned to pull request {pr_id}")]
    ReviewerAlreadyAssigned { pr_id: String, user_id: String },

    /// Reassignment found no eligible replacement.
    #[error("no active candidates available to replace {user_id} on pull request {pr_id}")]
    NoCandidate { pr_id: String, user_id: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn team_exists(team_name: impl Into<String>) -> Self {
        Self::TeamExists {
            team_name: team_name.into(),
        }
    }

    pub fn team_not_found(team_name: impl Into<String>) -> Self {
        Self::TeamNotFound {
            team_name: team_name.into(),
        }
    }

    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn user_already_exists(user_id: impl Into<String>) -> Self {
        Self::UserAlreadyExists {
            user_id: user_id.into(),
        }
    }

    pub fn pr_already_exists(pr_id: impl Into<String>) -> Self {
        Self::PrAlreadyExists {
            pr_id: pr_id.into(),
        }
    }

    pub fn pr_not_found(pr_id: impl Into<String>) -> Self {
        Self::PrNotFound {
            pr_id: pr_id.into(),
        }
    }

    pub fn pr_merged(pr_id: impl Into<String>) -> Self {
        Self::PrMerged {
            pr_id: pr_id.into(),
        }
    }

    pub fn reviewer_not_assigned(pr_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::ReviewerNotAssigned {
            pr_id: pr_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn reviewer_already_assigned(
        pr_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::ReviewerAlreadyAssigned {
            pr_id: pr_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn no_candidate(pr_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::NoCandidate {
            pr_id: pr_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error for a required field that was empty.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::InvalidInput {
            message: format!("{} is required", field),
            field: Some(field),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TeamExists { .. } => "TEAM_EXISTS",
            Self::TeamNotFound { .. } | Self::UserNotFound { .. } | Self::PrNotFound { .. } => {
                "NOT_FOUND"
            }
            Self::UserAlreadyExists { .. } => "USER_EXISTS",
            Self::PrAlreadyExists { .. } => "PR_EXISTS",
            Self::PrMerged { .. } => "PR_MERGED",
            Self::ReviewerNotAssigned { .. } => "NOT_ASSIGNED",
            Self::ReviewerAlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            Self::NoCandidate { .. } => "NO_CANDIDATE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Database { .. } | Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Classify the error for response mapping.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput { .. } | Self::TeamExists { .. } => ErrorClass::BadRequest,
            Self::UserAlreadyExists { .. }
            | Self::PrAlreadyExists { .. }
            | Self::PrMerged { .. }
            | Self::ReviewerNotAssigned { .. }
            | Self::ReviewerAlreadyAssigned { .. }
            | Self::NoCandidate { .. } => ErrorClass::Conflict,
            Self::TeamNotFound { .. } | Self::UserNotFound { .. } | Self::PrNotFound { .. } => {
                ErrorClass::NotFound
            }
            Self::Database { .. } | Self::Internal { .. } => ErrorClass::Internal,
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}
