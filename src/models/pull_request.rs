//! Pull request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a pull request.
///
/// `Open` is initial; the only transition is `Open -> Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl From<&str> for PrStatus {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MERGED" => Self::Merged,
            _ => Self::Open,
        }
    }
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of the `pull_requests` table.
///
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, FromRow)]
pub struct PullRequestRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: i64,
    pub merged_at: Option<i64>,
}

impl PullRequestRow {
    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PrStatus {
        PrStatus::from(self.status.as_str())
    }

    /// Combine the row with its reviewer ids into the aggregate.
    pub fn into_pull_request(self, reviewers: Vec<String>) -> PullRequest {
        PullRequest {
            status: self.status_enum(),
            created_at: from_millis(self.created_at),
            merged_at: self.merged_at.map(from_millis),
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            reviewers,
        }
    }

    pub fn into_short(self) -> PullRequestShort {
        PullRequestShort {
            status: self.status_enum(),
            id: self.id,
            name: self.name,
            author_id: self.author_id,
        }
    }
}

/// A pull request with its reviewers, ordered by assignment time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: String,

    #[serde(rename = "pull_request_name")]
    pub name: String,

    pub author_id: String,

    pub status: PrStatus,

    #[serde(rename = "assigned_reviewers")]
    pub reviewers: Vec<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Set exactly once, on the transition to `Merged`.
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none", default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    pub fn is_reviewer_assigned(&self, user_id: &str) -> bool {
        self.reviewers.iter().any(|r| r == user_id)
    }
}

/// Compact pull request listing, used for a reviewer's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestShort {
    #[serde(rename = "pull_request_id")]
    pub id: String,

    #[serde(rename = "pull_request_name")]
    pub name: String,

    pub author_id: String,

    pub status: PrStatus,
}

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, merged_at: Option<i64>) -> PullRequestRow {
        PullRequestRow {
            id: "pr-1".into(),
            name: "Add search".into(),
            author_id: "u1".into(),
            status: status.into(),
            created_at: 1_700_000_000_000,
            merged_at,
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(PrStatus::from("OPEN"), PrStatus::Open);
        assert_eq!(PrStatus::from("merged"), PrStatus::Merged);
        assert_eq!(PrStatus::Merged.to_string(), "MERGED");
    }

    #[test]
    fn test_open_pr_omits_merged_at() {
        let pr = row("OPEN", None).into_pull_request(vec!["u2".into(), "u3".into()]);
        assert!(!pr.is_merged());
        assert!(pr.is_reviewer_assigned("u3"));
        assert!(!pr.is_reviewer_assigned("u1"));

        let json = serde_json::to_value(&pr).unwrap();
        assert_eq!(json["pull_request_id"], "pr-1");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"][1], "u3");
        assert!(json.get("mergedAt").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_merged_pr_keeps_timestamp() {
        let pr = row("MERGED", Some(1_700_000_123_456)).into_pull_request(vec![]);
        assert!(pr.is_merged());
        assert_eq!(
            pr.merged_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_123_456)
        );
    }
}
