//! Pull request lifecycle: creation with reviewer assignment, merge and
//! reviewer reassignment.

use super::selector::{select_random, RandomSource};
use super::{log_failure, require};
use crate::db::pool::DbPool;
use crate::db::transaction::run_atomic;
use crate::db::{pull_requests, users};
use crate::error::AppError;
use crate::models::{active_members_except, now_millis, PrStatus, PullRequest, PullRequestRow};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reviewers assigned to a freshly created pull request, at most.
pub const MAX_REVIEWERS: usize = 2;

/// Input for creating a pull request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePullRequestInput {
    #[serde(default)]
    pub pull_request_id: String,
    #[serde(default)]
    pub pull_request_name: String,
    #[serde(default)]
    pub author_id: String,
}

/// Input for merging a pull request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergePullRequestInput {
    #[serde(default)]
    pub pull_request_id: String,
}

/// Input for replacing one reviewer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReassignReviewerInput {
    #[serde(default)]
    pub pull_request_id: String,
    #[serde(default)]
    pub old_user_id: String,
}

/// Result of a successful reassignment.
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
    pub pr: PullRequest,
    pub replaced_by: String,
}

/// Owns the pull request state machine (`OPEN -> MERGED`) and reviewer sets.
#[derive(Clone)]
pub struct PullRequestService {
    pool: DbPool,
    random: Arc<dyn RandomSource>,
}

impl PullRequestService {
    pub fn new(pool: DbPool, random: Arc<dyn RandomSource>) -> Self {
        Self { pool, random }
    }

    /// Create an open pull request and assign up to [`MAX_REVIEWERS`] active
    /// members of the author's team, never the author.
    ///
    /// Duplicate ids are detected by the insert itself, so two concurrent
    /// creates with the same id cannot both succeed.
    pub async fn create_pull_request(
        &self,
        input: CreatePullRequestInput,
    ) -> Result<PullRequest, AppError> {
        self.create_inner(input).await.inspect_err(|e| log_failure("Create pull request", e))
    }

    async fn create_inner(&self, input: CreatePullRequestInput) -> Result<PullRequest, AppError> {
        require("pull_request_id", &input.pull_request_id)?;
        require("pull_request_name", &input.pull_request_name)?;
        require("author_id", &input.author_id)?;

        log::info!(
            "Creating pull request {} (author: {})",
            input.pull_request_id,
            input.author_id
        );

        let reviewer_ids = {
            let mut conn = self.pool.acquire().await?;
            let author = users::get_by_id(&mut conn, &input.author_id).await?;
            let team = users::get_by_team(&mut conn, &author.team_name).await?;
            let eligible = active_members_except(&team, &[author.id.as_str()]);
            log::debug!(
                "Found {} eligible reviewers for {} in team {}",
                eligible.len(),
                input.pull_request_id,
                author.team_name
            );

            let mut rng = self.random.rng();
            select_random(&mut *rng, &eligible, MAX_REVIEWERS)
                .into_iter()
                .map(|u| u.id)
                .collect::<Vec<_>>()
        };

        let row = PullRequestRow {
            id: input.pull_request_id,
            name: input.pull_request_name,
            author_id: input.author_id,
            status: PrStatus::Open.as_str().to_string(),
            created_at: now_millis(),
            merged_at: None,
        };

        let pr = run_atomic(&self.pool, move |conn| {
            async move {
                pull_requests::create(conn, &row).await?;
                for reviewer_id in &reviewer_ids {
                    pull_requests::add_reviewer(conn, &row.id, reviewer_id, row.created_at)
                        .await?;
                }
                pull_requests::get_by_id(conn, &row.id).await
            }
            .boxed()
        })
        .await?;

        log::info!(
            "Created pull request {} with reviewers {:?}",
            pr.id,
            pr.reviewers
        );
        Ok(pr)
    }

    /// Merge a pull request.
    ///
    /// Idempotent: merging an already merged pull request returns it
    /// unchanged, keeping the original merge timestamp.
    pub async fn merge_pull_request(
        &self,
        input: MergePullRequestInput,
    ) -> Result<PullRequest, AppError> {
        self.merge_inner(input).await.inspect_err(|e| log_failure("Merge pull request", e))
    }

    async fn merge_inner(&self, input: MergePullRequestInput) -> Result<PullRequest, AppError> {
        require("pull_request_id", &input.pull_request_id)?;
        let pr_id = input.pull_request_id;

        log::info!("Merging pull request {}", pr_id);

        let mut conn = self.pool.acquire().await?;
        let current = pull_requests::get_by_id(&mut conn, &pr_id).await?;
        if current.is_merged() {
            log::info!("Pull request {} is already merged", pr_id);
            return Ok(current);
        }

        match pull_requests::merge(&mut conn, &pr_id, now_millis()).await {
            Ok(pr) => {
                log::info!("Merged pull request {}", pr_id);
                Ok(pr)
            }
            Err(AppError::PrMerged { .. }) => {
                log::info!("Pull request {} was merged concurrently", pr_id);
                pull_requests::get_by_id(&mut conn, &pr_id).await
            }
            Err(e) => Err(e),
        }
    }

    /// Replace `old_user_id` on an open pull request with a random active
    /// member of the departing reviewer's team.
    ///
    /// The author, the departing reviewer and every current reviewer are
    /// never picked.
    pub async fn reassign_reviewer(
        &self,
        input: ReassignReviewerInput,
    ) -> Result<Reassignment, AppError> {
        self.reassign_inner(input).await.inspect_err(|e| log_failure("Reassign reviewer", e))
    }

    async fn reassign_inner(&self, input: ReassignReviewerInput) -> Result<Reassignment, AppError> {
        require("pull_request_id", &input.pull_request_id)?;
        require("old_user_id", &input.old_user_id)?;
        let ReassignReviewerInput {
            pull_request_id: pr_id,
            old_user_id,
        } = input;

        log::info!("Reassigning reviewer {} on pull request {}", old_user_id, pr_id);

        let new_reviewer_id = {
            let mut conn = self.pool.acquire().await?;
            let pr = pull_requests::get_by_id(&mut conn, &pr_id).await?;

            if pr.is_merged() {
                return Err(AppError::pr_merged(&pr_id));
            }
            if !pr.is_reviewer_assigned(&old_user_id) {
                return Err(AppError::reviewer_not_assigned(&pr_id, &old_user_id));
            }

            let old_reviewer = users::get_by_id(&mut conn, &old_user_id).await?;
            let team = users::get_by_team(&mut conn, &old_reviewer.team_name).await?;

            let mut excluded: Vec<&str> = vec![old_user_id.as_str(), pr.author_id.as_str()];
            excluded.extend(pr.reviewers.iter().map(String::as_str));
            let candidates = active_members_except(&team, &excluded);
            log::debug!(
                "Found {} replacement candidates for {} in team {}",
                candidates.len(),
                pr_id,
                old_reviewer.team_name
            );

            let mut rng = self.random.rng();
            match select_random(&mut *rng, &candidates, 1).pop() {
                Some(user) => user.id,
                None => return Err(AppError::no_candidate(&pr_id, &old_user_id)),
            }
        };

        let replacement = new_reviewer_id.clone();
        let old_id = old_user_id.clone();
        let pr = run_atomic(&self.pool, move |conn| {
            async move {
                pull_requests::remove_reviewer(conn, &pr_id, &old_id).await?;
                // Merged in the meantime: the reviewer set is frozen.
                if pull_requests::get_by_id(conn, &pr_id).await?.is_merged() {
                    return Err(AppError::pr_merged(&pr_id));
                }
                pull_requests::add_reviewer(conn, &pr_id, &replacement, now_millis()).await?;
                pull_requests::get_by_id(conn, &pr_id).await
            }
            .boxed()
        })
        .await?;

        log::info!(
            "Reassigned pull request {}: {} -> {}",
            pr.id,
            old_user_id,
            new_reviewer_id
        );
        Ok(Reassignment {
            pr,
            replaced_by: new_reviewer_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::teams;
    use crate::models::User;
    use crate::services::selector::SeededSource;
    use tempfile::tempdir;

    async fn service_with_team(members: &[(&str, bool)]) -> (tempfile::TempDir, PullRequestService) {
        let dir = tempdir().unwrap();
        let pool = crate::db::initialize(&dir.path().join("test.db")).await.unwrap();
        {
            let mut conn = pool.acquire().await.unwrap();
            teams::create(&mut conn, "core").await.unwrap();
            for (id, active) in members {
                let user = User {
                    id: id.to_string(),
                    username: id.to_uppercase(),
                    team_name: "core".into(),
                    is_active: *active,
                };
                users::create(&mut conn, &user).await.unwrap();
            }
        }
        (dir, PullRequestService::new(pool, Arc::new(SeededSource(3))))
    }

    fn create_input(id: &str, author: &str) -> CreatePullRequestInput {
        CreatePullRequestInput {
            pull_request_id: id.into(),
            pull_request_name: format!("{} title", id),
            author_id: author.into(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_at_most_two_non_authors() {
        let (_dir, service) =
            service_with_team(&[("a", true), ("b", true), ("c", true), ("d", true), ("e", false)])
                .await;

        let pr = service.create_pull_request(create_input("pr-1", "a")).await.unwrap();

        assert_eq!(pr.status, PrStatus::Open);
        assert_eq!(pr.reviewers.len(), 2);
        assert_ne!(pr.reviewers[0], pr.reviewers[1]);
        assert!(pr.reviewers.iter().all(|r| ["b", "c", "d"].contains(&r.as_str())));
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let (_dir, service) = service_with_team(&[("a", true)]).await;

        let err = service
            .create_pull_request(CreatePullRequestInput {
                pull_request_name: "x".into(),
                author_id: "a".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: Some(ref f), .. } if f == "pull_request_id"));

        let err = service.create_pull_request(create_input("pr-1", "ghost")).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let (_dir, service) = service_with_team(&[("a", true), ("b", true)]).await;
        service.create_pull_request(create_input("pr-1", "a")).await.unwrap();

        let merge = || MergePullRequestInput {
            pull_request_id: "pr-1".into(),
        };
        let first = service.merge_pull_request(merge()).await.unwrap();
        let second = service.merge_pull_request(merge()).await.unwrap();

        assert_eq!(first.status, PrStatus::Merged);
        assert!(first.merged_at.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reassign_picks_fresh_reviewer() {
        let (_dir, service) =
            service_with_team(&[("a", true), ("b", true), ("c", true), ("d", true)]).await;
        let pr = service.create_pull_request(create_input("pr-1", "a")).await.unwrap();
        let old = pr.reviewers[0].clone();

        let result = service
            .reassign_reviewer(ReassignReviewerInput {
                pull_request_id: "pr-1".into(),
                old_user_id: old.clone(),
            })
            .await
            .unwrap();

        assert!(!pr.reviewers.contains(&result.replaced_by));
        assert_ne!(result.replaced_by, "a");
        assert!(!result.pr.is_reviewer_assigned(&old));
        assert!(result.pr.is_reviewer_assigned(&result.replaced_by));
        assert_eq!(result.pr.reviewers.len(), 2);
    }
}
