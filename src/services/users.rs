//! User workflow: activation toggling and review queues.

use super::{log_failure, require};
use crate::db::pool::DbPool;
use crate::db::{pull_requests, users};
use crate::error::AppError;
use crate::models::{PullRequestShort, User};
use serde::{Deserialize, Serialize};

/// Input for toggling a user's active flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetUserActiveInput {
    #[serde(default)]
    pub user_id: String,
    pub is_active: bool,
}

/// Pull requests a user is currently reviewing, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Set the active flag and return the refreshed user.
    ///
    /// Only future selections are affected; existing assignments stay.
    pub async fn set_user_active(&self, input: SetUserActiveInput) -> Result<User, AppError> {
        self.set_active_inner(input)
            .await
            .inspect_err(|e| log_failure("Set user active", e))
    }

    async fn set_active_inner(&self, input: SetUserActiveInput) -> Result<User, AppError> {
        require("user_id", &input.user_id)?;

        log::info!("Setting user {} active = {}", input.user_id, input.is_active);

        let mut conn = self.pool.acquire().await?;
        users::set_active(&mut conn, &input.user_id, input.is_active).await?;
        let user = users::get_by_id(&mut conn, &input.user_id).await?;

        log::info!("User {} is now active = {}", user.id, user.is_active);
        Ok(user)
    }

    pub async fn get_user_reviews(&self, user_id: &str) -> Result<UserReviews, AppError> {
        self.reviews_inner(user_id)
            .await
            .inspect_err(|e| log_failure("Get user reviews", e))
    }

    async fn reviews_inner(&self, user_id: &str) -> Result<UserReviews, AppError> {
        require("user_id", user_id)?;

        let mut conn = self.pool.acquire().await?;
        users::get_by_id(&mut conn, user_id).await?;
        let pull_requests = pull_requests::get_by_reviewer(&mut conn, user_id).await?;

        log::debug!("User {} reviews {} pull requests", user_id, pull_requests.len());
        Ok(UserReviews {
            user_id: user_id.to_string(),
            pull_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::teams;
    use tempfile::tempdir;

    async fn service_with_user() -> (tempfile::TempDir, UserService) {
        let dir = tempdir().unwrap();
        let pool = crate::db::initialize(&dir.path().join("test.db")).await.unwrap();
        {
            let mut conn = pool.acquire().await.unwrap();
            teams::create(&mut conn, "core").await.unwrap();
            users::create(
                &mut conn,
                &User {
                    id: "u1".into(),
                    username: "Alice".into(),
                    team_name: "core".into(),
                    is_active: true,
                },
            )
            .await
            .unwrap();
        }
        (dir, UserService::new(pool))
    }

    #[tokio::test]
    async fn test_set_user_active_returns_fresh_user() {
        let (_dir, service) = service_with_user().await;

        let user = service
            .set_user_active(SetUserActiveInput {
                user_id: "u1".into(),
                is_active: false,
            })
            .await
            .unwrap();
        assert!(!user.is_active);
        assert_eq!(user.team_name, "core");

        let err = service
            .set_user_active(SetUserActiveInput {
                user_id: "ghost".into(),
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_reviews_for_unknown_user() {
        let (_dir, service) = service_with_user().await;

        let reviews = service.get_user_reviews("u1").await.unwrap();
        assert_eq!(reviews.user_id, "u1");
        assert!(reviews.pull_requests.is_empty());

        let err = service.get_user_reviews("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound { .. }));

        let err = service.get_user_reviews(" ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }
}
