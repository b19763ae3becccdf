//! Team workflow: creation with member provisioning, lookup.

use super::{log_failure, require};
use crate::db::pool::DbPool;
use crate::db::transaction::run_atomic;
use crate::db::{teams, users};
use crate::error::AppError;
use crate::models::{Team, TeamMember};
use futures::FutureExt;
use serde::Deserialize;

/// Input for creating a team together with its members.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTeamInput {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[derive(Clone)]
pub struct TeamService {
    pool: DbPool,
}

impl TeamService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a team and all of its members in one unit.
    ///
    /// Either the team and every member exist afterwards or none of them do.
    /// An empty member list is rejected.
    pub async fn create_team(&self, input: CreateTeamInput) -> Result<Team, AppError> {
        self.create_inner(input).await.inspect_err(|e| log_failure("Create team", e))
    }

    async fn create_inner(&self, input: CreateTeamInput) -> Result<Team, AppError> {
        require("team_name", &input.team_name)?;
        if input.members.is_empty() {
            return Err(AppError::InvalidInput {
                message: "members array cannot be empty".to_string(),
                field: Some("members".to_string()),
            });
        }
        for (i, member) in input.members.iter().enumerate() {
            require(&format!("members[{}].user_id", i), &member.user_id)?;
            require(&format!("members[{}].username", i), &member.username)?;
        }

        log::info!(
            "Creating team {} with {} members",
            input.team_name,
            input.members.len()
        );

        // Fast path only; the insert below is what actually rejects duplicates.
        {
            let mut conn = self.pool.acquire().await?;
            if teams::exists(&mut conn, &input.team_name).await? {
                return Err(AppError::team_exists(&input.team_name));
            }
        }

        let CreateTeamInput { team_name, members } = input;
        let team = run_atomic(&self.pool, move |conn| {
            async move {
                teams::create(conn, &team_name).await?;
                for member in members {
                    users::create(conn, &member.into_user(&team_name)).await?;
                }
                teams::get_by_name(conn, &team_name).await
            }
            .boxed()
        })
        .await?;

        log::info!(
            "Created team {} with {} members",
            team.team_name,
            team.members.len()
        );
        Ok(team)
    }

    /// Load a team and its members.
    pub async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        self.get_inner(team_name).await.inspect_err(|e| log_failure("Get team", e))
    }

    async fn get_inner(&self, team_name: &str) -> Result<Team, AppError> {
        require("team_name", team_name)?;

        let mut conn = self.pool.acquire().await?;
        let team = teams::get_by_name(&mut conn, team_name).await?;

        log::debug!("Retrieved team {} with {} members", team_name, team.members.len());
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn member(id: &str, name: &str, active: bool) -> TeamMember {
        TeamMember {
            user_id: id.into(),
            username: name.into(),
            is_active: active,
        }
    }

    async fn service() -> (tempfile::TempDir, TeamService) {
        let dir = tempdir().unwrap();
        let pool = crate::db::initialize(&dir.path().join("test.db")).await.unwrap();
        (dir, TeamService::new(pool))
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let (_dir, service) = service().await;

        let created = service
            .create_team(CreateTeamInput {
                team_name: "payments".into(),
                members: vec![member("u2", "Bob", false), member("u1", "Alice", true)],
            })
            .await
            .unwrap();
        assert_eq!(created.members.len(), 2);

        let team = service.get_team("payments").await.unwrap();
        assert_eq!(team.members[0], member("u1", "Alice", true));
        assert_eq!(team.members[1], member("u2", "Bob", false));
    }

    #[tokio::test]
    async fn test_empty_member_list_rejected() {
        let (_dir, service) = service().await;

        let err = service
            .create_team(CreateTeamInput {
                team_name: "solo".into(),
                members: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: Some(ref f), .. } if f == "members"));

        let err = service.get_team("solo").await.unwrap_err();
        assert!(matches!(err, AppError::TeamNotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_team_rejected() {
        let (_dir, service) = service().await;
        let input = CreateTeamInput {
            team_name: "payments".into(),
            members: vec![member("u1", "Alice", true)],
        };

        service.create_team(input.clone()).await.unwrap();
        let err = service.create_team(input).await.unwrap_err();
        assert!(matches!(err, AppError::TeamExists { .. }));
    }

    #[tokio::test]
    async fn test_failed_member_rolls_back_team() {
        let (_dir, service) = service().await;

        let err = service
            .create_team(CreateTeamInput {
                team_name: "payments".into(),
                members: vec![member("u1", "Alice", true), member("u1", "Alice again", true)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserAlreadyExists { .. }));

        let err = service.get_team("payments").await.unwrap_err();
        assert!(matches!(err, AppError::TeamNotFound { .. }));
    }

    #[tokio::test]
    async fn test_validation() {
        let (_dir, service) = service().await;

        let err = service.get_team("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));

        let err = service
            .create_team(CreateTeamInput {
                team_name: "payments".into(),
                members: vec![member("", "Nobody", true)],
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidInput { field: Some(ref f), .. } if f == "members[0].user_id")
        );
    }
}
