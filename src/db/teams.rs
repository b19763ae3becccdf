//! Team store.

use super::{store_error, users, violated_constraint, Constraint};
use crate::error::AppError;
use crate::models::Team;
use sqlx::SqliteConnection;

/// Insert a team row.
///
/// The primary key decides whether the name is taken; a duplicate surfaces
/// as `TeamExists`.
pub async fn create(conn: &mut SqliteConnection, team_name: &str) -> Result<(), AppError> {
    sqlx::query("INSERT INTO teams (name) VALUES (?)")
        .bind(team_name)
        .execute(&mut *conn)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(Constraint::Unique) => AppError::team_exists(team_name),
            Some(Constraint::Check) => AppError::missing_field("team_name"),
            _ => store_error(e, "create team"),
        })?;

    log::debug!("Inserted team {}", team_name);
    Ok(())
}

/// Check whether a team exists.
pub async fn exists(conn: &mut SqliteConnection, team_name: &str) -> Result<bool, AppError> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM teams WHERE name = ?")
        .bind(team_name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error(e, "check team existence"))?;

    Ok(found.is_some())
}

/// Load a team with all of its members, ordered by username.
pub async fn get_by_name(conn: &mut SqliteConnection, team_name: &str) -> Result<Team, AppError> {
    if !exists(conn, team_name).await? {
        return Err(AppError::team_not_found(team_name));
    }

    let members = users::get_by_team(conn, team_name).await?;

    log::debug!("Loaded team {} with {} members", team_name, members.len());
    Ok(Team::from_users(team_name, &members))
}
