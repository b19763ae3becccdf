//! User store.

use super::{store_error, violated_constraint, Constraint};
use crate::error::AppError;
use crate::models::User;
use sqlx::SqliteConnection;

/// Insert a user row.
///
/// A taken id surfaces as `UserAlreadyExists`, an unknown team as
/// `TeamNotFound`.
pub async fn create(conn: &mut SqliteConnection, user: &User) -> Result<(), AppError> {
    sqlx::query("INSERT INTO users (id, username, team_name, is_active) VALUES (?, ?, ?, ?)")
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.team_name)
        .bind(user.is_active)
        .execute(&mut *conn)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(Constraint::Unique) => AppError::user_already_exists(&user.id),
            Some(Constraint::ForeignKey) => AppError::team_not_found(&user.team_name),
            Some(Constraint::Check) => AppError::invalid_input(format!(
                "user {:?} needs a non-empty id and username",
                user.id
            )),
            None => store_error(e, "create user"),
        })?;

    log::debug!("Inserted user {} into team {}", user.id, user.team_name);
    Ok(())
}

/// Overwrite a user's mutable attributes.
pub async fn update(conn: &mut SqliteConnection, user: &User) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE users SET username = ?, team_name = ?, is_active = ? WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.team_name)
    .bind(user.is_active)
    .bind(&user.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| match violated_constraint(&e) {
        Some(Constraint::ForeignKey) => AppError::team_not_found(&user.team_name),
        Some(Constraint::Check) => AppError::missing_field("username"),
        _ => store_error(e, "update user"),
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::user_not_found(&user.id));
    }

    Ok(())
}

/// Load a user by id.
pub async fn get_by_id(conn: &mut SqliteConnection, user_id: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, team_name, is_active FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| store_error(e, "get user"))?
    .ok_or_else(|| AppError::user_not_found(user_id))
}

/// All users of a team, ordered by username.
pub async fn get_by_team(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<User>, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, team_name, is_active
        FROM users
        WHERE team_name = ?
        ORDER BY username, id
        "#,
    )
    .bind(team_name)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| store_error(e, "get users by team"))
}

/// Set a user's active flag.
pub async fn set_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| store_error(e, "set user active"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::user_not_found(user_id));
    }

    Ok(())
}
