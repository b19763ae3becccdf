//! Pull request store, including the PR <-> reviewer relation.

use super::{store_error, violated_constraint, Constraint};
use crate::error::AppError;
use crate::models::{PrStatus, PullRequest, PullRequestRow, PullRequestShort};
use sqlx::SqliteConnection;

/// Insert a pull request row (without reviewers).
///
/// A taken id surfaces as `PrAlreadyExists`, an unknown author as
/// `UserNotFound`.
pub async fn create(conn: &mut SqliteConnection, pr: &PullRequestRow) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pr.id)
    .bind(&pr.name)
    .bind(&pr.author_id)
    .bind(&pr.status)
    .bind(pr.created_at)
    .bind(pr.merged_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match violated_constraint(&e) {
        Some(Constraint::Unique) => AppError::pr_already_exists(&pr.id),
        Some(Constraint::ForeignKey) => AppError::user_not_found(&pr.author_id),
        Some(Constraint::Check) => {
            AppError::invalid_input(format!("pull request {:?} violates a field constraint", pr.id))
        }
        None => store_error(e, "create pull request"),
    })?;

    log::debug!("Inserted pull request {} by {}", pr.id, pr.author_id);
    Ok(())
}

async fn get_row(
    conn: &mut SqliteConnection,
    pr_id: &str,
) -> Result<Option<PullRequestRow>, AppError> {
    sqlx::query_as::<_, PullRequestRow>(
        r#"
        SELECT id, name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE id = ?
        "#,
    )
    .bind(pr_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| store_error(e, "get pull request"))
}

/// Load a pull request with its reviewers.
pub async fn get_by_id(conn: &mut SqliteConnection, pr_id: &str) -> Result<PullRequest, AppError> {
    let row = get_row(conn, pr_id)
        .await?
        .ok_or_else(|| AppError::pr_not_found(pr_id))?;

    let reviewers = reviewers(conn, pr_id).await?;
    Ok(row.into_pull_request(reviewers))
}

/// Reviewer ids of a pull request in assignment order.
pub async fn reviewers(conn: &mut SqliteConnection, pr_id: &str) -> Result<Vec<String>, AppError> {
    sqlx::query_scalar::<_, String>(
        "SELECT reviewer_id FROM pr_reviewers WHERE pr_id = ? ORDER BY seq",
    )
    .bind(pr_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| store_error(e, "get reviewers"))
}

/// Transition an open pull request to merged, stamping `merged_at`.
///
/// The update only matches open rows, so a concurrent merge that got there
/// first yields `PrMerged` instead of a second timestamp.
pub async fn merge(
    conn: &mut SqliteConnection,
    pr_id: &str,
    merged_at: i64,
) -> Result<PullRequest, AppError> {
    let result = sqlx::query(
        "UPDATE pull_requests SET status = ?, merged_at = ? WHERE id = ? AND status = ?",
    )
    .bind(PrStatus::Merged.as_str())
    .bind(merged_at)
    .bind(pr_id)
    .bind(PrStatus::Open.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| store_error(e, "merge pull request"))?;

    if result.rows_affected() == 0 {
        return match get_row(conn, pr_id).await? {
            Some(_) => Err(AppError::pr_merged(pr_id)),
            None => Err(AppError::pr_not_found(pr_id)),
        };
    }

    get_by_id(conn, pr_id).await
}

/// Add a reviewer edge.
///
/// The `(pr_id, reviewer_id)` uniqueness constraint is what rejects a second
/// assignment of the same user.
pub async fn add_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer_id: &str,
    assigned_at: i64,
) -> Result<(), AppError> {
    let inserted =
        sqlx::query("INSERT INTO pr_reviewers (pr_id, reviewer_id, assigned_at) VALUES (?, ?, ?)")
            .bind(pr_id)
            .bind(reviewer_id)
            .bind(assigned_at)
            .execute(&mut *conn)
            .await;

    if let Err(e) = inserted {
        return Err(match violated_constraint(&e) {
            Some(Constraint::Unique) => AppError::reviewer_already_assigned(pr_id, reviewer_id),
            // Either side of the edge may be missing.
            Some(Constraint::ForeignKey) => match get_row(conn, pr_id).await? {
                Some(_) => AppError::user_not_found(reviewer_id),
                None => AppError::pr_not_found(pr_id),
            },
            _ => store_error(e, "add reviewer"),
        });
    }

    log::debug!("Assigned reviewer {} to {}", reviewer_id, pr_id);
    Ok(())
}

/// Remove a reviewer edge.
pub async fn remove_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer_id: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND reviewer_id = ?")
        .bind(pr_id)
        .bind(reviewer_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| store_error(e, "remove reviewer"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::reviewer_not_assigned(pr_id, reviewer_id));
    }

    log::debug!("Removed reviewer {} from {}", reviewer_id, pr_id);
    Ok(())
}

/// Pull requests the user currently reviews, newest first.
pub async fn get_by_reviewer(
    conn: &mut SqliteConnection,
    reviewer_id: &str,
) -> Result<Vec<PullRequestShort>, AppError> {
    let rows = sqlx::query_as::<_, PullRequestRow>(
        r#"
        SELECT pr.id, pr.name, pr.author_id, pr.status, pr.created_at, pr.merged_at
        FROM pull_requests pr
        INNER JOIN pr_reviewers prr ON prr.pr_id = pr.id
        WHERE prr.reviewer_id = ?
        ORDER BY pr.created_at DESC, pr.id
        "#,
    )
    .bind(reviewer_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| store_error(e, "get pull requests by reviewer"))?;

    Ok(rows.into_iter().map(PullRequestRow::into_short).collect())
}
