use deadpool_postgres::Pool;
use tokio_postgres::{Row, error::SqlState};

use crate::{
    error::{AppError, Result},
    models::user::{User, UserUpdate},
};

/// Reported when an edit would give two users the same email.
pub const EMAIL_IN_USE: &str = "email already in use";

const USER_COLUMNS: &str = "user_id, full_name, email, is_active, user_role, email_verified, \
                            created_on, last_login_try, last_login_success";

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    let column = |col: &'static str| {
        move |e: tokio_postgres::Error| {
            AppError::Internal(format!("users row column {} unreadable: {}", col, e))
        }
    };
    Ok(User {
        user_id: row.try_get("user_id").map_err(column("user_id"))?,
        full_name: row.try_get("full_name").map_err(column("full_name"))?,
        email: row.try_get("email").map_err(column("email"))?,
        is_active: row.try_get("is_active").map_err(column("is_active"))?,
        user_role: row.try_get("user_role").map_err(column("user_role"))?,
        email_verified: row.try_get("email_verified").map_err(column("email_verified"))?,
        created_on: row.try_get("created_on").map_err(column("created_on"))?,
        last_login_try: row.try_get("last_login_try").map_err(column("last_login_try"))?,
        last_login_success: row
            .try_get("last_login_success")
            .map_err(column("last_login_success"))?,
    })
}

/// Finds users, ascending by id. With `Some(id)` returns zero or one row.
pub async fn find_users(pool: &Pool, user_id: Option<i64>) -> Result<Vec<User>> {
    let client = pool.get().await?;
    let rows = match user_id {
        Some(id) => {
            client
                .query(
                    &format!(
                        "SELECT {} FROM users WHERE user_id = $1 ORDER BY user_id ASC",
                        USER_COLUMNS
                    ),
                    &[&id],
                )
                .await?
        }
        None => {
            client
                .query(
                    &format!("SELECT {} FROM users ORDER BY user_id ASC", USER_COLUMNS),
                    &[],
                )
                .await?
        }
    };
    rows.iter().map(row_to_user).collect()
}

/// Applies `changes` to one user row and returns the fresh row.
///
/// The row lock, the update and the re-select share one transaction, so
/// concurrent edits of the same user serialize while edits of different users
/// never contend. Returns `Ok(None)` when the user does not exist.
pub async fn update_user(pool: &Pool, user_id: i64, changes: &UserUpdate) -> Result<Option<User>> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let current = tx
        .query_opt("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE", &[&user_id])
        .await?;

    if current.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    tx.execute(
        r#"
        UPDATE users
        SET
            full_name = COALESCE($2, full_name),
            email = COALESCE($3, email),
            is_active = COALESCE($4, is_active),
            user_role = COALESCE($5, user_role),
            email_verified = COALESCE($6, email_verified),
            last_updated = NOW()
        WHERE user_id = $1
        "#,
        &[
            &user_id,
            &changes.full_name,
            &changes.email,
            &changes.is_active,
            &changes.user_role,
            &changes.email_verified,
        ],
    )
    .await
    .map_err(|e| {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            AppError::Validation(EMAIL_IN_USE.to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    let row = tx
        .query_opt(
            &format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS),
            &[&user_id],
        )
        .await?;

    let user = row.map(|r| row_to_user(&r)).transpose()?;
    tx.commit().await?;

    Ok(user)
}
