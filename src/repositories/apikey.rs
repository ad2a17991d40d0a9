use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::apikey::ApiKeyRecord,
};

fn row_to_apikey(row: &Row) -> Result<ApiKeyRecord> {
    let column = |col: &'static str| {
        move |e: tokio_postgres::Error| {
            AppError::Internal(format!("apikeys row column {} unreadable: {}", col, e))
        }
    };
    Ok(ApiKeyRecord {
        apikey: row.try_get("apikey").map_err(column("apikey"))?,
        issued: row.try_get("issued").map_err(column("issued"))?,
        expires: row.try_get("expires").map_err(column("expires"))?,
        not_valid_before: row
            .try_get("not_valid_before")
            .map_err(column("not_valid_before"))?,
        user_id: row.try_get("user_id").map_err(column("user_id"))?,
        user_role: row.try_get("user_role").map_err(column("user_role"))?,
        session_token: row.try_get("session_token").map_err(column("session_token"))?,
    })
}

/// Persists a freshly minted API key.
pub async fn insert_apikey(pool: &Pool, record: &ApiKeyRecord) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO apikeys
                (apikey, issued, expires, not_valid_before, user_id, user_role, session_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &record.apikey,
                &record.issued,
                &record.expires,
                &record.not_valid_before,
                &record.user_id,
                &record.user_role,
                &record.session_token,
            ],
        )
        .await?;
    Ok(())
}

/// Finds the stored record for a random token.
pub async fn find_apikey(pool: &Pool, apikey: &str) -> Result<Option<ApiKeyRecord>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT apikey, issued, expires, not_valid_before, user_id, user_role, session_token
            FROM apikeys
            WHERE apikey = $1
            "#,
            &[&apikey],
        )
        .await?;
    row.map(|r| row_to_apikey(&r)).transpose()
}
