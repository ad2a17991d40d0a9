use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
///
/// Authorization and policy failures are terminal for the request. Only the
/// store variants are candidates for a caller-side retry.
#[derive(Error, Debug)]
pub enum AppError {
    /// A PostgreSQL error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Failed to check a connection out of the pool.
    #[error("Database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Failed to build the connection pool.
    #[error("Database pool creation error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A missing or malformed request field. Never reaches the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The target is one of the reserved system accounts.
    #[error("Editing anonymous/locked user accounts not allowed")]
    ForbiddenTarget,

    /// The actor may not perform this operation on this target.
    #[error("Authorization failed")]
    Unauthorized,

    /// No live session bound to the claimed actor and role.
    #[error("Session invalid")]
    SessionInvalid,

    /// The session does not match the client fingerprint in the request.
    #[error("Session mismatch")]
    SessionMismatch,

    /// A requested field is outside the editable set for this actor.
    #[error("Field not editable: {0}")]
    FieldNotEditable(String),

    /// A role change to a value that cannot be assigned.
    #[error("Invalid role value: {0}")]
    InvalidRoleValue(String),

    /// The target user or key is absent.
    #[error("Resource not found")]
    NotFound,

    /// A sealing or unsealing error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether this is a collaborator failure rather than a caller mistake.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Pool(_) | AppError::CreatePool(_) | AppError::Redis(_)
        )
    }

    /// The status code and caller-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::CreatePool(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Redis(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session store error".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ForbiddenTarget => (
                StatusCode::FORBIDDEN,
                "Editing anonymous/locked user accounts not allowed.".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "user_id or session info not available for this request.".to_string(),
            ),
            AppError::SessionInvalid => (
                StatusCode::UNAUTHORIZED,
                "User session info not available for this request.".to_string(),
            ),
            AppError::SessionMismatch => (
                StatusCode::UNAUTHORIZED,
                "Session user_id, ip_address, user_agent, user_role \
                 does not match provided session info."
                    .to_string(),
            ),
            AppError::FieldNotEditable(field) => (
                StatusCode::FORBIDDEN,
                format!("Field '{}' is not editable for this request.", field),
            ),
            AppError::InvalidRoleValue(role) => (
                StatusCode::BAD_REQUEST,
                format!("Unknown role change request: '{}'.", role),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found.".to_string()),
            AppError::Encryption(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Encryption error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Pool(e) => tracing::error!("Database pool error: {}", e),
            AppError::CreatePool(e) => tracing::error!("Database pool creation error: {}", e),
            AppError::Redis(e) => tracing::error!("Redis error: {}", e),
            AppError::Encryption(msg) => tracing::error!("Encryption error: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::ForbiddenTarget
            | AppError::Unauthorized
            | AppError::SessionInvalid
            | AppError::SessionMismatch
            | AppError::FieldNotEditable(_)
            | AppError::InvalidRoleValue(_) => tracing::warn!("Request denied: {}", self),
            AppError::NotFound => tracing::debug!("Resource not found"),
            AppError::Validation(msg) => tracing::debug!("Validation error: {}", msg),
        }

        let (status, message) = self.status_and_message();

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "success": false,
            "data": null,
            "messages": [message]
        }))
        .unwrap_or_else(|_| {
            r#"{"success":false,"data":null,"messages":["Internal server error"]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
