use std::time::Duration;

use axum::{Router, routing::post};
use http::{HeaderValue, Method, header};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, state::AppState};

/// Builds the application router.
pub fn build(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(86400));

    let user_routes = Router::new()
        .route("/api/users/list", post(handlers::users::list_users))
        .route("/api/users/edit", post(handlers::users::edit_user))
        .route("/api/users/lock", post(handlers::users::set_lock));

    let apikey_routes = Router::new()
        .route("/api/apikeys/issue", post(handlers::apikeys::issue))
        .route("/api/apikeys/verify", post(handlers::apikeys::verify));

    let access_routes = Router::new()
        .route("/api/access/check", post(handlers::access::check_access))
        .route("/api/access/limit", post(handlers::access::check_limit));

    Router::new()
        .merge(user_routes)
        .merge(apikey_routes)
        .merge(access_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors)
        .with_state(state)
}
