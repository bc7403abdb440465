//! HTTP API surface, §6: the update-feed (`/hostdb/updates*`) and query
//! endpoints (`/hostdb/hosts`, `/hostdb/host`, `/hostdb/scans`,
//! `/hostdb/benchmarks`). Every endpoint requires HTTP basic auth.

pub mod auth;
pub mod errors;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use state::AppState;

use axum::middleware;
use axum::routing::get;
use axum::Router;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/hostdb/updates", get(routes::get_updates))
        .route("/hostdb/updates/confirm", get(routes::confirm_update))
        .route("/hostdb/hosts", get(routes::get_hosts))
        .route("/hostdb/host", get(routes::get_host))
        .route("/hostdb/scans", get(routes::get_scans))
        .route("/hostdb/benchmarks", get(routes::get_benchmarks))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_basic_auth))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use hsd_journal::Journal;
    use hsd_store::{Blocklist, HostStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let journal = Arc::new(Journal::default());
        let blocklist = Arc::new(Blocklist::default());
        let store = Arc::new(HostStore::open(pool, journal.clone(), blocklist, &[]).await.unwrap());
        AppState { store, journal, api_password: Arc::from("s3cret") }
    }

    fn basic_auth_header(password: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("hsd:{password}")))
    }

    #[tokio::test]
    async fn missing_auth_is_401() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri("/hostdb/updates").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/hostdb/updates")
                    .header(header::AUTHORIZATION, basic_auth_header("nope"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_updates_is_valid_200() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/hostdb/updates")
                    .header(header::AUTHORIZATION, basic_auth_header("s3cret"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_network_is_400() {
        let app = build_router(test_state().await);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/hostdb/hosts?network=bogus")
                    .header(header::AUTHORIZATION, basic_auth_header("s3cret"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
