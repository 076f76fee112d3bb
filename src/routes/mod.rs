pub mod catalog;
pub mod products;
pub mod promotions;
pub mod store;
pub mod users;

use axum::{middleware, Router};

use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

/// Public storefront API under `/v1`, back office under `/admin`.
pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .merge(catalog::routes(state))
        .merge(products::routes())
        .merge(promotions::routes(state))
        .merge(store::routes())
        .merge(users::routes(state));

    // Layers run bottom-up: authenticate first, then check the role.
    let admin = Router::new()
        .merge(catalog::admin_routes())
        .merge(products::admin_routes())
        .merge(promotions::admin_routes())
        .merge(store::admin_routes())
        .merge(users::admin_routes())
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().nest("/v1", public).nest("/admin", admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::auth::jwt::sign_token;
    use crate::config::Config;

    // The pool never connects; every request here is answered before a query runs.
    fn app() -> Router {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        let state = AppState::new(pool, config);
        create_router(&state).with_state(state)
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn list_rejects_limit_above_fifty() {
        let (status, body) = send(get("/v1/games/list?limit=100")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["errors"]["limit"].is_array());
    }

    #[tokio::test]
    async fn search_rejects_unknown_sort_and_order() {
        let (status, body) = send(get("/v1/games/search?sort=price&order=up")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["sort"].is_array());
        assert!(body["errors"]["order"].is_array());
    }

    #[tokio::test]
    async fn suggestions_need_two_characters() {
        let (status, body) = send(get("/v1/games/search/suggestions?q=m")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["q"].is_array());
    }

    #[tokio::test]
    async fn vouchers_reject_negative_amount() {
        let (status, body) = send(get("/v1/vouchers?amount=-5")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["amount"].is_array());
    }

    #[tokio::test]
    async fn me_requires_token() {
        let (status, _) = send(get("/v1/auth/me")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_requires_token() {
        let (status, body) = send(get("/admin/games")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn admin_rejects_bad_token() {
        let (status, _) = send(get_with_token("/admin/roles", "not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_rejects_non_admin_role() {
        let token = sign_token(7, Some("gold"), "budi", "test-secret").unwrap();
        let (status, body) = send(get_with_token("/admin/transactions", &token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");
    }

    #[tokio::test]
    async fn admin_token_passes_guards() {
        let token = sign_token(1, Some("admin"), "root", "test-secret").unwrap();
        let (status, body) = send(get_with_token("/admin/transactions?status=refunded", &token)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["status"].is_array());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = send(get("/v1/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
