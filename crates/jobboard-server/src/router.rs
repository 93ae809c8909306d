use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::probes::{healthz, livez};
use crate::handlers::{auth, categories, companies, describe, job_types, jobs, media, users};
use crate::middlewares::authn;
use crate::state::AppState;

/// Builds the full application router.
///
/// Reads are public. Every mutating method goes through
/// [`authn::authenticate`], which admits admins and super-admins only.
pub fn build_routes(state: AppState) -> Router {
    let guard = || from_fn_with_state(state.clone(), authn::authenticate);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/jobs",
            get(jobs::list).merge(post(jobs::create).route_layer(guard())),
        )
        .route(
            "/jobs/{id}",
            get(jobs::get).merge(
                put(jobs::update)
                    .delete(jobs::delete)
                    .route_layer(guard()),
            ),
        )
        .route(
            "/categories",
            get(categories::list).merge(post(categories::create).route_layer(guard())),
        )
        .route(
            "/categories/{id}",
            get(categories::get).merge(
                put(categories::update)
                    .delete(categories::delete)
                    .route_layer(guard()),
            ),
        )
        .route(
            "/companies",
            get(companies::list).merge(post(companies::create).route_layer(guard())),
        )
        .route(
            "/companies/{id}",
            get(companies::get).merge(
                put(companies::update)
                    .delete(companies::delete)
                    .route_layer(guard()),
            ),
        )
        .route(
            "/types",
            get(job_types::list).merge(post(job_types::create).route_layer(guard())),
        )
        .route(
            "/types/{id}",
            get(job_types::get).merge(
                put(job_types::update)
                    .delete(job_types::delete)
                    .route_layer(guard()),
            ),
        )
        .route("/users", get(users::list))
        .route(
            "/users/{id}",
            get(users::get).merge(put(users::update).route_layer(guard())),
        )
        .route(
            "/users/{id}/terminate",
            patch(users::terminate).route_layer(guard()),
        )
        .route(
            "/media",
            get(media::list).merge(post(media::create).route_layer(guard())),
        )
        .route(
            "/media/{id}",
            get(media::get).merge(delete(media::delete).route_layer(guard())),
        )
        .route(
            "/generate-description",
            post(describe::generate).route_layer(guard()),
        );

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use jobboard_core::config::Settings;
    use jobboard_core::describe::DisabledGenerator;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://jobboard@localhost/jobboard")
            .unwrap();
        let state = AppState::new(
            pool,
            Arc::new(DisabledGenerator),
            "test-secret",
            &Settings::default(),
        );
        build_routes(state)
    }

    async fn error_message(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_livez() {
        let response = app()
            .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mutation_without_token_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/jobs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Backend engineer"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(error_message(response).await.contains("missing bearer token"));
    }

    #[tokio::test]
    async fn test_malformed_and_forged_tokens_are_rejected() {
        for value in ["Token abc", "Bearer not-a-jwt"] {
            let request = Request::builder()
                .method(Method::DELETE)
                .uri("/api/categories/00000000-0000-0000-0000-000000000001")
                .header(header::AUTHORIZATION, value)
                .body(Body::empty())
                .unwrap();

            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        }
    }

    #[tokio::test]
    async fn test_terminate_requires_token() {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/users/00000000-0000-0000-0000-000000000001/terminate")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    fn json_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_json_error() {
        let response = app()
            .oneshot(json_post("/api/auth/register", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!error_message(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_a_json_error() {
        let response = app()
            .oneshot(json_post("/api/auth/login", r#"{"email":5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!error_message(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_json_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .body(Body::from(r#"{"email":"ada@example.com"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!error_message(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_is_a_json_error() {
        for uri in ["/api/jobs/not-a-uuid", "/api/users/42", "/api/media/abc"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(!error_message(response).await.is_empty(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::PATCH)
                    .uri("/api/jobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
