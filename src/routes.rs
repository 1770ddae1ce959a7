// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{admin, auth, profile, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Merges the auth, quiz and admin sub-routers under `/api/v1`.
/// * Protected routes pass through `auth_middleware`; admin routes also
///   through `admin_middleware`.
/// * Applies global middleware (Trace, CORS) and injects `AppState`.
pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/token/refresh/", post(auth::refresh_token))
        // Protected auth routes
        .merge(
            Router::new()
                .route(
                    "/profile/",
                    get(profile::get_profile)
                        .put(profile::update_profile)
                        .patch(profile::update_profile),
                )
                .route("/change-password/", put(profile::change_password))
                .layer(require_auth.clone()),
        );

    let quiz_routes = Router::new()
        .route("/questions/", get(quiz::list_questions))
        .route("/questions/{id}/", get(quiz::get_question))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/questions/{id}/submit/", post(quiz::submit_answer))
                .route("/practice-history/", get(quiz::practice_history))
                .layer(require_auth.clone()),
        );

    let admin_routes = Router::new()
        .route("/users/", get(admin::list_users))
        .route(
            "/questions/",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/{id}/", delete(admin::delete_question))
        .route("/practices/", get(admin::list_practices))
        // Auth runs first (outermost), then the staff check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/quiz", quiz_routes)
        .nest("/api/v1/admin", admin_routes)
        .fallback(|| async { AppError::NotFound("Not found".to_string()) })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
