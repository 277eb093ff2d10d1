// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{leaderboard, profile, session, topics},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (topics, session, profile, leaderboard).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, provider, live sessions).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Generation hits the AI provider; keep it rate limited per client.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let topic_routes = Router::new()
        .route("/", get(topics::list_topics))
        .route("/{topic_id}/lessons", get(topics::list_lessons))
        .route("/{topic_id}/lessons/{lesson_id}", get(topics::get_lesson))
        .merge(
            Router::new()
                .route("/{topic_id}/lessons/generate", post(topics::generate_lesson))
                .layer(GovernorLayer::new(governor_conf))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let session_routes = Router::new()
        .route(
            "/",
            get(session::session_state).delete(session::abandon_session),
        )
        .route("/start", post(session::start_session))
        .route("/answer", post(session::submit_answer))
        .route("/advance", post(session::advance))
        .route("/finish", post(session::finish_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let me_routes = Router::new()
        .route("/", post(profile::create_profile).get(profile::get_me))
        .route("/streak", post(profile::check_streak))
        .route("/streak-freeze", post(profile::purchase_streak_freeze))
        .route("/hearts/regen", post(profile::regen_hearts))
        .route("/achievements", get(profile::list_achievements))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let leaderboard_routes =
        Router::new().route("/{period}", get(leaderboard::get_leaderboard));

    let challenge_routes = Router::new()
        .route("/", get(leaderboard::get_daily_challenge))
        .merge(
            Router::new()
                .route("/complete", post(leaderboard::complete_daily_challenge))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .nest("/api/topics", topic_routes)
        .nest("/api/session", session_routes)
        .nest("/api/me", me_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        .nest("/api/daily-challenge", challenge_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
