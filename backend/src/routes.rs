use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware, state::AppState};

pub const API_PREFIX: &str = "/api/wx/v1";

fn api_routes() -> Router<AppState> {
    let robots = Router::new()
        .route(
            "/",
            get(handlers::robots::list_robots).post(handlers::robots::create_robot),
        )
        .route(
            "/{id}",
            get(handlers::robots::get_robot).put(handlers::robots::update_robot),
        )
        .route("/{id}/health", get(handlers::robots::robot_health));

    let users = Router::new()
        .route("/robot/{robot_id}", get(handlers::users::list_by_robot))
        .route("/authorize", post(handlers::users::authorize))
        .route("/qrcode", post(handlers::users::qr_code))
        .route("/status/{robot_id}/{token}", get(handlers::users::scan_status))
        .route("/save", post(handlers::users::save))
        .route("/{id}", delete(handlers::users::delete_session))
        .route("/login-status/{id}", get(handlers::users::login_status))
        .route(
            "/message-bot-status/{id}",
            post(handlers::users::set_message_bot),
        );

    let messages = Router::new()
        .route("/send-text", post(handlers::messages::send_text))
        .route("/send-image", post(handlers::messages::send_image))
        .route(
            "/send-text-image",
            post(handlers::messages::send_text_and_image),
        )
        .route("/set-strategy", post(handlers::messages::set_strategy));

    Router::new()
        .nest("/robots", robots)
        .nest("/users", users)
        .route("/auth/extend/{robot_id}", post(handlers::auth::extend))
        .nest("/messages/group", messages)
        .route("/groups/user/{wx_id}", get(handlers::groups::list_by_wx_id))
        .route("/groups/search", get(handlers::groups::search))
        .route("/bills/stats", get(handlers::bills::stats))
        .route("/bills/list", get(handlers::bills::list))
}

/// The full HTTP surface: health at the root, the API under [`API_PREFIX`]
/// and, when enabled, Swagger UI.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health::health))
        .nest(API_PREFIX, api_routes());

    if state.config.swagger_enabled {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(axum_middleware::from_fn(middleware::request_id))
            .layer(TraceLayer::new_for_http())
            .layer(axum_middleware::from_fn(middleware::log_error_responses))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers(Any)
                    .max_age(Duration::from_secs(24 * 60 * 60)),
            ),
    )
    .with_state(state)
}
