//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method},
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::http::accounts::{
    create_employee_handler, delete_account_handler, get_account_by_username_handler,
    get_account_handler, get_group_admin_handler, get_group_employee_handler,
    get_group_manager_handler, get_group_user_handler, heartbeat_handler, login_handler,
    promote_to_admin_handler, promote_to_manager_handler, update_account_handler,
};
use crate::http::middleware::{require_account, require_admin, require_management, require_staff};
use crate::http::shop::{
    create_category_handler, create_item_handler, create_stock_handler, create_store_handler,
    delete_category_handler, delete_item_handler, delete_stock_handler, delete_store_handler,
    edit_stock_handler, get_categories_handler, get_item_handler, get_items_handler,
    get_store_handler, get_stores_handler, update_category_handler, update_item_handler,
    update_store_handler,
};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in
    // CLIENT_ORIGIN), or the "*" wildcard without credentials
    let cors = if state.config.client_origin.trim() == "*" {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_credentials(true)
    }
    .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(banner_handler))
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/item", get(get_items_handler))
        .route("/item/:id", get(get_item_handler))
        .route("/store", get(get_stores_handler))
        .route("/store/:id", get(get_store_handler))
        .route("/category", get(get_categories_handler));

    // Any authenticated account
    let account_routes = Router::new()
        .route("/heartbeat", get(heartbeat_handler))
        .route("/account", get(get_account_handler))
        .route("/account/:username", put(update_account_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_account));

    // Employees and above
    let staff_routes = Router::new()
        .route("/employee", get(get_group_employee_handler))
        .route("/item", post(create_item_handler))
        .route("/item/:id", put(update_item_handler).delete(delete_item_handler))
        .route("/stock", post(create_stock_handler).put(edit_stock_handler))
        .route("/stock/:store/:item", delete(delete_stock_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_staff));

    // Managers and admins
    let management_routes = Router::new()
        .route(
            "/employee",
            post(create_employee_handler).delete(delete_account_handler),
        )
        .route(
            "/manager",
            get(get_group_manager_handler).delete(delete_account_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_management,
        ));

    // Admin only
    let admin_routes = Router::new()
        .route("/account/:username", get(get_account_by_username_handler))
        .route("/user", get(get_group_user_handler))
        .route("/manager", post(promote_to_manager_handler))
        .route(
            "/admin",
            get(get_group_admin_handler)
                .post(promote_to_admin_handler)
                .delete(delete_account_handler),
        )
        .route("/store", post(create_store_handler).put(update_store_handler))
        .route("/store/:id", delete(delete_store_handler))
        .route(
            "/category",
            post(create_category_handler).put(update_category_handler),
        )
        .route("/category/:id", delete(delete_category_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(staff_routes)
        .merge(management_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Banner and health endpoints
// ============================================================================

#[derive(Serialize)]
struct BannerResponse {
    message: &'static str,
}

async fn banner_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "smartshopper gateway",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

async fn health_handler(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
    })
}
