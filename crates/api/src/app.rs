use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::GroupService;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_internal_secret, trace_id};
use crate::routes::{groups, health, internal, invites, membership};
use crate::services::SessionValidator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub groups: GroupService,
    pub auth: Arc<dyn SessionValidator>,
    /// Present when storage is PostgreSQL; used for pool gauges.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(config: Config, groups: GroupService, auth: Arc<dyn SessionValidator>) -> Self {
        Self {
            config: Arc::new(config),
            groups,
            auth,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Session auth is enforced by the UserAuth extractor in each handler
    let group_routes = Router::new()
        .route("/group/group", post(groups::create_group))
        .route(
            "/group/group/:group_id",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/group/list", get(groups::list_groups))
        .route(
            "/group/membership",
            post(membership::change_role).delete(membership::expel_user),
        )
        .route(
            "/group/membership/:group_id",
            get(membership::list_members).put(membership::invite_users),
        )
        .route("/group/invite", delete(invites::remove_invite_links))
        .route("/group/invite/list", get(invites::list_invite_links))
        .route(
            "/group/invite/resolve",
            get(invites::resolve_link_query).post(invites::resolve_link),
        )
        .route("/group/invite/:group_id", put(invites::add_invite_link));

    let internal_routes = Router::new()
        .route("/internal/group/list", get(internal::list_groups))
        .route("/internal/group/permission", get(internal::user_role))
        .route(
            "/internal/group/check-permission",
            get(internal::check_permission),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_internal_secret,
        ));

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(group_routes)
        .merge(internal_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
