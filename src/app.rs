use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::agent::AgentClient;
use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::handlers;
use crate::limiter::{Clock, FixedWindowLimiter, SystemClock};
use crate::middleware::{
    error_classifier_middleware, jwt_auth_middleware, rate_limit_middleware, require_admin,
    user_rate_limit_middleware,
};
use crate::store::Store;

/// One limiter per route group
#[derive(Clone, Debug)]
pub struct Limiters {
    pub security: Arc<FixedWindowLimiter>,
    pub admin: Arc<FixedWindowLimiter>,
    pub api: Arc<FixedWindowLimiter>,
    pub ai_per_user: Arc<FixedWindowLimiter>,
}

impl Limiters {
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let settings = &config.rate_limit;
        let limiter = |group: &str, quota| {
            Arc::new(FixedWindowLimiter::new(group, quota, settings, clock.clone()))
        };

        Self {
            security: limiter("security", settings.security),
            admin: limiter("admin", settings.admin),
            api: limiter("api", settings.api),
            ai_per_user: limiter("ai_per_user", settings.ai_per_user),
        }
    }
}

/// Services shared by every request, constructed explicitly at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub agents: Arc<AgentClient>,
    pub verifier: Arc<TokenVerifier>,
    pub limiters: Limiters,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn Store>, agents: Arc<AgentClient>) -> Self {
        Self::with_clock(config, store, agents, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        agents: Arc<AgentClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verifier = Arc::new(TokenVerifier::new(
            &config.security.jwt_secret,
            config.security.jwt_leeway_secs,
        ));
        let limiters = Limiters::from_config(&config, clock);

        Self {
            config,
            store,
            agents,
            verifier,
            limiters,
        }
    }
}

/// Full application router.
///
/// Every gated group runs: rate limiter -> token verifier -> (role gate) ->
/// handler, with the error classifier innermost so it sees the caller.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(public_routes(&state))
        .merge(security_routes(&state))
        .merge(settings_routes(&state))
        .merge(ai_routes(&state))
        .fallback(handlers::public::not_found)
        .with_state(state.clone());

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config));
    }
    if state.config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn public_routes(state: &AppState) -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route_layer(from_fn_with_state(state.config.clone(), error_classifier_middleware))
}

fn security_routes(state: &AppState) -> Router<AppState> {
    use handlers::admin::security;

    Router::new()
        .route("/api/admin/security/users", get(security::users_get))
        .route("/api/admin/security/users/:id/role", put(security::user_role_put))
        .route("/api/admin/security/users/:id/suspend", post(security::user_suspend_post))
        .route("/api/admin/security/tokens/inspect", post(security::token_inspect_post))
        .route_layer(from_fn_with_state(state.config.clone(), error_classifier_middleware))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.verifier.clone(), jwt_auth_middleware))
        .route_layer(from_fn_with_state(state.limiters.security.clone(), rate_limit_middleware))
}

fn settings_routes(state: &AppState) -> Router<AppState> {
    use handlers::admin::settings;

    Router::new()
        .route("/api/admin/settings", get(settings::settings_get))
        .route("/api/admin/settings/:key", put(settings::setting_put))
        .route_layer(from_fn_with_state(state.config.clone(), error_classifier_middleware))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.verifier.clone(), jwt_auth_middleware))
        .route_layer(from_fn_with_state(state.limiters.admin.clone(), rate_limit_middleware))
}

fn ai_routes(state: &AppState) -> Router<AppState> {
    use handlers::ai;

    Router::new()
        .route("/api/ai/agents", get(ai::agents_get))
        .route("/api/ai/strategy", post(ai::strategy_post))
        .route("/api/ai/workflows/:workflow_id/steps/:step", post(ai::workflow_step_post))
        .route_layer(from_fn_with_state(state.config.clone(), error_classifier_middleware))
        .route_layer(from_fn_with_state(state.limiters.ai_per_user.clone(), user_rate_limit_middleware))
        .route_layer(from_fn_with_state(state.verifier.clone(), jwt_auth_middleware))
        .route_layer(from_fn_with_state(state.limiters.api.clone(), rate_limit_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
