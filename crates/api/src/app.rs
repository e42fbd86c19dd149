use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::ProcessCallbacks;
use persistence::repositories::{SubmissionRepository, TemplateRepository};
use persistence::SubmissionStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, processes, templates, validate};
use crate::services::{SessionRegistry, TemplateCatalog};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub catalog: TemplateCatalog,
    pub submissions: SubmissionRepository,
    pub callbacks: Arc<dyn ProcessCallbacks>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// State whose process callbacks write to the database.
    pub fn new(config: Config, pool: PgPool) -> Self {
        let store = SubmissionStore::new(SubmissionRepository::new(pool.clone()));
        Self::with_callbacks(config, pool, Arc::new(store))
    }

    pub fn with_callbacks(
        config: Config,
        pool: PgPool,
        callbacks: Arc<dyn ProcessCallbacks>,
    ) -> Self {
        Self {
            catalog: TemplateCatalog::new(TemplateRepository::new(pool.clone())),
            submissions: SubmissionRepository::new(pool.clone()),
            sessions: SessionRegistry::new(config.limits.max_live_sessions),
            config: Arc::new(config),
            callbacks,
            pool,
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    router(AppState::new(config, pool))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
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
    };

    let template_routes = Router::new()
        .route(
            "/api/v1/templates",
            post(templates::create_template).get(templates::list_templates),
        )
        .route(
            "/api/v1/templates/:template_id",
            get(templates::get_template),
        )
        .route(
            "/api/v1/templates/:template_id/submissions",
            get(templates::list_submissions),
        )
        .route(
            "/api/v1/templates/:template_id/processes",
            post(templates::start_process),
        );

    let process_routes = Router::new()
        .route(
            "/api/v1/processes/:instance_id",
            get(processes::get_process).delete(processes::cancel_process),
        )
        .route(
            "/api/v1/processes/:instance_id/form",
            get(processes::get_form),
        )
        .route(
            "/api/v1/processes/:instance_id/history",
            get(processes::get_history),
        )
        .route(
            "/api/v1/processes/:instance_id/fields/:field_id",
            put(processes::set_field),
        )
        .route(
            "/api/v1/processes/:instance_id/inputs/:field_id",
            post(processes::submit_input),
        )
        .route(
            "/api/v1/processes/:instance_id/transitions/:transition_id",
            post(processes::apply_transition),
        )
        .route(
            "/api/v1/processes/:instance_id/validate",
            post(processes::validate_process),
        )
        .route(
            "/api/v1/processes/:instance_id/draft",
            post(processes::save_draft),
        )
        .route(
            "/api/v1/processes/:instance_id/submit",
            post(processes::submit_process),
        )
        .route(
            "/api/v1/processes/:instance_id/reset",
            post(processes::reset_process),
        )
        .route("/api/v1/validate", post(validate::validate_submission));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(template_routes)
        .merge(process_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
