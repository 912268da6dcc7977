use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKeys;
use crate::authz::{AuthzEngine, ResourceKind};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_tenant_middleware, validate_user_middleware};
use crate::services::Services;

/// Shared request state: the engine, storage, token keys and the services
/// built over them.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuthzEngine>,
    pub store: Store,
    pub keys: JwtKeys,
    pub services: Services,
}

impl AppState {
    pub fn new(engine: Arc<AuthzEngine>, store: Store, keys: JwtKeys) -> Self {
        let services = Services::new(engine.clone(), store.clone(), keys.clone());
        Self { engine, store, keys, services }
    }

    /// Loads the hierarchy, connects storage and checks the token secret.
    /// Any failure here is fatal at startup.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let registry = config.load_hierarchy().context("loading resource hierarchy")?;
        let engine = AuthzEngine::new(registry);
        engine
            .ensure_kinds(&[ResourceKind::SCHOOL, ResourceKind::CLASSROOM, ResourceKind::STUDENT])
            .context("validating resource hierarchy")?;

        if config.security.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must be set in {:?}", config.environment);
        }

        let store = Store::connect(&config.database).await.context("connecting storage")?;
        Ok(Self::new(Arc::new(engine), store, JwtKeys::from_config(&config.security)))
    }

    /// Seeds the initial superadmin when enabled.
    pub async fn seed(&self, config: &AppConfig) -> anyhow::Result<()> {
        if !config.seed.enabled {
            return Ok(());
        }
        self.services
            .users
            .seed_superadmin(&config.seed)
            .await
            .context("seeding superadmin")?;
        Ok(())
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::auth::login_post))
        // Protected API
        .merge(protected_routes(state.clone()))
        .with_state(state)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        );

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, classrooms, schools, students, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/users", post(users::post))
        .route("/api/schools", get(schools::collection_get).post(schools::collection_post))
        .route(
            "/api/schools/:id",
            get(schools::record_get).put(schools::record_put).delete(schools::record_delete),
        )
        .route("/api/classrooms", get(classrooms::collection_get).post(classrooms::collection_post))
        .route(
            "/api/classrooms/:id",
            get(classrooms::record_get)
                .put(classrooms::record_put)
                .delete(classrooms::record_delete),
        )
        .route("/api/students", get(students::collection_get).post(students::collection_post))
        .route(
            "/api/students/:id",
            get(students::record_get).put(students::record_put).delete(students::record_delete),
        )
        .route("/api/students/:id/transfer", put(students::record_transfer))
        // Runs bottom-up: token, then account, then school
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_tenant_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Binds the configured port and serves until ctrl-c.
pub async fn serve(state: AppState, config: &AppConfig) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("School API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
