/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskmanager_api::{app::{build_router, AppState}, config::Config};
/// use taskmanager_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use taskmanager_shared::{
    accessor::TaskAccessor,
    auth::{
        authority::TokenAuthority,
        middleware::resolve_identity,
        token::{RandomTokenGenerator, TokenGenerator},
    },
    store::{TaskStore, UserStore},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};

/// Shared application state
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,

    /// Owner-scoped task operations
    pub tasks: TaskAccessor,

    /// Issues and rotates auth tokens
    pub authority: TokenAuthority,

    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by `store` with cryptographically random tokens
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        Self::with_generator(store, Arc::new(RandomTokenGenerator), config)
    }

    /// State with a custom token source
    pub fn with_generator<S>(
        store: Arc<S>,
        generator: Arc<dyn TokenGenerator>,
        config: Config,
    ) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store;
        let authority = TokenAuthority::new(generator, users.clone(), config.auth.token_length);

        Self {
            users,
            tasks: TaskAccessor::new(tasks),
            authority,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET    /health               public
/// POST   /users                public (registration)
/// POST   /sessions             public (login)
/// DELETE /sessions/:token      public (logout)
/// GET    /users/:id            authenticated
/// PUT    /users/:id            authenticated, self only (PATCH too)
/// DELETE /users/:id            authenticated, self only
/// GET    /tasks                authenticated
/// POST   /tasks                authenticated
/// GET    /tasks/:id            authenticated
/// PUT    /tasks/:id            authenticated (PATCH too)
/// DELETE /tasks/:id            authenticated
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then token
/// authentication on the protected routes only.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::create_user))
        .route("/sessions", post(routes::sessions::create_session))
        .route("/sessions/:token", delete(routes::sessions::destroy_session));

    let protected_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::show_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::destroy_task),
        )
        .route(
            "/users/:id",
            get(routes::users::show_user)
                .put(routes::users::update_user)
                .patch(routes::users::update_user)
                .delete(routes::users::destroy_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_layer));

    let cors = cors_layer(&state.config.api.cors_origins);
    let production = state.config.api.production;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Token authentication layer
///
/// Resolves the Authorization header and inserts the caller's `Identity`
/// into request extensions. Rejected requests never reach the handler.
async fn auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();

    let identity = match resolve_identity(state.users.as_ref(), &parts.headers).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(method = %parts.method, uri = %parts.uri, "Rejected request: {}", e);
            return Err(e.into());
        }
    };

    parts.extensions.insert(identity);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
