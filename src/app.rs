use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, options, post},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::auth::{PasswordHasher, SessionStore};
use crate::config::ConfigHandle;
use crate::database::CampRepository;
use crate::handlers::{self, camps, speakers, talks};
use crate::middleware::{authenticate, camp_cors};
use crate::versioning::{VersionTable, SUPPORTED_VERSIONS_HEADER};

/// Shared per-process services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn CampRepository>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ConfigHandle>,
    pub passwords: Arc<PasswordHasher>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CampRepository>, config: Arc<ConfigHandle>) -> Self {
        let cost = config.snapshot().security.password_hash_cost;
        Self {
            repo,
            sessions: Arc::new(SessionStore::new()),
            config,
            passwords: Arc::new(PasswordHasher::new(cost)),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::operations::health))
        .merge(camp_routes(&state))
        .merge(speaker_routes())
        .merge(talk_routes())
        .merge(auth_routes())
        .merge(operations_routes())
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn supported_versions<T>(table: &VersionTable<T>) -> SetResponseHeaderLayer<HeaderValue> {
    let value = HeaderValue::from_str(&table.supported_header()).unwrap_or(HeaderValue::from_static(""));
    SetResponseHeaderLayer::if_not_present(SUPPORTED_VERSIONS_HEADER.clone(), value)
}

fn camp_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/camps", get(camps::list).post(camps::create))
        .route(
            "/api/camps/:moniker",
            get(camps::get).put(camps::update).delete(camps::delete),
        )
        .layer(supported_versions(&camps::VERSIONS))
        .layer(camp_cors(Arc::clone(&state.config)))
}

fn speaker_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/camps/:moniker/speakers",
            get(speakers::list).post(speakers::create),
        )
        .route(
            "/api/camps/:moniker/speakers/:speaker_id",
            get(speakers::get).put(speakers::update).delete(speakers::delete),
        )
        .layer(supported_versions(&speakers::VERSIONS))
}

fn talk_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/camps/:moniker/speakers/:speaker_id/talks",
            get(talks::list).post(talks::create),
        )
        .route(
            "/api/camps/:moniker/speakers/:speaker_id/talks/:id",
            get(talks::get).put(talks::update).delete(talks::delete),
        )
        .layer(supported_versions(&talks::VERSIONS))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/token", post(handlers::auth::token))
}

fn operations_routes() -> Router<AppState> {
    Router::new().route("/api/operations/reloadConfig", options(handlers::operations::reload_config))
}
