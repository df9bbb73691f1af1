pub mod health;
pub mod history;
pub mod prices;
pub mod sessions;
pub mod simulate;

use crate::config::Config;
use crate::datasource::QuoteSource;
use crate::error::AppError;
use crate::session::{Session, SessionId, SessionStore};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quote_source: Arc<dyn QuoteSource>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, quote_source: Arc<dyn QuoteSource>) -> Self {
        Self {
            config,
            quote_source,
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// Apply `f` to a session, mapping an unknown id to 404.
    pub async fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, AppError> {
        self.sessions
            .with_session(id, f)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/sessions/:id", get(sessions::get_session).delete(sessions::delete_session))
        .route("/v1/sessions/:id/prices", post(prices::load_prices))
        .route("/v1/sessions/:id/simulate", post(simulate::run_simulation))
        .route(
            "/v1/sessions/:id/history",
            get(history::list_history)
                .post(history::record_history)
                .delete(history::clear_history),
        )
        .layer(cors)
        .with_state(state)
}
