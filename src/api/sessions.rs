use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::Month;
use crate::error::AppError;
use crate::session::SessionId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub monthly_contribution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_period: Option<Month>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_period: Option<Month>,
    pub history_count: usize,
}

pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let default_contribution = state.config.default_monthly_contribution;
    let id = state.sessions.create(default_contribution).await;
    info!("Created session {}", id);

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: id.to_string(),
            monthly_contribution: default_contribution.to_canonical_string(),
            ticker: None,
            first_period: None,
            last_period: None,
            history_count: 0,
        }),
    )
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let id = SessionId(id);
    let response = state
        .with_session(id, |session| SessionResponse {
            session_id: id.to_string(),
            monthly_contribution: session.monthly_contribution().to_canonical_string(),
            ticker: session.ticker().map(|t| t.to_string()),
            first_period: session.series().and_then(|s| s.first_period()),
            last_period: session.series().and_then(|s| s.last_period()),
            history_count: session.history().len(),
        })
        .await?;

    Ok(Json(response))
}

pub async fn delete_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let id = SessionId(id);
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("session {}", id)));
    }
    info!("Closed session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
