use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{format_currency, Month};
use crate::error::AppError;
use crate::session::{HistoryEntry, SessionId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub monthly_contribution: String,
    pub monthly_contribution_display: String,
    pub range_start: Month,
    pub range_end: Month,
    pub period_count: usize,
    pub final_value: String,
    pub final_value_display: String,
    pub final_pnl: String,
    pub final_pnl_display: String,
}

impl HistoryEntryResponse {
    fn new(entry: &HistoryEntry, symbol: &str) -> Self {
        Self {
            monthly_contribution: entry.monthly_contribution.to_canonical_string(),
            monthly_contribution_display: format_currency(symbol, entry.monthly_contribution),
            range_start: entry.range_start,
            range_end: entry.range_end,
            period_count: entry.period_count,
            final_value: entry.final_value.to_canonical_string(),
            final_value_display: format_currency(symbol, entry.final_value),
            final_pnl: entry.final_pnl.to_canonical_string(),
            final_pnl_display: format_currency(symbol, entry.final_pnl),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntryResponse>,
}

pub async fn list_history(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let symbol = state.config.currency_symbol.clone();
    let entries = state
        .with_session(SessionId(id), |session| {
            session
                .history()
                .list()
                .iter()
                .map(|e| HistoryEntryResponse::new(e, &symbol))
                .collect::<Vec<_>>()
        })
        .await?;

    Ok(Json(HistoryResponse { entries }))
}

pub async fn record_history(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<HistoryEntryResponse>), AppError> {
    let id = SessionId(id);
    let entry = state
        .with_session(id, |session| session.record_last_run())
        .await??;
    info!("Recorded simulation for session {}", id);

    Ok((
        StatusCode::CREATED,
        Json(HistoryEntryResponse::new(&entry, &state.config.currency_symbol)),
    ))
}

pub async fn clear_history(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let id = SessionId(id);
    state
        .with_session(id, |session| session.clear_history())
        .await?;
    info!("Cleared history for session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
