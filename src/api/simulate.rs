use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{format_currency, Decimal, Month};
use crate::engine::{axis_ticks, AxisTicks, SimulationRecord};
use crate::error::AppError;
use crate::session::SessionId;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub monthly_contribution: Option<String>,
    pub range_start: Option<Month>,
    pub range_end: Option<Month>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub period: Month,
    pub price: String,
    pub shares_purchased: String,
    pub cumulative_shares: String,
    pub cumulative_invested: String,
    pub market_value: String,
    pub unrealized_pnl: String,
}

impl From<&SimulationRecord> for RecordResponse {
    fn from(r: &SimulationRecord) -> Self {
        Self {
            period: r.period,
            price: r.price.to_canonical_string(),
            shares_purchased: r.shares_purchased.to_canonical_string(),
            cumulative_shares: r.cumulative_shares.to_canonical_string(),
            cumulative_invested: r.cumulative_invested.to_canonical_string(),
            market_value: r.market_value.to_canonical_string(),
            unrealized_pnl: r.unrealized_pnl.to_canonical_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub period_count: usize,
    pub final_value: String,
    pub final_pnl: String,
    pub final_value_display: String,
    pub final_pnl_display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub ticker: String,
    pub monthly_contribution: String,
    pub range_start: Month,
    pub range_end: Month,
    pub valuation_price: String,
    pub records: Vec<RecordResponse>,
    pub ticks: AxisTicks<Month>,
    pub summary: SummaryResponse,
}

fn parse_contribution(input: Option<&str>) -> Result<Option<Decimal>, AppError> {
    input
        .map(Decimal::from_str_canonical)
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid monthlyContribution".to_string()))
}

pub async fn run_simulation(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(params): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, AppError> {
    let id = SessionId(id);
    let contribution = parse_contribution(params.monthly_contribution.as_deref())?;
    let symbol = state.config.currency_symbol.clone();

    let response = state
        .with_session(id, |session| {
            let ticker = session
                .ticker()
                .map(|t| t.to_string())
                .unwrap_or_default();
            let run = session.run(contribution, params.range_start, params.range_end)?;
            let ledger = &run.ledger;

            Ok::<_, AppError>(SimulateResponse {
                ticker,
                monthly_contribution: run.monthly_contribution.to_canonical_string(),
                range_start: run.range_start,
                range_end: run.range_end,
                valuation_price: ledger.valuation_price().to_canonical_string(),
                records: ledger.records().iter().map(RecordResponse::from).collect(),
                ticks: axis_ticks(&ledger.periods()),
                summary: SummaryResponse {
                    period_count: ledger.period_count(),
                    final_value: ledger.final_value().to_canonical_string(),
                    final_pnl: ledger.final_pnl().to_canonical_string(),
                    final_value_display: format_currency(&symbol, ledger.final_value()),
                    final_pnl_display: format_currency(&symbol, ledger.final_pnl()),
                },
            })
        })
        .await??;

    Ok(Json(response))
}
