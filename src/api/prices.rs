use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::datasource::normalize_monthly;
use crate::domain::{Month, Ticker};
use crate::error::AppError;
use crate::session::SessionId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPricesRequest {
    pub ticker: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePointResponse {
    pub period: Month,
    pub price: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPricesResponse {
    pub ticker: String,
    pub count: usize,
    pub first_period: Month,
    pub last_period: Month,
    pub prices: Vec<PricePointResponse>,
}

fn default_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub async fn load_prices(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(params): Json<LoadPricesRequest>,
) -> Result<Json<LoadPricesResponse>, AppError> {
    let id = SessionId(id);
    let ticker = Ticker::parse(&params.ticker)
        .ok_or_else(|| AppError::BadRequest("Invalid ticker".to_string()))?;

    let from = params.from.unwrap_or_else(default_from);
    let to = params
        .to
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    if from > to {
        return Err(AppError::BadRequest("from must be <= to".to_string()));
    }

    // Fail fast on an unknown session before going to the network.
    state.with_session(id, |_| ()).await?;

    let quotes = state.quote_source.fetch_monthly(&ticker, from, to).await?;
    let series = normalize_monthly(&ticker, &quotes)?;

    let (first_period, last_period) = match (series.first_period(), series.last_period()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AppError::NotFound(format!("No price data for {}", ticker))),
    };

    let response = LoadPricesResponse {
        ticker: ticker.to_string(),
        count: series.len(),
        first_period,
        last_period,
        prices: series
            .points()
            .iter()
            .map(|p| PricePointResponse {
                period: p.period,
                price: p.price.to_canonical_string(),
            })
            .collect(),
    };

    state
        .with_session(id, move |session| session.load_prices(ticker, series))
        .await?;

    Ok(Json(response))
}
