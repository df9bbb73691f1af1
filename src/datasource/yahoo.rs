//! Yahoo Finance chart API client implementation.

use super::{DataSourceError, QuoteSource, RawQuote};
use crate::domain::{Decimal, Ticker};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Quote source backed by the public `v8/finance/chart` endpoint.
#[derive(Debug, Clone)]
pub struct YahooQuoteSource {
    client: Client,
    base_url: String,
}

impl YahooQuoteSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create with default Yahoo Finance API URL.
    pub fn default_url() -> Self {
        Self::new("https://query1.finance.yahoo.com".to_string())
    }

    async fn get_chart(
        &self,
        ticker: &Ticker,
        period1: i64,
        period2: i64,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker.as_str());
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .header(reqwest::header::USER_AGENT, "dcasim")
                .query(&[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1mo".to_string()),
                    ("events", "adjclose".to_string()),
                ])
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if status == 404 {
                return Err(backoff::Error::permanent(DataSourceError::Empty(
                    ticker.to_string(),
                )));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn fetch_monthly(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataSourceError> {
        debug!("Fetching monthly quotes for {} from {} to {}", ticker, from, to);

        // Bars are stamped at exchange-local midnight, which is the previous
        // UTC day east of Greenwich; start a day early and filter locally.
        let period1 = from
            .checked_sub_days(Days::new(1))
            .unwrap_or(from)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        // period2 is exclusive upstream; include the whole `to` day.
        let period2 = to
            .checked_add_days(Days::new(1))
            .unwrap_or(to)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let response = self.get_chart(ticker, period1, period2).await?;
        let quotes = parse_chart(&response)?;
        Ok(quotes
            .into_iter()
            .filter(|q| q.date >= from && q.date <= to)
            .collect())
    }
}

fn parse_chart(response: &serde_json::Value) -> Result<Vec<RawQuote>, DataSourceError> {
    let chart = response
        .get("chart")
        .ok_or_else(|| DataSourceError::ParseError("Missing chart field".to_string()))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(DataSourceError::ParseError(description.to_string()));
    }

    let Some(result) = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
    else {
        return Ok(Vec::new());
    };

    // A ticker with no trading in the window comes back without timestamps.
    let Some(timestamps) = result.get("timestamp").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    // Seconds east of UTC for the listing exchange, e.g. 32400 for Tokyo.
    let gmtoffset = result
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let indicators = result
        .get("indicators")
        .ok_or_else(|| DataSourceError::ParseError("Missing indicators field".to_string()))?;
    let closes = indicator_column(indicators, "quote", "close");
    let adj_closes = indicator_column(indicators, "adjclose", "adjclose");

    let mut quotes = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = ts
            .as_i64()
            .and_then(|secs| secs.checked_add(gmtoffset))
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.date_naive())
        else {
            warn!("Skipping row {} with invalid timestamp {}", i, ts);
            continue;
        };

        quotes.push(RawQuote::new(
            date,
            price_at(closes, i),
            price_at(adj_closes, i),
        ));
    }

    Ok(quotes)
}

fn indicator_column<'a>(
    indicators: &'a serde_json::Value,
    group: &str,
    field: &str,
) -> Option<&'a Vec<serde_json::Value>> {
    indicators
        .get(group)
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .and_then(|v| v.get(field))
        .and_then(|v| v.as_array())
}

fn price_at(column: Option<&Vec<serde_json::Value>>, i: usize) -> Option<Decimal> {
    column
        .and_then(|c| c.get(i))
        .and_then(|v| v.as_f64())
        .and_then(Decimal::from_f64)
}
