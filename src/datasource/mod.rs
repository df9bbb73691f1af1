//! Quote source abstraction for fetching monthly prices from external providers.

use crate::domain::{Decimal, Month, PricePoint, PriceSeries, Ticker};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod csv_file;
pub mod mock;
pub mod yahoo;

pub use csv_file::CsvQuoteSource;
pub use mock::MockQuoteSource;
pub use yahoo::YahooQuoteSource;

/// One row as returned by a provider, before any monthly normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub close: Option<Decimal>,
    pub adj_close: Option<Decimal>,
}

impl RawQuote {
    pub fn new(date: NaiveDate, close: Option<Decimal>, adj_close: Option<Decimal>) -> Self {
        Self {
            date,
            close,
            adj_close,
        }
    }
}

/// Quote source trait for fetching monthly price tables.
///
/// Implementations must handle retry/backoff and rate limiting themselves.
#[async_trait]
pub trait QuoteSource: Send + Sync + fmt::Debug {
    /// Fetch monthly quotes for a ticker.
    ///
    /// # Arguments
    /// * `ticker` - Symbol as understood by the provider
    /// * `from` - First calendar day (inclusive)
    /// * `to` - Last calendar day (inclusive)
    ///
    /// # Returns
    /// Raw rows in provider order; may be empty.
    async fn fetch_monthly(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataSourceError>;
}

/// Error type for quote source operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON, CSV or malformed response)
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Rate limit exceeded
    #[error("Rate limited")]
    RateLimited,
    /// Provider returned no rows for the ticker and period
    #[error("No price data for {0}")]
    Empty(String),
    /// Rows exist but carry neither an adjusted nor a plain close
    #[error("Price data has neither 'Adj Close' nor 'Close' values")]
    MissingPriceColumn,
    #[error("I/O error: {0}")]
    Io(String),
}

/// Turn raw provider rows into a monthly `PriceSeries`.
///
/// Adjusted closes are preferred whenever any row has one; otherwise plain
/// closes are used. Rows without the chosen column are dropped. Several rows
/// in one month collapse to the latest dated row.
pub fn normalize_monthly(
    ticker: &Ticker,
    quotes: &[RawQuote],
) -> Result<PriceSeries, DataSourceError> {
    if quotes.is_empty() {
        return Err(DataSourceError::Empty(ticker.to_string()));
    }

    let use_adjusted = quotes.iter().any(|q| q.adj_close.is_some());
    if !use_adjusted && !quotes.iter().any(|q| q.close.is_some()) {
        return Err(DataSourceError::MissingPriceColumn);
    }
    let pick = |q: &RawQuote| if use_adjusted { q.adj_close } else { q.close };

    let mut by_month: BTreeMap<Month, (NaiveDate, Decimal)> = BTreeMap::new();
    for quote in quotes {
        let Some(price) = pick(quote) else {
            tracing::warn!("Skipping {} row for {}: no price", ticker, quote.date);
            continue;
        };
        let month = Month::from_date(quote.date);
        match by_month.get(&month) {
            Some((seen, _)) if *seen > quote.date => {}
            _ => {
                by_month.insert(month, (quote.date, price));
            }
        }
    }

    if by_month.is_empty() {
        return Err(DataSourceError::Empty(ticker.to_string()));
    }

    let points = by_month
        .into_iter()
        .map(|(period, (_, price))| PricePoint::new(period, price))
        .collect();

    // BTreeMap keys are unique and sorted.
    PriceSeries::new(points).map_err(|e| DataSourceError::ParseError(e.to_string()))
}
