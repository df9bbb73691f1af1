//! Mock quote source for testing without network calls.

use super::{DataSourceError, QuoteSource, RawQuote};
use crate::domain::Ticker;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Mock quote source that returns predefined rows per ticker.
#[derive(Debug, Clone, Default)]
pub struct MockQuoteSource {
    quotes: HashMap<Ticker, Vec<RawQuote>>,
    failure: Option<DataSourceError>,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row for a ticker.
    pub fn with_quote(mut self, ticker: &Ticker, quote: RawQuote) -> Self {
        self.quotes.entry(ticker.clone()).or_default().push(quote);
        self
    }

    /// Add multiple rows for a ticker.
    pub fn with_quotes(mut self, ticker: &Ticker, quotes: Vec<RawQuote>) -> Self {
        self.quotes.entry(ticker.clone()).or_default().extend(quotes);
        self
    }

    /// Make every fetch fail with `err`.
    pub fn failing_with(mut self, err: DataSourceError) -> Self {
        self.failure = Some(err);
        self
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn fetch_monthly(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataSourceError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        Ok(self
            .quotes
            .get(ticker)
            .map(|rows| {
                rows.iter()
                    .filter(|q| q.date >= from && q.date <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
