//! Reading monthly quotes from CSV exports on disk.
//!
//! Files are named `<TICKER>.csv` and follow the Yahoo download layout:
//! a `Date` column plus `Close` and/or `Adj Close`.

use super::{DataSourceError, QuoteSource, RawQuote};
use crate::domain::{Decimal, Ticker};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CsvQuoteSource {
    dir: PathBuf,
}

impl CsvQuoteSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.as_str()))
    }

    pub fn parse_csv(csv_bytes: &[u8]) -> Result<Vec<RawQuote>, DataSourceError> {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            #[serde(rename = "Date")]
            date: String,
            #[serde(rename = "Close", default)]
            close: Option<String>,
            #[serde(rename = "Adj Close", default)]
            adj_close: Option<String>,
        }

        fn parse_price(field: Option<&str>) -> Result<Option<Decimal>, DataSourceError> {
            match field.map(str::trim) {
                None | Some("") | Some("null") | Some("NaN") => Ok(None),
                Some(s) => Decimal::from_str_canonical(s)
                    .map(Some)
                    .map_err(|e| DataSourceError::ParseError(format!("invalid price {}: {}", s, e))),
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_bytes);

        let mut quotes = Vec::new();
        for record in reader.deserialize::<Row>() {
            let row = record.map_err(|e| DataSourceError::ParseError(e.to_string()))?;
            // Accept both plain dates and timestamps such as `2020-01-01 00:00:00`.
            let date_part = row.date.get(..10).unwrap_or(&row.date);
            let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
                DataSourceError::ParseError(format!("invalid date: {}", row.date))
            })?;

            quotes.push(RawQuote::new(
                date,
                parse_price(row.close.as_deref())?,
                parse_price(row.adj_close.as_deref())?,
            ));
        }

        Ok(quotes)
    }

    fn read_file(path: &Path) -> Result<Option<Vec<u8>>, DataSourceError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DataSourceError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}

#[async_trait]
impl QuoteSource for CsvQuoteSource {
    async fn fetch_monthly(
        &self,
        ticker: &Ticker,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataSourceError> {
        let path = self.path_for(ticker);
        debug!("Reading quotes for {} from {}", ticker, path.display());

        let Some(bytes) = Self::read_file(&path)? else {
            return Ok(Vec::new());
        };

        Ok(Self::parse_csv(&bytes)?
            .into_iter()
            .filter(|q| q.date >= from && q.date <= to)
            .collect())
    }
}
