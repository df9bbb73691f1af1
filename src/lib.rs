pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod session;

pub use config::Config;
pub use datasource::{
    normalize_monthly, CsvQuoteSource, DataSourceError, MockQuoteSource, QuoteSource, RawQuote,
    YahooQuoteSource,
};
pub use domain::{Decimal, Month, PricePoint, PriceSeries, Ticker};
pub use engine::{sample_ticks, simulate, SimulationError, SimulationInput, SimulationLedger};
pub use error::AppError;
pub use session::{HistoryEntry, HistoryLedger, Session};
