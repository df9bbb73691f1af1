//! Domain types for the DCA simulator.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: Month, Ticker
//! - Monthly price points and the validated PriceSeries

pub mod decimal;
pub mod price;
pub mod primitives;

pub use decimal::{format_currency, Decimal};
pub use price::{PricePoint, PriceSeries, SeriesError};
pub use primitives::{Month, MonthParseError, Ticker};
