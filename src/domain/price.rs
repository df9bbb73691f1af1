//! Monthly price points and the ordered series the engine reads from.

use crate::domain::{Decimal, Month};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Price of the asset for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub period: Month,
    pub price: Decimal,
}

impl PricePoint {
    pub fn new(period: Month, price: Decimal) -> Self {
        Self { period, price }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("price series must be strictly increasing by month: {previous} is followed by {next}")]
    NotStrictlyIncreasing { previous: Month, next: Month },
}

/// Ordered monthly prices, strictly increasing by period with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or repeated months.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        if let Some(pair) = points.windows(2).find(|w| w[0].period >= w[1].period) {
            return Err(SeriesError::NotStrictlyIncreasing {
                previous: pair[0].period,
                next: pair[1].period,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_period(&self) -> Option<Month> {
        self.points.first().map(|p| p.period)
    }

    pub fn last_period(&self) -> Option<Month> {
        self.points.last().map(|p| p.period)
    }

    /// Contiguous sub-slice with `start <= period <= end`. Empty when
    /// `start > end` or nothing falls inside.
    pub fn range(&self, start: Month, end: Month) -> &[PricePoint] {
        if start > end {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.period < start);
        let hi = self.points.partition_point(|p| p.period <= end);
        &self.points[lo..hi]
    }
}

impl<'de> Deserialize<'de> for PriceSeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            points: Vec<PricePoint>,
        }
        let raw = Raw::deserialize(deserializer)?;
        PriceSeries::new(raw.points).map_err(serde::de::Error::custom)
    }
}
