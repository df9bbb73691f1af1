//! Per-user session state: loaded prices, last inputs and run history.
//!
//! A `Session` is plain data threaded through by its owner. Nothing here is
//! global; the HTTP layer keeps one per session id.

pub mod history;
pub mod store;

pub use history::{HistoryEntry, HistoryLedger};
pub use store::SessionStore;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Decimal, Month, PriceSeries, Ticker};
use crate::engine::{simulate, SimulationError, SimulationLedger};

/// Identifier handed out to HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The most recent simulation, kept so it can be recorded into history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRun {
    pub ledger: SimulationLedger,
    pub monthly_contribution: Decimal,
    pub range_start: Month,
    pub range_end: Month,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no price data loaded")]
    NoPrices,
    #[error("no simulation has been run yet")]
    NoRun,
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone)]
pub struct Session {
    prices: Option<(Ticker, PriceSeries)>,
    monthly_contribution: Decimal,
    last_run: Option<LastRun>,
    history: HistoryLedger,
}

impl Session {
    pub fn new(default_contribution: Decimal) -> Self {
        Self {
            prices: None,
            monthly_contribution: default_contribution,
            last_run: None,
            history: HistoryLedger::new(),
        }
    }

    /// Replace the loaded series. The previous run no longer matches the data
    /// and is dropped; history is kept.
    pub fn load_prices(&mut self, ticker: Ticker, series: PriceSeries) {
        info!("Loaded {} monthly prices for {}", series.len(), ticker);
        self.prices = Some((ticker, series));
        self.last_run = None;
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        self.prices.as_ref().map(|(t, _)| t)
    }

    pub fn series(&self) -> Option<&PriceSeries> {
        self.prices.as_ref().map(|(_, s)| s)
    }

    pub fn monthly_contribution(&self) -> Decimal {
        self.monthly_contribution
    }

    pub fn last_run(&self) -> Option<&LastRun> {
        self.last_run.as_ref()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Simulate over the loaded series.
    ///
    /// Missing inputs fall back to the session's last contribution and the
    /// full span of the series. A supplied contribution is remembered only
    /// when the run succeeds.
    pub fn run(
        &mut self,
        monthly_contribution: Option<Decimal>,
        range_start: Option<Month>,
        range_end: Option<Month>,
    ) -> Result<&LastRun, SessionError> {
        let series = self.series().ok_or(SessionError::NoPrices)?;
        let contribution = monthly_contribution.unwrap_or(self.monthly_contribution);
        let (first, last) = match (series.first_period(), series.last_period()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SessionError::NoPrices),
        };
        let start = range_start.unwrap_or(first);
        let end = range_end.unwrap_or(last);

        let ledger = simulate(series, contribution, start, end)?;

        self.monthly_contribution = contribution;
        Ok(&*self.last_run.insert(LastRun {
            ledger,
            monthly_contribution: contribution,
            range_start: start,
            range_end: end,
        }))
    }

    /// Save the last run's summary into history.
    pub fn record_last_run(&mut self) -> Result<HistoryEntry, SessionError> {
        let run = self.last_run.as_ref().ok_or(SessionError::NoRun)?;
        Ok(self.history.record(
            &run.ledger,
            run.monthly_contribution,
            run.range_start,
            run.range_end,
        ))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
