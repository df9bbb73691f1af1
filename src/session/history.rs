//! Saved summaries of completed simulation runs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Decimal, Month};
use crate::engine::SimulationLedger;

/// Summary of one recorded run. Final figures are whole currency units,
/// rounded half-to-even.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub monthly_contribution: Decimal,
    pub range_start: Month,
    pub range_end: Month,
    pub period_count: usize,
    pub final_value: Decimal,
    pub final_pnl: Decimal,
}

impl HistoryEntry {
    pub fn from_ledger(
        ledger: &SimulationLedger,
        monthly_contribution: Decimal,
        range_start: Month,
        range_end: Month,
    ) -> Self {
        Self {
            monthly_contribution,
            range_start,
            range_end,
            period_count: ledger.period_count(),
            final_value: ledger.final_value().round_to_unit(),
            final_pnl: ledger.final_pnl().round_to_unit(),
        }
    }
}

/// Append-only list of recorded runs, cleared only in bulk.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize `ledger`, append it and return the stored entry.
    pub fn record(
        &mut self,
        ledger: &SimulationLedger,
        monthly_contribution: Decimal,
        range_start: Month,
        range_end: Month,
    ) -> HistoryEntry {
        let entry = HistoryEntry::from_ledger(ledger, monthly_contribution, range_start, range_end);
        self.entries.push(entry.clone());
        debug!("Recorded run #{}", self.entries.len());
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
