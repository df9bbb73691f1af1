//! Fixed-contribution monthly purchase simulation.
//!
//! Every record's market value is marked at the price of the LAST month in
//! range, not at that month's own price. The resulting curve shows what each
//! accumulated position would be worth at the end of the window rather than
//! what it was worth on its own date. Valuation is therefore a separate pass
//! that runs once the final price is known.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Decimal, Month, PricePoint, PriceSeries};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("monthly contribution must be positive, got {0}")]
    InvalidContribution(Decimal),
    #[error("no prices between {start} and {end}")]
    EmptyRange { start: Month, end: Month },
    #[error("price for {period} must be positive, got {price}")]
    NonPositivePrice { period: Month, price: Decimal },
    #[error("amounts overflow at {period}; reduce the monthly contribution or range")]
    Overflow { period: Month },
}

/// One month of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub period: Month,
    pub price: Decimal,
    pub shares_purchased: Decimal,
    pub cumulative_shares: Decimal,
    pub cumulative_invested: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Result of one simulation run. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLedger {
    records: Vec<SimulationRecord>,
    final_value: Decimal,
    final_pnl: Decimal,
}

impl SimulationLedger {
    pub fn records(&self) -> &[SimulationRecord] {
        &self.records
    }

    pub fn final_value(&self) -> Decimal {
        self.final_value
    }

    pub fn final_pnl(&self) -> Decimal {
        self.final_pnl
    }

    pub fn period_count(&self) -> usize {
        self.records.len()
    }

    pub fn periods(&self) -> Vec<Month> {
        self.records.iter().map(|r| r.period).collect()
    }

    /// Price every record was valued at.
    pub fn valuation_price(&self) -> Decimal {
        self.records.last().map(|r| r.price).unwrap_or_default()
    }
}

/// Everything `simulate` needs, bundled for callers that carry it around.
#[derive(Debug, Clone, Copy)]
pub struct SimulationInput<'a> {
    pub series: &'a PriceSeries,
    pub monthly_contribution: Decimal,
    pub range_start: Month,
    pub range_end: Month,
}

impl SimulationInput<'_> {
    pub fn simulate(&self) -> Result<SimulationLedger, SimulationError> {
        simulate(
            self.series,
            self.monthly_contribution,
            self.range_start,
            self.range_end,
        )
    }
}

/// Purchases before valuation: output of the accumulation pass.
struct Purchase {
    period: Month,
    price: Decimal,
    shares_purchased: Decimal,
    cumulative_shares: Decimal,
    cumulative_invested: Decimal,
}

/// Run the plan over `[range_start, range_end]` of `series`.
pub fn simulate(
    series: &PriceSeries,
    monthly_contribution: Decimal,
    range_start: Month,
    range_end: Month,
) -> Result<SimulationLedger, SimulationError> {
    if !monthly_contribution.is_positive() {
        return Err(SimulationError::InvalidContribution(monthly_contribution));
    }

    let points = series.range(range_start, range_end);
    if points.is_empty() {
        return Err(SimulationError::EmptyRange {
            start: range_start,
            end: range_end,
        });
    }

    if let Some(bad) = points.iter().find(|p| !p.price.is_positive()) {
        return Err(SimulationError::NonPositivePrice {
            period: bad.period,
            price: bad.price,
        });
    }

    let purchases = accumulate(points, monthly_contribution)?;
    let ledger = mark_to_final_price(purchases)?;

    debug!(
        "Simulated {} months from {} to {}: final value {}, pnl {}",
        ledger.period_count(),
        range_start,
        range_end,
        ledger.final_value,
        ledger.final_pnl
    );

    Ok(ledger)
}

/// Pass 1: buy `contribution / price` each month and keep running totals.
fn accumulate(
    points: &[PricePoint],
    contribution: Decimal,
) -> Result<Vec<Purchase>, SimulationError> {
    let mut cumulative_shares = Decimal::zero();
    let mut purchases = Vec::with_capacity(points.len());

    for (index, point) in points.iter().enumerate() {
        let overflow = || SimulationError::Overflow {
            period: point.period,
        };
        let shares_purchased = contribution.checked_div(point.price).ok_or_else(overflow)?;
        cumulative_shares = cumulative_shares
            .checked_add(shares_purchased)
            .ok_or_else(overflow)?;
        let cumulative_invested = contribution
            .checked_mul(Decimal::from(index + 1))
            .ok_or_else(overflow)?;

        purchases.push(Purchase {
            period: point.period,
            price: point.price,
            shares_purchased,
            cumulative_shares,
            cumulative_invested,
        });
    }

    Ok(purchases)
}

/// Pass 2: value every accumulated position at the last month's price.
fn mark_to_final_price(purchases: Vec<Purchase>) -> Result<SimulationLedger, SimulationError> {
    let final_price = purchases
        .last()
        .map(|p| p.price)
        .unwrap_or_default();

    let records = purchases
        .into_iter()
        .map(|p| {
            let overflow = SimulationError::Overflow { period: p.period };
            let market_value = p
                .cumulative_shares
                .checked_mul(final_price)
                .ok_or(overflow.clone())?;
            let unrealized_pnl = market_value
                .checked_sub(p.cumulative_invested)
                .ok_or(overflow)?;
            Ok(SimulationRecord {
                period: p.period,
                price: p.price,
                shares_purchased: p.shares_purchased,
                cumulative_shares: p.cumulative_shares,
                cumulative_invested: p.cumulative_invested,
                market_value,
                unrealized_pnl,
            })
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let (final_value, final_pnl) = records
        .last()
        .map(|r| (r.market_value, r.unrealized_pnl))
        .unwrap_or_default();

    Ok(SimulationLedger {
        records,
        final_value,
        final_pnl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn m(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn series(start: &str, prices: &[&str]) -> PriceSeries {
        let mut period = m(start);
        let mut points = Vec::new();
        for price in prices {
            points.push(PricePoint::new(period, d(price)));
            period = period.succ().unwrap();
        }
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn test_accumulate_keeps_running_totals_without_valuation() {
        let s = series("2020-01", &["100", "50", "200"]);
        let purchases = accumulate(s.points(), d("1000")).unwrap();

        assert_eq!(purchases.len(), 3);
        assert_eq!(purchases[0].shares_purchased, d("10"));
        assert_eq!(purchases[1].shares_purchased, d("20"));
        assert_eq!(purchases[2].shares_purchased, d("5"));
        assert_eq!(purchases[2].cumulative_shares, d("35"));
        assert_eq!(purchases[2].cumulative_invested, d("3000"));
    }

    #[test]
    fn test_every_record_marked_at_last_price() {
        let s = series("2020-01", &["100", "50", "200"]);
        let ledger = simulate(&s, d("1000"), m("2020-01"), m("2020-03")).unwrap();

        assert_eq!(ledger.valuation_price(), d("200"));
        let values: Vec<Decimal> = ledger.records().iter().map(|r| r.market_value).collect();
        assert_eq!(values, vec![d("2000"), d("6000"), d("7000")]);
        assert_eq!(ledger.final_value(), d("7000"));
        assert_eq!(ledger.final_pnl(), d("4000"));
    }

    #[test]
    fn test_sub_range_resets_accumulators() {
        let s = series("2020-01", &["100", "50", "200", "400"]);
        let ledger = simulate(&s, d("1000"), m("2020-02"), m("2020-03")).unwrap();

        assert_eq!(ledger.period_count(), 2);
        assert_eq!(ledger.records()[0].period, m("2020-02"));
        assert_eq!(ledger.records()[0].cumulative_invested, d("1000"));
        assert_eq!(ledger.records()[1].cumulative_shares, d("25"));
        assert_eq!(ledger.final_value(), d("5000"));
    }

    #[test]
    fn test_negative_contribution_rejected() {
        let s = series("2020-01", &["100"]);
        let err = simulate(&s, d("-5"), m("2020-01"), m("2020-01")).unwrap_err();
        assert_eq!(err, SimulationError::InvalidContribution(d("-5")));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let s = series("2020-01", &["100", "100"]);
        let err = simulate(&s, d("1000"), m("2020-02"), m("2020-01")).unwrap_err();
        assert!(matches!(err, SimulationError::EmptyRange { .. }));
    }

    #[test]
    fn test_non_positive_price_in_range_rejected() {
        let s = series("2020-01", &["100", "0", "-3"]);
        let err = simulate(&s, d("1000"), m("2020-01"), m("2020-03")).unwrap_err();
        assert_eq!(
            err,
            SimulationError::NonPositivePrice {
                period: m("2020-02"),
                price: d("0"),
            }
        );
    }

    #[test]
    fn test_non_positive_price_outside_range_ignored() {
        let s = series("2020-01", &["0", "100"]);
        assert!(simulate(&s, d("1000"), m("2020-02"), m("2020-02")).is_ok());
    }

    #[test]
    fn test_share_count_overflow_is_an_error() {
        let s = series("2020-01", &["0.5"]);
        let err = simulate(&s, d("50000000000000000000000000000"), m("2020-01"), m("2020-01")).unwrap_err();
        assert_eq!(
            err,
            SimulationError::Overflow {
                period: m("2020-01"),
            }
        );
    }

    #[test]
    fn test_invested_overflow_names_failing_month() {
        let s = series("2020-01", &["100", "100", "100"]);
        let contribution = d("70000000000000000000000000000");
        let err = simulate(&s, contribution, m("2020-01"), m("2020-03")).unwrap_err();
        assert_eq!(
            err,
            SimulationError::Overflow {
                period: m("2020-02"),
            }
        );
    }

    #[test]
    fn test_input_delegates_to_simulate() {
        let s = series("2020-01", &["100", "125"]);
        let input = SimulationInput {
            series: &s,
            monthly_contribution: d("500"),
            range_start: m("2020-01"),
            range_end: m("2020-02"),
        };
        assert_eq!(
            input.simulate().unwrap(),
            simulate(&s, d("500"), m("2020-01"), m("2020-02")).unwrap()
        );
    }
}
