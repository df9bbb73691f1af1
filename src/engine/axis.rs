//! Thinning of period labels for chart axes.

/// Series at or below this length label every period.
pub const FULL_DENSITY_LIMIT: usize = 24;

/// Approximate number of labels kept for longer series.
pub const TARGET_LABELS: usize = 12;

/// Pick the periods that get an axis label.
///
/// Up to [`FULL_DENSITY_LIMIT`] periods are returned unchanged. Longer input
/// keeps every `len / TARGET_LABELS`-th period starting with the first.
pub fn sample_ticks<T: Clone>(periods: &[T]) -> Vec<T> {
    if periods.len() <= FULL_DENSITY_LIMIT {
        return periods.to_vec();
    }

    let step = periods.len() / TARGET_LABELS;
    periods.iter().step_by(step).cloned().collect()
}

/// Tick labels plus the rotation the chart applies to them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisTicks<T> {
    pub ticks: Vec<T>,
    /// Degrees; labels are slanted at both densities.
    pub label_rotation: u16,
}

pub fn axis_ticks<T: Clone>(periods: &[T]) -> AxisTicks<T> {
    AxisTicks {
        ticks: sample_ticks(periods),
        label_rotation: 45,
    }
}
