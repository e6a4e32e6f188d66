use serde::Serialize;
use thiserror::Error;

use crate::contract::SweepResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no sweep results to select from")]
    EmptyResultSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweetSpots {
    pub performance: SweepResult,
    pub cost: SweepResult,
}

/// Picks the lowest-duration and lowest-cost results among all records.
///
/// Degraded records take part with their zero duration and cost. Ties go to
/// the first occurrence, which is the smallest memory size for a sweep's
/// ascending output.
pub fn select_best(results: &[SweepResult]) -> Result<SweetSpots, SelectError> {
    pick(results.iter())
}

/// Like [`select_best`], but only over records that carry a measured
/// duration. Fails with `EmptyResultSet` when nothing was measured.
pub fn select_best_measured(results: &[SweepResult]) -> Result<SweetSpots, SelectError> {
    pick(results.iter().filter(|result| !result.is_degraded()))
}

fn pick<'a>(mut results: impl Iterator<Item = &'a SweepResult>) -> Result<SweetSpots, SelectError> {
    let first = results.next().ok_or(SelectError::EmptyResultSet)?;

    let mut performance = first;
    let mut cost = first;
    for result in results {
        if result.duration_ms() < performance.duration_ms() {
            performance = result;
        }
        if result.cost() < cost.cost() {
            cost = result;
        }
    }

    Ok(SweetSpots {
        performance: performance.clone(),
        cost: cost.clone(),
    })
}
