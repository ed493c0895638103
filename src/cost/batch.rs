//! Parallel costing of a tariff set against one profile summary.

use std::fmt;
use std::sync::mpsc;
use std::thread;

use crate::profile::ProfileSummary;
use crate::tariff::record::TariffRecord;

use super::simulator::{CostError, CostResult, cost_tariff};

/// Per-reason exclusion counts for one costing pass.
///
/// Exclusions are the only trace a dropped tariff leaves; the batch never
/// aborts on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub input: usize,
    pub costed: usize,
    pub ineligible: usize,
    pub malformed_schedule: usize,
    pub missing_rate: usize,
    pub negative_cost: usize,
}

impl BatchReport {
    fn record(&mut self, error: CostError) {
        match error {
            CostError::Ineligible => self.ineligible += 1,
            CostError::MalformedSchedule => self.malformed_schedule += 1,
            CostError::MissingRate => self.missing_rate += 1,
            CostError::NegativeFixed | CostError::NegativeDemand | CostError::NegativeEnergy => {
                self.negative_cost += 1;
            }
        }
    }

    /// Every input tariff is either costed or counted as excluded.
    pub fn reconciles(&self) -> bool {
        self.costed
            + self.ineligible
            + self.malformed_schedule
            + self.missing_rate
            + self.negative_cost
            == self.input
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "costed {}/{} tariffs (ineligible={}, malformed-schedule={}, missing-rate={}, negative-cost={})",
            self.costed,
            self.input,
            self.ineligible,
            self.malformed_schedule,
            self.missing_rate,
            self.negative_cost
        )
    }
}

/// Results and exclusion counts from one costing pass.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Costed tariffs in input order.
    pub results: Vec<CostResult>,
    pub report: BatchReport,
}

/// Costs every tariff against the profile summary on a bounded worker
/// pool.
///
/// Each tariff is independent and side-effect-free, so the set is split
/// into contiguous chunks, one scoped worker per chunk, all reading the
/// same immutable summary. `workers` is clamped to at least one; pass
/// [`default_workers`] for the machine's parallelism. Results are merged
/// back into input order.
pub fn cost_all(
    tariffs: &[TariffRecord],
    summary: &ProfileSummary,
    workers: usize,
) -> BatchOutcome {
    let mut report = BatchReport {
        input: tariffs.len(),
        ..BatchReport::default()
    };
    if tariffs.is_empty() {
        return BatchOutcome {
            results: Vec::new(),
            report,
        };
    }

    let workers = workers.max(1);
    let chunk_size = tariffs.len().div_ceil(workers);
    let (tx, rx) = mpsc::channel::<(usize, Vec<Result<CostResult, CostError>>)>();

    thread::scope(|scope| {
        for (chunk_idx, chunk) in tariffs.chunks(chunk_size).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let outcomes: Vec<_> = chunk.iter().map(|t| cost_tariff(t, summary)).collect();
                // Receiver outlives the scope; a send failure is unreachable.
                let _ = tx.send((chunk_idx * chunk_size, outcomes));
            });
        }
    });
    drop(tx);

    let mut chunks: Vec<(usize, Vec<Result<CostResult, CostError>>)> = rx.iter().collect();
    chunks.sort_by_key(|(start, _)| *start);

    let mut results = Vec::with_capacity(tariffs.len());
    for (_, outcomes) in chunks {
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    report.costed += 1;
                    results.push(result);
                }
                Err(error) => report.record(error),
            }
        }
    }

    BatchOutcome { results, report }
}

/// Worker count matching the machine's available parallelism.
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
