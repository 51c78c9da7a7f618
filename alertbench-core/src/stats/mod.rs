use serde::Serialize;

use crate::sample::Implementation;

/// Per-implementation aggregate over all of its samples.
///
/// Derived on every report run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStat {
    pub implementation: Implementation,
    pub count: usize,
    pub mean_ms: f64,
    /// Sample standard deviation (n-1 denominator), 0 for a single sample.
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
    /// Requests per action, constant within the group.
    pub request_count: u64,
    /// Bytes per action, constant within the group.
    pub bytes_transferred: u64,
}

/// One point on the stability chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialPoint {
    pub trial_index: u32,
    pub response_time_ms: f64,
}

/// Everything the reporters need to know about one implementation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplementationReport {
    pub summary: SummaryStat,
    /// Trials ordered by trial index.
    pub trials: Vec<TrialPoint>,
}

mod summary;
pub use summary::{group_by_implementation, Summarizer};
