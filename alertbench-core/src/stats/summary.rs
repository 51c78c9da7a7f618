use statrs::statistics::{Data, OrderStatistics, Statistics};

use super::{ImplementationReport, SummaryStat, TrialPoint};
use crate::error::PipelineError;
use crate::sample::{Implementation, Sample};

/// Group samples by implementation, preserving first-seen order.
///
/// That order is the category order on every chart.
pub fn group_by_implementation(samples: &[Sample]) -> Vec<(Implementation, Vec<&Sample>)> {
    let mut groups: Vec<(Implementation, Vec<&Sample>)> = Vec::new();
    for sample in samples {
        match groups
            .iter_mut()
            .find(|(implementation, _)| *implementation == sample.implementation)
        {
            Some((_, group)) => group.push(sample),
            None => groups.push((sample.implementation, vec![sample])),
        }
    }
    groups
}

/// Validates a dataset and derives per-implementation statistics.
#[derive(Debug, Clone)]
pub struct Summarizer {
    /// Implementations that must be present.
    pub expected: Vec<Implementation>,
    /// Allowed relative deviation of the per-implementation constants.
    ///
    /// Relative to the group's first value, so a group whose first value is
    /// 0 admits no deviation at any tolerance.
    pub consistency_tolerance: f64,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self {
            expected: Implementation::ALL.to_vec(),
            consistency_tolerance: 0.0,
        }
    }
}

impl Summarizer {
    pub fn new(expected: Vec<Implementation>, consistency_tolerance: f64) -> Self {
        Self {
            expected,
            consistency_tolerance: consistency_tolerance.max(0.0),
        }
    }

    /// Summarize `samples`, one report per implementation in first-seen order.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::EmptyDataset`] if `samples` is empty.
    /// * [`PipelineError::MissingImplementation`] if an expected implementation is absent.
    /// * [`PipelineError::InconsistentData`] if request count or bytes transferred
    ///   vary within a group beyond the tolerance.
    pub fn summarize(&self, samples: &[Sample]) -> Result<Vec<ImplementationReport>, PipelineError> {
        if samples.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let groups = group_by_implementation(samples);

        let mut missing: Vec<Implementation> = Vec::new();
        for expected in &self.expected {
            let present = groups.iter().any(|(implementation, _)| implementation == expected);
            if !present && !missing.contains(expected) {
                missing.push(*expected);
            }
        }
        if !missing.is_empty() {
            let mut expected = self.expected.clone();
            expected.sort();
            expected.dedup();
            return Err(PipelineError::MissingImplementation {
                missing,
                expected: expected.len(),
                found: groups.len(),
            });
        }

        groups
            .into_iter()
            .map(|(implementation, group)| self.summarize_group(implementation, &group))
            .collect()
    }

    fn summarize_group(
        &self,
        implementation: Implementation,
        group: &[&Sample],
    ) -> Result<ImplementationReport, PipelineError> {
        let request_count = self.constant_field(implementation, "request_count", group, |s| {
            s.request_count
        })?;
        let bytes_transferred =
            self.constant_field(implementation, "bytes_transferred", group, |s| {
                s.bytes_transferred
            })?;

        let times: Vec<f64> = group.iter().map(|s| s.response_time_ms).collect();
        let count = times.len();
        let mean_ms = Statistics::mean(&times);
        let std_dev_ms = if count < 2 {
            0.0
        } else {
            Statistics::std_dev(&times)
        };
        let min_ms = Statistics::min(&times);
        let max_ms = Statistics::max(&times);
        let median_ms = Data::new(times.clone()).median();

        let mut trials: Vec<TrialPoint> = group
            .iter()
            .map(|s| TrialPoint {
                trial_index: s.trial_index,
                response_time_ms: s.response_time_ms,
            })
            .collect();
        trials.sort_by_key(|point| point.trial_index);

        Ok(ImplementationReport {
            summary: SummaryStat {
                implementation,
                count,
                mean_ms,
                std_dev_ms,
                min_ms,
                max_ms,
                median_ms,
                request_count,
                bytes_transferred,
            },
            trials,
        })
    }

    /// Value of a field that must not vary within a group; the first-seen value wins.
    fn constant_field(
        &self,
        implementation: Implementation,
        field: &'static str,
        group: &[&Sample],
        value: impl Fn(&Sample) -> u64,
    ) -> Result<u64, PipelineError> {
        let first = group[0];
        let expected = value(first);
        let allowed = expected as f64 * self.consistency_tolerance;

        for sample in &group[1..] {
            let found = value(sample);
            let deviation = (found as f64 - expected as f64).abs();
            if deviation > allowed {
                return Err(PipelineError::InconsistentData {
                    implementation,
                    field,
                    expected,
                    found,
                    first_trial: first.trial_index,
                    trial_index: sample.trial_index,
                });
            }
        }
        Ok(expected)
    }
}
