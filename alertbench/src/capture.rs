//! Raw capture files and their normalization into [`Sample`]s.
//!
//! Capture tools disagree on field names (`duration_ms` vs `response_time_ms`,
//! `iteration` vs `trial_index`, ...). Everything funnels through
//! [`CaptureSet::normalize`] before any other code sees the data.

use std::collections::HashSet;
use std::path::Path;

use alertbench_core::{Implementation, PipelineError, Sample};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// The only action the pipeline benchmarks.
pub const BENCHMARKED_ACTION: &str = "create_alert";

/// One measurement as emitted by a capture tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCapture {
    #[serde(default, alias = "iteration", alias = "trial")]
    pub trial_index: Option<i64>,
    #[serde(default, alias = "duration_ms", alias = "elapsed_ms")]
    pub response_time_ms: Option<f64>,
    #[serde(default, alias = "network_requests")]
    pub request_count: Option<i64>,
    #[serde(default, alias = "total_bytes")]
    pub bytes_transferred: Option<i64>,
}

/// All measurements captured for one implementation in one session.
///
/// Set-level `request_count` / `bytes_transferred` are the per-implementation
/// constants and apply to measurements that do not carry their own.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureSet {
    pub implementation: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, alias = "network_requests")]
    pub request_count: Option<i64>,
    #[serde(default, alias = "total_bytes")]
    pub bytes_transferred: Option<i64>,
    #[serde(alias = "samples", alias = "trials")]
    pub measurements: Vec<RawCapture>,
}

fn non_negative(value: Option<i64>, field: &str, context: &str) -> Result<Option<u64>, PipelineError> {
    match value {
        Some(v) if v < 0 => Err(PipelineError::Validation(format!(
            "{context}: {field} must be non-negative, got {v}"
        ))),
        Some(v) => Ok(Some(v as u64)),
        None => Ok(None),
    }
}

impl CaptureSet {
    /// Normalize every measurement into a [`Sample`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] for an unknown implementation or
    /// action, a missing timing field, or a negative value.
    pub fn normalize(&self) -> Result<Vec<Sample>, PipelineError> {
        let implementation: Implementation = self
            .implementation
            .parse()
            .map_err(|e| PipelineError::Validation(format!("{e}")))?;

        if let Some(action) = &self.action {
            if action != BENCHMARKED_ACTION {
                return Err(PipelineError::Validation(format!(
                    "{implementation}: unsupported action '{action}', only '{BENCHMARKED_ACTION}' is benchmarked"
                )));
            }
        }

        let context = implementation.label();
        let default_requests = non_negative(self.request_count, "request_count", context)?;
        let default_bytes = non_negative(self.bytes_transferred, "bytes_transferred", context)?;

        self.measurements
            .iter()
            .enumerate()
            .map(|(position, raw)| {
                let context = format!("{implementation} measurement {}", position + 1);

                let trial_index = match raw.trial_index {
                    Some(t) if t < 1 || t > u32::MAX as i64 => {
                        return Err(PipelineError::Validation(format!(
                            "{context}: trial_index must be between 1 and {}, got {t}",
                            u32::MAX
                        )))
                    }
                    Some(t) => t as u32,
                    None => (position + 1) as u32,
                };

                let response_time_ms = raw.response_time_ms.ok_or_else(|| {
                    PipelineError::Validation(format!("{context}: missing response_time_ms"))
                })?;

                let request_count = non_negative(raw.request_count, "request_count", &context)?
                    .or(default_requests)
                    .unwrap_or(0);
                let bytes_transferred =
                    non_negative(raw.bytes_transferred, "bytes_transferred", &context)?
                        .or(default_bytes)
                        .unwrap_or(0);

                let sample = Sample::new(
                    implementation,
                    trial_index,
                    response_time_ms,
                    request_count,
                    bytes_transferred,
                );
                sample.validate().map_err(PipelineError::Validation)?;
                Ok(sample)
            })
            .collect()
    }
}

/// Decode `document`, naming the JSON path of the offending field on error.
fn decode<T: DeserializeOwned>(document: Value) -> Result<T, String> {
    serde_path_to_error::deserialize(document).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path == "." {
            inner.to_string()
        } else {
            format!("{path}: {inner}")
        }
    })
}

/// Load every capture set from a JSON file holding one set or an array of sets.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be read and
/// [`PipelineError::Validation`] if it is not a valid capture document. The
/// message names the JSON path of a malformed field, e.g.
/// `measurements[0].duration_ms`.
pub fn load_capture_file(path: &Path) -> Result<Vec<CaptureSet>, PipelineError> {
    let content = std::fs::read_to_string(path)?;
    let invalid = |detail: String| PipelineError::Validation(format!("{}: {detail}", path.display()));

    let document: Value = serde_json::from_str(&content)
        .map_err(|e| invalid(format!("not valid JSON: {e}")))?;
    let sets = if document.is_array() {
        decode::<Vec<CaptureSet>>(document)
    } else {
        decode::<CaptureSet>(document).map(|set| vec![set])
    }
    .map_err(invalid)?;

    debug!("Loaded {} capture set(s) from {}", sets.len(), path.display());
    Ok(sets)
}

/// Accumulates the samples of one collection run.
///
/// Append-only; rejects a second sample for the same implementation and trial.
#[derive(Debug, Default)]
pub struct SampleLog {
    samples: Vec<Sample>,
    seen: HashSet<(Implementation, u32)>,
}

impl SampleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample.
    pub fn record(&mut self, sample: Sample) -> Result<(), PipelineError> {
        if !self.seen.insert(sample.key()) {
            return Err(PipelineError::Validation(format!(
                "duplicate trial {} for '{}'",
                sample.trial_index, sample.implementation
            )));
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Normalize a capture set and append its samples. Returns how many were added.
    pub fn ingest(&mut self, set: &CaptureSet) -> Result<usize, PipelineError> {
        let samples = set.normalize()?;
        if samples.is_empty() {
            warn!("Capture set for '{}' has no measurements", set.implementation);
        }
        let added = samples.len();
        for sample in samples {
            self.record(sample)?;
        }
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse_set(json: &str) -> CaptureSet {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_accepts_tool_field_names() {
        let set = parse_set(
            r#"{
                "implementation": "django-htmx",
                "action": "create_alert",
                "measurements": [
                    {"iteration": 1, "duration_ms": 17.2, "network_requests": 1, "total_bytes": 7223, "dns_ms": 0},
                    {"iteration": 2, "duration_ms": 14.3, "network_requests": 1, "total_bytes": 7223, "request_ms": 4.8}
                ]
            }"#,
        );

        let samples = set.normalize().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0],
            Sample::new(Implementation::PartialUpdate, 1, 17.2, 1, 7223)
        );
        assert_eq!(samples[1].trial_index, 2);
    }

    #[test]
    fn test_normalize_accepts_canonical_field_names() {
        let set = parse_set(
            r#"{
                "implementation": "server-rendered",
                "measurements": [
                    {"trial_index": 1, "response_time_ms": 45.5, "request_count": 2, "bytes_transferred": 8500}
                ]
            }"#,
        );
        let samples = set.normalize().unwrap();
        assert_eq!(
            samples[0],
            Sample::new(Implementation::ServerRendered, 1, 45.5, 2, 8500)
        );
    }

    #[test]
    fn test_set_level_constants_apply() {
        let set = parse_set(
            r#"{
                "implementation": "LiveView",
                "request_count": 0,
                "bytes_transferred": 450,
                "measurements": [
                    {"duration_ms": 8.3},
                    {"duration_ms": 8.6, "total_bytes": 460}
                ]
            }"#,
        );
        let samples = set.normalize().unwrap();
        assert_eq!(samples[0].bytes_transferred, 450);
        assert_eq!(samples[0].request_count, 0);
        assert_eq!(samples[1].bytes_transferred, 460);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let set = parse_set(
            r#"{"implementation": "reactor", "measurements": [{"elapsed_ms": 10.4}]}"#,
        );
        let samples = set.normalize().unwrap();
        assert_eq!(samples[0].request_count, 0);
        assert_eq!(samples[0].bytes_transferred, 0);
    }

    #[test]
    fn test_missing_trial_index_uses_position() {
        let set = parse_set(
            r#"{"implementation": "unicorn", "measurements": [{"duration_ms": 12.1}, {"duration_ms": 16.3}]}"#,
        );
        let samples = set.normalize().unwrap();
        assert_eq!(samples[0].trial_index, 1);
        assert_eq!(samples[1].trial_index, 2);
    }

    #[test]
    fn test_missing_timing_is_validation_error() {
        let set = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1, "network_requests": 1}]}"#,
        );
        let err = set.normalize().unwrap_err();
        match err {
            PipelineError::Validation(msg) => {
                assert!(msg.contains("response_time_ms"));
                assert!(msg.contains("partial-update measurement 1"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_time_is_validation_error() {
        let set = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1, "duration_ms": -5}]}"#,
        );
        assert!(matches!(
            set.normalize(),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_count_is_validation_error() {
        let set = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"duration_ms": 5.0, "total_bytes": -1}]}"#,
        );
        assert!(matches!(
            set.normalize(),
            Err(PipelineError::Validation(_))
        ));

        let set = parse_set(
            r#"{"implementation": "htmx", "request_count": -2, "measurements": [{"duration_ms": 5.0}]}"#,
        );
        assert!(matches!(
            set.normalize(),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_trial_index_is_validation_error() {
        let set = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"iteration": 0, "duration_ms": 5.0}]}"#,
        );
        assert!(set.normalize().is_err());
    }

    #[test]
    fn test_unknown_implementation_and_action() {
        let set = parse_set(r#"{"implementation": "blazor", "measurements": []}"#);
        assert!(matches!(
            set.normalize(),
            Err(PipelineError::Validation(_))
        ));

        let set = parse_set(
            r#"{"implementation": "htmx", "action": "delete_alert", "measurements": []}"#,
        );
        let err = set.normalize().unwrap_err();
        assert!(err.to_string().contains("delete_alert"));
    }

    #[test]
    fn test_sample_log_rejects_duplicates() {
        let mut log = SampleLog::new();
        log.record(Sample::new(Implementation::PartialUpdate, 1, 17.2, 1, 7223))
            .unwrap();
        log.record(Sample::new(Implementation::ServerRendered, 1, 45.5, 2, 8500))
            .unwrap();

        let err = log
            .record(Sample::new(Implementation::PartialUpdate, 1, 14.3, 1, 7223))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_sample_log_preserves_order_across_sets() {
        let first = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1, "duration_ms": 17.2}]}"#,
        );
        let second = parse_set(
            r#"{"implementation": "ssr", "measurements": [{"iteration": 1, "duration_ms": 45.5}]}"#,
        );
        let third = parse_set(
            r#"{"implementation": "htmx", "measurements": [{"iteration": 2, "duration_ms": 14.3}]}"#,
        );

        let mut log = SampleLog::new();
        assert_eq!(log.ingest(&first).unwrap(), 1);
        assert_eq!(log.ingest(&second).unwrap(), 1);
        assert_eq!(log.ingest(&third).unwrap(), 1);

        let order: Vec<(Implementation, u32)> = log.samples().iter().map(|s| s.key()).collect();
        assert_eq!(
            order,
            vec![
                (Implementation::PartialUpdate, 1),
                (Implementation::ServerRendered, 1),
                (Implementation::PartialUpdate, 2),
            ]
        );
    }

    #[test]
    fn test_load_single_and_array_documents() {
        let mut single = NamedTempFile::new().unwrap();
        single
            .write_all(br#"{"implementation": "htmx", "measurements": [{"duration_ms": 1.0}]}"#)
            .unwrap();
        assert_eq!(load_capture_file(single.path()).unwrap().len(), 1);

        let mut many = NamedTempFile::new().unwrap();
        many.write_all(
            br#"[
                {"implementation": "htmx", "measurements": [{"duration_ms": 1.0}]},
                {"implementation": "ssr", "measurements": [{"duration_ms": 2.0}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(load_capture_file(many.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_load_invalid_document() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json at all").unwrap();
        assert!(matches!(
            load_capture_file(file.path()),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_load_names_malformed_field() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"implementation": "htmx", "measurements": [{"iteration": 1, "duration_ms": "fast"}]}"#,
        )
        .unwrap();

        match load_capture_file(file.path()).unwrap_err() {
            PipelineError::Validation(msg) => {
                assert!(msg.contains("measurements[0].duration_ms"), "{msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_names_set_in_array() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"implementation": "htmx", "measurements": [{"duration_ms": 1.0}]},
                {"implementation": "ssr", "measurements": [{"duration_ms": 2.0}, {"total_bytes": "lots"}]}
            ]"#,
        )
        .unwrap();

        let err = load_capture_file(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("[1].measurements[1].total_bytes"),
            "{err}"
        );
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_capture_file(Path::new("/nonexistent/capture.json")),
            Err(PipelineError::Io(_))
        ));
    }
}
