//! The two batch steps: collect captures into a table, report on a table.
//!
//! Each step validates everything before touching its outputs, so a failed
//! run leaves earlier results in place.

use std::path::{Path, PathBuf};

use alertbench_core::{
    group_by_implementation, read_table, write_table, ChartOptions, ChartReporter,
    ImplementationReport, JsonReporter, PipelineError, Reporter, Sample, Summarizer,
    TerminalReporter,
};
use log::{debug, info};

use crate::capture::{load_capture_file, SampleLog};
use crate::config::ReportConfig;

/// What a successful collect run produced.
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    pub output: PathBuf,
    pub samples: Vec<Sample>,
}

/// Normalize every capture file and write the results table.
///
/// # Errors
///
/// Returns [`PipelineError::Validation`] for invalid captures or when no
/// samples were captured at all, and [`PipelineError::Io`] if a capture
/// cannot be read or the table cannot be written. Nothing is written on error.
pub fn collect(captures: &[PathBuf], output: &Path) -> Result<CollectOutcome, PipelineError> {
    let mut log = SampleLog::new();

    for path in captures {
        for set in load_capture_file(path)? {
            let added = log.ingest(&set)?;
            debug!(
                "{}: {} sample(s) for '{}'",
                path.display(),
                added,
                set.implementation
            );
        }
    }

    if log.is_empty() {
        return Err(PipelineError::Validation(
            "capture files contain no measurements".to_string(),
        ));
    }

    let samples = log.into_samples();
    write_table(output, &samples)?;

    info!("Results saved to: {}", output.display());
    info!("Total measurements: {}", samples.len());
    for (implementation, group) in group_by_implementation(&samples) {
        let mean = group.iter().map(|s| s.response_time_ms).sum::<f64>() / group.len() as f64;
        info!("  {:<20} {:>8.2} ms avg", implementation.label(), mean);
    }

    Ok(CollectOutcome {
        output: output.to_path_buf(),
        samples,
    })
}

/// How summary statistics are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Table,
    Json,
    None,
}

/// What a successful report run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub results: Vec<ImplementationReport>,
    pub charts: Vec<PathBuf>,
}

/// Summarize the table, print the statistics and render the charts.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyDataset`], [`PipelineError::MissingImplementation`],
/// [`PipelineError::InconsistentData`] or [`PipelineError::Validation`] before any
/// image is written, and [`PipelineError::Io`] / [`PipelineError::Render`] if
/// writing the images fails.
pub fn report(
    config: &ReportConfig,
    charts: &ChartOptions,
    format: SummaryFormat,
) -> Result<ReportOutcome, PipelineError> {
    let results = summarize(config)?;

    match format {
        SummaryFormat::Table if config.color => TerminalReporter::new().report(&results)?,
        SummaryFormat::Table => TerminalReporter::without_colors().report(&results)?,
        SummaryFormat::Json => JsonReporter::new().report(&results)?,
        SummaryFormat::None => {}
    }

    let chart_reporter = ChartReporter::new(&config.output_dir, charts.clone());
    info!("Generating charts in {}", chart_reporter.output_dir().display());
    let written = chart_reporter.render_all(&results)?;
    info!("All {} charts generated", written.len());

    Ok(ReportOutcome {
        results,
        charts: written,
    })
}

/// Read and validate the table, returning per-implementation results.
pub fn summarize(config: &ReportConfig) -> Result<Vec<ImplementationReport>, PipelineError> {
    info!("Loading data from: {}", config.input.display());
    let samples = read_table(&config.input)?;
    debug!("Read {} samples", samples.len());

    let summarizer = Summarizer::new(
        config.expected_implementations.clone(),
        config.consistency_tolerance,
    );
    summarizer.summarize(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertbench_core::Implementation;
    use tempfile::TempDir;

    fn write_capture(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_collect_counts_all_records() {
        let dir = TempDir::new().unwrap();
        let htmx = write_capture(
            dir.path(),
            "htmx.json",
            r#"{"implementation": "htmx", "measurements": [{"duration_ms": 17.2}, {"duration_ms": 14.3}]}"#,
        );
        let others = write_capture(
            dir.path(),
            "others.json",
            r#"[
                {"implementation": "ssr", "request_count": 2, "measurements": [{"duration_ms": 45.5}]},
                {"implementation": "liveview", "measurements": [{"duration_ms": 8.3}, {"duration_ms": 8.6}, {"duration_ms": 8.9}]}
            ]"#,
        );
        let output = dir.path().join("results.csv");

        let outcome = collect(&[htmx, others], &output).unwrap();
        assert_eq!(outcome.samples.len(), 6);

        let table = read_table(&output).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table, outcome.samples);
    }

    #[test]
    fn test_collect_negative_time_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let capture = write_capture(
            dir.path(),
            "bad.json",
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1, "response_time_ms": -5}]}"#,
        );
        let output = dir.path().join("results.csv");

        let err = collect(&[capture], &output).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_collect_failure_keeps_previous_table() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("results.csv");
        std::fs::write(&output, "previous run\n").unwrap();

        let capture = write_capture(
            dir.path(),
            "bad.json",
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1}]}"#,
        );
        assert!(collect(&[capture], &output).is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run\n");
    }

    #[test]
    fn test_collect_duplicate_across_files() {
        let dir = TempDir::new().unwrap();
        let a = write_capture(
            dir.path(),
            "a.json",
            r#"{"implementation": "htmx", "measurements": [{"iteration": 1, "duration_ms": 17.2}]}"#,
        );
        let b = write_capture(
            dir.path(),
            "b.json",
            r#"{"implementation": "django-htmx", "measurements": [{"iteration": 1, "duration_ms": 14.3}]}"#,
        );
        let output = dir.path().join("results.csv");

        assert!(matches!(
            collect(&[a, b], &output),
            Err(PipelineError::Validation(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_collect_no_measurements() {
        let dir = TempDir::new().unwrap();
        let capture = write_capture(
            dir.path(),
            "empty.json",
            r#"{"implementation": "htmx", "measurements": []}"#,
        );
        let output = dir.path().join("results.csv");

        assert!(matches!(
            collect(&[capture], &output),
            Err(PipelineError::Validation(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_collect_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let capture = write_capture(
            dir.path(),
            "ok.json",
            r#"{"implementation": "htmx", "measurements": [{"duration_ms": 17.2}]}"#,
        );
        let output = dir.path().join("no-such-dir").join("results.csv");

        assert!(matches!(
            collect(&[capture], &output),
            Err(PipelineError::Io(_))
        ));
    }

    #[test]
    fn test_report_empty_table_writes_no_images() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("results.csv");
        std::fs::write(
            &input,
            "implementation,trial_index,response_time_ms,request_count,bytes_transferred\n",
        )
        .unwrap();

        let config = ReportConfig {
            input,
            output_dir: dir.path().join("plots"),
            ..ReportConfig::default()
        };

        let err = report(&config, &ChartOptions::default(), SummaryFormat::None).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_report_missing_implementation_writes_no_images() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("results.csv");
        std::fs::write(
            &input,
            "implementation,trial_index,response_time_ms,request_count,bytes_transferred\n\
             partial-update,1,17.2,1,7223\n",
        )
        .unwrap();

        let config = ReportConfig {
            input,
            output_dir: dir.path().join("plots"),
            ..ReportConfig::default()
        };

        let err = report(&config, &ChartOptions::default(), SummaryFormat::None).unwrap_err();
        assert!(matches!(err, PipelineError::MissingImplementation { .. }));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_report_writes_every_chart() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("results.csv");
        std::fs::write(
            &input,
            "implementation,trial_index,response_time_ms,request_count,bytes_transferred\n\
             partial-update,1,17.2,1,7223\n\
             server-rendered,1,45.5,2,8500\n\
             partial-update,2,14.3,1,7223\n",
        )
        .unwrap();

        let config = ReportConfig {
            input,
            output_dir: dir.path().join("plots"),
            expected_implementations: vec![
                Implementation::PartialUpdate,
                Implementation::ServerRendered,
            ],
            ..ReportConfig::default()
        };
        let charts = ChartOptions::default();

        let outcome = match report(&config, &charts, SummaryFormat::None) {
            Ok(outcome) => outcome,
            // Text rendering needs a system sans-serif font.
            Err(PipelineError::Render(msg)) => {
                eprintln!("skipping chart check, no usable font: {msg}");
                return;
            }
            Err(other) => panic!("report failed: {other}"),
        };

        assert_eq!(outcome.results.len(), 2);
        let expected = ChartReporter::new(&config.output_dir, charts).chart_paths();
        assert_eq!(outcome.charts, expected);
        assert!(outcome
            .charts
            .contains(&config.output_dir.join("distribution.png")));
        for path in &outcome.charts {
            assert!(path.is_file(), "{} was not written", path.display());
        }
    }

    #[test]
    fn test_summarize_does_not_touch_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("results.csv");
        let contents = "implementation,trial_index,response_time_ms,request_count,bytes_transferred\n\
                        partial-update,1,10.0,1,100\n\
                        server-rendered,1,20.0,2,200\n\
                        partial-update,2,12.0,1,100\n";
        std::fs::write(&input, contents).unwrap();

        let config = ReportConfig {
            input: input.clone(),
            expected_implementations: vec![
                Implementation::PartialUpdate,
                Implementation::ServerRendered,
            ],
            ..ReportConfig::default()
        };

        let first = summarize(&config).unwrap();
        let second = summarize(&config).unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&input).unwrap(), contents);
    }
}
