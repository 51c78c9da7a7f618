//! alertbench: compile and chart create-alert timings
//!
//! This library turns manually captured timings of the create-alert action,
//! measured once per interactivity approach, into a results table and a set
//! of comparison charts.

pub mod capture;
pub mod cli;
pub mod config;
pub mod pipeline;

// Re-export core types for convenience
pub use alertbench_core::{
    ChartKind, ChartOptions, ChartReporter, Implementation, ImplementationReport, JsonReporter,
    PipelineError, Reporter, Sample, Summarizer, SummaryStat, TerminalReporter,
};

// Re-export main types from this crate
pub use capture::{load_capture_file, CaptureSet, RawCapture, SampleLog};
pub use cli::{Cli, Command};
pub use config::Config;
pub use pipeline::{collect, report, summarize, CollectOutcome, ReportOutcome, SummaryFormat};
