//! Core types for alertbench.
//!
//! This crate holds what both halves of the pipeline agree on: the sample
//! model, the CSV table format between collector and reporter, summary
//! statistics, and the reporters that render them.

pub mod error;
pub mod report;
pub mod sample;
pub mod stats;
pub mod table;

// Re-export main types for convenience
pub use error::PipelineError;
pub use report::{
    BarSeries, ChartKind, ChartOptions, ChartReporter, JsonReporter, Reporter, TerminalReporter,
};
pub use sample::{Implementation, ParseImplementationError, Sample};
pub use stats::{
    group_by_implementation, ImplementationReport, Summarizer, SummaryStat, TrialPoint,
};
pub use table::{read_samples, read_table, write_samples, write_table, TABLE_HEADER};
