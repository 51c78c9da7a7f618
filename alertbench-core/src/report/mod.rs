use crate::error::PipelineError;
use crate::stats::ImplementationReport;

/// A sink for per-implementation results.
pub trait Reporter: Send + Sync {
    fn report(&self, results: &[ImplementationReport]) -> Result<(), PipelineError>;
}

mod chart;
mod json;
mod terminal;
pub use chart::{
    Bar, BarSeries, ChartKind, ChartOptions, ChartReporter, DistributionBox, DistributionSeries,
};
pub use json::JsonReporter;
pub use terminal::TerminalReporter;
