use std::io::{self, Write};

use super::Reporter;
use crate::error::PipelineError;
use crate::stats::{ImplementationReport, SummaryStat};

/// Prints summary statistics as pretty JSON on stdout.
#[derive(Debug, Clone, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    fn write_report(
        &self,
        writer: &mut impl Write,
        results: &[ImplementationReport],
    ) -> Result<(), PipelineError> {
        let summaries: Vec<&SummaryStat> = results.iter().map(|r| &r.summary).collect();
        serde_json::to_writer_pretty(&mut *writer, &summaries)
            .map_err(|e| PipelineError::Io(e.into()))?;
        writeln!(writer)?;
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn report(&self, results: &[ImplementationReport]) -> Result<(), PipelineError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_report(&mut writer, results)
    }
}
