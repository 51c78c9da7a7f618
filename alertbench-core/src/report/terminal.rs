use std::io::{self, Write};

use colored::Colorize;

use super::Reporter;
use crate::error::PipelineError;
use crate::stats::ImplementationReport;

const RULE_WIDTH: usize = 126;

/// A reporter that prints per-implementation statistics as a terminal table.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

/// Where a row ranks by mean response time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rank {
    Fastest,
    Slowest,
    Middle,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Format a duration in milliseconds to a human-readable string.
    fn format_time(ms: f64) -> String {
        if ms >= 1_000.0 {
            format!("{:.3} s", ms / 1_000.0)
        } else if ms >= 1.0 {
            format!("{:.2} ms", ms)
        } else {
            format!("{:.1} us", ms * 1_000.0)
        }
    }

    /// Format a byte count to a human-readable string.
    fn format_bytes(bytes: u64) -> String {
        if bytes >= 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else if bytes >= 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{} B", bytes)
        }
    }

    fn rank(results: &[ImplementationReport], index: usize) -> Rank {
        if results.len() < 2 {
            return Rank::Middle;
        }
        let mean = results[index].summary.mean_ms;
        let fastest = results
            .iter()
            .map(|r| r.summary.mean_ms)
            .fold(f64::INFINITY, f64::min);
        let slowest = results
            .iter()
            .map(|r| r.summary.mean_ms)
            .fold(f64::NEG_INFINITY, f64::max);

        if mean == fastest {
            Rank::Fastest
        } else if mean == slowest {
            Rank::Slowest
        } else {
            Rank::Middle
        }
    }

    fn paint(&self, text: String, rank: Rank) -> String {
        if !self.use_colors {
            return text;
        }
        match rank {
            Rank::Fastest => text.green().bold().to_string(),
            Rank::Slowest => text.red().to_string(),
            Rank::Middle => text,
        }
    }

    /// Print the table header.
    fn print_header(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer)?;
        let header = format!(
            "{:<22} {:<16} {:>7} {:>22} {:>11} {:>22} {:>9} {:>10}",
            "Implementation", "Transport", "Samples", "Mean", "Median", "Range", "Requests", "Transfer"
        );
        if self.use_colors {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Print a single implementation row.
    fn print_row(
        &self,
        writer: &mut impl Write,
        result: &ImplementationReport,
        rank: Rank,
    ) -> io::Result<()> {
        let summary = &result.summary;
        let mean = format!(
            "{} (+/- {})",
            Self::format_time(summary.mean_ms),
            Self::format_time(summary.std_dev_ms)
        );
        let range = format!(
            "[{}, {}]",
            Self::format_time(summary.min_ms),
            Self::format_time(summary.max_ms)
        );

        // Pad before painting so ANSI escapes do not break alignment.
        let mean = self.paint(format!("{:>22}", mean), rank);

        writeln!(
            writer,
            "{:<22} {:<16} {:>7} {} {:>11} {:>22} {:>9} {:>10}",
            summary.implementation.label(),
            summary.implementation.transport(),
            summary.count,
            mean,
            Self::format_time(summary.median_ms),
            range,
            summary.request_count,
            Self::format_bytes(summary.bytes_transferred),
        )?;
        Ok(())
    }

    /// Print the summary footer.
    fn print_summary(
        &self,
        writer: &mut impl Write,
        results: &[ImplementationReport],
    ) -> io::Result<()> {
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;

        let total: usize = results.iter().map(|r| r.summary.count).sum();
        let summary_label = "Summary:";
        if self.use_colors {
            write!(writer, "{} ", summary_label.bold())?;
        } else {
            write!(writer, "{} ", summary_label)?;
        }
        write!(
            writer,
            "{} samples across {} implementations",
            total,
            results.len()
        )?;

        let fastest = results.iter().min_by(|a, b| {
            a.summary
                .mean_ms
                .total_cmp(&b.summary.mean_ms)
        });
        if let (Some(fastest), true) = (fastest, results.len() > 1) {
            let text = format!(
                "fastest: {} ({})",
                fastest.summary.implementation,
                Self::format_time(fastest.summary.mean_ms)
            );
            write!(writer, ", {}", self.paint(text, Rank::Fastest))?;
        }
        writeln!(writer)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_report(
        &self,
        writer: &mut impl Write,
        results: &[ImplementationReport],
    ) -> io::Result<()> {
        self.print_header(writer)?;
        for (index, result) in results.iter().enumerate() {
            self.print_row(writer, result, Self::rank(results, index))?;
        }
        self.print_summary(writer, results)
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, results: &[ImplementationReport]) -> Result<(), PipelineError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.write_report(&mut writer, results)?;
        Ok(())
    }
}
