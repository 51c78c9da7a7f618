//! The CSV table handed from the collector to the reporter.
//!
//! Layout: a header row `implementation,trial_index,response_time_ms,request_count,bytes_transferred`
//! followed by one newline-terminated row per [`Sample`].

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::PipelineError;
use crate::sample::Sample;

/// Column names in table order.
pub const TABLE_HEADER: [&str; 5] = [
    "implementation",
    "trial_index",
    "response_time_ms",
    "request_count",
    "bytes_transferred",
];

/// Write samples to `path`, replacing any existing file atomically.
///
/// The rows go to a temporary file next to `path` which is renamed over the
/// target only once fully written, so a failed run leaves the old file intact.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the directory is not writable or the
/// rename fails.
pub fn write_table(path: &Path, samples: &[Sample]) -> Result<(), PipelineError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_samples(&mut tmp, samples)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

    debug!("Wrote {} rows to {}", samples.len(), path.display());
    Ok(())
}

/// Serialize samples, header first, to any writer.
pub fn write_samples<W: Write>(writer: W, samples: &[Sample]) -> Result<(), PipelineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(TABLE_HEADER)?;
    for sample in samples {
        csv_writer.serialize(sample)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Read and validate the table at `path`.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be opened and
/// [`PipelineError::Validation`] for a wrong header or a malformed row.
pub fn read_table(path: &Path) -> Result<Vec<Sample>, PipelineError> {
    let file = std::fs::File::open(path)?;
    read_samples(file)
}

/// Parse samples from any reader.
///
/// A completely empty input yields no samples; deciding whether that is an
/// error is left to the caller.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !headers.iter().eq(TABLE_HEADER) {
        return Err(PipelineError::validation(format!(
            "unexpected table header '{}', expected '{}'",
            headers.iter().collect::<Vec<_>>().join(","),
            TABLE_HEADER.join(",")
        )));
    }

    let mut samples = Vec::new();
    let mut seen = HashSet::new();
    for (idx, record) in csv_reader.deserialize::<Sample>().enumerate() {
        let row = idx + 1;
        let sample = record.map_err(|e| match PipelineError::from(e) {
            PipelineError::Validation(msg) => {
                PipelineError::validation(format!("row {row}: {msg}"))
            }
            other => other,
        })?;

        sample
            .validate()
            .map_err(|msg| PipelineError::validation(format!("row {row}: {msg}")))?;

        if !seen.insert(sample.key()) {
            return Err(PipelineError::validation(format!(
                "row {row}: duplicate trial {} for '{}'",
                sample.trial_index, sample.implementation
            )));
        }
        samples.push(sample);
    }

    Ok(samples)
}
