use thiserror::Error;

use crate::sample::Implementation;

/// Errors raised by the collect and report pipeline.
///
/// Every variant is terminal for the invocation that raised it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed, missing or negative input fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A field expected to be deterministic per implementation varies within its group.
    #[error(
        "Inconsistent data for '{implementation}': {field} is {expected} at trial {first_trial} \
         but {found} at trial {trial_index}"
    )]
    InconsistentData {
        implementation: Implementation,
        field: &'static str,
        expected: u64,
        found: u64,
        first_trial: u32,
        trial_index: u32,
    },

    /// The table contains no data rows.
    #[error("Dataset is empty: no samples to report on")]
    EmptyDataset,

    /// Fewer distinct implementations than expected are present.
    #[error("Missing implementations: expected {expected} distinct, found {found}; missing {}", format_labels(.missing))]
    MissingImplementation {
        missing: Vec<Implementation>,
        expected: usize,
        found: usize,
    },

    /// The chart backend failed to draw or encode an image.
    #[error("Failed to render chart: {0}")]
    Render(String),
}

impl PipelineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return PipelineError::Validation(err.to_string());
        }
        match err.into_kind() {
            csv::ErrorKind::Io(io) => PipelineError::Io(io),
            kind => PipelineError::Validation(format!("{kind:?}")),
        }
    }
}

fn format_labels(labels: &[Implementation]) -> String {
    labels
        .iter()
        .map(|label| label.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_implementation_message_names_labels() {
        let err = PipelineError::MissingImplementation {
            missing: vec![Implementation::ServerRendered, Implementation::BroadcastPush],
            expected: 5,
            found: 3,
        };
        let message = err.to_string();
        assert!(message.contains("expected 5"));
        assert!(message.contains("found 3"));
        assert!(message.contains("server-rendered, broadcast-push"));
    }

    #[test]
    fn test_inconsistent_data_message_names_group_and_field() {
        let err = PipelineError::InconsistentData {
            implementation: Implementation::PartialUpdate,
            field: "bytes_transferred",
            expected: 7223,
            found: 15001,
            first_trial: 1,
            trial_index: 2,
        };
        let message = err.to_string();
        assert!(message.contains("partial-update"));
        assert!(message.contains("bytes_transferred"));
        assert!(message.contains("15001"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
