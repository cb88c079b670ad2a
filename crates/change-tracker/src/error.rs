/// Tracker error types.
use std::fmt;

use thiserror::Error;

/// Host capability that failed while the tracker was using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOperation {
    DetectProperties,
    DeleteRecord,
    ReincarnateRecord,
}

impl fmt::Display for AdapterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DetectProperties => "detect properties",
            Self::DeleteRecord => "delete record",
            Self::ReincarnateRecord => "reincarnate record",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during change tracking.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// `undo` was called with an empty undo stack.
    #[error("nothing to undo")]
    NothingToUndo,

    /// `redo` was called with an empty redo stack.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The host's record adapter reported a failure.
    #[error("record adapter failed to {operation}")]
    Adapter {
        operation: AdapterOperation,
        #[source]
        source: anyhow::Error,
    },

    /// Writing a captured value back onto a record failed.
    #[error("failed to restore property `{property}`")]
    Restore {
        property: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TrackerError {
    pub(crate) fn adapter(operation: AdapterOperation, source: anyhow::Error) -> Self {
        Self::Adapter { operation, source }
    }
}

/// Result alias used throughout the tracker.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_names_operation() {
        let err = TrackerError::adapter(
            AdapterOperation::ReincarnateRecord,
            anyhow::anyhow!("store is closed"),
        );
        assert_eq!(err.to_string(), "record adapter failed to reincarnate record");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "store is closed");
    }

    #[test]
    fn test_empty_stack_messages() {
        assert_eq!(TrackerError::NothingToUndo.to_string(), "nothing to undo");
        assert_eq!(TrackerError::NothingToRedo.to_string(), "nothing to redo");
    }
}
