//! Error taxonomy shared by every component.

use thiserror::Error;

use crate::types::{Offset, PartitionId};

/// Errors raised by the channel, the window table and the processing loops.
///
/// Only [`Error::Configuration`] and a consumer that cannot subscribe are fatal;
/// everything else is contained where it happens and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid parameters, detected before the pipeline starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A write arrived for a window that has already been evicted (or would be
    /// evicted immediately).
    #[error("stale write ignored in table {table}: window {index} is below the live floor {floor}")]
    StaleWriteIgnored {
        table: String,
        index: i64,
        floor: i64,
    },

    /// A payload could not be decoded.
    #[error("decode error at partition {partition} offset {offset}: {reason}")]
    Decode {
        partition: PartitionId,
        offset: Offset,
        reason: String,
    },

    /// The transport rejected an operation (closed topic, missing topic, full queue...).
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
}

impl Error {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::TransportUnavailable(reason.into())
    }

    /// Whether the error should abort startup rather than be logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_errors_are_fatal() {
        assert!(Error::configuration("bad").is_fatal());
        assert!(!Error::transport("closed").is_fatal());
        assert!(!Error::StaleWriteIgnored {
            table: "t".into(),
            index: 0,
            floor: 1
        }
        .is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Decode {
            partition: 2,
            offset: 7,
            reason: "invalid utf-8".into(),
        };
        assert_eq!(
            err.to_string(),
            "decode error at partition 2 offset 7: invalid utf-8"
        );
    }
}
