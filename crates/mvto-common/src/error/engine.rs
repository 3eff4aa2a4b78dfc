//! Engine error types.

use thiserror::Error;

use crate::types::{ItemId, Tid};

/// A write rejected by the MVTO write rule.
///
/// Transaction `reader` already read version `read_version` of `item`, and
/// `read_version < writer < reader`. Installing the write now would mean the
/// reader should have seen it, so the writer must abort and retry under a
/// fresh timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("write of {item} at {writer} rejected: version {read_version} already read by {reader}")]
pub struct OrderViolation {
    /// The item the write targeted.
    pub item: ItemId,
    /// Timestamp of the rejected writer.
    pub writer: Tid,
    /// The older version that was read.
    pub read_version: Tid,
    /// The largest timestamp that read `read_version`.
    pub reader: Tid,
}

/// Errors a driver of the MVTO engine can observe.
///
/// Order violations are not part of this enum: they are resolved by
/// abort-and-retry inside the transaction executor.
#[derive(Debug, Error)]
pub enum MvtoError {
    // ==========================================================================
    // Fatal Errors
    // ==========================================================================
    /// A read could not resolve a version. Signals a broken engine invariant.
    #[error("consistency fault on {item} at {tid}: {reason}")]
    ConsistencyFault {
        /// The item being read.
        item: ItemId,
        /// The reader's timestamp.
        tid: Tid,
        /// What was found missing.
        reason: String,
    },

    /// A diagnostics snapshot does not satisfy the item invariants.
    #[error("invariant violated on {item}: {reason}")]
    InvariantViolation {
        /// The offending item.
        item: ItemId,
        /// Description of the violation.
        reason: String,
    },

    /// A worker thread panicked while running transactions.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
    },

    // ==========================================================================
    // Contract Violations
    // ==========================================================================
    /// A step referenced an item the store does not hold.
    #[error("unknown data item: {0}")]
    UnknownItem(ItemId),

    /// A timestamp was released that is not in flight.
    #[error("timestamp {0} is not active")]
    TimestampNotActive(Tid),

    // ==========================================================================
    // Runtime Errors
    // ==========================================================================
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker {worker}: {reason}")]
    WorkerSpawn {
        /// Index of the worker.
        worker: usize,
        /// The underlying I/O error.
        reason: String,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MvtoError {
    /// Creates a consistency fault.
    pub fn consistency_fault(item: ItemId, tid: Tid, reason: impl Into<String>) -> Self {
        Self::ConsistencyFault {
            item,
            tid,
            reason: reason.into(),
        }
    }

    /// Creates an invariant violation.
    pub fn invariant_violation(item: ItemId, reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            item,
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Returns true if this error indicates a bug in the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConsistencyFault { .. } | Self::InvariantViolation { .. } | Self::WorkerPanicked { .. }
        )
    }

    /// Returns true if the caller broke the engine's calling contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnknownItem(_) | Self::TimestampNotActive(_))
    }
}

impl From<toml::de::Error> for MvtoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MvtoError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for MvtoError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = MvtoError::consistency_fault(ItemId::new(1), Tid::new(5), "no version <= 5");
        assert!(err.is_fatal());
        assert!(!err.is_contract_violation());

        let err = MvtoError::UnknownItem(ItemId::new(9));
        assert!(err.is_contract_violation());
        assert!(!err.is_fatal());

        let err = MvtoError::TimestampNotActive(Tid::new(3));
        assert!(err.is_contract_violation());

        let err = MvtoError::config("threads must be positive");
        assert!(!err.is_fatal());
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_error_display() {
        let err = MvtoError::consistency_fault(ItemId::new(2), Tid::new(40), "missing");
        let msg = format!("{}", err);
        assert!(msg.contains("x2"));
        assert!(msg.contains("40"));

        let violation = OrderViolation {
            item: ItemId::new(0),
            writer: Tid::new(5),
            read_version: Tid::new(3),
            reader: Tid::new(8),
        };
        let msg = format!("{}", violation);
        assert!(msg.contains("at 5"));
        assert!(msg.contains("version 3"));
        assert!(msg.contains("by 8"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err: MvtoError = io_err.into();
        assert!(matches!(err, MvtoError::Config(_)));
    }
}
