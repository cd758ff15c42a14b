//! Error types for QLAB
//!
//! Gantree: L0_Foundation → Errors
//!
//! Every failure of a single simulation request is reported through
//! [`QlabError`]. Nothing here is process-wide; an error never leaves
//! shared state behind.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for QLAB
/// Gantree: QlabError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QlabError {
    // ========================================================================
    // Qubit / Register Errors
    // ========================================================================
    /// Qubit index out of range
    /// Gantree: QubitOutOfRange{{q,n}} // 큐비트 범위
    #[error("Qubit {qubit} out of range: register has {num_qubits} qubits")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    /// Same qubit referenced twice by one operation
    /// Gantree: DuplicateQubit(q) // 중복 큐비트
    #[error("Qubit {0} referenced more than once by the same operation")]
    DuplicateQubit(usize),

    /// Classical bit index out of range
    #[error("Classical bit {clbit} out of range: register has {num_clbits} bits")]
    ClbitOutOfRange { clbit: usize, num_clbits: usize },

    /// Dense representation would be too large
    #[error("{kind} with {qubits} qubits exceeds the supported maximum of {max}")]
    QubitLimitExceeded {
        kind: &'static str,
        qubits: usize,
        max: usize,
    },

    // ========================================================================
    // Dimension Errors
    // ========================================================================
    /// Incompatible register or operator sizes
    /// Gantree: Dimension{{expected,found}} // 차원 오류
    #[error("Dimension error: expected {expected}, found {found} ({context})")]
    Dimension {
        expected: usize,
        found: usize,
        context: String,
    },

    /// Two states of different dimension compared or combined
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    // ========================================================================
    // Numerical Errors
    // ========================================================================
    /// Probability mass drifted outside tolerance
    /// Gantree: Normalization{{total}} // 정규화 실패
    #[error("Normalization error: total probability {total:.12} deviates from 1 by more than {tolerance:e}")]
    Normalization { total: f64, tolerance: f64 },

    /// State fails a physical validity check (Hermitian, PSD)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Invalid basis character
    #[error("Invalid basis '{0}': must be X, Y, or Z")]
    InvalidBasis(String),

    // ========================================================================
    // Gate / Noise Errors
    // ========================================================================
    /// Gate name not recognised
    /// Gantree: UnknownGate(name) // 미등록 게이트
    #[error("Unknown gate kind '{0}'")]
    UnknownGate(String),

    /// Invalid gate parameter
    #[error("Invalid gate parameter: {0}")]
    InvalidGateParameter(String),

    /// Kraus set is malformed or not trace preserving
    #[error("Invalid noise channel: {0}")]
    InvalidChannel(String),

    /// Readout confusion matrix is malformed
    #[error("Invalid readout error: {0}")]
    InvalidReadout(String),

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for QLAB operations
/// Gantree: QlabResult<T> // type alias
pub type QlabResult<T> = Result<T, QlabError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QlabError {
    fn from(err: serde_json::Error) -> Self {
        QlabError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QlabError {
    /// Shorthand for a [`QlabError::Dimension`]
    pub fn dimension(expected: usize, found: usize, context: impl Into<String>) -> Self {
        QlabError::Dimension {
            expected,
            found,
            context: context.into(),
        }
    }

    /// Check if error is a qubit index error (out of range or colliding)
    pub fn is_qubit_index_error(&self) -> bool {
        matches!(
            self,
            QlabError::QubitOutOfRange { .. } | QlabError::DuplicateQubit(_)
        )
    }

    /// Check if error is a dimension error
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            QlabError::Dimension { .. }
                | QlabError::DimensionMismatch { .. }
                | QlabError::QubitLimitExceeded { .. }
        )
    }

    /// Check if error signals a numerical engine bug rather than bad input
    pub fn is_numerical_error(&self) -> bool {
        matches!(
            self,
            QlabError::Normalization { .. } | QlabError::InvalidState(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QlabError::InvalidProbability(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_qubit_out_of_range() {
        let err = QlabError::QubitOutOfRange {
            qubit: 10,
            num_qubits: 7,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("7"));
        assert!(err.is_qubit_index_error());
    }

    #[test]
    fn test_dimension_helpers() {
        let err = QlabError::dimension(2, 3, "compose");
        assert!(err.is_dimension_error());
        assert!(err.to_string().contains("compose"));
        assert!(QlabError::DimensionMismatch { left: 4, right: 8 }.is_dimension_error());
        assert!(!QlabError::DuplicateQubit(0).is_dimension_error());
    }

    #[test]
    fn test_is_numerical_error() {
        let err = QlabError::Normalization {
            total: 0.9,
            tolerance: 1e-6,
        };
        assert!(err.is_numerical_error());
        assert!(!QlabError::UnknownGate("foo".into()).is_numerical_error());
    }
}
