//! # QLAB Core
//!
//! Core types, gates, and circuits for the QLAB noisy simulation engine.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qlab_core // L0+L1: Foundation + Circuit (완료)
//!     L0_Foundation // 기반 타입/상수/에러 (완료)
//!         CoreTypes // 핵심 타입 (완료)
//!         Constants // 허용 오차/크기 제한 (완료)
//!         Errors // 에러 타입 (완료)
//!     L1_Circuit // 회로 구조 (완료)
//!         Gate // 게이트 enum (완료)
//!         Circuit // 회로 구조체 (완료)
//!         CircuitBuilder // 빌더 패턴 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qlab_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(3)
//!     .h(0)
//!     .cnot(0, 1)
//!     .cnot(1, 2)
//!     .measure_all()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(circuit.num_clbits(), 3);
//! println!("{}", circuit);
//! ```
//!
//! ## Feed-forward
//!
//! ```rust
//! use qlab_core::prelude::*;
//!
//! let circuit = CircuitBuilder::with_clbits(2, 1)
//!     .h(0)
//!     .measure(0, 0)
//!     .c_if(0, true, Gate::X(1))
//!     .build()
//!     .unwrap();
//!
//! assert!(circuit.has_mid_circuit_measurement());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::{Circuit, Operation};
pub use constants::{limits, sampling, tolerance};
pub use error::{QlabError, QlabResult};
pub use gate::{Gate, GateKind};
pub use types::{Angle, Basis, Bitstring, ClbitId, Counts, Probability, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qlab_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::{Circuit, Operation};
    pub use crate::constants::{limits, sampling, tolerance};
    pub use crate::error::{QlabError, QlabResult};
    pub use crate::gate::{Gate, GateKind};
    pub use crate::types::{Angle, Basis, Bitstring, ClbitId, Counts, Probability, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_teleportation_circuit_structure() {
        // q0: payload, q1/q2: Bell pair
        let circuit = CircuitBuilder::with_clbits(3, 3)
            .ry(0, 0.7)
            .h(1)
            .cx(1, 2)
            .cx(0, 1)
            .h(0)
            .measure(0, 0)
            .measure(1, 1)
            .c_if(1, true, Gate::X(2))
            .c_if(0, true, Gate::Z(2))
            .measure(2, 2)
            .build()
            .unwrap();

        assert_eq!(circuit.count_measurements(), 3);
        let terminal = circuit.terminal_measurements();
        // Both Bell measurements feed forward; the final one is terminal
        assert!(!terminal[5]);
        assert!(!terminal[6]);
        assert!(terminal[9]);
    }

    #[test]
    fn test_ghz_depth() {
        let circuit = CircuitBuilder::new(5).ghz().measure_all().build().unwrap();
        // H + 4 chained CNOTs + measurement layer
        assert_eq!(circuit.depth(), 6);
        assert_eq!(circuit.count_2q(), 4);
    }

    #[test]
    fn test_gate_kind_histogram() {
        let circuit = CircuitBuilder::new(3)
            .h_layer()
            .cx_chain()
            .rz_layer(&[0.1, 0.2, 0.3])
            .build()
            .unwrap();

        let kinds = circuit.gate_kinds();
        assert_eq!(kinds[&GateKind::H], 3);
        assert_eq!(kinds[&GateKind::Cx], 2);
        assert_eq!(kinds[&GateKind::Rz], 3);
    }

    #[test]
    fn test_serde_roundtrip_circuit() {
        let circuit = CircuitBuilder::with_clbits(2, 1)
            .h(0)
            .measure(0, 0)
            .c_if(0, false, Gate::X(1))
            .build()
            .unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(circuit, back);
    }

    #[test]
    fn test_parity_calculation() {
        let even = Bitstring::parse("0110").unwrap();
        assert_eq!(even.popcount(), 2);
        assert_eq!(even.parity_sign(), 1);

        let odd = Bitstring::parse("0111").unwrap();
        assert!(odd.parity());
    }
}
