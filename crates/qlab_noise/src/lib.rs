//! # QLAB Noise
//!
//! Kraus channels, readout errors, and noise models.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qlab_noise // L3: Noise (완료)
//!     NoiseChannel // 크라우스 채널 (완료)
//!         depolarizing(), phase_damping(), amplitude_damping()
//!         bit_flip(), phase_flip(), pauli(), compose()
//!         apply_trajectory(), apply_exact()
//!     ReadoutError // 판독 오류 (완료)
//!         symmetric(), asymmetric(), from_matrix(), sample()
//!     NoiseModel // 노이즈 모델 (완료)
//!         add_all_qubit_error(), add_quantum_error(), add_arity_default()
//!         channel_for(), noise_after(), apply_readout(), coverage()
//!     NoiseConfig // JSON 설정 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qlab_core::{Gate, GateKind};
//! use qlab_noise::prelude::*;
//!
//! let model = NoiseModel::new()
//!     .with_all_qubit_error(NoiseChannel::phase_damping(0.1).unwrap(), &[GateKind::H])
//!     .unwrap()
//!     .with_all_qubit_error(NoiseChannel::depolarizing(0.02, 2).unwrap(), &[GateKind::Cx])
//!     .unwrap()
//!     .with_readout_error(ReadoutError::symmetric(0.01).unwrap())
//!     .unwrap();
//!
//! assert_eq!(model.noise_after(&Gate::Cnot(0, 1)).len(), 1);
//! println!("{}", model);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Kraus channels (Gantree: L3_Noise → NoiseChannel)
pub mod channel;

/// Readout errors (Gantree: L3_Noise → ReadoutError)
pub mod readout;

/// Noise model (Gantree: L3_Noise → NoiseModel)
pub mod noise_model;

/// JSON configuration (Gantree: L3_Noise → NoiseConfig)
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::NoiseChannel;
pub use config::{ChannelConfig, NoiseConfig, ReadoutConfig};
pub use noise_model::{CorrelatedReadout, LocalError, NoiseCoverage, NoiseModel};
pub use readout::ReadoutError;

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qlab_noise::prelude::*;
    //! ```

    pub use crate::channel::NoiseChannel;
    pub use crate::config::NoiseConfig;
    pub use crate::noise_model::{NoiseCoverage, NoiseModel};
    pub use crate::readout::ReadoutError;
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================
