//! # QLAB Backend
//!
//! Measurement sampling and the ideal, trajectory, and exact simulation
//! methods.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qlab_backend // L4: Backend (완료)
//!     Sampling // 본 규칙 샘플링 (완료)
//!         check_normalized(), sample_counts(), sample_records()
//!     BackendTrait // 백엔드 인터페이스 (완료)
//!         execute(), execute_batch(), final_state(), trajectory_average()
//!     ExecutionResult // 실행 결과 (완료)
//!         probability(), frequencies(), marginal_counts()
//!         parity_expectation(), p_even(), p_odd(), most_frequent()
//!     Simulator // 시뮬레이터 (완료)
//!         Method::{Ideal, Trajectory, Exact}
//!     SimulatorConfig // JSON 설정 (완료)
//!     simulate(), simulate_with_state() // 함수형 진입점 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qlab_backend::prelude::*;
//! use qlab_core::CircuitBuilder;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).measure_all().build().unwrap();
//!
//! let result = Simulator::ideal().with_seed(42).execute(&circuit, 1000).unwrap();
//! assert!(result.counts.keys().all(|k| k == "00" || k == "11"));
//! ```
//!
//! ## Noisy Simulation
//!
//! ```rust
//! use qlab_backend::prelude::*;
//! use qlab_core::CircuitBuilder;
//! use qlab_noise::NoiseModel;
//!
//! let noise = NoiseModel::depolarizing(0.01, 0.02).unwrap();
//! let circuit = CircuitBuilder::new(3).ghz().build().unwrap();
//!
//! let counts = simulate(&circuit, Some(&noise), Method::Exact, 2000, Some(7)).unwrap();
//! assert_eq!(counts.values().sum::<u64>(), 2000);
//!
//! let rho = simulate_with_state(&circuit, Some(&noise), Method::Exact, Some(7)).unwrap();
//! let pair = partial_trace(&rho, &[0, 2]).unwrap();
//! println!("purity of (q0, q2): {:.4}", pair.purity());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use qlab_core::{Circuit, Counts, QlabResult};
use qlab_noise::NoiseModel;
use qlab_state::DensityMatrix;

// ============================================================================
// Module Declarations
// ============================================================================

/// Born-rule sampling (Gantree: L4_Backend → Sampling)
pub mod sampling;

/// Execution types and backend trait (Gantree: L4_Backend → BackendTrait)
pub mod execution;

/// Simulator backend (Gantree: L4_Backend → Simulator)
pub mod simulator;

/// Simulator configuration (Gantree: L4_Backend → SimulatorConfig)
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::SimulatorConfig;
pub use execution::{Backend, ExecutionMetadata, ExecutionResult, Method};
pub use qlab_state::{fidelity, partial_trace};
pub use sampling::{check_normalized, sample_counts};
pub use simulator::Simulator;

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qlab_backend::prelude::*;
    //! ```

    pub use crate::config::SimulatorConfig;
    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionResult, Method};
    pub use crate::simulator::Simulator;
    pub use crate::{simulate, simulate_with_state};
    pub use qlab_state::{fidelity, partial_trace};
}

// ============================================================================
// Entry Points
// ============================================================================

fn configured(noise_model: Option<&NoiseModel>, method: Method, seed: Option<u64>) -> Simulator {
    let simulator = Simulator::new(method).with_noise_model(noise_model.cloned().unwrap_or_default());
    match seed {
        Some(seed) => simulator.with_seed(seed),
        None => simulator,
    }
}

/// Run `circuit` for `shots` shots and return the counts
/// Gantree: simulate(circuit, noise, method, shots, seed) -> Result<Counts> // 시뮬레이션
pub fn simulate(
    circuit: &Circuit,
    noise_model: Option<&NoiseModel>,
    method: Method,
    shots: u64,
    seed: Option<u64>,
) -> QlabResult<Counts> {
    Ok(configured(noise_model, method, seed)
        .execute(circuit, shots)?
        .counts)
}

/// Final density matrix of `circuit` without sampling
/// Gantree: simulate_with_state(circuit, noise, method, seed) -> Result<DensityMatrix> // 최종 상태
pub fn simulate_with_state(
    circuit: &Circuit,
    noise_model: Option<&NoiseModel>,
    method: Method,
    seed: Option<u64>,
) -> QlabResult<DensityMatrix> {
    configured(noise_model, method, seed).final_state(circuit)
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qlab_core::{sampling::derive_seed, CircuitBuilder, Gate, GateKind};
    use qlab_noise::{NoiseChannel, NoiseModel, ReadoutError};
    use qlab_state::{fidelity_pure, StateVector};
    use std::f64::consts::PI;

    fn teleportation(theta: f64) -> qlab_core::Circuit {
        CircuitBuilder::with_clbits(3, 2)
            .ry(0, theta)
            .h(1)
            .cx(1, 2)
            .cx(0, 1)
            .h(0)
            .measure(0, 0)
            .measure(1, 1)
            .c_if(1, true, Gate::X(2))
            .c_if(0, true, Gate::Z(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_probability_conservation() {
        let circuit = CircuitBuilder::new(4)
            .h_layer()
            .cx_chain()
            .ry_layer(&[0.3, 1.1, 2.0, 0.4])
            .build()
            .unwrap();
        for method in [Method::Ideal, Method::Exact] {
            let rho = simulate_with_state(&circuit, None, method, Some(1)).unwrap();
            let total: f64 = rho.probabilities().iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hadamard_within_three_sigma() {
        let circuit = CircuitBuilder::new(1).h(0).measure(0, 0).build().unwrap();
        for method in [Method::Ideal, Method::Trajectory, Method::Exact] {
            let counts = simulate(&circuit, None, method, 1024, Some(42)).unwrap();
            let ones = counts.get("1").copied().unwrap_or(0) as i64;
            assert!((ones - 512).abs() <= 48, "{}: ones = {}", method, ones);
        }
    }

    #[test]
    fn test_rotation_gates() {
        let circuit = CircuitBuilder::new(1).rx(0, PI).build().unwrap();
        let counts = simulate(&circuit, None, Method::Ideal, 1000, Some(42)).unwrap();
        assert_eq!(counts.get("1"), Some(&1000));

        let circuit = CircuitBuilder::new(1).ry(0, PI).build().unwrap();
        let counts = simulate(&circuit, None, Method::Ideal, 1000, Some(42)).unwrap();
        assert_eq!(counts.get("1"), Some(&1000));
    }

    #[test]
    fn test_exact_vs_trajectory_cross_validation() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cx(0, 1)
            .cx(1, 2)
            .ry(2, 0.4)
            .measure_all()
            .build()
            .unwrap();
        let noise = NoiseModel::new()
            .with_all_qubit_error(NoiseChannel::depolarizing(0.05, 1).unwrap(), &[GateKind::H, GateKind::Ry])
            .unwrap()
            .with_all_qubit_error(NoiseChannel::depolarizing(0.08, 2).unwrap(), &[GateKind::Cx])
            .unwrap()
            .with_readout_error(ReadoutError::asymmetric(0.02, 0.04).unwrap())
            .unwrap();

        let shots = 8000;
        let exact = Simulator::exact(noise.clone())
            .with_seed(11)
            .execute(&circuit, shots)
            .unwrap();
        let traj = Simulator::trajectory(noise)
            .with_seed(12)
            .execute(&circuit, shots)
            .unwrap();

        for outcome in 0..8u64 {
            let key = qlab_core::Bitstring::from_register(outcome, 3).to_string();
            let (pe, pt) = (exact.probability(&key), traj.probability(&key));
            // Two independent samples of 8000: 4σ of the difference ≤ 0.032
            assert!((pe - pt).abs() < 0.032, "{}: exact {} vs trajectory {}", key, pe, pt);
        }
    }

    #[test]
    fn test_noisy_parity_degradation() {
        let circuit = CircuitBuilder::new(4).ghz().build().unwrap();
        let ideal = Simulator::ideal().with_seed(42).execute(&circuit, 2000).unwrap();
        let noisy = Simulator::exact(NoiseModel::depolarizing(0.02, 0.05).unwrap())
            .with_seed(42)
            .execute(&circuit, 2000)
            .unwrap();
        assert!((ideal.parity_expectation() - 1.0).abs() < 1e-12);
        assert!(noisy.parity_expectation() < ideal.parity_expectation());
        assert!((noisy.p_even() + noisy.p_odd() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_teleportation_fidelity() {
        let theta = 0.7;
        let mut payload = StateVector::new(1).unwrap();
        payload.apply_gate(&Gate::Ry(0, theta)).unwrap();

        for method in [Method::Exact, Method::Ideal] {
            let rho = simulate_with_state(&teleportation(theta), None, method, Some(3)).unwrap();
            let received = partial_trace(&rho, &[2]).unwrap();
            let f = fidelity_pure(&payload, &received).unwrap();
            assert!((f - 1.0).abs() < 1e-9, "{}: fidelity {}", method, f);
        }

        // A single trajectory also lands on the payload state
        let rho = simulate_with_state(&teleportation(theta), None, Method::Trajectory, Some(3))
            .unwrap();
        let received = partial_trace(&rho, &[2]).unwrap();
        assert!((fidelity_pure(&payload, &received).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_teleportation_degrades_with_noise() {
        let theta = 1.1;
        let mut payload = StateVector::new(1).unwrap();
        payload.apply_gate(&Gate::Ry(0, theta)).unwrap();
        let noise = NoiseModel::depolarizing(0.05, 0.1).unwrap();

        let rho =
            simulate_with_state(&teleportation(theta), Some(&noise), Method::Exact, None).unwrap();
        let f = fidelity_pure(&payload, &partial_trace(&rho, &[2]).unwrap()).unwrap();
        assert!(f < 0.99 && f > 0.5, "fidelity {}", f);
        // Uhlmann fidelity agrees with the pure-state fast path
        let pure = payload.to_density_matrix().unwrap();
        let g = fidelity(&pure, &partial_trace(&rho, &[2]).unwrap()).unwrap();
        assert!((f - g).abs() < 1e-9);
    }

    #[test]
    fn test_readout_error_statistics() {
        let circuit = CircuitBuilder::new(1).measure(0, 0).build().unwrap();
        let noise = NoiseModel::new()
            .with_readout_error(ReadoutError::symmetric(0.1).unwrap())
            .unwrap();
        let shots = 20_000;
        for method in [Method::Exact, Method::Trajectory] {
            let counts = simulate(&circuit, Some(&noise), method, shots, Some(8)).unwrap();
            let p1 = counts.get("1").copied().unwrap_or(0) as f64 / shots as f64;
            // 4σ ≈ 0.0085
            assert!((p1 - 0.1).abs() < 0.0085, "{}: p1 = {}", method, p1);
        }
    }

    #[test]
    fn test_batch_seeds() {
        let sim = Simulator::trajectory(NoiseModel::depolarizing(0.05, 0.1).unwrap()).with_seed(42);
        let circuits: Vec<_> = (0..4)
            .map(|i| {
                CircuitBuilder::new(2)
                    .h(0)
                    .rz(0, i as f64 * 0.2)
                    .cx(0, 1)
                    .build()
                    .unwrap()
            })
            .collect();

        let results = sim.execute_batch(&circuits, 200).unwrap();
        assert_eq!(results.len(), 4);
        for (j, (result, circuit)) in results.iter().zip(&circuits).enumerate() {
            assert_eq!(result.shots, 200);
            assert_eq!(result.metadata.seed, derive_seed(42, j as u64));
            let single = sim
                .execute_with_seed(circuit, 200, derive_seed(42, j as u64))
                .unwrap();
            assert_eq!(single.counts, result.counts);
        }

        let sequential = sim.clone().with_parallel(false).execute_batch(&circuits, 200).unwrap();
        for (a, b) in results.iter().zip(&sequential) {
            assert_eq!(a.counts, b.counts);
        }
    }

    #[test]
    fn test_config_driven_run() {
        let config = SimulatorConfig::from_json(
            r#"{
                "method": "exact",
                "seed": 5,
                "shots": 1000,
                "noise": {
                    "gate_errors": [
                        { "channel": { "type": "phase_damping", "p": 0.2 }, "gates": ["h"] }
                    ]
                }
            }"#,
        )
        .unwrap();
        let sim = config.build().unwrap();
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build().unwrap();
        let result = sim.execute(&circuit, config.shots).unwrap();
        assert_eq!(result.total_counts(), 1000);
        assert_eq!(result.coverage.uncovered_kinds(), vec![GateKind::Cx]);
        // Phase damping leaves Z correlations intact
        assert!((result.probability("00") + result.probability("11") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bit_for_bit_reproducible() {
        let circuit = CircuitBuilder::new(3).ghz().build().unwrap();
        let noise = NoiseModel::depolarizing(0.03, 0.06).unwrap();
        for method in [Method::Ideal, Method::Trajectory, Method::Exact] {
            let a = simulate(&circuit, Some(&noise), method, 500, Some(99)).unwrap();
            let b = simulate(&circuit, Some(&noise), method, 500, Some(99)).unwrap();
            assert_eq!(a, b, "{}", method);
        }
    }

    #[test]
    fn test_full_two_qubit_depolarizing_counts_uniform() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build().unwrap();
        let noise = NoiseModel::new()
            .with_all_qubit_error(NoiseChannel::depolarizing(1.0, 2).unwrap(), &[GateKind::Cx])
            .unwrap();

        let shots = 8000;
        for method in [Method::Trajectory, Method::Exact] {
            let counts = simulate(&circuit, Some(&noise), method, shots, Some(21)).unwrap();
            assert_eq!(counts.values().sum::<u64>(), shots);
            for outcome in 0..4u64 {
                let key = qlab_core::Bitstring::from_register(outcome, 2).to_string();
                let p = counts.get(&key).copied().unwrap_or(0) as f64 / shots as f64;
                // 4σ ≈ 0.0194 at p = 1/4
                assert!((p - 0.25).abs() < 0.02, "{}: P({}) = {}", method, key, p);
            }
        }
    }
}
