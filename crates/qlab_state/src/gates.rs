//! Gate unitaries
//!
//! Gantree: L2_State → GateUnitary
//!
//! Maps every [`Gate`] variant to the operator on its target qubits plus
//! its control qubits. Controlled gates carry only the target block; the
//! kernel leaves amplitudes with any control bit 0 untouched.

use crate::operator::Operator;
use num_complex::Complex64;
use qlab_core::{Angle, Gate, QubitId};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Operator plus the qubits it acts on
/// Gantree: GateAction // 게이트 작용
#[derive(Debug, Clone, PartialEq)]
pub struct GateAction {
    /// Target qubits; `targets[0]` is the least significant operator axis
    pub targets: Vec<QubitId>,
    /// Control qubits (all must be 1)
    pub controls: Vec<QubitId>,
    /// Operator on the targets
    pub op: Operator,
}

/// Resolve a gate into its target operator
/// Gantree: gate_unitary(&Gate) -> GateAction // 게이트 행렬
pub fn gate_unitary(gate: &Gate) -> GateAction {
    GateAction {
        targets: gate.targets(),
        controls: gate.controls(),
        op: target_operator(gate),
    }
}

fn target_operator(gate: &Gate) -> Operator {
    match gate {
        Gate::H(_) => hadamard(),
        Gate::X(_) | Gate::Cnot(_, _) | Gate::Ccx(_, _, _) => Operator::pauli_x(),
        Gate::Y(_) | Gate::Cy(_, _) => Operator::pauli_y(),
        Gate::Z(_) | Gate::Cz(_, _) => Operator::pauli_z(),
        Gate::S(_) => phase(std::f64::consts::FRAC_PI_2),
        Gate::Sdg(_) => phase(-std::f64::consts::FRAC_PI_2),
        Gate::T(_) => phase(FRAC_PI_4),
        Gate::Tdg(_) => phase(-FRAC_PI_4),
        Gate::Sx(_) => sx(),
        Gate::Sxdg(_) => sx().adjoint(),
        Gate::Id(_) => Operator::identity(1),
        Gate::Rx(_, a) | Gate::Crx(_, _, a) => rx(*a),
        Gate::Ry(_, a) | Gate::Cry(_, _, a) => ry(*a),
        Gate::Rz(_, a) | Gate::Crz(_, _, a) => rz(*a),
        Gate::P(_, a) => phase(*a),
        Gate::U(_, theta, phi, lambda) => u(*theta, *phi, *lambda),
        Gate::Swap(_, _) | Gate::Cswap(_, _, _) => Operator::swap(),
    }
}

// ============================================================================
// Matrices
// ============================================================================

fn hadamard() -> Operator {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    Operator::single(h, h, h, -h)
}

fn phase(lambda: Angle) -> Operator {
    Operator::single(ONE, ZERO, ZERO, Complex64::from_polar(1.0, lambda))
}

fn sx() -> Operator {
    let p = Complex64::new(0.5, 0.5);
    let m = Complex64::new(0.5, -0.5);
    Operator::single(p, m, m, p)
}

fn rx(theta: Angle) -> Operator {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    Operator::single(c, s, s, c)
}

fn ry(theta: Angle) -> Operator {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    Operator::single(c, -s, s, c)
}

fn rz(theta: Angle) -> Operator {
    Operator::single(
        Complex64::from_polar(1.0, -theta / 2.0),
        ZERO,
        ZERO,
        Complex64::from_polar(1.0, theta / 2.0),
    )
}

fn u(theta: Angle, phi: Angle, lambda: Angle) -> Operator {
    let (s, c) = (theta / 2.0).sin_cos();
    Operator::single(
        Complex64::new(c, 0.0),
        -Complex64::from_polar(s, lambda),
        Complex64::from_polar(s, phi),
        Complex64::from_polar(c, phi + lambda),
    )
}

// ============================================================================
// Tests
// ============================================================================
