//! Circuit builder for QLAB
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent builder over [`Circuit`]. Every call is validated as it is made;
//! the first failure is kept and returned by [`CircuitBuilder::build`], and
//! later calls become no-ops.

use crate::circuit::{Circuit, Operation};
use crate::error::{QlabError, QlabResult};
use crate::gate::Gate;
use crate::types::{Angle, Basis, ClbitId, QubitId};

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // 빌더 패턴
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    /// Internal circuit being built
    /// Gantree: circuit: Circuit // 내부 회로
    circuit: Circuit,

    /// First construction error
    error: Option<QlabError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder without classical bits
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self::with_clbits(num_qubits, 0)
    }

    /// Create a builder with a classical register
    ///
    /// An oversized register is reported by [`build`](Self::build).
    pub fn with_clbits(num_qubits: usize, num_clbits: usize) -> Self {
        Self::start(num_qubits, Circuit::with_clbits(num_qubits, num_clbits))
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, num_clbits: usize, name: impl Into<String>) -> Self {
        Self::start(num_qubits, Circuit::with_name(num_qubits, num_clbits, name))
    }

    fn start(num_qubits: usize, circuit: QlabResult<Circuit>) -> Self {
        match circuit {
            Ok(circuit) => Self {
                circuit,
                error: None,
            },
            Err(e) => Self {
                circuit: Circuit::new(num_qubits),
                error: Some(e),
            },
        }
    }

    fn push(mut self, op: Operation) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.push(op) {
                self.error = Some(e);
            }
        }
        self
    }

    fn record(mut self, result: QlabResult<()>) -> Self {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Add an arbitrary gate
    pub fn gate(self, gate: Gate) -> Self {
        self.push(Operation::Gate(gate))
    }

    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================

    /// Add Hadamard gate
    /// Gantree: h(self, q) -> Self // H 추가
    pub fn h(self, qubit: QubitId) -> Self {
        self.gate(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.gate(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.gate(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.gate(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.gate(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sdg(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.gate(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Tdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sx(qubit))
    }

    /// Add SX-dagger gate
    pub fn sxdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sxdg(qubit))
    }

    /// Add identity gate
    pub fn id(self, qubit: QubitId) -> Self {
        self.gate(Gate::Id(qubit))
    }

    // ========================================================================
    // Single-Qubit Parameterized Gates
    // ========================================================================

    /// Add Rx rotation
    /// Gantree: rx(self, q, a) -> Self // Rx 추가
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rz(qubit, angle))
    }

    /// Add phase gate
    pub fn p(self, qubit: QubitId, lambda: Angle) -> Self {
        self.gate(Gate::P(qubit, lambda))
    }

    /// Add U gate (general single-qubit)
    pub fn u(self, qubit: QubitId, theta: Angle, phi: Angle, lambda: Angle) -> Self {
        self.gate(Gate::U(qubit, theta, phi, lambda))
    }

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    /// Gantree: cnot(self, c, t) -> Self // CNOT 추가
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cnot(control, target))
    }

    /// Alias for cnot
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.cnot(control, target)
    }

    /// Add CY gate
    pub fn cy(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cy(control, target))
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cz(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.gate(Gate::Swap(qubit1, qubit2))
    }

    /// Add CRX gate
    pub fn crx(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Crx(control, target, angle))
    }

    /// Add CRY gate
    pub fn cry(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Cry(control, target, angle))
    }

    /// Add CRZ gate
    pub fn crz(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Crz(control, target, angle))
    }

    // ========================================================================
    // Three-Qubit Gates
    // ========================================================================

    /// Add Toffoli (CCX) gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Ccx(c1, c2, target))
    }

    /// Add Fredkin (CSWAP) gate
    pub fn cswap(self, control: QubitId, t1: QubitId, t2: QubitId) -> Self {
        self.gate(Gate::Cswap(control, t1, t2))
    }

    // ========================================================================
    // Measurement and Control
    // ========================================================================

    /// Measure `qubit` into `clbit`
    /// Gantree: measure(self, q, c) -> Self // 측정 추가
    pub fn measure(self, qubit: QubitId, clbit: ClbitId) -> Self {
        self.push(Operation::Measure { qubit, clbit })
    }

    /// Rotate `qubit` so that `basis` maps onto Z, then measure it
    pub fn measure_in_basis(self, qubit: QubitId, clbit: ClbitId, basis: Basis) -> Self {
        Gate::basis_transform(qubit, basis)
            .into_iter()
            .fold(self, CircuitBuilder::gate)
            .measure(qubit, clbit)
    }

    /// Measure every qubit into the matching classical bit
    /// Gantree: measure_all(self) -> Self // 전체 측정
    pub fn measure_all(mut self) -> Self {
        if self.error.is_some() {
            return self;
        }
        let result = self.circuit.measure_all();
        self.record(result)
    }

    /// Apply `gate` only when classical bit `clbit` equals `value`
    /// Gantree: c_if(self, c, v, gate) -> Self // 조건부 게이트
    pub fn c_if(self, clbit: ClbitId, value: bool, gate: Gate) -> Self {
        self.push(Operation::Conditional { clbit, value, gate })
    }

    /// Add barrier on all qubits
    pub fn barrier(self) -> Self {
        let qubits: Vec<QubitId> = (0..self.circuit.num_qubits()).collect();
        self.push(Operation::Barrier(qubits))
    }

    /// Add barrier on specific qubits
    pub fn barrier_on(self, qubits: Vec<QubitId>) -> Self {
        self.push(Operation::Barrier(qubits))
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Splice a sub-circuit in at `qubit_map`
    pub fn compose(mut self, inner: &Circuit, qubit_map: &[QubitId]) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.circuit.compose(inner, qubit_map, None) {
            Ok(c) => self.circuit = c,
            Err(e) => self.error = Some(e),
        }
        self
    }

    // ========================================================================
    // Layer Operations
    // ========================================================================

    /// Add Hadamard layer on all qubits
    /// Gantree: h_layer(self) -> Self // H 레이어
    pub fn h_layer(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self, CircuitBuilder::h)
    }

    /// Add Ry rotation layer (angle i on qubit i)
    pub fn ry_layer(self, angles: &[Angle]) -> Self {
        let n = self.circuit.num_qubits().min(angles.len());
        (0..n).fold(self, |b, i| b.ry(i, angles[i]))
    }

    /// Add Rz rotation layer (angle i on qubit i)
    pub fn rz_layer(self, angles: &[Angle]) -> Self {
        let n = self.circuit.num_qubits().min(angles.len());
        (0..n).fold(self, |b, i| b.rz(i, angles[i]))
    }

    /// Add CX chain with linear connectivity
    /// Gantree: cx_chain(self) -> Self // CX 체인
    pub fn cx_chain(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n.saturating_sub(1)).fold(self, |b, i| b.cx(i, i + 1))
    }

    /// Prepare the n-qubit GHZ state (|0..0> + |1..1>)/sqrt(2)
    pub fn ghz(self) -> Self {
        if self.circuit.num_qubits() == 0 {
            return self;
        }
        self.h(0).cx_chain()
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build and return the circuit, or the first construction error
    /// Gantree: build(self) -> Result<Circuit> // 빌드
    pub fn build(self) -> QlabResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Get reference to current circuit state
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }
}

// ============================================================================
// Tests
// ============================================================================
