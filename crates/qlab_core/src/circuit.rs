//! Quantum circuit structure for QLAB
//!
//! Gantree: L1_Circuit → Circuit
//!
//! A circuit owns a qubit register, a classical register, and an ordered
//! list of [`Operation`]s. It is validated on every insertion, so a built
//! circuit always satisfies the register invariants.

use crate::constants::limits;
use crate::error::{QlabError, QlabResult};
use crate::gate::{Gate, GateKind};
use crate::types::{ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ============================================================================
// Operation
// ============================================================================

/// One step of a circuit
/// Gantree: Operation // 회로 연산
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Unitary gate
    Gate(Gate),

    /// Computational-basis measurement of `qubit` into `clbit`
    Measure {
        /// Measured qubit
        qubit: QubitId,
        /// Destination classical bit
        clbit: ClbitId,
    },

    /// Gate applied only when classical bit `clbit` equals `value`
    Conditional {
        /// Classical bit read
        clbit: ClbitId,
        /// Required bit value
        value: bool,
        /// Gate to apply
        gate: Gate,
    },

    /// Scheduling barrier (no effect on the state)
    Barrier(Vec<QubitId>),
}

impl Operation {
    /// Qubits touched by this operation
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Gate(g) | Operation::Conditional { gate: g, .. } => g.qubits(),
            Operation::Measure { qubit, .. } => vec![*qubit],
            Operation::Barrier(qs) => qs.clone(),
        }
    }

    /// Gate carried by this operation, if any
    pub fn gate(&self) -> Option<&Gate> {
        match self {
            Operation::Gate(g) | Operation::Conditional { gate: g, .. } => Some(g),
            _ => None,
        }
    }

    /// Check if operation is a measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Operation::Measure { .. })
    }

    /// Check if operation is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Operation::Barrier(_))
    }

    fn remap(&self, qubit_map: &[QubitId], clbit_map: &[ClbitId]) -> QlabResult<Operation> {
        let clbit = |c: ClbitId| -> QlabResult<ClbitId> {
            clbit_map.get(c).copied().ok_or(QlabError::ClbitOutOfRange {
                clbit: c,
                num_clbits: clbit_map.len(),
            })
        };
        let qubit = |q: QubitId| -> QlabResult<QubitId> {
            qubit_map.get(q).copied().ok_or(QlabError::QubitOutOfRange {
                qubit: q,
                num_qubits: qubit_map.len(),
            })
        };
        Ok(match self {
            Operation::Gate(g) => Operation::Gate(g.remap(qubit_map)?),
            Operation::Measure { qubit: q, clbit: c } => Operation::Measure {
                qubit: qubit(*q)?,
                clbit: clbit(*c)?,
            },
            Operation::Conditional { clbit: c, value, gate } => Operation::Conditional {
                clbit: clbit(*c)?,
                value: *value,
                gate: gate.remap(qubit_map)?,
            },
            Operation::Barrier(qs) => {
                Operation::Barrier(qs.iter().map(|&q| qubit(q)).collect::<QlabResult<_>>()?)
            }
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate(g) => write!(f, "{}", g),
            Operation::Measure { qubit, clbit } => write!(f, "measure q[{}] -> c[{}]", qubit, clbit),
            Operation::Conditional { clbit, value, gate } => {
                write!(f, "if (c[{}] == {}) {}", clbit, u8::from(*value), gate)
            }
            Operation::Barrier(qs) => write!(f, "barrier {:?}", qs),
        }
    }
}

// ============================================================================
// Circuit
// ============================================================================

/// Quantum circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    /// Gantree: num_qubits: usize // 큐비트 수
    num_qubits: usize,

    /// Number of classical bits
    /// Gantree: num_clbits: usize // 고전 비트 수
    num_clbits: usize,

    /// Operation sequence
    /// Gantree: ops: Vec<Operation> // 연산 목록
    ops: Vec<Operation>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit without classical bits
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits: 0,
            ops: Vec::new(),
            name: None,
        }
    }

    /// Create a new empty circuit with `num_clbits` classical bits
    ///
    /// The classical register holds at most `limits::MAX_CLBITS` bits.
    pub fn with_clbits(num_qubits: usize, num_clbits: usize) -> QlabResult<Self> {
        check_register(num_clbits)?;
        Ok(Self {
            num_clbits,
            ..Self::new(num_qubits)
        })
    }

    /// Create a circuit with a name
    pub fn with_name(
        num_qubits: usize,
        num_clbits: usize,
        name: impl Into<String>,
    ) -> QlabResult<Self> {
        let mut circuit = Self::with_clbits(num_qubits, num_clbits)?;
        circuit.name = Some(name.into());
        Ok(circuit)
    }

    /// Create from a vector of operations
    pub fn from_operations(
        num_qubits: usize,
        num_clbits: usize,
        ops: Vec<Operation>,
    ) -> QlabResult<Self> {
        let mut circuit = Self::with_clbits(num_qubits, num_clbits)?;
        for op in ops {
            circuit.push(op)?;
        }
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Validate and append an operation
    /// Gantree: push(&mut, Operation) -> Result // 연산 추가
    pub fn push(&mut self, op: Operation) -> QlabResult<()> {
        self.validate_operation(&op)?;
        self.ops.push(op);
        Ok(())
    }

    /// Add a gate to the circuit
    /// Gantree: add_gate(&mut, Gate) -> Result // 게이트 추가
    pub fn add_gate(&mut self, gate: Gate) -> QlabResult<()> {
        self.push(Operation::Gate(gate))
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> QlabResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    /// Add a measurement of `qubit` into `clbit`
    pub fn add_measure(&mut self, qubit: QubitId, clbit: ClbitId) -> QlabResult<()> {
        self.push(Operation::Measure { qubit, clbit })
    }

    /// Add a classically conditioned gate
    pub fn add_conditional(&mut self, clbit: ClbitId, value: bool, gate: Gate) -> QlabResult<()> {
        self.push(Operation::Conditional { clbit, value, gate })
    }

    /// Add a barrier (empty list = all qubits)
    pub fn add_barrier(&mut self, qubits: Vec<QubitId>) -> QlabResult<()> {
        let qubits = if qubits.is_empty() {
            (0..self.num_qubits).collect()
        } else {
            qubits
        };
        self.push(Operation::Barrier(qubits))
    }

    /// Measure every qubit `q` into classical bit `q`, growing the
    /// classical register if needed
    /// Gantree: measure_all(&mut) -> Result // 전체 측정
    pub fn measure_all(&mut self) -> QlabResult<()> {
        if self.num_clbits < self.num_qubits {
            self.extend_clbits(self.num_qubits - self.num_clbits)?;
        }
        for q in 0..self.num_qubits {
            self.add_measure(q, q)?;
        }
        Ok(())
    }

    /// Append `k` fresh qubits to the register
    pub fn extend_qubits(&mut self, k: usize) {
        self.num_qubits += k;
    }

    /// Append `k` fresh classical bits to the register
    pub fn extend_clbits(&mut self, k: usize) -> QlabResult<()> {
        let total = self.num_clbits + k;
        check_register(total)?;
        self.num_clbits = total;
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get number of classical bits
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Get operations
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Iterate over every gate, including classically conditioned ones
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.ops.iter().filter_map(Operation::gate)
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Splice `inner` into a copy of this circuit
    ///
    /// Inner qubit `i` lands on `qubit_map[i]`; inner clbit `j` lands on
    /// `clbit_map[j]` (identity when `None`).
    /// Gantree: compose(&self, inner, qmap, cmap) -> Result<Circuit> // 회로 합성
    pub fn compose(
        &self,
        inner: &Circuit,
        qubit_map: &[QubitId],
        clbit_map: Option<&[ClbitId]>,
    ) -> QlabResult<Circuit> {
        if inner.num_qubits > qubit_map.len() {
            return Err(QlabError::dimension(
                inner.num_qubits,
                qubit_map.len(),
                "compose qubit map",
            ));
        }
        check_map(qubit_map, self.num_qubits, |q, n| QlabError::QubitOutOfRange {
            qubit: q,
            num_qubits: n,
        })?;

        let identity: Vec<ClbitId>;
        let clbit_map = match clbit_map {
            Some(map) => map,
            None => {
                identity = (0..inner.num_clbits).collect();
                &identity
            }
        };
        if inner.num_clbits > clbit_map.len() {
            return Err(QlabError::dimension(
                inner.num_clbits,
                clbit_map.len(),
                "compose clbit map",
            ));
        }
        check_map(clbit_map, self.num_clbits, |c, n| QlabError::ClbitOutOfRange {
            clbit: c,
            num_clbits: n,
        })?;

        let mut out = self.clone();
        for op in &inner.ops {
            out.push(op.remap(qubit_map, clbit_map)?)?;
        }
        Ok(out)
    }

    /// Compose `inner` at the identity qubit and clbit mapping
    pub fn append(&self, inner: &Circuit) -> QlabResult<Circuit> {
        let qubit_map: Vec<QubitId> = (0..inner.num_qubits).collect();
        self.compose(inner, &qubit_map, None)
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (longest path, barriers excluded)
    /// Gantree: depth(&self) -> usize // 깊이 계산
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];

        for op in self.ops.iter().filter(|op| !op.is_barrier()) {
            let qubits = op.qubits();
            let max_depth = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .max()
                .copied()
                .unwrap_or(0);
            for &q in &qubits {
                qubit_depths[q] = max_depth + 1;
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Get total operation count
    pub fn gate_count(&self) -> usize {
        self.ops.len()
    }

    /// Count single-qubit gates
    pub fn count_1q(&self) -> usize {
        self.gates().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates().filter(|g| g.is_two_qubit()).count()
    }

    /// Count three-qubit gates
    pub fn count_3q(&self) -> usize {
        self.gates().filter(|g| g.is_three_qubit()).count()
    }

    /// Count parameterized gates
    pub fn count_parameterized(&self) -> usize {
        self.gates().filter(|g| g.is_parameterized()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.ops.iter().filter(|op| op.is_measurement()).count()
    }

    /// Occurrence count per gate kind
    pub fn gate_kinds(&self) -> BTreeMap<GateKind, usize> {
        let mut kinds = BTreeMap::new();
        for gate in self.gates() {
            *kinds.entry(gate.kind()).or_insert(0) += 1;
        }
        kinds
    }

    /// Get qubits used in the circuit
    pub fn used_qubits(&self) -> HashSet<QubitId> {
        self.ops.iter().flat_map(|op| op.qubits()).collect()
    }

    /// Check whether any measurement is present
    pub fn has_measurements(&self) -> bool {
        self.ops.iter().any(Operation::is_measurement)
    }

    /// Check whether any classically conditioned gate is present
    pub fn has_conditionals(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, Operation::Conditional { .. }))
    }

    /// Flag, per operation index, whether it is a terminal measurement
    ///
    /// A measurement of `q` into `c` is terminal when no later operation
    /// touches `q` (barriers excepted) and none reads or writes `c`.
    /// Terminal measurements can be sampled from the final state.
    /// Gantree: terminal_measurements(&self) -> Vec<bool> // 말단 측정
    pub fn terminal_measurements(&self) -> Vec<bool> {
        let mut touched_qubits = vec![false; self.num_qubits];
        let mut touched_clbits = vec![false; self.num_clbits];
        let mut terminal = vec![false; self.ops.len()];

        for (i, op) in self.ops.iter().enumerate().rev() {
            match op {
                Operation::Measure { qubit, clbit } => {
                    terminal[i] = !touched_qubits[*qubit] && !touched_clbits[*clbit];
                    touched_qubits[*qubit] = true;
                    touched_clbits[*clbit] = true;
                }
                Operation::Gate(g) => {
                    for q in g.qubits() {
                        touched_qubits[q] = true;
                    }
                }
                Operation::Conditional { clbit, gate, .. } => {
                    touched_clbits[*clbit] = true;
                    for q in gate.qubits() {
                        touched_qubits[q] = true;
                    }
                }
                Operation::Barrier(_) => {}
            }
        }
        terminal
    }

    /// Check whether some measurement must be resolved before the end
    pub fn has_mid_circuit_measurement(&self) -> bool {
        self.ops
            .iter()
            .zip(self.terminal_measurements())
            .any(|(op, terminal)| op.is_measurement() && !terminal)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Re-check register sizes and every operation
    ///
    /// Insertion already enforces this; deserialized circuits skip it.
    /// Gantree: validate(&self) -> Result // 전체 검증
    pub fn validate(&self) -> QlabResult<()> {
        check_register(self.num_clbits)?;
        self.ops
            .iter()
            .try_for_each(|op| self.validate_operation(op))
    }

    fn validate_operation(&self, op: &Operation) -> QlabResult<()> {
        match op {
            Operation::Gate(g) => g.validate(self.num_qubits),
            Operation::Measure { qubit, clbit } => {
                self.check_qubit(*qubit)?;
                self.check_clbit(*clbit)
            }
            Operation::Conditional { clbit, gate, .. } => {
                self.check_clbit(*clbit)?;
                gate.validate(self.num_qubits)
            }
            Operation::Barrier(qs) => qs.iter().try_for_each(|&q| self.check_qubit(q)),
        }
    }

    fn check_qubit(&self, qubit: QubitId) -> QlabResult<()> {
        if qubit >= self.num_qubits {
            return Err(QlabError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    fn check_clbit(&self, clbit: ClbitId) -> QlabResult<()> {
        if clbit >= self.num_clbits {
            return Err(QlabError::ClbitOutOfRange {
                clbit,
                num_clbits: self.num_clbits,
            });
        }
        Ok(())
    }
}

/// Classical records are stored as `u64` bit masks
fn check_register(num_clbits: usize) -> QlabResult<()> {
    if num_clbits > limits::MAX_CLBITS {
        return Err(QlabError::dimension(
            limits::MAX_CLBITS,
            num_clbits,
            "classical register",
        ));
    }
    Ok(())
}

/// Reject out-of-range or repeated entries of an index map
fn check_map(
    map: &[usize],
    size: usize,
    out_of_range: impl Fn(usize, usize) -> QlabError,
) -> QlabResult<()> {
    for (i, &idx) in map.iter().enumerate() {
        if idx >= size {
            return Err(out_of_range(idx, size));
        }
        if map[..i].contains(&idx) {
            return Err(QlabError::DuplicateQubit(idx));
        }
    }
    Ok(())
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} clbits, {} ops)",
            self.num_qubits,
            self.num_clbits,
            self.ops.len()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        writeln!(f, "  Measurements: {}", self.count_measurements())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_new() {
        let circuit = Circuit::new(5);
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_add_gate() {
        let mut circuit = Circuit::new(3);
        assert!(circuit.add_gate(Gate::H(0)).is_ok());
        assert!(circuit.add_gate(Gate::Cnot(0, 1)).is_ok());
        assert_eq!(circuit.gate_count(), 2);
    }

    #[test]
    fn test_add_gate_out_of_range() {
        let mut circuit = Circuit::new(3);
        assert!(circuit.add_gate(Gate::H(5)).unwrap_err().is_qubit_index_error());
        assert!(circuit.add_gate(Gate::Cnot(1, 1)).unwrap_err().is_qubit_index_error());
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_measure_clbit_range() {
        let mut circuit = Circuit::with_clbits(2, 1).unwrap();
        assert!(circuit.add_measure(0, 0).is_ok());
        assert_eq!(
            circuit.add_measure(1, 1),
            Err(QlabError::ClbitOutOfRange {
                clbit: 1,
                num_clbits: 1
            })
        );
    }

    #[test]
    fn test_measure_all_grows_register() {
        let mut circuit = Circuit::new(3);
        circuit.measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.count_measurements(), 3);
    }

    #[test]
    fn test_circuit_depth() {
        let mut circuit = Circuit::new(3);
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_gate(Gate::H(1)).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit.add_gate(Gate::H(2)).unwrap();
        circuit.add_barrier(vec![]).unwrap();

        // H(0), H(1) parallel -> 1; CNOT -> 2; H(2) parallel with CNOT
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_gate_counts() {
        let mut circuit = Circuit::with_clbits(3, 1).unwrap();
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit.add_gate(Gate::Ccx(0, 1, 2)).unwrap();
        circuit.add_conditional(0, true, Gate::X(2)).unwrap();

        assert_eq!(circuit.count_1q(), 2);
        assert_eq!(circuit.count_2q(), 1);
        assert_eq!(circuit.count_3q(), 1);
        let kinds = circuit.gate_kinds();
        assert_eq!(kinds.get(&GateKind::X), Some(&1));
        assert_eq!(kinds.get(&GateKind::Ccx), Some(&1));
    }

    #[test]
    fn test_compose_with_map() {
        let mut inner = Circuit::new(2);
        inner.add_gate(Gate::Cnot(0, 1)).unwrap();

        let outer = Circuit::new(4);
        let composed = outer.compose(&inner, &[3, 1], None).unwrap();
        assert_eq!(composed.operations(), &[Operation::Gate(Gate::Cnot(3, 1))]);
    }

    #[test]
    fn test_compose_dimension_error() {
        let inner = Circuit::new(3);
        let outer = Circuit::new(4);
        let err = outer.compose(&inner, &[0, 1], None).unwrap_err();
        assert!(matches!(err, QlabError::Dimension { .. }));
    }

    #[test]
    fn test_compose_duplicate_target() {
        let mut inner = Circuit::new(2);
        inner.add_gate(Gate::Cnot(0, 1)).unwrap();
        let outer = Circuit::new(3);
        let err = outer.compose(&inner, &[2, 2], None).unwrap_err();
        assert_eq!(err, QlabError::DuplicateQubit(2));
    }

    #[test]
    fn test_compose_out_of_range_map() {
        let inner = Circuit::new(1);
        let outer = Circuit::new(2);
        assert!(outer.compose(&inner, &[5], None).unwrap_err().is_qubit_index_error());
    }

    #[test]
    fn test_compose_clbits() {
        let mut inner = Circuit::with_clbits(1, 1).unwrap();
        inner.add_measure(0, 0).unwrap();

        let outer = Circuit::with_clbits(2, 2).unwrap();
        let composed = outer.compose(&inner, &[1], Some(&[1])).unwrap();
        assert_eq!(
            composed.operations(),
            &[Operation::Measure { qubit: 1, clbit: 1 }]
        );

        // Identity clbit map needs room in the outer register
        let small = Circuit::new(2);
        assert!(small.compose(&inner, &[0], None).is_err());
    }

    #[test]
    fn test_append_identity() {
        let mut a = Circuit::new(2);
        a.add_gate(Gate::H(0)).unwrap();
        let mut b = Circuit::new(2);
        b.add_gate(Gate::Cnot(0, 1)).unwrap();
        let c = a.append(&b).unwrap();
        assert_eq!(c.gate_count(), 2);
        // Original untouched
        assert_eq!(a.gate_count(), 1);
    }

    #[test]
    fn test_extend_registers() {
        let mut circuit = Circuit::new(2);
        circuit.extend_qubits(1);
        circuit.extend_clbits(2).unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
        assert!(circuit.add_gate(Gate::X(2)).is_ok());
        assert!(circuit.extend_clbits(100).is_err());
    }

    #[test]
    fn test_terminal_measurements() {
        let mut circuit = Circuit::with_clbits(3, 2).unwrap();
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_measure(0, 0).unwrap(); // read by conditional below
        circuit.add_measure(1, 1).unwrap(); // terminal
        circuit.add_conditional(0, true, Gate::X(2)).unwrap();

        let terminal = circuit.terminal_measurements();
        assert_eq!(terminal, vec![false, false, true, false]);
        assert!(circuit.has_mid_circuit_measurement());
    }

    #[test]
    fn test_only_terminal_measurements() {
        let mut circuit = Circuit::new(2);
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit.measure_all().unwrap();
        assert!(!circuit.has_mid_circuit_measurement());
    }

    #[test]
    fn test_from_operations_validates() {
        let ops = vec![
            Operation::Gate(Gate::H(0)),
            Operation::Measure { qubit: 0, clbit: 3 },
        ];
        assert!(Circuit::from_operations(1, 1, ops).is_err());
    }

    #[test]
    fn test_classical_register_limit() {
        assert!(Circuit::with_clbits(1, 64).is_ok());
        let err = Circuit::with_clbits(1, 70).unwrap_err();
        assert!(err.is_dimension_error());
        assert!(Circuit::with_name(1, 65, "wide").is_err());
        assert!(Circuit::from_operations(1, 70, Vec::new()).is_err());

        // A deserialized register past the limit is caught by validate
        let json = r#"{"num_qubits":1,"num_clbits":70,"ops":[{"Measure":{"qubit":0,"clbit":65}}],"name":null}"#;
        let wide: Circuit = serde_json::from_str(json).unwrap();
        assert!(wide.validate().unwrap_err().is_dimension_error());
        assert!(Circuit::with_clbits(1, 2).unwrap().validate().is_ok());
    }
}
