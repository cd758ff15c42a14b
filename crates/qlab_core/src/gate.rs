//! Quantum gate definitions for QLAB
//!
//! Gantree: L1_Circuit → Gate
//!
//! Closed gate enum. Every engine that consumes a [`Gate`] matches on it
//! exhaustively, so a new variant is a compile-time checked extension.

use crate::error::{QlabError, QlabResult};
use crate::types::{Angle, Basis, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // 게이트 enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    /// Gantree: H(QubitId) // 하다마드
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate (inverse of S)
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate (inverse of T)
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// SX-dagger gate
    Sxdg(QubitId),

    /// Identity gate (idle timestep; still a noise attachment point)
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Rotation Gates
    // ========================================================================
    /// Rotation around X-axis
    /// Gantree: Rx(QubitId, Angle) // X 회전
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (control, target)
    /// Gantree: CNOT(QubitId, QubitId) // ctrl, tgt
    Cnot(QubitId, QubitId),

    /// Controlled-Y
    Cy(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Controlled-Rx
    Crx(QubitId, QubitId, Angle),

    /// Controlled-Ry
    Cry(QubitId, QubitId, Angle),

    /// Controlled-Rz
    Crz(QubitId, QubitId, Angle),

    // ========================================================================
    // Three-Qubit Gates
    // ========================================================================
    /// Toffoli (control1, control2, target)
    Ccx(QubitId, QubitId, QubitId),

    /// Controlled-SWAP (control, a, b)
    Cswap(QubitId, QubitId, QubitId),
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Gate kind tag
    pub fn kind(&self) -> GateKind {
        match self {
            Gate::H(_) => GateKind::H,
            Gate::X(_) => GateKind::X,
            Gate::Y(_) => GateKind::Y,
            Gate::Z(_) => GateKind::Z,
            Gate::S(_) => GateKind::S,
            Gate::Sdg(_) => GateKind::Sdg,
            Gate::T(_) => GateKind::T,
            Gate::Tdg(_) => GateKind::Tdg,
            Gate::Sx(_) => GateKind::Sx,
            Gate::Sxdg(_) => GateKind::Sxdg,
            Gate::Id(_) => GateKind::Id,
            Gate::Rx(_, _) => GateKind::Rx,
            Gate::Ry(_, _) => GateKind::Ry,
            Gate::Rz(_, _) => GateKind::Rz,
            Gate::P(_, _) => GateKind::P,
            Gate::U(_, _, _, _) => GateKind::U,
            Gate::Cnot(_, _) => GateKind::Cx,
            Gate::Cy(_, _) => GateKind::Cy,
            Gate::Cz(_, _) => GateKind::Cz,
            Gate::Swap(_, _) => GateKind::Swap,
            Gate::Crx(_, _, _) => GateKind::Crx,
            Gate::Cry(_, _, _) => GateKind::Cry,
            Gate::Crz(_, _, _) => GateKind::Crz,
            Gate::Ccx(_, _, _) => GateKind::Ccx,
            Gate::Cswap(_, _, _) => GateKind::Cswap,
        }
    }

    /// Get qubits involved in this gate (controls first, then targets)
    /// Gantree: qubits(&self) -> Vec<QubitId> // 관련 큐비트
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qubits = self.controls();
        qubits.extend(self.targets());
        qubits
    }

    /// Control qubits
    pub fn controls(&self) -> Vec<QubitId> {
        match self {
            Gate::Cnot(c, _)
            | Gate::Cy(c, _)
            | Gate::Cz(c, _)
            | Gate::Crx(c, _, _)
            | Gate::Cry(c, _, _)
            | Gate::Crz(c, _, _)
            | Gate::Cswap(c, _, _) => vec![*c],
            Gate::Ccx(c1, c2, _) => vec![*c1, *c2],
            _ => vec![],
        }
    }

    /// Target qubits (ordered; the first is the least significant axis of
    /// the gate's sub-unitary)
    pub fn targets(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Sxdg(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::P(q, _)
            | Gate::U(q, _, _, _) => vec![*q],
            Gate::Cnot(_, t)
            | Gate::Cy(_, t)
            | Gate::Cz(_, t)
            | Gate::Crx(_, t, _)
            | Gate::Cry(_, t, _)
            | Gate::Crz(_, t, _)
            | Gate::Ccx(_, _, t) => vec![*t],
            Gate::Swap(a, b) | Gate::Cswap(_, a, b) => vec![*a, *b],
        }
    }

    /// Real parameters (rotation angles)
    pub fn params(&self) -> Vec<Angle> {
        match self {
            Gate::Rx(_, a)
            | Gate::Ry(_, a)
            | Gate::Rz(_, a)
            | Gate::P(_, a)
            | Gate::Crx(_, _, a)
            | Gate::Cry(_, _, a)
            | Gate::Crz(_, _, a) => vec![*a],
            Gate::U(_, theta, phi, lambda) => vec![*theta, *phi, *lambda],
            _ => vec![],
        }
    }

    /// Number of qubits the gate acts on
    pub fn num_qubits(&self) -> usize {
        self.kind().num_qubits()
    }

    /// Check if gate is single-qubit
    pub fn is_single_qubit(&self) -> bool {
        self.num_qubits() == 1
    }

    /// Check if gate is two-qubit
    pub fn is_two_qubit(&self) -> bool {
        self.num_qubits() == 2
    }

    /// Check if gate is three-qubit
    pub fn is_three_qubit(&self) -> bool {
        self.num_qubits() == 3
    }

    /// Check if gate is parameterized
    pub fn is_parameterized(&self) -> bool {
        !self.params().is_empty()
    }

    /// Get gate name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    // ========================================================================
    // Validation and Remapping
    // ========================================================================

    /// Check qubit range and pairwise distinctness against a register size
    /// Gantree: validate(&self, n) -> Result // 큐비트 검증
    pub fn validate(&self, num_qubits: usize) -> QlabResult<()> {
        let qubits = self.qubits();
        for (i, &q) in qubits.iter().enumerate() {
            if q >= num_qubits {
                return Err(QlabError::QubitOutOfRange {
                    qubit: q,
                    num_qubits,
                });
            }
            if qubits[..i].contains(&q) {
                return Err(QlabError::DuplicateQubit(q));
            }
        }
        for &angle in &self.params() {
            if !angle.is_finite() {
                return Err(QlabError::InvalidGateParameter(format!(
                    "{} angle must be finite, got {}",
                    self.name(),
                    angle
                )));
            }
        }
        Ok(())
    }

    /// Rewrite every qubit index through `map`
    ///
    /// Fails with `QubitOutOfRange` when an index has no entry in `map`.
    pub fn remap(&self, map: &[QubitId]) -> QlabResult<Gate> {
        let m = |q: QubitId| -> QlabResult<QubitId> {
            map.get(q).copied().ok_or(QlabError::QubitOutOfRange {
                qubit: q,
                num_qubits: map.len(),
            })
        };
        Ok(match self {
            Gate::H(q) => Gate::H(m(*q)?),
            Gate::X(q) => Gate::X(m(*q)?),
            Gate::Y(q) => Gate::Y(m(*q)?),
            Gate::Z(q) => Gate::Z(m(*q)?),
            Gate::S(q) => Gate::S(m(*q)?),
            Gate::Sdg(q) => Gate::Sdg(m(*q)?),
            Gate::T(q) => Gate::T(m(*q)?),
            Gate::Tdg(q) => Gate::Tdg(m(*q)?),
            Gate::Sx(q) => Gate::Sx(m(*q)?),
            Gate::Sxdg(q) => Gate::Sxdg(m(*q)?),
            Gate::Id(q) => Gate::Id(m(*q)?),
            Gate::Rx(q, a) => Gate::Rx(m(*q)?, *a),
            Gate::Ry(q, a) => Gate::Ry(m(*q)?, *a),
            Gate::Rz(q, a) => Gate::Rz(m(*q)?, *a),
            Gate::P(q, a) => Gate::P(m(*q)?, *a),
            Gate::U(q, t, p, l) => Gate::U(m(*q)?, *t, *p, *l),
            Gate::Cnot(c, t) => Gate::Cnot(m(*c)?, m(*t)?),
            Gate::Cy(c, t) => Gate::Cy(m(*c)?, m(*t)?),
            Gate::Cz(c, t) => Gate::Cz(m(*c)?, m(*t)?),
            Gate::Swap(a, b) => Gate::Swap(m(*a)?, m(*b)?),
            Gate::Crx(c, t, a) => Gate::Crx(m(*c)?, m(*t)?, *a),
            Gate::Cry(c, t, a) => Gate::Cry(m(*c)?, m(*t)?, *a),
            Gate::Crz(c, t, a) => Gate::Crz(m(*c)?, m(*t)?, *a),
            Gate::Ccx(c1, c2, t) => Gate::Ccx(m(*c1)?, m(*c2)?, m(*t)?),
            Gate::Cswap(c, a, b) => Gate::Cswap(m(*c)?, m(*a)?, m(*b)?),
        })
    }

    // ========================================================================
    // Basis Transformation Helpers
    // ========================================================================

    /// Get basis transformation gates for measuring in given basis
    /// X basis: H
    /// Y basis: Sdg, H
    /// Z basis: (none)
    pub fn basis_transform(qubit: QubitId, basis: Basis) -> Vec<Gate> {
        match basis {
            Basis::X => vec![Gate::H(qubit)],
            Basis::Y => vec![Gate::Sdg(qubit), Gate::H(qubit)],
            Basis::Z => vec![],
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        let params = self.params();
        if !params.is_empty() {
            let ps: Vec<String> = params.iter().map(|p| format!("{:.4}", p)).collect();
            write!(f, "({})", ps.join(","))?;
        }
        let qs: Vec<String> = self.qubits().iter().map(|q| format!("q[{}]", q)).collect();
        write!(f, " {}", qs.join(","))
    }
}

// ============================================================================
// Gate Kind
// ============================================================================

/// Gate kind tag, the key noise models attach channels to
/// Gantree: GateKind // 게이트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum GateKind {
    H,
    X,
    Y,
    Z,
    S,
    Sdg,
    T,
    Tdg,
    Sx,
    Sxdg,
    Id,
    Rx,
    Ry,
    Rz,
    P,
    U,
    Cx,
    Cy,
    Cz,
    Swap,
    Crx,
    Cry,
    Crz,
    Ccx,
    Cswap,
}

impl GateKind {
    /// Every gate kind, in declaration order
    pub const ALL: [GateKind; 25] = [
        GateKind::H,
        GateKind::X,
        GateKind::Y,
        GateKind::Z,
        GateKind::S,
        GateKind::Sdg,
        GateKind::T,
        GateKind::Tdg,
        GateKind::Sx,
        GateKind::Sxdg,
        GateKind::Id,
        GateKind::Rx,
        GateKind::Ry,
        GateKind::Rz,
        GateKind::P,
        GateKind::U,
        GateKind::Cx,
        GateKind::Cy,
        GateKind::Cz,
        GateKind::Swap,
        GateKind::Crx,
        GateKind::Cry,
        GateKind::Crz,
        GateKind::Ccx,
        GateKind::Cswap,
    ];

    /// Lower-case gate name
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::Sx => "sx",
            GateKind::Sxdg => "sxdg",
            GateKind::Id => "id",
            GateKind::Rx => "rx",
            GateKind::Ry => "ry",
            GateKind::Rz => "rz",
            GateKind::P => "p",
            GateKind::U => "u",
            GateKind::Cx => "cx",
            GateKind::Cy => "cy",
            GateKind::Cz => "cz",
            GateKind::Swap => "swap",
            GateKind::Crx => "crx",
            GateKind::Cry => "cry",
            GateKind::Crz => "crz",
            GateKind::Ccx => "ccx",
            GateKind::Cswap => "cswap",
        }
    }

    /// Parse a gate name (case-insensitive, common aliases accepted)
    /// Gantree: parse(s) -> Result<GateKind> // 이름 파싱
    pub fn parse(s: &str) -> QlabResult<Self> {
        let lower = s.trim().to_lowercase();
        let kind = match lower.as_str() {
            "cnot" => GateKind::Cx,
            "toffoli" => GateKind::Ccx,
            "fredkin" => GateKind::Cswap,
            "i" => GateKind::Id,
            other => *Self::ALL
                .iter()
                .find(|k| k.name() == other)
                .ok_or_else(|| QlabError::UnknownGate(s.to_string()))?,
        };
        Ok(kind)
    }

    /// Number of qubits a gate of this kind acts on
    pub fn num_qubits(&self) -> usize {
        match self {
            GateKind::Cx
            | GateKind::Cy
            | GateKind::Cz
            | GateKind::Swap
            | GateKind::Crx
            | GateKind::Cry
            | GateKind::Crz => 2,
            GateKind::Ccx | GateKind::Cswap => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================
