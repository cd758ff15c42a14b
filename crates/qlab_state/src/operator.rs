//! Small dense operators
//!
//! Gantree: L2_State → Operator
//!
//! A `2^k × 2^k` complex matrix acting on `k` qubits. Row/column index bit
//! `i` corresponds to the `i`-th target qubit handed to the kernel.

use num_complex::Complex64;
use qlab_core::{QlabError, QlabResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// `4^k` entries must stay addressable
const MAX_OPERATOR_QUBITS: usize = 16;
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Dense square operator on `num_qubits` qubits (row-major)
/// Gantree: Operator // 소형 연산자
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperatorData")]
pub struct Operator {
    num_qubits: usize,
    data: Vec<Complex64>,
}

/// Unchecked wire form of [`Operator`]
#[derive(Deserialize)]
struct OperatorData {
    num_qubits: usize,
    data: Vec<Complex64>,
}

impl TryFrom<OperatorData> for Operator {
    type Error = QlabError;

    fn try_from(raw: OperatorData) -> QlabResult<Self> {
        Operator::new(raw.num_qubits, raw.data)
    }
}

impl Operator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from row-major entries, checking the length is `4^k`
    pub fn new(num_qubits: usize, data: Vec<Complex64>) -> QlabResult<Self> {
        if num_qubits > MAX_OPERATOR_QUBITS {
            return Err(QlabError::dimension(
                MAX_OPERATOR_QUBITS,
                num_qubits,
                "operator qubits",
            ));
        }
        let dim = 1usize << num_qubits;
        if data.len() != dim * dim {
            return Err(QlabError::dimension(dim * dim, data.len(), "operator entries"));
        }
        Ok(Self { num_qubits, data })
    }

    /// Build a 2×2 operator from its four entries
    pub fn single(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self {
            num_qubits: 1,
            data: vec![a, b, c, d],
        }
    }

    /// Identity on `k` qubits
    pub fn identity(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        let mut data = vec![ZERO; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = ONE;
        }
        Self { num_qubits, data }
    }

    /// Zero operator on `k` qubits
    pub fn zeros(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        Self {
            num_qubits,
            data: vec![ZERO; dim * dim],
        }
    }

    /// Diagonal operator; `entries.len()` must be a power of two
    pub fn diagonal(entries: &[Complex64]) -> QlabResult<Self> {
        let dim = entries.len();
        if !dim.is_power_of_two() {
            return Err(QlabError::dimension(
                dim.next_power_of_two(),
                dim,
                "diagonal operator",
            ));
        }
        let mut data = vec![ZERO; dim * dim];
        for (i, &e) in entries.iter().enumerate() {
            data[i * dim + i] = e;
        }
        Ok(Self {
            num_qubits: dim.trailing_zeros() as usize,
            data,
        })
    }

    // ========================================================================
    // Pauli Operators
    // ========================================================================

    /// Pauli X
    pub fn pauli_x() -> Self {
        Self::single(ZERO, ONE, ONE, ZERO)
    }

    /// Pauli Y
    pub fn pauli_y() -> Self {
        Self::single(ZERO, -I, I, ZERO)
    }

    /// Pauli Z
    pub fn pauli_z() -> Self {
        Self::single(ONE, ZERO, ZERO, -ONE)
    }

    /// Two-qubit SWAP
    pub fn swap() -> Self {
        let mut op = Self::zeros(2);
        for (r, c) in [(0, 0), (1, 2), (2, 1), (3, 3)] {
            op.data[r * 4 + c] = ONE;
        }
        op
    }

    /// Multi-qubit Pauli string such as `"XZ"`
    ///
    /// The leftmost character acts on the highest qubit, so `"XZ"` is
    /// `X ⊗ Z` with Z on qubit 0.
    pub fn pauli(label: &str) -> QlabResult<Self> {
        if label.is_empty() {
            return Err(QlabError::InvalidChannel("empty Pauli label".to_string()));
        }
        label.chars().try_fold(Self::identity(0), |acc, c| {
            let p = match c.to_ascii_uppercase() {
                'I' => Self::identity(1),
                'X' => Self::pauli_x(),
                'Y' => Self::pauli_y(),
                'Z' => Self::pauli_z(),
                _ => {
                    return Err(QlabError::InvalidChannel(format!(
                        "invalid Pauli label '{}'",
                        label
                    )))
                }
            };
            Ok(acc.kron(&p))
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits acted on
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension `2^k`
    #[inline]
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Entry at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim() + col]
    }

    /// Row-major entries
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    // ========================================================================
    // Algebra
    // ========================================================================

    /// Kronecker product `self ⊗ other` (`self` on the high qubits)
    /// Gantree: kron(&self, other) -> Operator // 텐서곱
    pub fn kron(&self, other: &Operator) -> Operator {
        let (da, db) = (self.dim(), other.dim());
        let dim = da * db;
        let mut data = vec![ZERO; dim * dim];
        for ar in 0..da {
            for ac in 0..da {
                let a = self.get(ar, ac);
                if a == ZERO {
                    continue;
                }
                for br in 0..db {
                    for bc in 0..db {
                        data[(ar * db + br) * dim + ac * db + bc] = a * other.get(br, bc);
                    }
                }
            }
        }
        Operator {
            num_qubits: self.num_qubits + other.num_qubits,
            data,
        }
    }

    /// Matrix product `self · other`
    /// Gantree: matmul(&self, other) -> Result<Operator> // 행렬곱
    pub fn matmul(&self, other: &Operator) -> QlabResult<Operator> {
        if self.num_qubits != other.num_qubits {
            return Err(QlabError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        let dim = self.dim();
        let mut data = vec![ZERO; dim * dim];
        for r in 0..dim {
            for k in 0..dim {
                let a = self.get(r, k);
                if a == ZERO {
                    continue;
                }
                for c in 0..dim {
                    data[r * dim + c] += a * other.get(k, c);
                }
            }
        }
        Ok(Operator {
            num_qubits: self.num_qubits,
            data,
        })
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Operator {
        let dim = self.dim();
        let mut data = vec![ZERO; dim * dim];
        for r in 0..dim {
            for c in 0..dim {
                data[c * dim + r] = self.get(r, c).conj();
            }
        }
        Operator {
            num_qubits: self.num_qubits,
            data,
        }
    }

    /// Element-wise complex conjugate
    pub fn conj(&self) -> Operator {
        Operator {
            num_qubits: self.num_qubits,
            data: self.data.iter().map(|z| z.conj()).collect(),
        }
    }

    /// Multiply every entry by a scalar
    pub fn scale(&self, factor: Complex64) -> Operator {
        Operator {
            num_qubits: self.num_qubits,
            data: self.data.iter().map(|z| z * factor).collect(),
        }
    }

    /// Entry-wise sum
    pub fn add(&self, other: &Operator) -> QlabResult<Operator> {
        if self.num_qubits != other.num_qubits {
            return Err(QlabError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(Operator {
            num_qubits: self.num_qubits,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect(),
        })
    }

    /// Trace
    pub fn trace(&self) -> Complex64 {
        (0..self.dim()).map(|i| self.get(i, i)).sum()
    }

    /// Largest absolute entry-wise difference
    pub fn max_abs_diff(&self, other: &Operator) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Check `self · self† = I` within `tolerance`
    /// Gantree: is_unitary(&self, tol) -> bool // 유니터리 검사
    pub fn is_unitary(&self, tolerance: f64) -> bool {
        self.matmul(&self.adjoint())
            .map(|p| p.max_abs_diff(&Operator::identity(self.num_qubits)) <= tolerance)
            .unwrap_or(false)
    }

    /// Apply to a vector of length `2^k`
    pub fn apply(&self, v: &[Complex64]) -> Vec<Complex64> {
        let dim = self.dim();
        (0..dim)
            .map(|r| (0..dim).map(|c| self.get(r, c) * v[c]).sum())
            .collect()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dim = self.dim();
        for r in 0..dim {
            let row: Vec<String> = (0..dim)
                .map(|c| {
                    let z = self.get(r, c);
                    format!("{:+.4}{:+.4}i", z.re, z.im)
                })
                .collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
