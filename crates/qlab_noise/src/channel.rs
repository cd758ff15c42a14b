//! Kraus noise channels
//!
//! Gantree: L3_Noise → NoiseChannel
//!
//! A channel is a list of Kraus operators `Kᵢ` on `k` qubits with
//! `Σ Kᵢ†Kᵢ = I`. It can be applied exactly to a density matrix or sampled
//! along a single statevector trajectory.

use num_complex::Complex64;
use qlab_core::{limits, tolerance, Probability, QlabError, QlabResult, QubitId};
use qlab_state::{DensityMatrix, Operator, StateVector};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completely positive trace-preserving map in Kraus form
/// Gantree: NoiseChannel // 크라우스 채널
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoiseChannelData")]
pub struct NoiseChannel {
    /// Display name
    name: String,

    /// Number of qubits acted on
    num_qubits: usize,

    /// Kraus operators
    kraus: Vec<Operator>,

    /// Every `Kᵢ` is a scaled unitary, so outcome weights are state independent
    unitary_mixture: bool,
}

/// Wire form of [`NoiseChannel`]; the arity and mixture flag are recomputed
#[derive(Deserialize)]
struct NoiseChannelData {
    name: String,
    kraus: Vec<Operator>,
}

impl TryFrom<NoiseChannelData> for NoiseChannel {
    type Error = QlabError;

    fn try_from(raw: NoiseChannelData) -> QlabResult<Self> {
        NoiseChannel::new(raw.name, raw.kraus)
    }
}

impl NoiseChannel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from Kraus operators, verifying completeness within `1e-9`
    /// Gantree: new(name, kraus) -> Result<Self> // 생성+검증
    pub fn new(name: impl Into<String>, kraus: Vec<Operator>) -> QlabResult<Self> {
        let name = name.into();
        let first = kraus
            .first()
            .ok_or_else(|| QlabError::InvalidChannel(format!("{}: no Kraus operators", name)))?;
        let num_qubits = first.num_qubits();

        if num_qubits == 0 || num_qubits > limits::MAX_CHANNEL_QUBITS {
            return Err(QlabError::InvalidChannel(format!(
                "{}: channels act on 1..={} qubits, got {}",
                name,
                limits::MAX_CHANNEL_QUBITS,
                num_qubits
            )));
        }
        if let Some(bad) = kraus.iter().find(|k| k.num_qubits() != num_qubits) {
            return Err(QlabError::dimension(
                num_qubits,
                bad.num_qubits(),
                format!("{} Kraus operator arity", name),
            ));
        }

        let mut completeness = Operator::zeros(num_qubits);
        for k in &kraus {
            completeness = completeness.add(&k.adjoint().matmul(k)?)?;
        }
        let deviation = completeness.max_abs_diff(&Operator::identity(num_qubits));
        if deviation > tolerance::KRAUS_COMPLETENESS {
            return Err(QlabError::InvalidChannel(format!(
                "{}: Σ K†K deviates from identity by {:e}",
                name, deviation
            )));
        }

        let unitary_mixture = kraus.iter().all(is_scaled_unitary);
        Ok(Self {
            name,
            num_qubits,
            kraus,
            unitary_mixture,
        })
    }

    /// Identity channel on `k` qubits
    pub fn identity(num_qubits: usize) -> QlabResult<Self> {
        Self::new("identity", vec![Operator::identity(num_qubits)])
    }

    /// `k`-qubit depolarizing channel
    ///
    /// Identity weight `1 − p + p/4^k`, every non-identity Pauli `p/4^k`.
    /// Valid for `0 ≤ p ≤ 4^k/(4^k − 1)`; `p = 1` is fully depolarizing.
    /// Gantree: depolarizing(p, k) -> Result<Self> // 탈분극
    pub fn depolarizing(p: f64, num_qubits: usize) -> QlabResult<Self> {
        if num_qubits == 0 || num_qubits > limits::MAX_CHANNEL_QUBITS {
            return Err(QlabError::InvalidChannel(format!(
                "depolarizing channel on {} qubits",
                num_qubits
            )));
        }
        let n_paulis = 4f64.powi(num_qubits as i32);
        let p_max = n_paulis / (n_paulis - 1.0);
        if !(0.0..=p_max).contains(&p) {
            return Err(QlabError::InvalidProbability(p));
        }

        let labels = pauli_labels(num_qubits);
        let terms: Vec<(&str, f64)> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let w = if i == 0 {
                    1.0 - p + p / n_paulis
                } else {
                    p / n_paulis
                };
                (label.as_str(), w)
            })
            .collect();
        Self::pauli_named(&format!("depolarizing({})", p), &terms)
    }

    /// Phase damping: `K₀ = diag(1, √(1−p))`, `K₁ = diag(0, √p)`
    /// Gantree: phase_damping(p) -> Result<Self> // 위상 감쇠
    pub fn phase_damping(p: f64) -> QlabResult<Self> {
        let prob = Probability::new(p)?;
        let k0 = Operator::diagonal(&[c(1.0), c(prob.complement().sqrt())])?;
        let k1 = Operator::diagonal(&[c(0.0), c(prob.value().sqrt())])?;
        Self::new(format!("phase_damping({})", p), vec![k0, k1])
    }

    /// Amplitude damping: `K₀ = diag(1, √(1−γ))`, `K₁ = √γ |0⟩⟨1|`
    pub fn amplitude_damping(gamma: f64) -> QlabResult<Self> {
        let prob = Probability::new(gamma)?;
        let k0 = Operator::diagonal(&[c(1.0), c(prob.complement().sqrt())])?;
        let k1 = Operator::single(c(0.0), c(prob.value().sqrt()), c(0.0), c(0.0));
        Self::new(format!("amplitude_damping({})", gamma), vec![k0, k1])
    }

    /// Bit flip with probability `p`
    pub fn bit_flip(p: f64) -> QlabResult<Self> {
        let prob = Probability::new(p)?;
        Self::pauli_named(
            &format!("bit_flip({})", p),
            &[("I", prob.complement()), ("X", prob.value())],
        )
    }

    /// Phase flip with probability `p`
    pub fn phase_flip(p: f64) -> QlabResult<Self> {
        let prob = Probability::new(p)?;
        Self::pauli_named(
            &format!("phase_flip({})", p),
            &[("I", prob.complement()), ("Z", prob.value())],
        )
    }

    /// Mixture of Pauli strings, e.g. `[("II", 0.9), ("XZ", 0.1)]`
    ///
    /// Labels put the highest channel qubit first. Probabilities must lie
    /// in `[0, 1]` and sum to 1.
    pub fn pauli(terms: &[(&str, f64)]) -> QlabResult<Self> {
        Self::pauli_named("pauli", terms)
    }

    fn pauli_named(name: &str, terms: &[(&str, f64)]) -> QlabResult<Self> {
        let mut kraus = Vec::with_capacity(terms.len());
        let mut total = 0.0;
        for &(label, prob) in terms {
            Probability::new(prob)?;
            total += prob;
            let op = Operator::pauli(label)?;
            if prob > 0.0 {
                kraus.push(op.scale(c(prob.sqrt())));
            }
        }
        if (total - 1.0).abs() > tolerance::KRAUS_COMPLETENESS {
            return Err(QlabError::InvalidChannel(format!(
                "{}: Pauli probabilities sum to {}",
                name, total
            )));
        }
        Self::new(name, kraus)
    }

    /// Sequential composition: `self` first, then `next`
    /// Gantree: compose(&self, next) -> Result<Self> // 채널 합성
    pub fn compose(&self, next: &NoiseChannel) -> QlabResult<Self> {
        if self.num_qubits != next.num_qubits {
            return Err(QlabError::dimension(
                self.num_qubits,
                next.num_qubits,
                "channel composition",
            ));
        }
        let mut kraus = Vec::with_capacity(self.kraus.len() * next.kraus.len());
        for b in &next.kraus {
            for a in &self.kraus {
                let k = b.matmul(a)?;
                if k.data().iter().any(|z| z.norm() > 0.0) {
                    kraus.push(k);
                }
            }
        }
        Self::new(format!("{} ∘ {}", next.name, self.name), kraus)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits acted on
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Kraus operators
    pub fn kraus_operators(&self) -> &[Operator] {
        &self.kraus
    }

    /// Average weight of each Kraus operator, `Tr(Kᵢ†Kᵢ)/2^k`
    pub fn weights(&self) -> Vec<f64> {
        let dim = (1usize << self.num_qubits) as f64;
        self.kraus
            .iter()
            .map(|k| k.data().iter().map(|z| z.norm_sqr()).sum::<f64>() / dim)
            .collect()
    }

    /// Check whether the channel is the identity map
    pub fn is_identity(&self) -> bool {
        self.kraus.len() == 1 && self.kraus[0].is_unitary(tolerance::UNITARY) && {
            let k = &self.kraus[0];
            let phase = k.get(0, 0);
            k.max_abs_diff(&Operator::identity(self.num_qubits).scale(phase))
                <= tolerance::UNITARY
        }
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Sample one Kraus operator along a trajectory
    ///
    /// Draws index `i` with probability `‖Kᵢψ‖²` (one uniform draw), applies
    /// it and renormalises. Returns the chosen index.
    /// Gantree: apply_trajectory(&self, state, qubits, rng) -> Result<usize> // 궤적 샘플링
    pub fn apply_trajectory<R: Rng + ?Sized>(
        &self,
        state: &mut StateVector,
        qubits: &[QubitId],
        rng: &mut R,
    ) -> QlabResult<usize> {
        self.check_qubits(qubits)?;

        if self.unitary_mixture {
            let weights = self.weights();
            let index = pick(&weights, rng)?;
            state.apply_operator(&self.kraus[index], qubits, &[])?;
            state.normalize()?;
            return Ok(index);
        }

        let mut candidates = Vec::with_capacity(self.kraus.len());
        let mut probs = Vec::with_capacity(self.kraus.len());
        for k in &self.kraus {
            let mut next = state.clone();
            next.apply_operator(k, qubits, &[])?;
            probs.push(next.norm_squared());
            candidates.push(next);
        }
        let index = pick(&probs, rng)?;
        let mut chosen = candidates.swap_remove(index);
        chosen.normalize()?;
        *state = chosen;
        Ok(index)
    }

    /// Exact application `ρ ← Σᵢ KᵢρKᵢ†`
    /// Gantree: apply_exact(&self, rho, qubits) -> Result // 정확 적용
    pub fn apply_exact(&self, rho: &mut DensityMatrix, qubits: &[QubitId]) -> QlabResult<()> {
        self.check_qubits(qubits)?;
        let mut acc = DensityMatrix::zeros(rho.num_qubits())?;
        for k in &self.kraus {
            let mut term = rho.clone();
            term.apply_operator(k, qubits, &[])?;
            acc.add_assign(&term)?;
        }
        *rho = acc;
        Ok(())
    }

    fn check_qubits(&self, qubits: &[QubitId]) -> QlabResult<()> {
        if qubits.len() != self.num_qubits {
            return Err(QlabError::dimension(
                self.num_qubits,
                qubits.len(),
                format!("{} channel qubits", self.name),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}q, {} Kraus]",
            self.name,
            self.num_qubits,
            self.kraus.len()
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

/// All `4^k` Pauli labels, identity first
fn pauli_labels(num_qubits: usize) -> Vec<String> {
    (0..num_qubits).fold(vec![String::new()], |acc, _| {
        acc.iter()
            .flat_map(|prefix| ['I', 'X', 'Y', 'Z'].map(|p| format!("{}{}", prefix, p)))
            .collect()
    })
}

fn is_scaled_unitary(k: &Operator) -> bool {
    let Ok(gram) = k.adjoint().matmul(k) else {
        return false;
    };
    let w = gram.get(0, 0);
    gram.max_abs_diff(&Operator::identity(k.num_qubits()).scale(w)) <= tolerance::KRAUS_COMPLETENESS
}

/// Pick index `i` with probability `probs[i]` (one uniform draw)
fn pick<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> QlabResult<usize> {
    let total: f64 = probs.iter().sum();
    if !total.is_finite() || (total - 1.0).abs() > tolerance::NORMALIZATION {
        return Err(QlabError::Normalization {
            total,
            tolerance: tolerance::NORMALIZATION,
        });
    }
    let dist = WeightedIndex::new(probs)
        .map_err(|e| QlabError::InternalError(format!("Kraus weights: {}", e)))?;
    Ok(dist.sample(rng))
}

// ============================================================================
// Tests
// ============================================================================
