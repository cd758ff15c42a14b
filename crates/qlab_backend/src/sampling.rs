//! Born-rule sampling
//!
//! Gantree: L4_Backend → Sampling
//!
//! Probabilities are never renormalised before sampling: a distribution
//! that drifts from unit mass is an engine bug and surfaces as
//! `Normalization`.

use qlab_core::{limits, tolerance, Bitstring, ClbitId, Counts, QlabError, QlabResult, QubitId};
use qlab_noise::NoiseModel;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::BTreeMap;

/// Check that `probs` sums to 1 within `1e-6`; returns the total
/// Gantree: check_normalized(probs) -> Result<f64> // 정규화 확인
pub fn check_normalized(probs: &[f64]) -> QlabResult<f64> {
    let total: f64 = probs.iter().sum();
    if !total.is_finite() || (total - 1.0).abs() > tolerance::NORMALIZATION {
        return Err(QlabError::Normalization {
            total,
            tolerance: tolerance::NORMALIZATION,
        });
    }
    Ok(total)
}

/// Check a shot count against the supported range
pub fn check_shots(shots: u64) -> QlabResult<()> {
    if !(limits::MIN_SHOTS..=limits::MAX_SHOTS).contains(&shots) {
        return Err(QlabError::ShotsOutOfRange(
            shots,
            limits::MIN_SHOTS,
            limits::MAX_SHOTS,
        ));
    }
    Ok(())
}

fn weighted_index(probs: &[f64]) -> QlabResult<WeightedIndex<f64>> {
    check_normalized(probs)?;
    WeightedIndex::new(probs).map_err(|e| QlabError::InternalError(format!("sampling: {}", e)))
}

/// Draw one outcome index from `probs`
pub fn sample_once<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> QlabResult<usize> {
    Ok(weighted_index(probs)?.sample(rng))
}

/// Multinomial histogram of `shots` categorical draws from `probs`
/// Gantree: sample_counts(probs, shots, rng) -> Result<Vec<u64>> // 다항 샘플링
pub fn sample_counts<R: Rng + ?Sized>(
    probs: &[f64],
    shots: u64,
    rng: &mut R,
) -> QlabResult<Vec<u64>> {
    let dist = weighted_index(probs)?;
    let mut hist = vec![0u64; probs.len()];
    for _ in 0..shots {
        hist[dist.sample(rng)] += 1;
    }
    Ok(hist)
}

/// Readout context for sampled records
#[derive(Debug, Clone, Copy)]
pub struct Readout<'a> {
    /// Noise model carrying the readout errors
    pub model: &'a NoiseModel,
    /// Final `(qubit, clbit)` writer of each measured classical bit
    pub measured: &'a [(QubitId, ClbitId)],
}

impl Readout<'_> {
    /// Apply the readout errors to one record
    pub fn apply<R: Rng + ?Sized>(&self, record: u64, rng: &mut R) -> QlabResult<u64> {
        self.model.apply_readout(record, self.measured, rng)
    }
}

/// Sample `shots` classical records from a distribution over records
///
/// Each shot takes one categorical draw, then its readout draws.
/// Gantree: sample_records(dist, shots, readout, rng) -> Result<BTreeMap> // 레코드 샘플링
pub fn sample_records<R: Rng + ?Sized>(
    distribution: &[(u64, f64)],
    shots: u64,
    readout: Option<Readout<'_>>,
    rng: &mut R,
) -> QlabResult<BTreeMap<u64, u64>> {
    let probs: Vec<f64> = distribution.iter().map(|(_, p)| *p).collect();
    let dist = weighted_index(&probs)?;
    let mut records = BTreeMap::new();
    for _ in 0..shots {
        let mut record = distribution[dist.sample(rng)].0;
        if let Some(readout) = &readout {
            record = readout.apply(record, rng)?;
        }
        *records.entry(record).or_insert(0) += 1;
    }
    Ok(records)
}

/// Render record histograms as bitstring counts (highest clbit leftmost)
pub fn records_to_counts(records: &BTreeMap<u64, u64>, num_clbits: usize) -> Counts {
    records
        .iter()
        .map(|(&record, &n)| (Bitstring::from_register(record, num_clbits).to_string(), n))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
