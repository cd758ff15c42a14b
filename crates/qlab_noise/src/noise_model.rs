//! Noise model for QLAB
//!
//! Gantree: L3_Noise → NoiseModel
//!
//! Attaches Kraus channels to gates and readout errors to measured qubits.
//! Channel lookup for a gate is most-specific first:
//! `(kind, qubits)` → `kind` → arity default → none.

use crate::channel::NoiseChannel;
use crate::readout::ReadoutError;
use qlab_core::{limits, Circuit, ClbitId, Gate, GateKind, QlabError, QlabResult, QubitId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Channel attached to one gate kind on specific qubits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalError {
    /// Gate kind
    pub kind: GateKind,
    /// Exact qubit tuple, in gate operand order
    pub qubits: Vec<QubitId>,
    /// Attached channel
    pub channel: NoiseChannel,
}

/// Readout error spanning a fixed group of qubits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedReadout {
    /// Covered qubits; outcome bit `i` is `qubits[i]`
    pub qubits: Vec<QubitId>,
    /// Assignment matrix
    pub error: ReadoutError,
}

/// Gate noise and readout noise for a simulation
/// Gantree: NoiseModel // 노이즈 모델
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Channels keyed by gate kind and qubit tuple
    /// Gantree: local: Vec<LocalError> // 국소 오류
    local: Vec<LocalError>,

    /// Channels keyed by gate kind on any qubits
    /// Gantree: all_qubit: BTreeMap<GateKind, NoiseChannel> // 전체 큐비트 오류
    all_qubit: BTreeMap<GateKind, NoiseChannel>,

    /// Fallback channel per gate arity
    /// Gantree: arity_default: BTreeMap<usize, NoiseChannel> // 기본 오류
    arity_default: BTreeMap<usize, NoiseChannel>,

    /// Readout error for every measured qubit
    /// Gantree: readout: Option<ReadoutError> // 판독 오류
    readout: Option<ReadoutError>,

    /// Per-qubit readout overrides
    qubit_readout: BTreeMap<QubitId, ReadoutError>,

    /// Correlated readout groups (disjoint)
    correlated_readout: Vec<CorrelatedReadout>,
}

/// One readout application over measured `(qubit, clbit)` pairs
#[derive(Debug, Clone)]
struct ReadoutStep<'a> {
    error: &'a ReadoutError,
    pairs: Vec<(QubitId, ClbitId)>,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Create ideal (noiseless) model
    /// Gantree: ideal() -> Self // 이상적
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Uniform depolarizing noise: `p1` after every 1-qubit gate, `p2` after
    /// every 2-qubit gate
    /// Gantree: depolarizing(p1, p2) -> Result<Self> // 균일 탈분극
    pub fn depolarizing(p1: f64, p2: f64) -> QlabResult<Self> {
        let mut model = Self::new();
        model.add_arity_default(NoiseChannel::depolarizing(p1, 1)?, 1)?;
        model.add_arity_default(NoiseChannel::depolarizing(p2, 2)?, 2)?;
        Ok(model)
    }

    // ========================================================================
    // Gate Errors
    // ========================================================================

    /// Attach `channel` to every gate of the listed kinds
    /// Gantree: add_all_qubit_error(channel, kinds) -> Result // 종류별 오류
    pub fn add_all_qubit_error(
        &mut self,
        channel: NoiseChannel,
        kinds: &[GateKind],
    ) -> QlabResult<()> {
        for &kind in kinds {
            check_arity(&channel, kind.num_qubits(), kind.name())?;
        }
        for &kind in kinds {
            if self.all_qubit.insert(kind, channel.clone()).is_some() {
                log::debug!("Replacing all-qubit error on '{}'", kind.name());
            }
        }
        Ok(())
    }

    /// Attach `channel` to gates of `kind` acting on exactly `qubits`
    /// Gantree: add_quantum_error(channel, kind, qubits) -> Result // 국소 오류
    pub fn add_quantum_error(
        &mut self,
        channel: NoiseChannel,
        kind: GateKind,
        qubits: &[QubitId],
    ) -> QlabResult<()> {
        check_local_qubits(kind, qubits)?;
        check_arity(&channel, kind.num_qubits(), kind.name())?;

        self.local.retain(|e| !(e.kind == kind && e.qubits == qubits));
        self.local.push(LocalError {
            kind,
            qubits: qubits.to_vec(),
            channel,
        });
        Ok(())
    }

    /// Fallback channel for gates with `arity` qubits not otherwise covered
    pub fn add_arity_default(&mut self, channel: NoiseChannel, arity: usize) -> QlabResult<()> {
        check_default_arity(arity)?;
        check_arity(&channel, arity, "default")?;
        self.arity_default.insert(arity, channel);
        Ok(())
    }

    /// Builder form of [`add_all_qubit_error`](Self::add_all_qubit_error)
    pub fn with_all_qubit_error(
        mut self,
        channel: NoiseChannel,
        kinds: &[GateKind],
    ) -> QlabResult<Self> {
        self.add_all_qubit_error(channel, kinds)?;
        Ok(self)
    }

    /// Builder form of [`add_quantum_error`](Self::add_quantum_error)
    pub fn with_quantum_error(
        mut self,
        channel: NoiseChannel,
        kind: GateKind,
        qubits: &[QubitId],
    ) -> QlabResult<Self> {
        self.add_quantum_error(channel, kind, qubits)?;
        Ok(self)
    }

    /// Builder form of [`add_arity_default`](Self::add_arity_default)
    pub fn with_arity_default(mut self, channel: NoiseChannel, arity: usize) -> QlabResult<Self> {
        self.add_arity_default(channel, arity)?;
        Ok(self)
    }

    // ========================================================================
    // Readout Errors
    // ========================================================================

    /// Readout error applied to every measured qubit
    pub fn set_readout_error(&mut self, error: ReadoutError) -> QlabResult<()> {
        check_single_readout(&error)?;
        self.readout = Some(error);
        Ok(())
    }

    /// Readout error for one qubit, overriding the uniform one
    pub fn add_qubit_readout_error(&mut self, qubit: QubitId, error: ReadoutError) -> QlabResult<()> {
        check_single_readout(&error)?;
        self.qubit_readout.insert(qubit, error);
        Ok(())
    }

    /// Correlated readout error over a disjoint qubit group
    /// Gantree: add_correlated_readout_error(qubits, error) -> Result // 상관 판독
    pub fn add_correlated_readout_error(
        &mut self,
        qubits: &[QubitId],
        error: ReadoutError,
    ) -> QlabResult<()> {
        check_correlated(qubits, &error, &self.correlated_readout)?;
        self.correlated_readout.push(CorrelatedReadout {
            qubits: qubits.to_vec(),
            error,
        });
        Ok(())
    }

    /// Builder form of [`set_readout_error`](Self::set_readout_error)
    pub fn with_readout_error(mut self, error: ReadoutError) -> QlabResult<Self> {
        self.set_readout_error(error)?;
        Ok(self)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Channel attached to `gate`, most specific first
    /// Gantree: channel_for(&self, gate) -> Option<&NoiseChannel> // 채널 조회
    pub fn channel_for(&self, gate: &Gate) -> Option<&NoiseChannel> {
        let kind = gate.kind();
        let qubits = gate.qubits();
        self.local
            .iter()
            .find(|e| e.kind == kind && e.qubits == qubits)
            .map(|e| &e.channel)
            .or_else(|| self.all_qubit.get(&kind))
            .or_else(|| self.arity_default.get(&qubits.len()))
    }

    /// Channel applications following `gate`
    ///
    /// A channel matching the gate arity acts once on the gate's qubits in
    /// operand order. A 1-qubit channel on a wider gate acts on each qubit.
    /// Gantree: noise_after(&self, gate) -> Vec<(&NoiseChannel, Vec<QubitId>)> // 배치
    pub fn noise_after(&self, gate: &Gate) -> Vec<(&NoiseChannel, Vec<QubitId>)> {
        let Some(channel) = self.channel_for(gate) else {
            return Vec::new();
        };
        if channel.is_identity() {
            return Vec::new();
        }
        let qubits = gate.qubits();
        if channel.num_qubits() == qubits.len() {
            vec![(channel, qubits)]
        } else {
            qubits.into_iter().map(|q| (channel, vec![q])).collect()
        }
    }

    /// Readout error governing a single qubit, if any
    pub fn readout_for(&self, qubit: QubitId) -> Option<&ReadoutError> {
        self.qubit_readout.get(&qubit).or(self.readout.as_ref())
    }

    /// Apply readout errors to a classical record
    ///
    /// `measured` lists the final `(qubit, clbit)` writer of each measured
    /// classical bit. Steps run in ascending qubit order with one draw each.
    /// A correlated group applies when each of its qubits appears exactly
    /// once; otherwise its qubits fall back to single-qubit errors.
    /// Classical bits must fit the 64-bit record.
    /// Gantree: apply_readout(&self, record, measured, rng) -> Result<u64> // 판독 적용
    pub fn apply_readout<R: Rng + ?Sized>(
        &self,
        record: u64,
        measured: &[(QubitId, ClbitId)],
        rng: &mut R,
    ) -> QlabResult<u64> {
        if let Some(&(_, clbit)) = measured.iter().find(|&&(_, c)| c >= limits::MAX_CLBITS) {
            return Err(QlabError::ClbitOutOfRange {
                clbit,
                num_clbits: limits::MAX_CLBITS,
            });
        }
        let mut record = record;
        for step in self.readout_plan(measured) {
            let truth = step
                .pairs
                .iter()
                .enumerate()
                .fold(0usize, |acc, (i, &(_, c))| acc | ((((record >> c) & 1) as usize) << i));
            let reported = step.error.sample(truth, rng)?;
            for (i, &(_, c)) in step.pairs.iter().enumerate() {
                let bit = ((reported >> i) & 1) as u64;
                record = (record & !(1u64 << c)) | (bit << c);
            }
        }
        Ok(record)
    }

    fn readout_plan(&self, measured: &[(QubitId, ClbitId)]) -> Vec<ReadoutStep<'_>> {
        let mut pairs = measured.to_vec();
        pairs.sort_unstable();

        let mut steps: Vec<(QubitId, ReadoutStep<'_>)> = Vec::new();
        let mut grouped = BTreeSet::new();

        for group in &self.correlated_readout {
            let mut found = Vec::with_capacity(group.qubits.len());
            let complete = group.qubits.iter().all(|q| {
                let mut hits = pairs.iter().filter(|(pq, _)| pq == q);
                match (hits.next(), hits.next()) {
                    (Some(&pair), None) => {
                        found.push(pair);
                        true
                    }
                    _ => false,
                }
            });
            if complete {
                grouped.extend(group.qubits.iter().copied());
                let first = group.qubits.iter().copied().min().unwrap_or_default();
                steps.push((
                    first,
                    ReadoutStep {
                        error: &group.error,
                        pairs: found,
                    },
                ));
            }
        }

        for &(q, c) in &pairs {
            if grouped.contains(&q) {
                continue;
            }
            if let Some(error) = self.readout_for(q) {
                steps.push((
                    q,
                    ReadoutStep {
                        error,
                        pairs: vec![(q, c)],
                    },
                ));
            }
        }

        // Stable sort keeps clbit order for repeated qubits
        steps.sort_by_key(|(q, _)| *q);
        steps.into_iter().map(|(_, s)| s).collect()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Check whether any gate channel is attached
    pub fn has_gate_noise(&self) -> bool {
        let noisy = |c: &NoiseChannel| !c.is_identity();
        self.local.iter().any(|e| noisy(&e.channel))
            || self.all_qubit.values().any(noisy)
            || self.arity_default.values().any(noisy)
    }

    /// Check whether any readout error is attached
    pub fn has_readout_error(&self) -> bool {
        self.readout.as_ref().is_some_and(|e| !e.is_ideal())
            || self.qubit_readout.values().any(|e| !e.is_ideal())
            || self.correlated_readout.iter().any(|g| !g.error.is_ideal())
    }

    /// Check if the model is noiseless
    /// Gantree: is_ideal(&self) -> bool // 이상적 여부
    pub fn is_ideal(&self) -> bool {
        !self.has_gate_noise() && !self.has_readout_error()
    }

    /// Report which gate kinds in `circuit` receive noise
    ///
    /// Logs a warning when the model carries gate noise but leaves some
    /// kinds uncovered.
    /// Gantree: coverage(&self, circuit) -> NoiseCoverage // 적용 범위
    pub fn coverage(&self, circuit: &Circuit) -> NoiseCoverage {
        let mut report = NoiseCoverage::default();
        for gate in circuit.gates() {
            let slot = if self.channel_for(gate).is_some() {
                &mut report.covered
            } else {
                &mut report.uncovered
            };
            *slot.entry(gate.kind()).or_insert(0) += 1;
        }

        if self.has_gate_noise() && !report.uncovered.is_empty() {
            let names: Vec<&str> = report.uncovered.keys().map(GateKind::name).collect();
            log::warn!(
                "Noise model leaves gate kinds without noise: {}",
                names.join(", ")
            );
        }
        report
    }

    /// Channels keyed by kind and qubits
    pub fn local_errors(&self) -> &[LocalError] {
        &self.local
    }

    /// Channels keyed by kind
    pub fn all_qubit_errors(&self) -> &BTreeMap<GateKind, NoiseChannel> {
        &self.all_qubit
    }

    /// Fallback channels by arity
    pub fn arity_defaults(&self) -> &BTreeMap<usize, NoiseChannel> {
        &self.arity_default
    }

    /// Uniform readout error
    pub fn readout_error(&self) -> Option<&ReadoutError> {
        self.readout.as_ref()
    }

    /// Correlated readout groups
    pub fn correlated_readout_errors(&self) -> &[CorrelatedReadout] {
        &self.correlated_readout
    }

    /// Re-check how channels and readout errors are attached
    ///
    /// Channels and readout errors validate themselves on construction and
    /// deserialization; this covers the model-level rules the `add_*`
    /// methods enforce, which a deserialized model bypasses.
    /// Gantree: validate(&self) -> Result // 검증
    pub fn validate(&self) -> QlabResult<()> {
        for e in &self.local {
            check_local_qubits(e.kind, &e.qubits)?;
            check_arity(&e.channel, e.kind.num_qubits(), e.kind.name())?;
        }
        for (kind, channel) in &self.all_qubit {
            check_arity(channel, kind.num_qubits(), kind.name())?;
        }
        for (&arity, channel) in &self.arity_default {
            check_default_arity(arity)?;
            check_arity(channel, arity, "default")?;
        }
        if let Some(e) = &self.readout {
            check_single_readout(e)?;
        }
        for e in self.qubit_readout.values() {
            check_single_readout(e)?;
        }
        for (i, g) in self.correlated_readout.iter().enumerate() {
            check_correlated(&g.qubits, &g.error, &self.correlated_readout[..i])?;
        }
        Ok(())
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ideal() {
            return write!(f, "NoiseModel(ideal)");
        }
        writeln!(f, "NoiseModel:")?;
        for e in &self.local {
            writeln!(f, "  {} {:?}: {}", e.kind.name(), e.qubits, e.channel)?;
        }
        for (kind, channel) in &self.all_qubit {
            writeln!(f, "  {}: {}", kind.name(), channel)?;
        }
        for (arity, channel) in &self.arity_default {
            writeln!(f, "  default {}q: {}", arity, channel)?;
        }
        if let Some(e) = &self.readout {
            writeln!(f, "  readout: {}", e)?;
        }
        for (q, e) in &self.qubit_readout {
            writeln!(f, "  readout q{}: {}", q, e)?;
        }
        for g in &self.correlated_readout {
            writeln!(f, "  readout {:?}: {}", g.qubits, g.error)?;
        }
        Ok(())
    }
}

// ============================================================================
// Coverage Report
// ============================================================================

/// Gate kinds of a circuit with and without attached noise
/// Gantree: NoiseCoverage // 적용 범위 보고
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseCoverage {
    /// Occurrences per kind that received a channel
    pub covered: BTreeMap<GateKind, usize>,
    /// Occurrences per kind that ran noiselessly
    pub uncovered: BTreeMap<GateKind, usize>,
}

impl NoiseCoverage {
    /// Check whether every gate received a channel
    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }

    /// Kinds without noise
    pub fn uncovered_kinds(&self) -> Vec<GateKind> {
        self.uncovered.keys().copied().collect()
    }
}

impl fmt::Display for NoiseCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |m: &BTreeMap<GateKind, usize>| {
            m.iter()
                .map(|(k, n)| format!("{}×{}", k.name(), n))
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(
            f,
            "covered [{}], uncovered [{}]",
            list(&self.covered),
            list(&self.uncovered)
        )
    }
}

// ============================================================================
// Validation Helpers
// ============================================================================

fn check_arity(channel: &NoiseChannel, gate_arity: usize, what: &str) -> QlabResult<()> {
    let k = channel.num_qubits();
    if k == gate_arity || k == 1 {
        Ok(())
    } else {
        Err(QlabError::dimension(
            gate_arity,
            k,
            format!("channel arity for '{}' gates", what),
        ))
    }
}

fn check_single_readout(error: &ReadoutError) -> QlabResult<()> {
    if error.num_qubits() != 1 {
        return Err(QlabError::dimension(1, error.num_qubits(), "single-qubit readout error"));
    }
    Ok(())
}

fn check_default_arity(arity: usize) -> QlabResult<()> {
    if !(1..=3).contains(&arity) {
        return Err(QlabError::dimension(3, arity, "default error arity"));
    }
    Ok(())
}

fn check_local_qubits(kind: GateKind, qubits: &[QubitId]) -> QlabResult<()> {
    if qubits.len() != kind.num_qubits() {
        return Err(QlabError::dimension(
            kind.num_qubits(),
            qubits.len(),
            format!("qubits for '{}' error", kind.name()),
        ));
    }
    check_distinct(qubits)
}

/// Group size matches the matrix and does not overlap `existing`
fn check_correlated(
    qubits: &[QubitId],
    error: &ReadoutError,
    existing: &[CorrelatedReadout],
) -> QlabResult<()> {
    if qubits.len() != error.num_qubits() {
        return Err(QlabError::dimension(
            error.num_qubits(),
            qubits.len(),
            "correlated readout qubits",
        ));
    }
    check_distinct(qubits)?;
    match existing
        .iter()
        .flat_map(|g| g.qubits.iter())
        .find(|q| qubits.contains(q))
    {
        Some(&q) => Err(QlabError::DuplicateQubit(q)),
        None => Ok(()),
    }
}

fn check_distinct(qubits: &[QubitId]) -> QlabResult<()> {
    let mut seen = BTreeSet::new();
    match qubits.iter().find(|q| !seen.insert(**q)) {
        Some(&q) => Err(QlabError::DuplicateQubit(q)),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================
