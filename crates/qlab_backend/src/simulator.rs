//! Simulator backend for QLAB
//!
//! Gantree: L4_Backend → Simulator
//!
//! Three methods share one circuit walk:
//!
//! - **ideal**: noiseless statevector; sampled from the final distribution,
//!   or per shot when mid-circuit measurements steer the circuit.
//! - **trajectory**: one statevector trajectory per shot, each on its own
//!   `ChaCha8Rng` stream, run in parallel with rayon.
//! - **exact**: density-matrix evolution with exact channels; mid-circuit
//!   measurements split the state into classical-record branches.
//!
//! Terminal measurements are never applied to the state; they are sampled
//! from the final distribution.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult, Method};
use crate::sampling::{self, Readout};
use qlab_core::{
    sampling::derive_seed, tolerance, Circuit, ClbitId, Gate, Operation, QlabError, QlabResult,
    QubitId,
};
use qlab_noise::{NoiseCoverage, NoiseModel};
use qlab_state::{DensityMatrix, StateVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;

/// Record histogram keyed by classical register value
type Records = BTreeMap<u64, u64>;

/// Noise-aware circuit simulator
/// Gantree: Simulator // 시뮬레이터 구현
#[derive(Debug, Clone)]
pub struct Simulator {
    /// Backend name
    name: String,

    /// Simulation method
    method: Method,

    /// Noise model (ignored by the ideal method)
    noise_model: NoiseModel,

    /// Base seed; drawn from entropy when absent
    seed: Option<u64>,

    /// Run shots and batches on the rayon pool
    parallel: bool,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Method::Ideal)
    }
}

impl Simulator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a simulator using `method` with no noise
    pub fn new(method: Method) -> Self {
        Self {
            name: "qlab_simulator".to_string(),
            method,
            noise_model: NoiseModel::ideal(),
            seed: None,
            parallel: true,
        }
    }

    /// Create ideal (noiseless) simulator
    pub fn ideal() -> Self {
        Self::new(Method::Ideal)
    }

    /// Trajectory simulator with `noise_model`
    pub fn trajectory(noise_model: NoiseModel) -> Self {
        Self::new(Method::Trajectory).with_noise_model(noise_model)
    }

    /// Exact density-matrix simulator with `noise_model`
    pub fn exact(noise_model: NoiseModel) -> Self {
        Self::new(Method::Exact).with_noise_model(noise_model)
    }

    /// Set noise model
    pub fn with_noise_model(mut self, noise_model: NoiseModel) -> Self {
        self.noise_model = noise_model;
        self
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable rayon parallelism
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Configured seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check whether shots run in parallel
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Noise model the method applies, re-validated before every run
    fn active_noise(&self) -> QlabResult<Option<&NoiseModel>> {
        match self.method {
            Method::Ideal => Ok(None),
            Method::Trajectory | Method::Exact => {
                self.noise_model.validate()?;
                Ok(Some(&self.noise_model))
            }
        }
    }

    fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            let seed = rand::random();
            log::debug!("No seed configured, using entropy seed {}", seed);
            seed
        })
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute with an explicit base seed
    /// Gantree: execute_with_seed(circuit, shots, seed) -> Result<ExecutionResult> // 실행
    pub fn execute_with_seed(
        &self,
        circuit: &Circuit,
        shots: u64,
        seed: u64,
    ) -> QlabResult<ExecutionResult> {
        sampling::check_shots(shots)?;
        let noise = self.active_noise()?;
        let start = Instant::now();
        let plan = Plan::new(circuit)?;

        log::debug!(
            "Executing {} qubits / {} ops with {} method, {} shots, seed {}",
            plan.circuit.num_qubits(),
            plan.circuit.operations().len(),
            self.method,
            shots,
            seed
        );

        let coverage = match noise {
            Some(model) => model.coverage(&plan.circuit),
            None => NoiseCoverage::default(),
        };
        let readout = noise
            .filter(|m| m.has_readout_error())
            .map(|model| Readout {
                model,
                measured: &plan.measured,
            });

        let mut branches = None;
        let records = match self.method {
            Method::Exact => {
                let evolved = evolve_exact(&plan, noise)?;
                branches = Some(evolved.len());
                let distribution = plan.record_distribution(&evolved)?;
                let mut rng = stream_rng(seed, 0);
                sampling::sample_records(&distribution, shots, readout, &mut rng)?
            }
            Method::Ideal if !plan.mid_circuit => {
                let mut rng = stream_rng(seed, 0);
                let (state, record) = run_trajectory(&plan, None, &mut rng)?;
                let probs = state.marginal_probabilities(&plan.terminal_qubits)?;
                let distribution = plan.place_outcomes(record, &probs);
                sampling::sample_records(&distribution, shots, None, &mut rng)?
            }
            Method::Ideal | Method::Trajectory => self.run_shots(&plan, noise, readout, shots, seed)?,
        };

        let counts = sampling::records_to_counts(&records, plan.circuit.num_clbits());
        Ok(ExecutionResult {
            counts,
            shots,
            coverage,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                method: self.method,
                seed,
                num_qubits: plan.circuit.num_qubits(),
                num_clbits: plan.circuit.num_clbits(),
                implicit_measurement: plan.implicit,
                branches,
                execution_time_ms: Some(start.elapsed().as_millis() as u64),
            },
        })
    }

    /// One trajectory per shot; shot `i` draws from stream `i`
    fn run_shots(
        &self,
        plan: &Plan<'_>,
        noise: Option<&NoiseModel>,
        readout: Option<Readout<'_>>,
        shots: u64,
        seed: u64,
    ) -> QlabResult<Records> {
        let shot = |i: u64| -> QlabResult<u64> {
            let mut rng = stream_rng(seed, i);
            let (state, record) = run_trajectory(plan, noise, &mut rng)?;
            let record = if plan.terminal_qubits.is_empty() {
                record
            } else {
                let probs = state.marginal_probabilities(&plan.terminal_qubits)?;
                let outcome = sampling::sample_once(&probs, &mut rng)?;
                plan.place_terminal(record, outcome)
            };
            match &readout {
                Some(r) => r.apply(record, &mut rng),
                None => Ok(record),
            }
        };

        if self.parallel {
            (0..shots)
                .into_par_iter()
                .map(shot)
                .try_fold(
                    Records::new,
                    |mut acc: Records, record: QlabResult<u64>| -> QlabResult<Records> {
                        *acc.entry(record?).or_insert(0) += 1;
                        Ok(acc)
                    },
                )
                .try_reduce(Records::new, |mut a, b| {
                    for (record, n) in b {
                        *a.entry(record).or_insert(0) += n;
                    }
                    Ok(a)
                })
        } else {
            (0..shots).map(shot).try_fold(
                Records::new(),
                |mut acc: Records, record: QlabResult<u64>| -> QlabResult<Records> {
                    *acc.entry(record?).or_insert(0) += 1;
                    Ok(acc)
                },
            )
        }
    }

    /// Final state with an explicit base seed
    ///
    /// Exact and ideal: sum of all measurement branches. Trajectory: the
    /// stream-0 trajectory as a pure state.
    /// Gantree: final_state_with_seed(circuit, seed) -> Result<DensityMatrix> // 최종 상태
    pub fn final_state_with_seed(&self, circuit: &Circuit, seed: u64) -> QlabResult<DensityMatrix> {
        let noise = self.active_noise()?;
        let plan = Plan::new(circuit)?;
        match self.method {
            Method::Exact | Method::Ideal => {
                let branches = evolve_exact(&plan, noise)?;
                let mut total = DensityMatrix::zeros(plan.circuit.num_qubits())?;
                for rho in branches.values() {
                    total.add_assign(rho)?;
                }
                Ok(total)
            }
            Method::Trajectory => {
                let mut rng = stream_rng(seed, 0);
                let (state, _) = run_trajectory(&plan, noise, &mut rng)?;
                state.to_density_matrix()
            }
        }
    }

    /// Average of `trajectories` pure states on streams `0..trajectories`
    /// Gantree: trajectory_average_with_seed(circuit, n, seed) -> Result<DensityMatrix> // 궤적 평균
    pub fn trajectory_average_with_seed(
        &self,
        circuit: &Circuit,
        trajectories: usize,
        seed: u64,
    ) -> QlabResult<DensityMatrix> {
        sampling::check_shots(trajectories as u64)?;
        let noise = self.active_noise()?;
        let plan = Plan::new(circuit)?;
        let one = |i: u64| -> QlabResult<DensityMatrix> {
            let mut rng = stream_rng(seed, i);
            run_trajectory(&plan, noise, &mut rng)?.0.to_density_matrix()
        };

        let total = if self.parallel {
            (0..trajectories as u64)
                .into_par_iter()
                .map(one)
                .try_fold(|| None, |acc, rho| merge_states(acc, rho?))
                .try_reduce(|| None, |a, b| match b {
                    Some(b) => merge_states(a, b),
                    None => Ok(a),
                })?
        } else {
            (0..trajectories as u64)
                .map(one)
                .try_fold(None, |acc, rho| merge_states(acc, rho?))?
        };
        let mut total =
            total.ok_or_else(|| QlabError::InternalError("no trajectories averaged".into()))?;
        total.scale(1.0 / trajectories as f64);
        Ok(total)
    }
}

impl Backend for Simulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        self.method
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QlabResult<ExecutionResult> {
        self.execute_with_seed(circuit, shots, self.resolve_seed())
    }

    /// Circuit `j` runs with seed `derive_seed(base, j)`
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QlabResult<Vec<ExecutionResult>> {
        let base = self.resolve_seed();
        let run = |(j, circuit): (usize, &Circuit)| {
            self.execute_with_seed(circuit, shots, derive_seed(base, j as u64))
        };
        if self.parallel {
            circuits.par_iter().enumerate().map(run).collect()
        } else {
            circuits.iter().enumerate().map(run).collect()
        }
    }

    fn final_state(&self, circuit: &Circuit) -> QlabResult<DensityMatrix> {
        self.final_state_with_seed(circuit, self.resolve_seed())
    }

    fn trajectory_average(
        &self,
        circuit: &Circuit,
        trajectories: usize,
    ) -> QlabResult<DensityMatrix> {
        self.trajectory_average_with_seed(circuit, trajectories, self.resolve_seed())
    }
}

// ============================================================================
// Execution Plan
// ============================================================================

/// Circuit prepared for simulation
struct Plan<'a> {
    /// Circuit, with a measure-all appended when it had no measurement
    circuit: Cow<'a, Circuit>,
    implicit: bool,
    /// Terminal flag per operation
    terminal: Vec<bool>,
    /// Terminal `(qubit, clbit)` pairs; outcome bit `i` is pair `i`
    terminal_pairs: Vec<(QubitId, ClbitId)>,
    terminal_qubits: Vec<QubitId>,
    /// Final writer of each measured clbit, for readout
    measured: Vec<(QubitId, ClbitId)>,
    mid_circuit: bool,
}

impl<'a> Plan<'a> {
    fn new(circuit: &'a Circuit) -> QlabResult<Self> {
        circuit.validate()?;
        let (circuit, implicit) = if circuit.has_measurements() {
            (Cow::Borrowed(circuit), false)
        } else {
            let mut owned = circuit.clone();
            owned.measure_all()?;
            (Cow::Owned(owned), true)
        };

        let terminal = circuit.terminal_measurements();
        let mut terminal_pairs = Vec::new();
        let mut writers = BTreeMap::new();
        let mut mid_circuit = false;
        for (op, &is_terminal) in circuit.operations().iter().zip(&terminal) {
            if let Operation::Measure { qubit, clbit } = *op {
                writers.insert(clbit, qubit);
                if is_terminal {
                    terminal_pairs.push((qubit, clbit));
                } else {
                    mid_circuit = true;
                }
            }
        }

        Ok(Self {
            terminal_qubits: terminal_pairs.iter().map(|&(q, _)| q).collect(),
            measured: writers.into_iter().map(|(c, q)| (q, c)).collect(),
            circuit,
            implicit,
            terminal,
            terminal_pairs,
            mid_circuit,
        })
    }

    /// Write a terminal outcome into the record
    fn place_terminal(&self, record: u64, outcome: usize) -> u64 {
        self.terminal_pairs
            .iter()
            .enumerate()
            .fold(record, |r, (i, &(_, c))| set_bit(r, c, (outcome >> i) & 1 == 1))
    }

    /// Distribution over full records for one branch
    fn place_outcomes(&self, record: u64, probs: &[f64]) -> Vec<(u64, f64)> {
        probs
            .iter()
            .enumerate()
            .filter(|(_, &p)| p > 0.0)
            .map(|(outcome, &p)| (self.place_terminal(record, outcome), p))
            .collect()
    }

    /// Distribution over full records from exact branches
    fn record_distribution(
        &self,
        branches: &BTreeMap<u64, DensityMatrix>,
    ) -> QlabResult<Vec<(u64, f64)>> {
        let mut distribution = BTreeMap::new();
        for (&record, rho) in branches {
            let probs = rho.marginal_probabilities(&self.terminal_qubits)?;
            for (full, p) in self.place_outcomes(record, &probs) {
                *distribution.entry(full).or_insert(0.0) += p;
            }
        }
        Ok(distribution.into_iter().collect())
    }
}

// ============================================================================
// Evolution
// ============================================================================

fn merge_states(
    acc: Option<DensityMatrix>,
    rho: DensityMatrix,
) -> QlabResult<Option<DensityMatrix>> {
    Ok(Some(match acc {
        Some(mut total) => {
            total.add_assign(&rho)?;
            total
        }
        None => rho,
    }))
}

fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

#[inline]
fn bit(record: u64, clbit: ClbitId) -> bool {
    (record >> clbit) & 1 == 1
}

#[inline]
fn set_bit(record: u64, clbit: ClbitId, value: bool) -> u64 {
    (record & !(1u64 << clbit)) | (u64::from(value) << clbit)
}

fn apply_noisy_gate<R: Rng + ?Sized>(
    state: &mut StateVector,
    gate: &Gate,
    noise: Option<&NoiseModel>,
    rng: &mut R,
) -> QlabResult<()> {
    state.apply_gate(gate)?;
    if let Some(model) = noise {
        for (channel, qubits) in model.noise_after(gate) {
            channel.apply_trajectory(state, &qubits, rng)?;
        }
    }
    Ok(())
}

fn apply_noisy_gate_exact(
    rho: &mut DensityMatrix,
    gate: &Gate,
    noise: Option<&NoiseModel>,
) -> QlabResult<()> {
    rho.apply_gate(gate)?;
    if let Some(model) = noise {
        for (channel, qubits) in model.noise_after(gate) {
            channel.apply_exact(rho, &qubits)?;
        }
    }
    Ok(())
}

/// Walk the circuit on a statevector up to the terminal measurements
///
/// Draws: one per channel application in circuit order, one per
/// mid-circuit measurement.
fn run_trajectory<R: Rng + ?Sized>(
    plan: &Plan<'_>,
    noise: Option<&NoiseModel>,
    rng: &mut R,
) -> QlabResult<(StateVector, u64)> {
    let mut state = StateVector::new(plan.circuit.num_qubits())?;
    let mut record = 0u64;

    for (op, &is_terminal) in plan.circuit.operations().iter().zip(&plan.terminal) {
        match op {
            Operation::Gate(gate) => apply_noisy_gate(&mut state, gate, noise, rng)?,
            Operation::Conditional { clbit, value, gate } => {
                if bit(record, *clbit) == *value {
                    apply_noisy_gate(&mut state, gate, noise, rng)?;
                }
            }
            Operation::Measure { qubit, clbit } if !is_terminal => {
                let outcome = state.measure(*qubit, rng.gen())?;
                record = set_bit(record, *clbit, outcome);
            }
            Operation::Measure { .. } | Operation::Barrier(_) => {}
        }
    }
    Ok((state, record))
}

/// Evolve the density matrix, branching on mid-circuit measurements
///
/// Branch states are unnormalised; their traces are the branch weights.
/// Branches with equal records are merged, negligible ones dropped.
fn evolve_exact(
    plan: &Plan<'_>,
    noise: Option<&NoiseModel>,
) -> QlabResult<BTreeMap<u64, DensityMatrix>> {
    let mut branches = BTreeMap::new();
    branches.insert(0u64, DensityMatrix::new(plan.circuit.num_qubits())?);

    for (op, &is_terminal) in plan.circuit.operations().iter().zip(&plan.terminal) {
        match op {
            Operation::Gate(gate) => {
                for rho in branches.values_mut() {
                    apply_noisy_gate_exact(rho, gate, noise)?;
                }
            }
            Operation::Conditional { clbit, value, gate } => {
                for (&record, rho) in branches.iter_mut() {
                    if bit(record, *clbit) == *value {
                        apply_noisy_gate_exact(rho, gate, noise)?;
                    }
                }
            }
            Operation::Measure { qubit, clbit } if !is_terminal => {
                branches = split_branches(branches, *qubit, *clbit)?;
            }
            Operation::Measure { .. } | Operation::Barrier(_) => {}
        }
    }
    Ok(branches)
}

fn split_branches(
    branches: BTreeMap<u64, DensityMatrix>,
    qubit: QubitId,
    clbit: ClbitId,
) -> QlabResult<BTreeMap<u64, DensityMatrix>> {
    let mut next: BTreeMap<u64, DensityMatrix> = BTreeMap::new();
    for (record, rho) in branches {
        for outcome in [false, true] {
            let mut part = rho.clone();
            let weight = part.project(qubit, outcome)?;
            if weight <= tolerance::BRANCH_WEIGHT {
                continue;
            }
            match next.entry(set_bit(record, clbit, outcome)) {
                Entry::Occupied(mut e) => e.get_mut().add_assign(&part)?,
                Entry::Vacant(e) => {
                    e.insert(part);
                }
            }
        }
    }
    Ok(next)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qlab_core::{CircuitBuilder, GateKind};
    use qlab_noise::{NoiseChannel, ReadoutError};

    fn bell() -> Circuit {
        CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build().unwrap()
    }

    #[test]
    fn test_ideal_hadamard() {
        let circuit = CircuitBuilder::new(1).h(0).measure_all().build().unwrap();
        let result = Simulator::ideal()
            .with_seed(42)
            .execute(&circuit, 1024)
            .unwrap();
        assert_eq!(result.total_counts(), 1024);
        // 3σ = 48
        let zeros = result.counts.get("0").copied().unwrap_or(0) as i64;
        assert!((zeros - 512).abs() <= 48, "zeros = {}", zeros);
    }

    #[test]
    fn test_bell_only_correlated_outcomes() {
        for method in [Method::Ideal, Method::Trajectory, Method::Exact] {
            let result = Simulator::new(method)
                .with_seed(3)
                .execute(&bell(), 500)
                .unwrap();
            assert!(result
                .counts
                .keys()
                .all(|k| k.as_str() == "00" || k.as_str() == "11"));
            assert_relative_eq!(result.probability("00") + result.probability("11"), 1.0);
        }
    }

    #[test]
    fn test_implicit_measurement() {
        let circuit = CircuitBuilder::new(2).x(1).build().unwrap();
        let result = Simulator::ideal().with_seed(1).execute(&circuit, 10).unwrap();
        assert!(result.metadata.implicit_measurement);
        assert_eq!(result.counts.get("10"), Some(&10));
    }

    #[test]
    fn test_shots_validated() {
        let err = Simulator::ideal().execute(&bell(), 0).unwrap_err();
        assert!(matches!(err, QlabError::ShotsOutOfRange(0, _, _)));
    }

    #[test]
    fn test_seed_reproducible() {
        let model = NoiseModel::depolarizing(0.05, 0.1).unwrap();
        for method in [Method::Trajectory, Method::Exact] {
            let sim = Simulator::new(method)
                .with_noise_model(model.clone())
                .with_seed(77);
            let a = sim.execute(&bell(), 300).unwrap();
            let b = sim.execute(&bell(), 300).unwrap();
            assert_eq!(a.counts, b.counts);
            assert_eq!(a.metadata.seed, 77);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = NoiseModel::depolarizing(0.1, 0.2)
            .unwrap()
            .with_readout_error(ReadoutError::symmetric(0.05).unwrap())
            .unwrap();
        let sim = Simulator::trajectory(model).with_seed(2024);
        let par = sim.clone().with_parallel(true).execute(&bell(), 400).unwrap();
        let seq = sim.with_parallel(false).execute(&bell(), 400).unwrap();
        assert_eq!(par.counts, seq.counts);
    }

    #[test]
    fn test_entropy_seed_recorded() {
        let sim = Simulator::new(Method::Trajectory);
        let first = sim.execute(&bell(), 50).unwrap();
        let replay = sim
            .execute_with_seed(&bell(), 50, first.metadata.seed)
            .unwrap();
        assert_eq!(first.counts, replay.counts);
    }

    #[test]
    fn test_mid_circuit_measurement_branches() {
        // Measure a |+> qubit mid-circuit, copy the record onto qubit 1
        let circuit = CircuitBuilder::with_clbits(2, 2)
            .h(0)
            .measure(0, 0)
            .c_if(0, true, Gate::X(1))
            .h(0)
            .measure(1, 1)
            .build()
            .unwrap();
        let exact = Simulator::exact(NoiseModel::ideal())
            .with_seed(5)
            .execute(&circuit, 400)
            .unwrap();
        assert_eq!(exact.metadata.branches, Some(2));
        assert!(exact.counts.keys().all(|k| k == "00" || k == "11"));

        let ideal = Simulator::ideal().with_seed(5).execute(&circuit, 400).unwrap();
        assert!(ideal.counts.keys().all(|k| k == "00" || k == "11"));
        assert_eq!(ideal.total_counts(), 400);
    }

    #[test]
    fn test_final_state_sums_branches() {
        let circuit = CircuitBuilder::with_clbits(1, 1)
            .h(0)
            .measure(0, 0)
            .c_if(0, true, Gate::X(0))
            .build()
            .unwrap();
        // Feed-forward resets the qubit to |0> on both branches
        let rho = Simulator::exact(NoiseModel::ideal())
            .final_state_with_seed(&circuit, 0)
            .unwrap();
        assert_relative_eq!(rho.get(0, 0).re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rho.trace(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trajectory_average_converges_to_exact() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build().unwrap();
        let model = NoiseModel::new()
            .with_all_qubit_error(NoiseChannel::amplitude_damping(0.3).unwrap(), &[GateKind::Cx])
            .unwrap();
        let exact = Simulator::exact(model.clone())
            .final_state_with_seed(&circuit, 0)
            .unwrap();
        let avg = Simulator::trajectory(model)
            .trajectory_average_with_seed(&circuit, 4000, 9)
            .unwrap();
        for (a, e) in avg.probabilities().iter().zip(exact.probabilities()) {
            assert!((a - e).abs() < 0.03, "{} vs {}", a, e);
        }
        assert_relative_eq!(avg.trace(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_readout_flips_everything() {
        let model = NoiseModel::new()
            .with_readout_error(ReadoutError::symmetric(1.0).unwrap())
            .unwrap();
        for method in [Method::Trajectory, Method::Exact] {
            let result = Simulator::new(method)
                .with_noise_model(model.clone())
                .with_seed(0)
                .execute(&CircuitBuilder::new(3).measure_all().build().unwrap(), 20)
                .unwrap();
            assert_eq!(result.counts.get("111"), Some(&20));
        }
        // Ideal ignores the model entirely
        let ideal = Simulator::ideal()
            .with_noise_model(model)
            .with_seed(0)
            .execute(&CircuitBuilder::new(3).build().unwrap(), 20)
            .unwrap();
        assert_eq!(ideal.counts.get("000"), Some(&20));
    }

    #[test]
    fn test_coverage_reported() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).rz(1, 0.2).build().unwrap();
        let model = NoiseModel::new()
            .with_all_qubit_error(NoiseChannel::depolarizing(0.01, 1).unwrap(), &[GateKind::H])
            .unwrap();
        let result = Simulator::exact(model).with_seed(1).execute(&circuit, 10).unwrap();
        assert_eq!(
            result.coverage.uncovered_kinds(),
            vec![GateKind::Rz, GateKind::Cx]
        );
    }

    #[test]
    fn test_size_limits() {
        let big = CircuitBuilder::new(13).h(0).build().unwrap();
        let err = Simulator::exact(NoiseModel::ideal())
            .execute_with_seed(&big, 1, 0)
            .unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_wide_classical_register_rejected() {
        let json = r#"{"num_qubits":1,"num_clbits":70,"ops":[{"Measure":{"qubit":0,"clbit":65}}],"name":null}"#;
        let circuit: Circuit = serde_json::from_str(json).unwrap();
        let model = NoiseModel::new()
            .with_readout_error(ReadoutError::symmetric(0.1).unwrap())
            .unwrap();
        for method in [Method::Ideal, Method::Trajectory, Method::Exact] {
            let err = Simulator::new(method)
                .with_noise_model(model.clone())
                .execute_with_seed(&circuit, 10, 1)
                .unwrap_err();
            assert!(err.is_dimension_error(), "{}: {}", method, err);
        }
    }

    #[test]
    fn test_deserialized_noise_model_validated() {
        let group = ReadoutError::from_matrix(vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ])
        .unwrap();
        let mut model = NoiseModel::new();
        model.add_correlated_readout_error(&[0, 1], group).unwrap();
        let mut value = serde_json::to_value(&model).unwrap();
        let groups = value["correlated_readout"].as_array_mut().unwrap();
        groups.push(groups[0].clone());
        let overlapping: NoiseModel = serde_json::from_value(value).unwrap();

        for method in [Method::Trajectory, Method::Exact] {
            let sim = Simulator::new(method).with_noise_model(overlapping.clone());
            assert!(matches!(
                sim.execute_with_seed(&bell(), 10, 1),
                Err(QlabError::DuplicateQubit(_))
            ));
            assert!(sim.final_state_with_seed(&bell(), 1).is_err());
        }
        // The ideal method ignores the model
        let ideal = Simulator::ideal().with_noise_model(overlapping);
        assert!(ideal.execute_with_seed(&bell(), 10, 1).is_ok());
    }

    #[test]
    fn test_set_bit() {
        assert_eq!(set_bit(0b101, 1, true), 0b111);
        assert_eq!(set_bit(0b101, 0, false), 0b100);
        assert!(bit(0b100, 2));
    }
}
