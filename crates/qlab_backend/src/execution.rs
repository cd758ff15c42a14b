//! Backend execution types and traits
//!
//! Gantree: L4_Backend → BackendTrait
//!
//! Defines the interface for circuit execution and the result statistics.

use qlab_core::{limits, Bitstring, Circuit, ClbitId, Counts, QlabError, QlabResult};
use qlab_noise::NoiseCoverage;
use qlab_state::DensityMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Simulation method
/// Gantree: Method // 시뮬레이션 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Noiseless statevector evolution
    #[default]
    Ideal,
    /// Monte-Carlo statevector trajectories, one per shot
    Trajectory,
    /// Density-matrix evolution with exact channels
    Exact,
}

impl Method {
    /// Lower-case method name
    pub fn name(&self) -> &'static str {
        match self {
            Method::Ideal => "ideal",
            Method::Trajectory => "trajectory",
            Method::Exact => "exact",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of circuit execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Gate kinds with and without attached noise
    pub coverage: NoiseCoverage,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Simulation method
    pub method: Method,

    /// Base seed actually used
    pub seed: u64,

    /// Qubits simulated
    pub num_qubits: usize,

    /// Classical bits reported
    pub num_clbits: usize,

    /// Whether a measure-all was appended to an unmeasured circuit
    pub implicit_measurement: bool,

    /// Measurement branches carried to the end (exact method)
    pub branches: Option<usize>,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            coverage: NoiseCoverage::default(),
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// Get total count (equals shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get probability of a specific bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        let count = self.counts.get(bitstring).copied().unwrap_or(0);
        count as f64 / self.shots as f64
    }

    /// Relative frequency of every observed bitstring
    pub fn frequencies(&self) -> BTreeMap<String, f64> {
        self.counts
            .iter()
            .map(|(bs, &n)| (bs.clone(), n as f64 / self.shots as f64))
            .collect()
    }

    /// Counts restricted to `clbits` (result bit `i` = `clbits[i]`)
    /// Gantree: marginal_counts(clbits) -> Result<Counts> // 주변 카운트
    pub fn marginal_counts(&self, clbits: &[ClbitId]) -> QlabResult<Counts> {
        let width = self.metadata.num_clbits;
        if let Some(&bad) = clbits.iter().find(|&&c| c >= width) {
            return Err(QlabError::ClbitOutOfRange {
                clbit: bad,
                num_clbits: width,
            });
        }
        let mut out = Counts::new();
        for (bitstring, &n) in &self.counts {
            let bits = Bitstring::parse(bitstring)?;
            let value = clbits.iter().enumerate().fold(0u64, |acc, (i, &c)| {
                acc | (u64::from(bits.bit(c).unwrap_or(false)) << i)
            });
            let key = Bitstring::from_register(value, clbits.len()).to_string();
            *out.entry(key).or_insert(0) += n;
        }
        Ok(out)
    }

    /// Most frequent bitstring (ties broken by the smaller bitstring)
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by(|(a, &na), (b, &nb)| na.cmp(&nb).then_with(|| b.cmp(a)))
            .map(|(bs, &count)| (bs, count))
    }

    /// Parity expectation `Σ_b (-1)^|b| P(b)`
    /// Gantree: parity_expectation() -> f64 // 패리티 기대값
    pub fn parity_expectation(&self) -> f64 {
        let signed: i64 = self
            .counts
            .iter()
            .filter_map(|(bs, &n)| {
                Bitstring::parse(bs)
                    .ok()
                    .map(|b| i64::from(b.parity_sign()) * n as i64)
            })
            .sum();
        signed as f64 / self.shots as f64
    }

    /// Probability of an even number of ones
    pub fn p_even(&self) -> f64 {
        (1.0 + self.parity_expectation()) / 2.0
    }

    /// Probability of an odd number of ones
    pub fn p_odd(&self) -> f64 {
        1.0 - self.p_even()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> QlabResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(method={}, shots={}, unique={}, parity={:.4})",
            self.metadata.method,
            self.shots,
            self.counts.len(),
            self.parity_expectation()
        )
    }
}

/// Circuit execution backend
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Simulation method
    fn method(&self) -> Method;

    /// Execute a circuit
    /// Gantree: execute(circuit, shots) -> Result<ExecutionResult>
    fn execute(&self, circuit: &Circuit, shots: u64) -> QlabResult<ExecutionResult>;

    /// Execute multiple circuits (batch)
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QlabResult<Vec<ExecutionResult>> {
        circuits.iter().map(|c| self.execute(c, shots)).collect()
    }

    /// Final state without sampling
    /// Gantree: final_state(circuit) -> Result<DensityMatrix>
    fn final_state(&self, circuit: &Circuit) -> QlabResult<DensityMatrix>;

    /// Mean of `trajectories` pure trajectory states
    fn trajectory_average(&self, circuit: &Circuit, trajectories: usize)
        -> QlabResult<DensityMatrix>;

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        limits::MAX_SHOTS
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_counts() -> Counts {
        [
            ("000", 350),
            ("001", 90),
            ("010", 120),
            ("011", 80),
            ("100", 110),
            ("101", 60),
            ("110", 140),
            ("111", 50),
        ]
        .into_iter()
        .map(|(bs, n)| (bs.to_string(), n))
        .collect()
    }

    fn make_result() -> ExecutionResult {
        let mut result = ExecutionResult::new(make_test_counts(), 1000, "unit");
        result.metadata.num_clbits = 3;
        result
    }

    #[test]
    fn test_total_counts() {
        let result = make_result();
        assert_eq!(result.total_counts(), 1000);
        assert_eq!(result.metadata.backend, "unit");
    }

    #[test]
    fn test_probability() {
        let result = make_result();
        assert!((result.probability("000") - 0.35).abs() < 1e-10);
        assert!((result.probability("101") - 0.06).abs() < 1e-10);
        assert_eq!(result.probability("1111"), 0.0);
    }

    #[test]
    fn test_parity() {
        let result = make_result();
        // 000, 011, 101, 110 are even: 350 + 80 + 60 + 140
        assert!((result.p_even() - 0.63).abs() < 1e-10);
        assert!((result.p_odd() - 0.37).abs() < 1e-10);
        assert!((result.parity_expectation() - 0.26).abs() < 1e-10);
    }

    #[test]
    fn test_most_frequent() {
        let result = make_result();
        assert_eq!(result.most_frequent(), Some((&"000".to_string(), 350)));

        let tie: Counts = [("10".to_string(), 5), ("01".to_string(), 5)]
            .into_iter()
            .collect();
        let tied = ExecutionResult::new(tie, 10, "unit");
        assert_eq!(tied.most_frequent().map(|(bs, _)| bs.as_str()), Some("01"));
    }

    #[test]
    fn test_marginal_counts() {
        let result = make_result();
        // Leftmost character is clbit 2
        let top = result.marginal_counts(&[2]).unwrap();
        assert_eq!(top.get("0"), Some(&640));
        assert_eq!(top.get("1"), Some(&360));

        let pair = result.marginal_counts(&[0, 2]).unwrap();
        assert_eq!(pair.values().sum::<u64>(), 1000);
        // clbit 0 and clbit 2 both set: "101" and "111"
        assert_eq!(pair.get("11"), Some(&(60 + 50)));

        assert!(result.marginal_counts(&[3]).is_err());
    }

    #[test]
    fn test_frequencies() {
        let freqs = make_result().frequencies();
        assert!((freqs["010"] - 0.12).abs() < 1e-12);
        assert!((freqs.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_method_serde() {
        let json = serde_json::to_string(&Method::Trajectory).unwrap();
        assert_eq!(json, "\"trajectory\"");
        assert_eq!(Method::default(), Method::Ideal);
    }

    #[test]
    fn test_metadata_serde() {
        let value = serde_json::to_value(&make_result().metadata).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "backend",
                "branches",
                "execution_time_ms",
                "implicit_measurement",
                "method",
                "num_clbits",
                "num_qubits",
                "seed"
            ]
        );
        let back: ExecutionMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back.num_clbits, 3);
    }
}
