//! Serializable noise configuration
//!
//! Gantree: L3_Noise → NoiseConfig
//!
//! JSON description of a [`NoiseModel`] with gates named by string:
//!
//! ```json
//! {
//!   "gate_errors": [
//!     { "channel": { "type": "depolarizing", "p": 0.01 }, "gates": ["h", "id"] },
//!     { "channel": { "type": "depolarizing", "p": 0.02, "num_qubits": 2 },
//!       "gates": ["cx"], "qubits": [0, 1] }
//!   ],
//!   "arity_defaults": [],
//!   "readout": { "uniform": { "type": "symmetric", "p": 0.02 } }
//! }
//! ```

use crate::channel::NoiseChannel;
use crate::noise_model::NoiseModel;
use crate::readout::ReadoutError;
use qlab_core::{GateKind, QlabResult, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Channel description
/// Gantree: ChannelConfig // 채널 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Depolarizing channel
    Depolarizing {
        /// Depolarizing parameter
        p: f64,
        /// Channel width
        #[serde(default = "one")]
        num_qubits: usize,
    },
    /// Phase damping
    PhaseDamping {
        /// Damping probability
        p: f64,
    },
    /// Amplitude damping
    AmplitudeDamping {
        /// Decay probability
        gamma: f64,
    },
    /// Bit flip
    BitFlip {
        /// Flip probability
        p: f64,
    },
    /// Phase flip
    PhaseFlip {
        /// Flip probability
        p: f64,
    },
    /// Pauli mixture
    Pauli {
        /// `(label, probability)` terms
        terms: Vec<(String, f64)>,
    },
    /// Sequential composition, first entry applied first
    Sequence {
        /// Channels in application order
        channels: Vec<ChannelConfig>,
    },
}

fn one() -> usize {
    1
}

impl ChannelConfig {
    /// Build the channel
    /// Gantree: build(&self) -> Result<NoiseChannel> // 채널 생성
    pub fn build(&self) -> QlabResult<NoiseChannel> {
        match self {
            ChannelConfig::Depolarizing { p, num_qubits } => {
                NoiseChannel::depolarizing(*p, *num_qubits)
            }
            ChannelConfig::PhaseDamping { p } => NoiseChannel::phase_damping(*p),
            ChannelConfig::AmplitudeDamping { gamma } => NoiseChannel::amplitude_damping(*gamma),
            ChannelConfig::BitFlip { p } => NoiseChannel::bit_flip(*p),
            ChannelConfig::PhaseFlip { p } => NoiseChannel::phase_flip(*p),
            ChannelConfig::Pauli { terms } => {
                let terms: Vec<(&str, f64)> =
                    terms.iter().map(|(l, p)| (l.as_str(), *p)).collect();
                NoiseChannel::pauli(&terms)
            }
            ChannelConfig::Sequence { channels } => {
                let mut iter = channels.iter();
                let first = iter.next().ok_or_else(|| {
                    qlab_core::QlabError::InvalidChannel("empty channel sequence".into())
                })?;
                iter.try_fold(first.build()?, |acc, next| acc.compose(&next.build()?))
            }
        }
    }
}

/// Readout error description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReadoutConfig {
    /// Symmetric flip probability
    Symmetric {
        /// Flip probability
        p: f64,
    },
    /// Distinct flip probabilities per true outcome
    Asymmetric {
        /// `P(read 1 | 0)`
        p01: f64,
        /// `P(read 0 | 1)`
        p10: f64,
    },
    /// Explicit assignment matrix
    Matrix {
        /// Rows indexed by true outcome
        rows: Vec<Vec<f64>>,
    },
}

impl ReadoutConfig {
    /// Build the readout error
    pub fn build(&self) -> QlabResult<ReadoutError> {
        match self {
            ReadoutConfig::Symmetric { p } => ReadoutError::symmetric(*p),
            ReadoutConfig::Asymmetric { p01, p10 } => ReadoutError::asymmetric(*p01, *p10),
            ReadoutConfig::Matrix { rows } => ReadoutError::from_matrix(rows.clone()),
        }
    }
}

/// Channel attached to named gates, optionally on specific qubits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateErrorConfig {
    /// Channel description
    pub channel: ChannelConfig,
    /// Gate names (aliases such as `cnot` accepted)
    pub gates: Vec<String>,
    /// Exact qubit tuple; all qubits when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubits: Option<Vec<QubitId>>,
}

/// Fallback channel for gates of one arity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArityErrorConfig {
    /// Channel description
    pub channel: ChannelConfig,
    /// Gate arity
    pub num_qubits: usize,
}

/// Correlated readout group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedReadoutConfig {
    /// Covered qubits
    pub qubits: Vec<QubitId>,
    /// Readout description
    pub error: ReadoutConfig,
}

/// All readout errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadoutSection {
    /// Error for every measured qubit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform: Option<ReadoutConfig>,
    /// Per-qubit overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_qubit: BTreeMap<QubitId, ReadoutConfig>,
    /// Correlated groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlated: Vec<CorrelatedReadoutConfig>,
}

/// Noise configuration
/// Gantree: NoiseConfig // 노이즈 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gate-attached channels
    #[serde(default)]
    pub gate_errors: Vec<GateErrorConfig>,
    /// Arity fallbacks
    #[serde(default)]
    pub arity_defaults: Vec<ArityErrorConfig>,
    /// Readout errors
    #[serde(default)]
    pub readout: ReadoutSection,
}

impl NoiseConfig {
    /// Parse from JSON
    /// Gantree: from_json(s) -> Result<Self> // JSON 파싱
    pub fn from_json(json: &str) -> QlabResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> QlabResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the noise model; unknown gate names fail with `UnknownGate`
    /// Gantree: to_noise_model(&self) -> Result<NoiseModel> // 모델 생성
    pub fn to_noise_model(&self) -> QlabResult<NoiseModel> {
        let mut model = NoiseModel::new();

        for entry in &self.gate_errors {
            let channel = entry.channel.build()?;
            let kinds = entry
                .gates
                .iter()
                .map(|g| GateKind::parse(g))
                .collect::<QlabResult<Vec<_>>>()?;
            match &entry.qubits {
                Some(qubits) => {
                    for &kind in &kinds {
                        model.add_quantum_error(channel.clone(), kind, qubits)?;
                    }
                }
                None => model.add_all_qubit_error(channel, &kinds)?,
            }
        }

        for entry in &self.arity_defaults {
            model.add_arity_default(entry.channel.build()?, entry.num_qubits)?;
        }

        if let Some(uniform) = &self.readout.uniform {
            model.set_readout_error(uniform.build()?)?;
        }
        for (&qubit, error) in &self.readout.per_qubit {
            model.add_qubit_readout_error(qubit, error.build()?)?;
        }
        for group in &self.readout.correlated {
            model.add_correlated_readout_error(&group.qubits, group.error.build()?)?;
        }

        log::debug!(
            "Built noise model from config: {} gate entries, {} arity defaults",
            self.gate_errors.len(),
            self.arity_defaults.len()
        );
        Ok(model)
    }
}

// ============================================================================
// Tests
// ============================================================================
