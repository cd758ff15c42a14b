//! Simulator configuration
//!
//! Gantree: L4_Backend → SimulatorConfig
//!
//! JSON-loadable description of a [`Simulator`].

use crate::execution::Method;
use crate::sampling::check_shots;
use crate::simulator::Simulator;
use qlab_core::{sampling, QlabResult};
use qlab_noise::NoiseConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulator configuration
/// Gantree: SimulatorConfig // 시뮬레이터 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Backend name
    #[serde(default = "default_name")]
    pub name: String,

    /// Simulation method
    #[serde(default)]
    pub method: Method,

    /// Noise description; noiseless when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseConfig>,

    /// Base seed; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Run shots and batches in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Default shot count for callers driving the simulator from config
    #[serde(default = "default_shots")]
    pub shots: u64,
}

fn default_name() -> String {
    "qlab_simulator".to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_shots() -> u64 {
    sampling::DEFAULT_SHOTS
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            method: Method::default(),
            noise: None,
            seed: None,
            parallel: default_parallel(),
            shots: default_shots(),
        }
    }
}

impl SimulatorConfig {
    /// Exact-method configuration with `noise`
    pub fn exact(noise: NoiseConfig) -> Self {
        Self {
            method: Method::Exact,
            noise: Some(noise),
            ..Default::default()
        }
    }

    /// Trajectory-method configuration with `noise`
    pub fn trajectory(noise: NoiseConfig) -> Self {
        Self {
            method: Method::Trajectory,
            noise: Some(noise),
            ..Default::default()
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> QlabResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> QlabResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration
    /// Gantree: validate(&self) -> Result // 검증
    pub fn validate(&self) -> QlabResult<()> {
        check_shots(self.shots)?;
        if let Some(noise) = &self.noise {
            noise.to_noise_model()?;
        }
        Ok(())
    }

    /// Build the simulator
    /// Gantree: build(&self) -> Result<Simulator> // 생성
    pub fn build(&self) -> QlabResult<Simulator> {
        check_shots(self.shots)?;
        let mut simulator = Simulator::new(self.method)
            .with_name(&self.name)
            .with_parallel(self.parallel);
        if let Some(noise) = &self.noise {
            simulator = simulator.with_noise_model(noise.to_noise_model()?);
        }
        if let Some(seed) = self.seed {
            simulator = simulator.with_seed(seed);
        }
        Ok(simulator)
    }
}

impl fmt::Display for SimulatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimulatorConfig({}, method={}, shots={}, seed={:?}, noisy={})",
            self.name,
            self.method,
            self.shots,
            self.seed,
            self.noise.is_some()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
