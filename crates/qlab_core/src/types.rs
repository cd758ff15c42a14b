//! Core types for QLAB
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Provides fundamental type aliases and validated wrapper types
//! used throughout the QLAB workspace.

use crate::error::{QlabError, QlabResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Classical bit identifier (0-indexed)
/// Gantree: ClbitId // pub type ClbitId = usize
pub type ClbitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Measurement counts: bitstring -> count
///
/// Bitstrings list the highest classical bit first, so classical bit 0
/// is the rightmost character.
/// Gantree: Counts // pub type Counts = HashMap<String, u64>
pub type Counts = HashMap<String, u64>;

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // 범위 검증 구조체
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    /// Gantree: new(f64) -> Result<Self> // 생성+검증
    pub fn new(value: f64) -> QlabResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(QlabError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the complement (1 - p)
    #[inline]
    pub fn complement(&self) -> f64 {
        1.0 - self.0
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Classical register snapshot
///
/// Stored as the register value (`bit i` = classical bit `i`) plus its
/// width. Displayed with the highest classical bit first.
/// Gantree: Bitstring // 비트열 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bitstring {
    value: u64,
    width: usize,
}

impl Bitstring {
    /// Create from a register value and width
    pub fn from_register(value: u64, width: usize) -> Self {
        let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        Self {
            value: value & mask,
            width,
        }
    }

    /// Parse from string (e.g., "0110", leftmost = highest classical bit)
    /// Gantree: parse(s) -> Self // 파싱
    pub fn parse(s: &str) -> QlabResult<Self> {
        if s.len() > 64 {
            return Err(QlabError::dimension(64, s.len(), "bitstring width"));
        }
        let mut value = 0u64;
        for c in s.chars() {
            value <<= 1;
            match c {
                '0' => {}
                '1' => value |= 1,
                _ => return Err(QlabError::InvalidBitstring(s.to_string())),
            }
        }
        Ok(Self {
            value,
            width: s.len(),
        })
    }

    /// Register value (bit i = classical bit i)
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.width
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Value of classical bit `clbit`
    pub fn bit(&self, clbit: ClbitId) -> Option<bool> {
        (clbit < self.width).then(|| (self.value >> clbit) & 1 == 1)
    }

    /// Count number of 1s (Hamming weight)
    /// Gantree: popcount() -> usize // 1 카운트
    pub fn popcount(&self) -> usize {
        self.value.count_ones() as usize
    }

    /// Get parity (true if odd number of 1s)
    pub fn parity(&self) -> bool {
        self.popcount() % 2 == 1
    }

    /// Get parity sign (+1 for even, -1 for odd)
    pub fn parity_sign(&self) -> i32 {
        if self.parity() {
            -1
        } else {
            1
        }
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", if (self.value >> i) & 1 == 1 { '1' } else { '0' })?;
        }
        Ok(())
    }
}

// ============================================================================
// MeasurementBasis
// ============================================================================

/// Measurement basis for a single qubit
/// Gantree: Basis // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Basis {
    /// X (Hadamard) basis
    X,
    /// Y basis
    Y,
    /// Z (computational) basis
    #[default]
    Z,
}

impl Basis {
    /// Parse from character
    pub fn from_char(c: char) -> QlabResult<Self> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Basis::X),
            'Y' => Ok(Basis::Y),
            'Z' => Ok(Basis::Z),
            _ => Err(QlabError::InvalidBasis(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ============================================================================
// Tests
// ============================================================================
