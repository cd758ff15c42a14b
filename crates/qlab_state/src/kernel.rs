//! Tensor-contraction kernel
//!
//! Gantree: L2_State → Kernel
//!
//! Treats a flat buffer of length `2^num_bits` as a tensor with one binary
//! axis per index bit and contracts a `2^k × 2^k` operator against `k` of
//! those axes. Statevectors use bit `q` for qubit `q`; density matrices use
//! bit `n + q` for the row copy of qubit `q` and bit `q` for the column copy.

use crate::operator::Operator;
use num_complex::Complex64;
use qlab_core::{QlabError, QlabResult, QubitId};

/// Apply `op` on the `targets` axes wherever every `controls` axis is 1
///
/// `targets[i]` is the index bit bound to operator axis `i`. Indices with
/// any control bit 0 are left untouched. Callers guarantee that all bit
/// positions are distinct and below `num_bits`.
/// Gantree: apply_operator(buf, bits, op, tgts, ctrls) // 텐서 축약
pub fn apply_operator(
    buf: &mut [Complex64],
    num_bits: usize,
    op: &Operator,
    targets: &[usize],
    controls: &[usize],
) {
    debug_assert_eq!(buf.len(), 1usize << num_bits);
    debug_assert_eq!(op.num_qubits(), targets.len());

    let dim = op.dim();
    let control_mask = controls.iter().fold(0usize, |m, &c| m | (1 << c));

    let mut fixed: Vec<usize> = targets.iter().chain(controls).copied().collect();
    fixed.sort_unstable();

    // Offset of each operator basis index inside the full index
    let offsets: Vec<usize> = (0..dim)
        .map(|j| {
            targets
                .iter()
                .enumerate()
                .filter(|(b, _)| (j >> b) & 1 == 1)
                .fold(0usize, |m, (_, &t)| m | (1 << t))
        })
        .collect();

    let mut scratch = vec![Complex64::new(0.0, 0.0); dim];
    let free_bits = num_bits - fixed.len();

    for base in 0..(1usize << free_bits) {
        let i = insert_zero_bits(base, &fixed) | control_mask;

        for (s, &off) in scratch.iter_mut().zip(&offsets) {
            *s = buf[i | off];
        }
        for (r, &off) in offsets.iter().enumerate() {
            buf[i | off] = (0..dim).map(|c| op.get(r, c) * scratch[c]).sum();
        }
    }
}

/// Check that `qubits` are in range and pairwise distinct
pub(crate) fn check_qubits(qubits: &[QubitId], num_qubits: usize) -> QlabResult<()> {
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
    Ok(())
}

/// Spread `value` over the bit positions not listed in `positions`
/// (`positions` ascending)
#[inline]
fn insert_zero_bits(mut value: usize, positions: &[usize]) -> usize {
    for &p in positions {
        let low = value & ((1 << p) - 1);
        value = ((value >> p) << (p + 1)) | low;
    }
    value
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn basis(num_bits: usize, index: usize) -> Vec<Complex64> {
        let mut v = vec![Complex64::new(0.0, 0.0); 1 << num_bits];
        v[index] = Complex64::new(1.0, 0.0);
        v
    }

    #[test]
    fn test_check_qubits() {
        assert!(check_qubits(&[0, 2], 3).is_ok());
        assert_eq!(check_qubits(&[1, 1], 3), Err(QlabError::DuplicateQubit(1)));
        assert!(check_qubits(&[3], 3).unwrap_err().is_qubit_index_error());
    }

    #[test]
    fn test_insert_zero_bits() {
        assert_eq!(insert_zero_bits(0b11, &[1]), 0b101);
        assert_eq!(insert_zero_bits(0b111, &[0, 2]), 0b11010);
        assert_eq!(insert_zero_bits(5, &[]), 5);
    }

    #[test]
    fn test_single_target() {
        let mut v = basis(3, 0);
        apply_operator(&mut v, 3, &Operator::pauli_x(), &[2], &[]);
        assert_relative_eq!(v[0b100].re, 1.0);
    }

    #[test]
    fn test_controls_respected() {
        // Control 0 clear: no change
        let mut v = basis(2, 0b00);
        apply_operator(&mut v, 2, &Operator::pauli_x(), &[1], &[0]);
        assert_relative_eq!(v[0b00].re, 1.0);

        // Control 0 set: target 1 flips
        let mut v = basis(2, 0b01);
        apply_operator(&mut v, 2, &Operator::pauli_x(), &[1], &[0]);
        assert_relative_eq!(v[0b11].re, 1.0);
    }

    #[test]
    fn test_target_order() {
        // "IX" has X on operator axis 0, which is bound to targets[0]
        let op = Operator::pauli("IX").unwrap();
        let mut v = basis(3, 0);
        apply_operator(&mut v, 3, &op, &[2, 0], &[]);
        assert_relative_eq!(v[0b100].re, 1.0);
    }

    #[test]
    fn test_swap_non_adjacent() {
        let mut v = basis(3, 0b001);
        apply_operator(&mut v, 3, &Operator::swap(), &[0, 2], &[]);
        assert_relative_eq!(v[0b100].re, 1.0);
    }
}
