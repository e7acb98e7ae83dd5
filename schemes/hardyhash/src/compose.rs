//! Restricted integer compositions.
//!
//! The fixed-weight one-time signature encodes a 256-bit message hash
//! as a composition of 241 into 134 parts, each part in `[0, 3]`. The
//! number of such compositions exceeds `2^256`, so the hash (read as
//! a big-endian unsigned integer) indexes injectively into the
//! lexicographic ordering of valid compositions. Counting compositions
//! requires integers wider than any machine word, hence `BigUint`.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Table of composition counts.
///
/// `count(w, n)` is the number of compositions of weight `w` into `n`
/// parts with each part in `[0, depth]`:
///
/// - `count(0, 0) = 1`
/// - `count(w, n) = 0` for `w < 0` or `n < 0`
/// - `count(w, n) = sum_{i=0..=depth} count(w - i, n - 1)` otherwise
pub struct CompositionCounts {
    counts: Vec<Vec<BigUint>>,
    weight: usize,
    width: usize,
    depth: usize,
    zero: BigUint,
}

impl CompositionCounts {
    /// Builds the full table for compositions of `weight` into
    /// `width` parts of depth at most `depth`.
    pub fn build(weight: usize, width: usize, depth: usize) -> Self {
        // counts[w][n], filled column by column.
        let mut counts = vec![vec![BigUint::zero(); width + 1]; weight + 1];
        counts[0][0] = BigUint::one();
        for n in 1..=width {
            for w in 0..=weight {
                let mut total = BigUint::zero();
                for i in 0..=depth.min(w) {
                    total += &counts[w - i][n - 1];
                }
                counts[w][n] = total;
            }
        }
        CompositionCounts {
            counts,
            weight,
            width,
            depth,
            zero: BigUint::zero(),
        }
    }

    /// Looks up `count(w, n)`; out-of-range arguments count zero.
    pub fn count(&self, w: i64, n: i64) -> &BigUint {
        if w < 0 || n < 0 || w as usize > self.weight || n as usize > self.width {
            return &self.zero;
        }
        &self.counts[w as usize][n as usize]
    }

    /// Total number of valid compositions.
    pub fn total(&self) -> &BigUint {
        &self.counts[self.weight][self.width]
    }
}

/// Maps an index into the lexicographic ordering of valid
/// compositions to the composition itself, emitting digits
/// big-endian.
///
/// `index` must be below [`CompositionCounts::total`].
pub fn index_to_composition(index: &BigUint, counts: &CompositionCounts) -> Vec<u8> {
    debug_assert!(index < counts.total());
    let mut remaining = index.clone();
    let mut w = counts.weight as i64;
    let mut n = counts.width as i64;
    let mut composition = Vec::with_capacity(counts.width);
    for _ in 0..counts.width {
        let mut digit = 0u8;
        for d in 0..=counts.depth as i64 {
            let block = counts.count(w - d, n - 1);
            if &remaining < block {
                digit = d as u8;
                break;
            }
            remaining -= block;
        }
        composition.push(digit);
        w -= digit as i64;
        n -= 1;
    }
    composition
}

/// Inverse of [`index_to_composition`].
pub fn composition_to_index(composition: &[u8], counts: &CompositionCounts) -> BigUint {
    let mut index = BigUint::zero();
    let mut w: i64 = composition.iter().map(|&d| d as i64).sum();
    let mut n = composition.len() as i64;
    for &digit in composition {
        for d in 0..digit as i64 {
            index += counts.count(w - d, n - 1);
        }
        w -= digit as i64;
        n -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;
    use crate::params::{WOTS_DEPTH, WOTS_WEIGHT, WOTS_WIDTH};

    fn full_counts() -> CompositionCounts {
        CompositionCounts::build(WOTS_WEIGHT, WOTS_WIDTH, WOTS_DEPTH)
    }

    #[test]
    fn test_small_table_matches_hand_count() {
        // Compositions of 2 into 2 parts, each in [0, 3]:
        // (0,2), (1,1), (2,0) -> 3 of them.
        let counts = CompositionCounts::build(2, 2, 3);
        assert_eq!(counts.total(), &BigUint::from(3u32));
    }

    #[test]
    fn test_total_exceeds_256_bits() {
        let counts = full_counts();
        assert!(counts.total() > &(BigUint::one() << 256));
    }

    #[test]
    fn test_lexicographic_endpoints() {
        let counts = full_counts();

        // Index 0: 53 zeros, a one, then 80 threes.
        let mut minimum = vec![0u8; 53];
        minimum.push(1);
        minimum.extend(std::iter::repeat(3).take(80));
        assert_eq!(index_to_composition(&BigUint::zero(), &counts), minimum);

        // Index 1 swaps the tail boundary: 53 zeros, 2, 2, 79 threes.
        let mut first = vec![0u8; 53];
        first.extend([2, 2]);
        first.extend(std::iter::repeat(3).take(79));
        assert_eq!(index_to_composition(&BigUint::one(), &counts), first);

        // The largest index: 80 threes, a one, then 53 zeros.
        let mut maximum = vec![3u8; 80];
        maximum.push(1);
        maximum.extend(std::iter::repeat(0).take(53));
        let last = counts.total() - BigUint::one();
        assert_eq!(index_to_composition(&last, &counts), maximum);
    }

    #[test]
    fn test_roundtrip_through_hash_indices() {
        let counts = full_counts();
        for msg in [&b"alpha"[..], b"beta", b"gamma", b"delta"] {
            let index = BigUint::from_bytes_be(&sha256(msg));
            let composition = index_to_composition(&index, &counts);
            assert_eq!(composition.len(), WOTS_WIDTH);
            assert_eq!(
                composition.iter().map(|&d| d as usize).sum::<usize>(),
                WOTS_WEIGHT
            );
            assert!(composition.iter().all(|&d| d <= WOTS_DEPTH as u8));
            assert_eq!(composition_to_index(&composition, &counts), index);
        }
    }

    #[test]
    fn test_roundtrip_small_indices() {
        let counts = full_counts();
        for i in 0u32..32 {
            let index = BigUint::from(i);
            let composition = index_to_composition(&index, &counts);
            assert_eq!(composition_to_index(&composition, &counts), index);
        }
    }
}
