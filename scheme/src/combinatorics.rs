//! Combinatorial number system (spec.md §4.5/§4.6): a bijection between
//! `k`-subsets of `{0, ..., n-1}` and integers `[0, C(n,k))`, used to pack a
//! finalized proof's voter set into a variable-length key id instead of a
//! fixed `n`-bit mask.

use bitvec::vec::BitVec;
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// `C(n, k)`, computed incrementally so every intermediate product stays
/// exact (`result * (n-i) / (i+1)` is always an integer at each step).
pub fn binomial(n: usize, k: usize) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    let k = k.min(n - k);
    let mut result = BigUint::one();
    for i in 0..k {
        result *= n - i;
        result /= i + 1;
    }
    result
}

/// Encode the set bits of `subset` (length `n`) as `(k, C)`: `k` is the
/// popcount, `C` is the combinatorial index of the subset within `n`.
pub fn encode_subset(subset: &BitVec, n: usize) -> (usize, BigUint) {
    let present: Vec<usize> = subset.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i).collect();
    let k = present.len();
    let mut remaining = k;
    let mut c = BigUint::zero();
    let mut curr = 0usize;
    for &p in &present {
        for j in curr..p {
            c += binomial(n - j - 1, remaining - 1);
        }
        curr = p + 1;
        remaining -= 1;
    }
    (k, c)
}

/// Inverse of [`encode_subset`]: decode `(k, C)` back to the set of `k`
/// members of `{0, ..., n-1}` it names. Panics if `C` names an index that
/// does not exist for this `(n, k)` — callers must bounds-check `k <= n`
/// and that `C < binomial(n, k)` first.
pub fn decode_subset(n: usize, k: usize, mut c: BigUint) -> BitVec {
    let mut bits = BitVec::repeat(false, n);
    let mut remaining = k;
    let mut curr = 0usize;
    while remaining > 0 {
        loop {
            let b = binomial(n - curr - 1, remaining - 1);
            if c >= b {
                c -= b;
                curr += 1;
            } else {
                break;
            }
        }
        bits.set(curr, true);
        curr += 1;
        remaining -= 1;
    }
    bits
}

/// Minimal big-endian encoding of `c`: the empty byte string iff `c == 0`.
pub fn encode_minimal_be(c: &BigUint) -> Vec<u8> {
    if c.is_zero() {
        Vec::new()
    } else {
        c.to_bytes_be()
    }
}

/// Inverse of [`encode_minimal_be`]: the empty slice decodes to zero.
pub fn decode_minimal_be(bytes: &[u8]) -> BigUint {
    if bytes.is_empty() {
        BigUint::zero()
    } else {
        BigUint::from_bytes_be(bytes)
    }
}
