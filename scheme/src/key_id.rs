//! Finalized-form key ids (spec.md §6): `uint16_be(k) || big_endian_minimal(C)`,
//! as opposed to `sig-proof`'s fixed 2-byte gossip-form tree index.

use bitvec::vec::BitVec;
use num_bigint::BigUint;

use crate::combinatorics::{decode_minimal_be, decode_subset, encode_minimal_be, encode_subset};
use crate::error::SchemeError;

/// Build a finalized key id for the subset of `{0, ..., n_scope-1}` set in
/// `bits` (length `n_scope`). `finalize` always calls this with the full
/// validator count as `n_scope`, for both the main signature and every
/// rest signature, so every key_id decodes independently of the others.
pub fn encode_key_id(bits: &BitVec, n_scope: usize) -> Vec<u8> {
    let (k, c) = encode_subset(bits, n_scope);
    let mut out = Vec::with_capacity(2 + (c.bits() as usize + 7) / 8);
    out.extend_from_slice(&(k as u16).to_be_bytes());
    out.extend_from_slice(&encode_minimal_be(&c));
    out
}

/// Decode `key_id` into `(k, C)`. Does not itself bounds-check `k` against
/// any particular `n_scope`; callers do that once they know it.
pub fn decode_key_id(key_id: &[u8]) -> Result<(usize, BigUint), SchemeError> {
    if key_id.len() < 2 {
        return Err(SchemeError::MalformedKeyID);
    }
    let k = u16::from_be_bytes([key_id[0], key_id[1]]) as usize;
    let c = decode_minimal_be(&key_id[2..]);
    Ok((k, c))
}

/// Decode `key_id` all the way to the bit set it names within
/// `{0, ..., n_scope-1}`. Rejects `k > n_scope` or `k == 0` with more
/// members encoded than fit.
pub fn decode_key_id_to_subset(key_id: &[u8], n_scope: usize) -> Result<BitVec, SchemeError> {
    let (k, c) = decode_key_id(key_id)?;
    if k > n_scope {
        return Err(SchemeError::MalformedKeyID);
    }
    if c >= crate::combinatorics::binomial(n_scope, k) {
        return Err(SchemeError::MalformedKeyID);
    }
    Ok(decode_subset(n_scope, k, c))
}
