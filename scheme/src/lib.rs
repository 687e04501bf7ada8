//! The aggregate-signature scheme (C5, C6): finalizing a supermajority
//! vote into an immutable [`FinalizedProof`], and validating one received
//! from a remote peer. Built on top of `sig-proof`'s dense proofs; the
//! combinatorial-number-system key-id codec lives here because it is only
//! ever used at the finalize/validate boundary (spec.md §4.5, §4.6).

mod combinatorics;
mod error;
mod finalized;
mod key_id;
#[allow(clippy::module_inception)]
mod scheme;

pub use error::SchemeError;
pub use finalized::FinalizedProof;
pub use scheme::SignatureProofScheme;

pub use combinatorics::{binomial, decode_subset, encode_subset};
pub use key_id::{decode_key_id, decode_key_id_to_subset, encode_key_id};
