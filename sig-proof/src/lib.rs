//! Per-message signature collection (spec.md C3, C4): wraps one
//! [`sig_tree::SignatureTree`] with the message and validator-set identity
//! it is bound to, and the merge/match/sparse-encoding operations gossip
//! and local vote collection need on top of the bare tree.

mod error;
mod key_id;
mod proof;
mod sparse;

pub use error::ProofError;
pub use key_id::KeyIDChecker;
pub use proof::{MergeResult, SignatureProof};
pub use sparse::{SparseSignature, SparseSignatureProof};
