use thiserror::Error;

/// Failure kinds surfaced by `SignatureProof` operations (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("key is not a member of this proof's validator set")]
    UnknownKey,
    #[error("signature does not verify against the claimed key and message")]
    InvalidSignature,
    #[error("a different, already-verified signature is stored for this key")]
    InconsistentSignature,
    #[error("proofs reference different validator sets")]
    UnmergeablePubKeyHash,
    #[error("key id has the wrong length or names an out-of-range index")]
    MalformedKeyID,
    #[error("compressed bytes do not decode to a valid curve point")]
    MalformedPoint(#[from] curve::CurveError),
}
