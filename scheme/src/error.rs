use thiserror::Error;

/// Failure kinds surfaced by `SignatureProofScheme` (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemeError {
    #[error("key id has the wrong length or names a subset larger than the validator set")]
    MalformedKeyID,
    #[error("compressed bytes do not decode to a valid curve point")]
    MalformedPoint(#[from] curve::CurveError),
}
