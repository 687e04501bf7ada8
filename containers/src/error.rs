use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContainersError {
    #[error("compressed public key does not decode to a valid curve point: {0}")]
    MalformedPoint(#[from] curve::CurveError),
    #[error("validator set size {0} is outside the allowed range [1, {1}]")]
    InvalidSetSize(usize, usize),
}
