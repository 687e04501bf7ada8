//! BLS12-381 "minimal-signature" curve primitatives (C1).
//!
//! Signatures live on G1 (48-byte compressed), public keys on G2 (96-byte
//! compressed), matching `blst`'s `min_sig` module. Aggregation is plain
//! point addition; the identity element is the neutral element of that
//! addition and is modelled explicitly (`PubKeyPoint::Identity` /
//! `SigPoint::Identity`) rather than pushed through `blst`'s own point
//! encoding, so callers never have to reason about whether a "point at
//! infinity" survived a round trip through the library's subgroup checks.

use blst::min_sig::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain separation tag for the "basic" BLS ciphersuite this engine speaks.
///
/// Exactly `BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_` per spec.md §6 —
/// this is a process-wide constant, never per-instance configuration.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

pub const PUBKEY_COMPRESSED_LEN: usize = 96;
pub const SIGNATURE_COMPRESSED_LEN: usize = 48;

/// Compressed encoding of the G1 identity element (point at infinity).
///
/// Per the ZCash-style compressed point format BLS12-381 implementations
/// share: the compression flag and the infinity flag are set, every other
/// byte is zero.
const IDENTITY_G1: [u8; SIGNATURE_COMPRESSED_LEN] = {
    let mut bytes = [0u8; SIGNATURE_COMPRESSED_LEN];
    bytes[0] = 0xc0;
    bytes
};

const IDENTITY_G2: [u8; PUBKEY_COMPRESSED_LEN] = {
    let mut bytes = [0u8; PUBKEY_COMPRESSED_LEN];
    bytes[0] = 0xc0;
    bytes
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    #[error("compressed point has wrong length")]
    WrongLength,
    #[error("compressed point does not decode to a valid curve point")]
    BadEncoding,
    #[error("point is not in the required subgroup")]
    NotInGroup,
}

fn map_blst_err(err: BLST_ERROR) -> CurveError {
    match err {
        BLST_ERROR::BLST_BAD_ENCODING => CurveError::BadEncoding,
        BLST_ERROR::BLST_POINT_NOT_ON_CURVE => CurveError::BadEncoding,
        BLST_ERROR::BLST_POINT_NOT_IN_GROUP => CurveError::NotInGroup,
        _ => CurveError::BadEncoding,
    }
}

/// A point on G2: a validator public key, or the identity used internally
/// as padding in the signature tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubKeyPoint {
    Identity,
    Point(PublicKeyPoint),
}

/// Newtype so `PublicKey` (which isn't `Eq`) can live behind a type that is.
#[derive(Debug, Clone, Copy)]
pub struct PublicKeyPoint(PublicKey);

impl PartialEq for PublicKeyPoint {
    fn eq(&self, other: &Self) -> bool {
        self.0.compress() == other.0.compress()
    }
}
impl Eq for PublicKeyPoint {}

impl PubKeyPoint {
    pub fn identity() -> Self {
        PubKeyPoint::Identity
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, PubKeyPoint::Identity)
    }

    pub fn from_compressed(bytes: &[u8]) -> Result<Self, CurveError> {
        if bytes.len() != PUBKEY_COMPRESSED_LEN {
            return Err(CurveError::WrongLength);
        }
        if bytes == IDENTITY_G2 {
            return Ok(PubKeyPoint::Identity);
        }
        let pk = PublicKey::from_bytes(bytes).map_err(map_blst_err)?;
        pk.validate().map_err(map_blst_err)?;
        Ok(PubKeyPoint::Point(PublicKeyPoint(pk)))
    }

    pub fn to_compressed(&self) -> [u8; PUBKEY_COMPRESSED_LEN] {
        match self {
            PubKeyPoint::Identity => IDENTITY_G2,
            PubKeyPoint::Point(p) => p.0.compress(),
        }
    }

    fn inner(&self) -> Option<&PublicKey> {
        match self {
            PubKeyPoint::Identity => None,
            PubKeyPoint::Point(p) => Some(&p.0),
        }
    }
}

/// A point on G1: a (possibly aggregated) signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigPoint {
    Identity,
    Point(SignaturePoint),
}

#[derive(Debug, Clone, Copy)]
pub struct SignaturePoint(Signature);

impl PartialEq for SignaturePoint {
    fn eq(&self, other: &Self) -> bool {
        self.0.compress() == other.0.compress()
    }
}
impl Eq for SignaturePoint {}

impl SigPoint {
    pub fn identity() -> Self {
        SigPoint::Identity
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, SigPoint::Identity)
    }

    pub fn from_compressed(bytes: &[u8]) -> Result<Self, CurveError> {
        if bytes.len() != SIGNATURE_COMPRESSED_LEN {
            return Err(CurveError::WrongLength);
        }
        if bytes == IDENTITY_G1 {
            return Ok(SigPoint::Identity);
        }
        let sig = Signature::from_bytes(bytes).map_err(map_blst_err)?;
        sig.validate(true).map_err(map_blst_err)?;
        Ok(SigPoint::Point(SignaturePoint(sig)))
    }

    pub fn to_compressed(&self) -> [u8; SIGNATURE_COMPRESSED_LEN] {
        match self {
            SigPoint::Identity => IDENTITY_G1,
            SigPoint::Point(p) => p.0.compress(),
        }
    }

    fn inner(&self) -> Option<&Signature> {
        match self {
            SigPoint::Identity => None,
            SigPoint::Point(p) => Some(&p.0),
        }
    }
}

/// Aggregate any number of G1 points (signatures). The identity is neutral
/// and order does not matter.
pub fn aggregate_g1(points: &[SigPoint]) -> SigPoint {
    let refs: Vec<&Signature> = points.iter().filter_map(SigPoint::inner).collect();
    if refs.is_empty() {
        return SigPoint::Identity;
    }
    // aggregate() performs plain point addition; we've already validated
    // every point we stored, so we don't re-check subgroup membership here.
    let agg = AggregateSignature::aggregate(&refs, false).expect("aggregation of validated points cannot fail");
    SigPoint::Point(SignaturePoint(agg.to_signature()))
}

/// Aggregate any number of G2 points (public keys). Identity is neutral.
pub fn aggregate_g2(points: &[PubKeyPoint]) -> PubKeyPoint {
    let refs: Vec<&PublicKey> = points.iter().filter_map(PubKeyPoint::inner).collect();
    if refs.is_empty() {
        return PubKeyPoint::Identity;
    }
    let agg = AggregatePublicKey::aggregate(&refs, false).expect("aggregation of validated points cannot fail");
    PubKeyPoint::Point(PublicKeyPoint(agg.to_public_key()))
}

/// Opaque secret scalar plus its derived G2 point.
///
/// The backing bytes are wiped on drop; spec.md doesn't mandate this but
/// never excludes it, and it's how this corpus's other BLS libraries treat
/// signing key material.
pub struct Signer {
    secret: SecretKey,
    public: PubKeyPoint,
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("key material is malformed or too short")]
    BadKeyMaterial,
}

impl Signer {
    /// Derive a signer from 32+ bytes of key material (IKM, per the BLS
    /// key-generation scheme). Deterministic in `ikm`.
    pub fn from_ikm(ikm: &[u8]) -> Result<Self, SignerError> {
        let secret = SecretKey::key_gen(ikm, &[]).map_err(|_| SignerError::BadKeyMaterial)?;
        let public = PubKeyPoint::Point(PublicKeyPoint(secret.sk_to_pk()));
        Ok(Self { secret, public })
    }

    /// Deterministic signer from an arbitrary-length seed, for tests and
    /// fixture generation. Not part of spec.md; grounded in the corpus's
    /// habit of deterministic per-index key loading for local devnets.
    pub fn from_seed(seed: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"quorumsig-test-seed");
        hasher.update(seed);
        let mut ikm = hasher.finalize().to_vec();
        let signer = Self::from_ikm(&ikm).expect("32-byte sha256 output is always valid IKM");
        ikm.zeroize();
        signer
    }

    /// Generate a fresh signer from a cryptographic RNG.
    pub fn generate(rng: &mut impl rand::RngCore) -> Self {
        let mut ikm = [0u8; 32];
        rng.fill_bytes(&mut ikm);
        let signer = Self::from_ikm(&ikm).expect("32 random bytes are always valid IKM");
        ikm.zeroize();
        signer
    }

    pub fn public_key(&self) -> PubKeyPoint {
        self.public
    }

    /// Sign `msg` deterministically under the fixed domain-separation tag.
    pub fn sign(&self, msg: &[u8]) -> SigPoint {
        let sig = self.secret.sign(msg, DST, &[]);
        SigPoint::Point(SignaturePoint(sig))
    }
}

/// Verify a single signature. Rejects the identity signature and performs
/// subgroup validation on both inputs via their decoded representation.
pub fn verify(pubkey: &PubKeyPoint, msg: &[u8], sig: &SigPoint) -> bool {
    let (Some(pk), Some(sig)) = (pubkey.inner(), sig.inner()) else {
        // Either input is the identity: spec.md requires the identity
        // signature is never valid, and an identity pubkey has no signer.
        return false;
    };
    sig.verify(true, msg, DST, &[], pk, true) == BLST_ERROR::BLST_SUCCESS
}
