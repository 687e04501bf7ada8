use containers::PubKeyHash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One (possibly aggregated) signature in transmission form. In unfinalized
/// (gossip) form `key_id` is always the 2-byte big-endian tree index; the
/// combinatorial-number-system form used by finalized proofs lives in the
/// `scheme` crate, which builds its own `key_id` bytes directly (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseSignature {
    pub key_id: Vec<u8>,
    pub sig: [u8; curve::SIGNATURE_COMPRESSED_LEN],
}

/// Hex-string wire form, matching `containers::PubKey`'s serde convention.
#[derive(Serialize, Deserialize)]
struct SparseSignatureWire {
    key_id: String,
    sig: String,
}

impl Serialize for SparseSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SparseSignatureWire {
            key_id: format!("0x{}", hex::encode(&self.key_id)),
            sig: format!("0x{}", hex::encode(self.sig)),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SparseSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SparseSignatureWire::deserialize(deserializer)?;
        let key_id = hex::decode(wire.key_id.strip_prefix("0x").unwrap_or(&wire.key_id))
            .map_err(serde::de::Error::custom)?;
        let sig_bytes = hex::decode(wire.sig.strip_prefix("0x").unwrap_or(&wire.sig))
            .map_err(serde::de::Error::custom)?;
        let sig: [u8; curve::SIGNATURE_COMPRESSED_LEN] = sig_bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature has the wrong length"))?;
        Ok(Self { key_id, sig })
    }
}

impl SparseSignature {
    pub fn leaf(idx: u16, sig: [u8; curve::SIGNATURE_COMPRESSED_LEN]) -> Self {
        Self {
            key_id: idx.to_be_bytes().to_vec(),
            sig,
        }
    }

    /// Decode a gossip-form `key_id` (always exactly 2 bytes) to a tree index.
    pub fn tree_index(&self) -> Option<usize> {
        let bytes: [u8; 2] = self.key_id.as_slice().try_into().ok()?;
        Some(u16::from_be_bytes(bytes) as usize)
    }
}

/// A sparse proof as transmitted on the wire: the validator-set fingerprint
/// plus the minimal signature set a sender currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseSignatureProof {
    pub pub_key_hash: PubKeyHash,
    pub sigs: Vec<SparseSignature>,
}
