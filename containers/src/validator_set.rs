use sha2::{Digest, Sha256};

use crate::error::ContainersError;
use crate::pub_key::PubKey;

/// Opaque byte string uniquely summarizing a `ValidatorSet`. Two proofs are
/// compatible only if their `PubKeyHash` values are byte-equal (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PubKeyHash(#[serde(with = "hex_bytes")] pub Vec<u8>);

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw: String = Deserialize::deserialize(deserializer)?;
        let raw = raw.strip_prefix("0x").unwrap_or(&raw);
        hex::decode(raw).map_err(serde::de::Error::custom)
    }
}

impl PubKeyHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// An ordered, fixed-for-its-lifetime sequence of validator public keys.
/// The index into this sequence is the validator's identity within any
/// proof built on it.
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    keys: Vec<PubKey>,
    pub_key_hash: PubKeyHash,
}

impl ValidatorSet {
    /// Build a validator set from an ordered sequence of keys.
    ///
    /// Enforces `1 <= N <= env_config::MAX_VALIDATOR_SET_SIZE` per spec.md
    /// §3; the exact ceiling is a deployment-profile constant, not a
    /// per-call parameter (see `env-config`).
    pub fn new(keys: Vec<PubKey>) -> Result<Self, ContainersError> {
        if keys.is_empty() || keys.len() > env_config::MAX_VALIDATOR_SET_SIZE {
            return Err(ContainersError::InvalidSetSize(
                keys.len(),
                env_config::MAX_VALIDATOR_SET_SIZE,
            ));
        }
        let pub_key_hash = Self::hash_keys(&keys);
        Ok(Self { keys, pub_key_hash })
    }

    fn hash_keys(keys: &[PubKey]) -> PubKeyHash {
        let mut hasher = Sha256::new();
        for key in keys {
            hasher.update(key.to_compressed());
        }
        PubKeyHash(hasher.finalize().to_vec())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[PubKey] {
        &self.keys
    }

    pub fn pub_key_hash(&self) -> &PubKeyHash {
        &self.pub_key_hash
    }

    /// Index of `key` within this set, or `None` if it is not a member.
    /// Linear scan is acceptable at the expected scale (spec.md §4.2).
    pub fn index_of(&self, key: &PubKey) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(seed: &[u8]) -> PubKey {
        PubKey::from_point(curve::Signer::from_seed(seed).public_key())
    }

    #[test]
    fn rejects_empty_set() {
        assert!(ValidatorSet::new(vec![]).is_err());
    }

    #[test]
    fn hash_is_order_sensitive() {
        let a = key(b"a");
        let b = key(b"b");
        let set1 = ValidatorSet::new(vec![a, b]).unwrap();
        let set2 = ValidatorSet::new(vec![b, a]).unwrap();
        assert_ne!(set1.pub_key_hash(), set2.pub_key_hash());
    }

    #[test]
    fn hash_is_deterministic() {
        let a = key(b"a");
        let b = key(b"b");
        let set1 = ValidatorSet::new(vec![a, b]).unwrap();
        let set2 = ValidatorSet::new(vec![a, b]).unwrap();
        assert_eq!(set1.pub_key_hash(), set2.pub_key_hash());
    }

    #[test]
    fn index_of_finds_member() {
        let a = key(b"a");
        let b = key(b"b");
        let set = ValidatorSet::new(vec![a, b]).unwrap();
        assert_eq!(set.index_of(&a), Some(0));
        assert_eq!(set.index_of(&b), Some(1));
        assert_eq!(set.index_of(&key(b"c")), None);
    }
}
