use curve::PubKeyPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ContainersError;

/// A validator public key: a point on G2, compressed to 96 bytes on the
/// wire. Immutable after construction; equality is by canonical point
/// identity (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubKey {
    point: PubKeyPoint,
}

impl PubKey {
    pub fn from_point(point: PubKeyPoint) -> Self {
        Self { point }
    }

    pub fn from_compressed(bytes: &[u8]) -> Result<Self, ContainersError> {
        Ok(Self {
            point: PubKeyPoint::from_compressed(bytes)?,
        })
    }

    pub fn to_compressed(&self) -> [u8; curve::PUBKEY_COMPRESSED_LEN] {
        self.point.to_compressed()
    }

    pub fn point(&self) -> PubKeyPoint {
        self.point
    }

    /// Short stable fingerprint for logs — never the full key.
    pub fn fingerprint_hex(&self) -> String {
        let bytes = self.to_compressed();
        format!("0x{}", hex::encode(&bytes[..12]))
    }
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.to_compressed())))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: String = Deserialize::deserialize(deserializer)?;
        let raw = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(raw).map_err(serde::de::Error::custom)?;
        PubKey::from_compressed(&bytes).map_err(serde::de::Error::custom)
    }
}
