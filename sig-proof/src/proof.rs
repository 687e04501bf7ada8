use bitvec::vec::BitVec;
use containers::{Message, PubKey, PubKeyHash, ValidatorSet};
use curve::SigPoint;
use sig_tree::SignatureTree;

use crate::error::ProofError;
use crate::sparse::{SparseSignature, SparseSignatureProof};

/// Outcome of folding another proof's signatures into this one (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    pub all_valid_signatures: bool,
    pub increased_signatures: bool,
    pub was_strict_superset: bool,
}

/// `other`'s bits are a strict superset of `mine`'s, counting empty⊆empty as
/// a strict superset per spec.md §8's idempotence property.
fn is_strict_superset(other: &BitVec, mine: &BitVec) -> bool {
    if !mine.any() && !other.any() {
        return true;
    }
    mine.iter().zip(other.iter()).all(|(m, o)| !*m || *o) && other != mine
}

/// A per-message vote-collection proof: one signature tree bound to a fixed
/// `(message, validator set)` pair (spec.md §3). Owned by exactly one task at
/// a time; `clone`/`derive` exist to hand out read-only snapshots or reset a
/// round without contending with the writer (spec.md §5).
#[derive(Debug, Clone)]
pub struct SignatureProof {
    msg: Message,
    tree: SignatureTree,
    pub_key_hash: PubKeyHash,
}

impl SignatureProof {
    pub fn new(msg: Message, validator_set: &ValidatorSet) -> Self {
        let tree = SignatureTree::new(
            validator_set.keys().iter().map(|k| k.point()),
            validator_set.len(),
        )
        .expect("a validator set already enforces the tree's size invariants");
        Self {
            msg,
            tree,
            pub_key_hash: validator_set.pub_key_hash().clone(),
        }
    }

    pub fn message(&self) -> &Message {
        &self.msg
    }

    pub fn pub_key_hash(&self) -> &PubKeyHash {
        &self.pub_key_hash
    }

    pub fn tree(&self) -> &SignatureTree {
        &self.tree
    }

    /// Insert `key`'s signature over this proof's message. Idempotent on an
    /// already-stored, byte-identical signature.
    pub fn add_signature(&mut self, key: &PubKey, sig_bytes: &[u8]) -> Result<(), ProofError> {
        let idx = self
            .tree
            .index(&key.point())
            .ok_or(ProofError::UnknownKey)?;
        let candidate = SigPoint::from_compressed(sig_bytes)?;
        let (_, have_sig) = self.tree.get(idx).expect("idx came from this tree");

        if !have_sig.is_identity() {
            return if have_sig == candidate {
                Ok(())
            } else {
                Err(ProofError::InconsistentSignature)
            };
        }

        if !curve::verify(&key.point(), self.msg.as_bytes(), &candidate) {
            return Err(ProofError::InvalidSignature);
        }
        self.tree.add_signature(idx, candidate);
        tracing::debug!(idx, "signature accepted into proof");
        Ok(())
    }

    /// True iff `self` and `other` vote on the same message under the same
    /// validator set. Ignores which signatures either side currently holds.
    pub fn matches(&self, other: &Self) -> bool {
        self.msg == other.msg && self.pub_key_hash == other.pub_key_hash
    }

    /// Fold another dense proof's signatures into this one.
    pub fn merge(&mut self, other: &Self) -> Result<MergeResult, ProofError> {
        if !self.matches(other) {
            return Err(ProofError::UnmergeablePubKeyHash);
        }

        let before_bits = self.tree.signature_bits().clone();
        let strict_superset_snapshot = is_strict_superset(other.tree.signature_bits(), &before_bits);

        let mut all_valid = true;
        let mut other_sparse = Vec::new();
        other.tree.sparse_indices(&mut other_sparse);

        for idx in other_sparse {
            let (_, their_sig) = other.tree.get(idx).expect("idx came from other's tree");
            let (my_key, my_sig) = self.tree.get(idx).expect("both trees share the same layout");

            if my_sig.is_identity() {
                if curve::verify(&my_key, self.msg.as_bytes(), &their_sig) {
                    self.tree.add_signature(idx, their_sig);
                } else {
                    all_valid = false;
                }
            } else if my_sig != their_sig {
                all_valid = false;
            }
        }

        let increased_signatures = self.tree.signature_bits() != &before_bits;
        let was_strict_superset = strict_superset_snapshot && all_valid;

        tracing::info!(
            all_valid,
            increased_signatures,
            was_strict_superset,
            "proof merge complete"
        );

        Ok(MergeResult {
            all_valid_signatures: all_valid,
            increased_signatures,
            was_strict_superset,
        })
    }

    /// Fold a sparse (wire-form) proof into this one. A structurally
    /// malformed `key_id` (wrong length, or naming a padding/out-of-range
    /// leaf) aborts the whole merge rather than being tallied as an invalid
    /// entry: unlike a bad signature, it's not attributable to a specific
    /// validator, so there's nothing useful `all_valid_signatures` could
    /// report about it.
    pub fn merge_sparse(&mut self, sparse: &SparseSignatureProof) -> Result<MergeResult, ProofError> {
        if sparse.pub_key_hash != self.pub_key_hash {
            return Err(ProofError::UnmergeablePubKeyHash);
        }

        let before_bits = self.tree.signature_bits().clone();
        let mut all_valid = true;

        for entry in &sparse.sigs {
            let idx = entry.tree_index().ok_or(ProofError::MalformedKeyID)?;
            if self.tree.is_padding_leaf(idx) {
                return Err(ProofError::MalformedKeyID);
            }
            let Some((key, have_sig)) = self.tree.get(idx) else {
                return Err(ProofError::MalformedKeyID);
            };
            let candidate = match SigPoint::from_compressed(&entry.sig) {
                Ok(s) => s,
                Err(_) => {
                    all_valid = false;
                    continue;
                }
            };

            if have_sig.is_identity() {
                if curve::verify(&key, self.msg.as_bytes(), &candidate) {
                    self.tree.add_signature(idx, candidate);
                } else {
                    all_valid = false;
                }
            } else if have_sig != candidate {
                all_valid = false;
            }
        }

        let increased_signatures = self.tree.signature_bits() != &before_bits;
        let was_strict_superset =
            is_strict_superset(self.tree.signature_bits(), &before_bits) && all_valid;

        Ok(MergeResult {
            all_valid_signatures: all_valid,
            increased_signatures,
            was_strict_superset,
        })
    }

    /// Render the minimal signature set currently held as a wire-sized proof.
    pub fn as_sparse(&self) -> SparseSignatureProof {
        let mut idxs = Vec::new();
        self.tree.sparse_indices(&mut idxs);
        let sigs = idxs
            .into_iter()
            .map(|idx| {
                let (_, sig) = self.tree.get(idx).expect("idx came from this tree");
                SparseSignature::leaf(idx as u16, sig.to_compressed())
            })
            .collect();
        SparseSignatureProof {
            pub_key_hash: self.pub_key_hash.clone(),
            sigs,
        }
    }

    pub fn has_sparse_key_id(&self, key_id: &[u8]) -> (bool, bool) {
        let Ok(bytes) = <[u8; 2]>::try_from(key_id) else {
            return (false, false);
        };
        let idx = u16::from_be_bytes(bytes) as usize;
        if idx >= self.tree.total_nodes() {
            return (false, false);
        }
        let has = self
            .tree
            .get(idx)
            .map(|(_, sig)| !sig.is_identity())
            .unwrap_or(false);
        (has, true)
    }

    pub fn signature_bit_set(&self, dst: &mut BitVec) {
        dst.clone_from(self.tree.signature_bits());
    }

    /// Fresh proof sharing this one's keys, with no signatures.
    pub fn derive(&self) -> Self {
        Self {
            msg: self.msg.clone(),
            tree: self.tree.derive(),
            pub_key_hash: self.pub_key_hash.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use containers::PubKey;
    use curve::Signer;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture(n: usize) -> (Vec<Signer>, Vec<PubKey>, ValidatorSet, SignatureProof) {
        let signers: Vec<Signer> = (0..n).map(|i| Signer::from_seed(format!("v{i}").as_bytes())).collect();
        let keys: Vec<PubKey> = signers.iter().map(|s| PubKey::from_point(s.public_key())).collect();
        let set = ValidatorSet::new(keys.clone()).unwrap();
        let proof = SignatureProof::new(Message::new(b"hello".to_vec()), &set);
        (signers, keys, set, proof)
    }

    #[test]
    fn idempotence_self_merge_leaves_proof_unchanged() {
        let (signers, keys, _set, mut proof) = fixture(4);
        for i in [0, 2] {
            let sig = signers[i].sign(b"hello");
            proof.add_signature(&keys[i], &sig.to_compressed()).unwrap();
        }
        let before = proof.clone();
        let clone = proof.clone();
        let result = proof.merge(&clone).unwrap();

        assert_eq!(proof.tree().signature_bits(), before.tree().signature_bits());
        assert!(result.all_valid_signatures);
        assert!(!result.increased_signatures);
        assert!(!result.was_strict_superset);
    }

    #[test]
    fn idempotence_on_empty_proof_is_strict_superset_of_itself() {
        let (_signers, _keys, _set, proof) = fixture(4);
        let mut a = proof.clone();
        let b = proof.clone();
        let result = a.merge(&b).unwrap();
        assert!(result.all_valid_signatures);
        assert!(!result.increased_signatures);
        assert!(result.was_strict_superset);
    }

    #[test]
    fn merge_monotonicity_never_drops_a_bit_already_set() {
        let (signers, keys, _set, mut mine) = fixture(8);
        for i in [0, 1, 2] {
            let sig = signers[i].sign(b"hello");
            mine.add_signature(&keys[i], &sig.to_compressed()).unwrap();
        }
        let mut other = mine.derive();
        for i in [3, 4] {
            let sig = signers[i].sign(b"hello");
            other.add_signature(&keys[i], &sig.to_compressed()).unwrap();
        }

        let before = mine.tree().signature_bits().clone();
        mine.merge(&other).unwrap();
        let after = mine.tree().signature_bits().clone();

        for i in 0..before.len() {
            if before[i] {
                assert!(after[i], "bit {i} was set before the merge and must stay set");
            }
        }
        for i in [3, 4] {
            assert!(after[i], "merge should have picked up {i}'s signature from other");
        }
    }

    #[test]
    fn unknown_key_rejected_regardless_of_signature_validity() {
        let (_signers, _keys, _set, mut proof) = fixture(4);
        let outsider = Signer::from_seed(b"not-a-validator");
        let outsider_key = PubKey::from_point(outsider.public_key());
        let valid_sig = outsider.sign(b"hello");
        let err = proof.add_signature(&outsider_key, &valid_sig.to_compressed()).unwrap_err();
        assert_eq!(err, ProofError::UnknownKey);

        let garbage_sig = [0u8; curve::SIGNATURE_COMPRESSED_LEN];
        let err = proof.add_signature(&outsider_key, &garbage_sig).unwrap_err();
        assert_eq!(err, ProofError::UnknownKey);
    }

    #[test]
    fn sparse_round_trip_matches_source_proof() {
        let (signers, keys, set, mut proof) = fixture(5);
        for i in [1, 4] {
            let sig = signers[i].sign(b"hello");
            proof.add_signature(&keys[i], &sig.to_compressed()).unwrap();
        }

        let mut merger = SignatureProof::new(Message::new(b"hello".to_vec()), &set);
        let result = merger.merge_sparse(&proof.as_sparse()).unwrap();

        assert!(result.all_valid_signatures);
        assert_eq!(merger.tree().signature_bits(), proof.tree().signature_bits());
    }

    #[test]
    fn merge_rejects_mismatched_validator_sets() {
        let (_signers_a, _keys_a, _set_a, proof_a) = fixture(4);
        let (_signers_b, _keys_b, set_b, _proof_b) = fixture(5);
        let mut proof_b_same_msg = SignatureProof::new(Message::new(b"hello".to_vec()), &set_b);

        let err = proof_b_same_msg.merge(&proof_a).unwrap_err();
        assert_eq!(err, ProofError::UnmergeablePubKeyHash);
    }

    #[test]
    fn merge_sparse_rejects_out_of_range_tree_index() {
        let (_signers, _keys, _set, mut proof) = fixture(4);
        let forged = SparseSignatureProof {
            pub_key_hash: proof.pub_key_hash.clone(),
            sigs: vec![SparseSignature::leaf(u16::MAX, [0u8; curve::SIGNATURE_COMPRESSED_LEN])],
        };

        let err = proof.merge_sparse(&forged).unwrap_err();
        assert_eq!(err, ProofError::MalformedKeyID);
    }
}
