//! Scheme — finalize (C5) and validate (C6): the two operations that turn a
//! supermajority of dense proofs into (and back out of) a `FinalizedProof`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use bitvec::vec::BitVec;
use containers::{Message, PubKey};
use curve::{PubKeyPoint, SigPoint};
use sig_proof::{SignatureProof, SparseSignature};

use crate::finalized::FinalizedProof;
use crate::key_id;

/// Stateless facade over finalize/validate; spec.md models these as
/// operations of a scheme, not state carried between calls.
pub struct SignatureProofScheme;

impl SignatureProofScheme {
    /// Finalize `main` (the winning message) plus zero or more `rest`
    /// proofs (dissenting messages) into an immutable commit proof.
    ///
    /// Every proof must reference the same validator set. A duplicate
    /// message among `rest`, or a `rest` proof whose voters overlap one
    /// another or the main voters, indicates the caller finalized data it
    /// had not validated first — both are fatal bugs, not recoverable
    /// errors (spec.md §7, §9).
    pub fn finalize(main: &SignatureProof, rest: &[SignatureProof]) -> FinalizedProof {
        let n = main.tree().n_unaggregated_keys();
        for r in rest {
            assert_eq!(
                r.pub_key_hash(),
                main.pub_key_hash(),
                "finalize: rest proof references a different validator set than main"
            );
            assert_eq!(
                r.tree().n_unaggregated_keys(),
                n,
                "finalize: rest proof was built over a differently sized validator set"
            );
        }
        let mut seen_messages = HashSet::new();
        for r in rest {
            assert!(
                seen_messages.insert(r.message().clone()),
                "finalize: duplicate rest message {:?}",
                r.message()
            );
        }

        let keys: Vec<PubKey> = (0..n)
            .map(|i| PubKey::from_point(main.tree().get(i).expect("leaf index in range").0))
            .collect();

        let main_bits = main.tree().signature_bits().clone();
        let k_main = main_bits.count_ones();
        let main_signature = SparseSignature {
            key_id: key_id::encode_key_id(&main_bits, n),
            sig: main.tree().finalized_sig().to_compressed(),
        };

        // Deterministic order (spec.md §4.5 point 4) so two honest finalizers
        // given the same inputs attribute an overlap assertion to the same
        // rest proof, and `validate` re-derives the same order from the
        // wire-encoded `k` fields without needing it transmitted.
        let mut sorted_rest: Vec<&SignatureProof> = rest.iter().collect();
        sorted_rest.sort_by(|a, b| {
            let ka = a.tree().signature_bits().count_ones();
            let kb = b.tree().signature_bits().count_ones();
            kb.cmp(&ka).then_with(|| a.message().as_bytes().cmp(b.message().as_bytes()))
        });

        let mut used_original_bits = main_bits;
        let mut rest_map = HashMap::new();
        for r in sorted_rest {
            let r_bits = r.tree().signature_bits();
            assert!(
                r_bits
                    .iter()
                    .enumerate()
                    .all(|(i, voted)| !*voted || !used_original_bits[i]),
                "finalize: rest proof for {:?} votes overlap validators already accounted for; \
                 caller must validate proofs before finalizing",
                r.message()
            );

            let sig = SparseSignature {
                key_id: key_id::encode_key_id(r_bits, n),
                sig: r.tree().finalized_sig().to_compressed(),
            };
            rest_map.insert(r.message().clone(), sig);

            for (i, voted) in r_bits.iter().enumerate() {
                if *voted {
                    used_original_bits.set(i, true);
                }
            }
        }

        tracing::info!(n, k_main, rest_count = rest_map.len(), "proof finalized");

        FinalizedProof {
            keys,
            pub_key_hash: main.pub_key_hash().clone(),
            main_message: main.message().clone(),
            main_signature,
            rest: rest_map,
        }
    }

    /// Decode and verify a finalized proof against `hashes_by_sign_content`,
    /// a mapping from each signed message to the caller's own identifier for
    /// it (typically a block hash). Returns `(None, false)` on any
    /// verification or decode failure, `(Some(partial), false)` if a
    /// double-sign is detected (so the caller can still use the bit sets
    /// accumulated before the conflict as misbehavior evidence), and
    /// `(Some(complete), true)` on success.
    ///
    /// Panics if a signed message present in the proof has no entry in
    /// `hashes_by_sign_content` — the caller is expected to have derived
    /// that mapping from the same data before calling validate.
    pub fn validate<H: Clone + Eq + Hash>(
        proof: &FinalizedProof,
        hashes_by_sign_content: &HashMap<Message, H>,
    ) -> (Option<HashMap<H, BitVec>>, bool) {
        let n = proof.keys.len();

        let Some(main_bits) = decode_and_bound(&proof.main_signature.key_id, n) else {
            return (None, false);
        };

        let main_agg_key = aggregate_keys(&proof.keys, &main_bits);
        let Ok(main_sig) = SigPoint::from_compressed(&proof.main_signature.sig) else {
            return (None, false);
        };
        if !curve::verify(&main_agg_key, proof.main_message.as_bytes(), &main_sig) {
            return (None, false);
        }

        let mut used_original_bits = main_bits.clone();
        let mut sign_bits_by_hash = HashMap::new();
        let main_hash = hashes_by_sign_content
            .get(&proof.main_message)
            .expect("validate: missing hash mapping for the main signed message");
        sign_bits_by_hash.insert(main_hash.clone(), main_bits);

        let mut sorted_rest: Vec<(&Message, &SparseSignature)> = proof.rest.iter().collect();
        sorted_rest.sort_by(|a, b| {
            let ka = key_id::decode_key_id(&a.1.key_id).map(|(k, _)| k).unwrap_or(0);
            let kb = key_id::decode_key_id(&b.1.key_id).map(|(k, _)| k).unwrap_or(0);
            kb.cmp(&ka).then_with(|| a.0.as_bytes().cmp(b.0.as_bytes()))
        });

        for (message, sparse) in sorted_rest {
            let Some(projected) = decode_and_bound(&sparse.key_id, n) else {
                return (None, false);
            };

            if overlaps(&projected, &used_original_bits) {
                tracing::warn!(?message, "double-sign detected during finalized-proof validation");
                return (Some(sign_bits_by_hash), false);
            }

            let agg_key = aggregate_keys(&proof.keys, &projected);
            let Ok(rest_sig) = SigPoint::from_compressed(&sparse.sig) else {
                return (None, false);
            };
            if !curve::verify(&agg_key, message.as_bytes(), &rest_sig) {
                return (None, false);
            }

            for (i, voted) in projected.iter().enumerate() {
                if *voted {
                    used_original_bits.set(i, true);
                }
            }

            let hash = hashes_by_sign_content
                .get(message)
                .expect("validate: missing hash mapping for a rest signed message");
            sign_bits_by_hash.insert(hash.clone(), projected);
        }

        (Some(sign_bits_by_hash), true)
    }
}

/// Decode `key_id` to a bit set of length `n_scope`, rejecting a
/// structurally malformed id or one naming `k > n_scope`.
fn decode_and_bound(key_id: &[u8], n_scope: usize) -> Option<BitVec> {
    key_id::decode_key_id_to_subset(key_id, n_scope).ok()
}

fn aggregate_keys(keys: &[PubKey], bits: &BitVec) -> PubKeyPoint {
    let points: Vec<PubKeyPoint> = bits
        .iter()
        .enumerate()
        .filter(|(_, voted)| **voted)
        .map(|(i, _)| keys[i].point())
        .collect();
    curve::aggregate_g2(&points)
}

/// Whether `projected` sets any bit `used` already has set — the
/// double-sign guard of spec.md §4.6 step 5. Both `main` and every `rest`
/// entry decode directly against the full `n`-validator universe (see
/// `key_id::encode_key_id` call sites in `finalize`), so this is a real
/// check over attacker-reachable wire data: a finalized proof built by
/// hand (not through `finalize`) can set the same bit in both a main and a
/// rest key_id, and this is exactly what catches it.
fn overlaps(projected: &BitVec, used: &BitVec) -> bool {
    projected.iter().enumerate().any(|(i, voted)| *voted && used[i])
}
