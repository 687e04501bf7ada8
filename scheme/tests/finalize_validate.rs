use std::collections::HashMap;

use containers::{Message, PubKey, ValidatorSet};
use curve::Signer;
use pretty_assertions::assert_eq;
use rstest::rstest;
use scheme::SignatureProofScheme;
use sig_proof::SignatureProof;

fn validator_set(n: usize) -> (Vec<Signer>, ValidatorSet) {
    let signers: Vec<Signer> = (0..n).map(|i| Signer::from_seed(&(i as u64).to_be_bytes())).collect();
    let keys: Vec<PubKey> = signers.iter().map(|s| PubKey::from_point(s.public_key())).collect();
    let set = ValidatorSet::new(keys).unwrap();
    (signers, set)
}

fn signed_proof(msg: &[u8], set: &ValidatorSet, signers: &[Signer], voters: &[usize]) -> SignatureProof {
    let mut proof = SignatureProof::new(Message::new(msg.to_vec()), set);
    for &v in voters {
        let key = PubKey::from_point(signers[v].public_key());
        let sig = signers[v].sign(msg);
        proof.add_signature(&key, &sig.to_compressed()).unwrap();
    }
    proof
}

#[test]
fn finalize_main_only_partial() {
    let (signers, set) = validator_set(16);
    let msg = b"M";
    let main = signed_proof(msg, &set, &signers, &[0, 1, 3, 5]);

    let finalized = SignatureProofScheme::finalize(&main, &[]);
    assert_eq!(finalized.main_signature.key_id[..2], [0u8, 4]);
    assert!(finalized.rest.is_empty());

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(msg.to_vec()), "block-M".to_string());

    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(ok);
    let bits = &result.unwrap()["block-M"];
    for i in [0usize, 1, 3, 5] {
        assert!(bits[i], "expected voter {i} to be set");
    }
    for i in [2usize, 4, 6, 7] {
        assert!(!bits[i], "expected non-voter {i} to be clear");
    }
}

#[test]
fn finalize_with_two_rest_groups() {
    let (signers, set) = validator_set(16);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 3, 5]);
    let nil = signed_proof(b"nil-content", &set, &signers, &[2, 9]);
    let other = signed_proof(b"other-content", &set, &signers, &[7, 11]);

    let finalized = SignatureProofScheme::finalize(&main, &[nil.clone(), other.clone()]);
    assert_eq!(finalized.rest.len(), 2);

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "hash-M");
    hashes.insert(Message::new(b"nil-content".to_vec()), "hash-nil");
    hashes.insert(Message::new(b"other-content".to_vec()), "hash-other");

    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(ok);
    let map = result.unwrap();

    for i in [0usize, 1, 3, 5] {
        assert!(map["hash-M"][i]);
    }
    for i in [2usize, 9] {
        assert!(map["hash-nil"][i]);
    }
    for i in [7usize, 11] {
        assert!(map["hash-other"][i]);
    }

    // No voter appears in more than one group.
    for i in 0..16 {
        let count = [map["hash-M"][i], map["hash-nil"][i], map["hash-other"][i]]
            .iter()
            .filter(|&&b| b)
            .count();
        assert!(count <= 1, "voter {i} double-counted across groups");
    }
}

#[test]
fn tampering_with_main_signature_byte_fails_validation() {
    let (signers, set) = validator_set(8);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 2]);
    let mut finalized = SignatureProofScheme::finalize(&main, &[]);
    finalized.main_signature.sig[0] ^= 0xFF;

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "h");
    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(!ok);
    assert!(result.is_none());
}

#[test]
fn tampering_with_rest_key_id_fails_validation() {
    let (signers, set) = validator_set(16);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 3, 5]);
    let nil = signed_proof(b"nil", &set, &signers, &[2, 9]);
    let mut finalized = SignatureProofScheme::finalize(&main, &[nil]);

    let entry = finalized.rest.get_mut(&Message::new(b"nil".to_vec())).unwrap();
    *entry.key_id.last_mut().unwrap() = entry.key_id.last().unwrap().wrapping_add(1);

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "h-main");
    hashes.insert(Message::new(b"nil".to_vec()), "h-nil");
    let (_, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(!ok);
}

#[test]
fn rest_entry_claiming_more_voters_than_total_validators_is_rejected() {
    let (signers, set) = validator_set(16);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 3, 5, 6, 7, 8, 9, 10, 11, 12, 13]); // 12 voters
    let rest = signed_proof(b"other", &set, &signers, &[2]);
    let mut finalized = SignatureProofScheme::finalize(&main, &[rest]);

    // 16 validators total; forge a k_rest of 17, which cannot fit in the
    // full validator universe key ids decode against.
    let entry = finalized.rest.get_mut(&Message::new(b"other".to_vec())).unwrap();
    entry.key_id = vec![0, 17];

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "h-main");
    hashes.insert(Message::new(b"other".to_vec()), "h-other");

    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(!ok);
    assert!(result.is_none());
}

#[test]
fn double_sign_across_main_and_rest_is_detected() {
    let (signers, set) = validator_set(16);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 3, 5]);
    let nil = signed_proof(b"nil", &set, &signers, &[2, 9]);
    let mut finalized = SignatureProofScheme::finalize(&main, &[nil]);

    // Forge the rest entry's key id so it claims validator 0 in addition to
    // its honest voters; validator 0 already signed the main message. This
    // is not something an honest `finalize` call can produce (its overlap
    // assert would panic first) — it models a hand-built malicious or
    // buggy finalized proof arriving over the wire.
    let mut forged_bits = bitvec::vec::BitVec::repeat(false, 16);
    for i in [0usize, 2, 9] {
        forged_bits.set(i, true);
    }
    let entry = finalized.rest.get_mut(&Message::new(b"nil".to_vec())).unwrap();
    entry.key_id = scheme::encode_key_id(&forged_bits, 16);

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "h-main");
    hashes.insert(Message::new(b"nil".to_vec()), "h-nil");

    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(!ok, "a validator appearing in both main and rest must be rejected");
    let partial = result.expect("the main entry, validated before the conflict, must survive");
    assert!(partial.contains_key("h-main"));
}

#[test]
fn finalize_rejects_validator_set_mismatch() {
    let (signers_a, set_a) = validator_set(8);
    let (_signers_b, set_b) = validator_set(8);
    let main = signed_proof(b"M", &set_a, &signers_a, &[0]);
    let rest = SignatureProof::new(Message::new(b"other".to_vec()), &set_b);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        SignatureProofScheme::finalize(&main, &[rest])
    }));
    assert!(result.is_err());
}

/// Flipping any single byte of the main signature must be caught; tries a
/// spread across the 48-byte compressed point rather than just the first.
#[rstest]
#[case(0)]
#[case(1)]
#[case(23)]
#[case(47)]
fn tampering_any_byte_of_main_signature_fails_validation(#[case] byte_idx: usize) {
    let (signers, set) = validator_set(8);
    let main = signed_proof(b"M", &set, &signers, &[0, 1, 2, 4]);
    let mut finalized = SignatureProofScheme::finalize(&main, &[]);
    finalized.main_signature.sig[byte_idx] ^= 0xFF;

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"M".to_vec()), "h");
    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(!ok, "tampering byte {byte_idx} should have been detected");
    assert!(result.is_none());
}

#[test]
fn single_validator_finalizes_trivially() {
    let (signers, set) = validator_set(1);
    let main = signed_proof(b"solo", &set, &signers, &[0]);
    let finalized = SignatureProofScheme::finalize(&main, &[]);
    assert_eq!(finalized.main_signature.key_id, vec![0u8, 1]);

    let mut hashes = HashMap::new();
    hashes.insert(Message::new(b"solo".to_vec()), "h");
    let (result, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    assert!(ok);
    assert!(result.unwrap()["h"][0]);
}
