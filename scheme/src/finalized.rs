use std::collections::HashMap;

use containers::{Message, PubKey, PubKeyHash};
use sig_proof::SparseSignature;

/// The immutable record written into a committed block header (spec.md §3,
/// §6): one aggregated signature per distinct signed message, with
/// combinatorial-index key ids. `main_signature` and each entry of `rest`
/// are modelled as bare `SparseSignature` fields (not `Vec`) so "exactly
/// one signature per message" is a type-level guarantee, not a runtime
/// check callers can get wrong.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FinalizedProof {
    pub keys: Vec<PubKey>,
    pub pub_key_hash: PubKeyHash,
    pub main_message: Message,
    pub main_signature: SparseSignature,
    pub rest: HashMap<Message, SparseSignature>,
}
