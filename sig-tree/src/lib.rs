//! The signature tree (C2): a fixed-shape binary tree whose leaves hold one
//! validator public key each, with pairwise aggregation precomputed at
//! construction and signatures opportunistically aggregated upward as they
//! arrive.
//!
//! Node indices run over the flat range `[0, 2L-1)` where `L` is the leaf
//! capacity (the next power of two at or above the validator count). Layer
//! `0` is the `L` leaves; each subsequent layer holds half as many nodes as
//! the one below it, concatenated after it, up to the single root. This
//! layout needs no parent pointers: `parent_index` derives the relationship
//! from arithmetic alone (spec.md §9).

mod layout;

use std::sync::Arc;

use bitvec::vec::BitVec;
use curve::{PubKeyPoint, SigPoint};
use thiserror::Error;

pub use layout::TreeLayout;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("validator count {0} is out of the supported range")]
    InvalidSize(usize),
    #[error("expected {expected} keys from the iterator, got {got}")]
    KeyCountMismatch { expected: usize, got: usize },
}

/// A complete binary tree of pairwise-aggregated validator keys plus the
/// signatures accumulated against them so far.
#[derive(Debug, Clone)]
pub struct SignatureTree {
    layout: TreeLayout,
    n: usize,
    /// Immutable once built; shared across every clone/derive of this tree.
    keys: Arc<Vec<PubKeyPoint>>,
    sigs: Vec<SigPoint>,
    sig_bits: BitVec,
}

impl SignatureTree {
    /// Build a tree over `n` keys drawn from `keys_iter`, in order.
    /// `n` must be in `[1, env_config::MAX_VALIDATOR_SET_SIZE]`.
    pub fn new(
        keys_iter: impl IntoIterator<Item = PubKeyPoint>,
        n: usize,
    ) -> Result<Self, TreeError> {
        if n == 0 || n > env_config::MAX_VALIDATOR_SET_SIZE {
            return Err(TreeError::InvalidSize(n));
        }
        let layout = TreeLayout::for_leaf_count(n);
        let mut keys = vec![PubKeyPoint::Identity; layout.total_nodes()];

        let mut got = 0;
        for (i, key) in keys_iter.into_iter().enumerate() {
            if i >= n {
                break;
            }
            keys[i] = key;
            got += 1;
        }
        if got != n {
            return Err(TreeError::KeyCountMismatch { expected: n, got });
        }

        layout.aggregate_keys_upward(&mut keys);

        let total = layout.total_nodes();
        Ok(Self {
            layout,
            n,
            keys: Arc::new(keys),
            sigs: vec![SigPoint::Identity; total],
            sig_bits: BitVec::repeat(false, n),
        })
    }

    pub fn n_unaggregated_keys(&self) -> usize {
        self.n
    }

    pub fn leaf_capacity(&self) -> usize {
        self.layout.leaf_capacity()
    }

    pub fn total_nodes(&self) -> usize {
        self.layout.total_nodes()
    }

    pub fn root_index(&self) -> usize {
        self.layout.total_nodes() - 1
    }

    /// Index of `key` among the `n` real leaves, or `None` if it is not a
    /// member of this tree. Linear scan, acceptable at the expected scale
    /// (spec.md §4.2).
    pub fn index(&self, key: &PubKeyPoint) -> Option<usize> {
        self.keys[..self.n].iter().position(|k| k == key)
    }

    /// Bounds-checked read of a raw slot.
    pub fn get(&self, idx: usize) -> Option<(PubKeyPoint, SigPoint)> {
        if idx >= self.total_nodes() {
            return None;
        }
        Some((self.keys[idx], self.sigs[idx]))
    }

    pub fn signature_bits(&self) -> &BitVec {
        &self.sig_bits
    }

    /// Whether `idx` names a real leaf (not padding, not internal).
    pub fn is_real_leaf(&self, idx: usize) -> bool {
        idx < self.n
    }

    /// Whether `idx` names a padding leaf — callers must never target these
    /// with `add_signature`.
    pub fn is_padding_leaf(&self, idx: usize) -> bool {
        idx >= self.n && idx < self.leaf_capacity()
    }

    /// Record a signature at `idx`. **Does not verify** — the caller must
    /// already have verified `sig` against the key at `idx` and the
    /// proof's message. Cascades the aggregation upward per spec.md §4.2.
    ///
    /// Panics if `idx` is out of range or names a padding leaf: both are
    /// self-inconsistency bugs in the caller, not external-input errors
    /// (spec.md §7/§9).
    pub fn add_signature(&mut self, idx: usize, sig: SigPoint) {
        assert!(idx < self.total_nodes(), "signature tree index {idx} out of range");
        assert!(
            !self.is_padding_leaf(idx),
            "attempted to write a signature into padding leaf {idx}"
        );

        self.sigs[idx] = sig;
        self.mark_covered(idx);

        let mut current_idx = idx;
        let mut current_sig = sig;
        while let Some(parent) = self.layout.parent_index(current_idx) {
            if !self.sigs[parent].is_identity() {
                break;
            }
            let sibling = self.layout.sibling_index(current_idx);
            let sibling_key = self.keys[sibling];
            if sibling_key.is_identity() {
                // Sibling is padding: the parent's aggregate equals ours.
                self.sigs[parent] = current_sig;
                current_idx = parent;
                continue;
            }
            let sibling_sig = self.sigs[sibling];
            if sibling_sig.is_identity() {
                // Real sibling, but its signature hasn't arrived yet.
                break;
            }
            current_sig = curve::aggregate_g1(&[current_sig, sibling_sig]);
            self.sigs[parent] = current_sig;
            current_idx = parent;
        }

        if current_idx == self.root_index() && !self.sigs[current_idx].is_identity() {
            self.sig_bits.fill(true);
            tracing::debug!(n = self.n, "signature tree fully aggregated at root");
        }
    }

    fn mark_covered(&mut self, idx: usize) {
        let (leaf_start, leaf_span) = self.layout.leaf_range_of(idx);
        let leaf_end = (leaf_start + leaf_span).min(self.n);
        for leaf in leaf_start..leaf_end {
            self.sig_bits.set(leaf, true);
        }
    }

    /// Zero every signature and covered bit; keys are untouched.
    pub fn clear_signatures(&mut self) {
        self.sigs.iter_mut().for_each(|s| *s = SigPoint::Identity);
        self.sig_bits.fill(false);
    }

    /// A fresh tree sharing this one's keys, with no signatures.
    pub fn derive(&self) -> Self {
        Self {
            layout: self.layout,
            n: self.n,
            keys: Arc::clone(&self.keys),
            sigs: vec![SigPoint::Identity; self.total_nodes()],
            sig_bits: BitVec::repeat(false, self.n),
        }
    }

    /// Append the indices of the minimal set of nodes whose populated
    /// signatures collectively cover every set bit, in root-to-leaf walk
    /// order (spec.md §4.2). `dst` is cleared first; reusing a caller-owned
    /// buffer avoids an allocation per call.
    pub fn sparse_indices(&self, dst: &mut Vec<usize>) {
        dst.clear();
        self.collect_sparse(self.root_index(), dst);
    }

    fn collect_sparse(&self, idx: usize, dst: &mut Vec<usize>) {
        if !self.sigs[idx].is_identity() {
            dst.push(idx);
            return;
        }
        if idx < self.leaf_capacity() {
            return;
        }
        let (left, right) = self.layout.children_of(idx);
        self.collect_sparse(left, dst);
        self.collect_sparse(right, dst);
    }

    /// The G1 point equal to the sum of every signature named by
    /// `sparse_indices` — the signature on the aggregation of the pubkeys
    /// whose bits are set in `sig_bits`.
    pub fn finalized_sig(&self) -> SigPoint {
        let mut idxs = Vec::new();
        self.sparse_indices(&mut idxs);
        let points: Vec<SigPoint> = idxs.iter().map(|&i| self.sigs[i]).collect();
        curve::aggregate_g1(&points)
    }
}
