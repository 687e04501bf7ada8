/// Stateless, allocation-free gossip filter: rejects a `key_id` before it's
/// worth decoding further, given only the shape of the tree it targets
/// (spec.md §6). Cheap enough that transport layers can apply it per packet.
#[derive(Debug, Clone, Copy)]
pub struct KeyIDChecker {
    total_nodes: usize,
}

impl KeyIDChecker {
    pub fn for_tree(tree: &sig_tree::SignatureTree) -> Self {
        Self {
            total_nodes: tree.total_nodes(),
        }
    }

    pub fn is_valid(&self, key_id: &[u8]) -> bool {
        let Ok(bytes) = <[u8; 2]>::try_from(key_id) else {
            return false;
        };
        (u16::from_be_bytes(bytes) as usize) < self.total_nodes
    }
}
