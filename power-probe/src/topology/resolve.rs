//! Inherited attribute resolution.
//!
//! Index and identifier attributes may live on an ancestor rather than on
//! the node itself. Resolution always walks strictly upward; a node never
//! inherits from a sibling or descendant. The root carries no index or
//! address of its own and is simply passed over by the ascent.

use super::{DeviceTree, NodeId};

impl DeviceTree {
    /// The node's effective index: its own if set, otherwise the nearest
    /// ancestor's. `None` if no node on the ancestor chain carries an index.
    pub fn resolve_index(&self, id: NodeId) -> Option<u32> {
        let mut current = Some(id);
        while let Some(node) = current {
            let index = self.index(node);
            if index != -1 {
                return Some(index as u32);
            }
            current = self.parent(node);
        }
        None
    }

    /// The effective index of the nearest ancestor (the node itself
    /// included) whose class tag matches `class`. `None` if no such
    /// ancestor exists.
    pub fn resolve_ancestor_index(&self, id: NodeId, class: &str) -> Option<u32> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.class_name(node) == class {
                return self.resolve_index(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// A 64-bit property (two big-endian 32-bit cells), looked up on the
    /// node first and then on each ancestor in turn. Used for attributes
    /// such as a chip identifier declared once and shared by all
    /// descendants.
    ///
    /// A property of the right name but the wrong width counts as absent on
    /// that node; the walk continues upward.
    pub fn resolve_u64_property(&self, id: NodeId, name: &str) -> Option<u64> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(raw) = self.get_property(node, name) {
                if let Ok(cells) = <[u8; 8]>::try_from(raw) {
                    return Some(u64::from_be_bytes(cells));
                }
            }
            current = self.parent(node);
        }
        None
    }
}
