//! The derived enabled/disabled/hidden/nonexistent state of a node.
//!
//! Status is not a dedicated field: it is the presence and text of the
//! `status` property. No property means enabled. The topology image spells
//! the fourth state `nonexistant`; that spelling is kept on the wire for
//! compatibility with existing images.

use super::{DeviceTree, NodeId, TopologyError};

/// The resolved status of a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// The node takes part in operations. The default.
    Enabled,
    /// The node is skipped by operations and pruned from display.
    Disabled,
    /// The node is skipped by operations and unlisted, but its children are
    /// still descended into.
    Hidden,
    /// Probing determined the unit is not actually present.
    Nonexistent,
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TargetStatus::Enabled => "enabled",
            TargetStatus::Disabled => "disabled",
            TargetStatus::Hidden => "hidden",
            TargetStatus::Nonexistent => "nonexistant",
        };
        f.write_str(name)
    }
}

impl DeviceTree {
    /// The node's resolved status. Absence of the `status` property means
    /// [TargetStatus::Enabled]; unrecognized text means the image is corrupt.
    pub fn status(&self, id: NodeId) -> Result<TargetStatus, TopologyError> {
        let Some(raw) = self.get_property(id, "status") else {
            return Ok(TargetStatus::Enabled);
        };

        match raw {
            b"enabled" => Ok(TargetStatus::Enabled),
            b"disabled" => Ok(TargetStatus::Disabled),
            b"hidden" => Ok(TargetStatus::Hidden),
            b"nonexistant" => Ok(TargetStatus::Nonexistent),
            other => Err(TopologyError::InvalidStatus {
                node: self.name(id).to_string(),
                value: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }

    /// Return the node to its default-enabled state.
    ///
    /// A status baked into the topology image encodes a hard backend fact
    /// (for example "this board variant has no second bus") and is left
    /// untouched; only a status written at runtime is removed.
    pub fn enable(&mut self, id: NodeId) -> Result<(), TopologyError> {
        if self.status(id)? == TargetStatus::Enabled {
            return Ok(());
        }

        if self.has_baked_status(id) {
            return Ok(());
        }

        tracing::debug!(node = %self.name(id), "enabling");
        self.delete_property(id, "status");
        Ok(())
    }

    /// Mark the node disabled.
    ///
    /// A node that already carries a `status` property is left untouched,
    /// for the same hard-fact reason as [DeviceTree::enable].
    pub fn disable(&mut self, id: NodeId) {
        if self.get_property(id, "status").is_some() {
            return;
        }

        tracing::debug!(node = %self.name(id), "disabling");
        self.set_property(id, "status", b"disabled");
    }
}

#[cfg(test)]
mod tests {
    use crate::topology::testutil::{node, topology, with_status};
    use crate::topology::{DeviceTree, TargetStatus};

    fn single_node_tree(status: Option<&str>) -> DeviceTree {
        let mut root = node("/", "root", -1);
        let pib = node("pib0", "pib", 0);
        root.children.push(match status {
            Some(s) => with_status(pib, s),
            None => pib,
        });
        DeviceTree::from_description(&topology(root)).unwrap()
    }

    fn pib(tree: &DeviceTree) -> crate::topology::NodeId {
        tree.children(tree.root())[0]
    }

    #[test]
    fn freshly_loaded_node_defaults_to_enabled() {
        let tree = single_node_tree(None);
        assert_eq!(tree.status(pib(&tree)).unwrap(), TargetStatus::Enabled);
    }

    #[test]
    fn status_vocabulary_parses() {
        for (text, status) in [
            ("enabled", TargetStatus::Enabled),
            ("disabled", TargetStatus::Disabled),
            ("hidden", TargetStatus::Hidden),
            ("nonexistant", TargetStatus::Nonexistent),
        ] {
            let tree = single_node_tree(Some(text));
            assert_eq!(tree.status(pib(&tree)).unwrap(), status);
        }
    }

    #[test]
    fn baked_disabled_survives_enable() {
        let mut tree = single_node_tree(Some("disabled"));
        let pib = pib(&tree);

        tree.enable(pib).unwrap();
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Disabled);
    }

    #[test]
    fn baked_hidden_survives_enable() {
        let mut tree = single_node_tree(Some("hidden"));
        let pib = pib(&tree);

        tree.enable(pib).unwrap();
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Hidden);
    }

    #[test]
    fn runtime_disable_can_be_enabled_again() {
        let mut tree = single_node_tree(None);
        let pib = pib(&tree);

        tree.disable(pib);
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Disabled);

        tree.enable(pib).unwrap();
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Enabled);
    }

    #[test]
    fn disable_does_not_override_existing_status() {
        let mut tree = single_node_tree(Some("hidden"));
        let pib = pib(&tree);

        tree.disable(pib);
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Hidden);
    }

    #[test]
    fn enable_on_enabled_node_is_a_no_op() {
        let mut tree = single_node_tree(None);
        let pib = pib(&tree);

        tree.enable(pib).unwrap();
        assert_eq!(tree.status(pib).unwrap(), TargetStatus::Enabled);
        assert_eq!(tree.get_property(pib, "status"), None);
    }
}
