//! The hardware topology model.
//!
//! A [DeviceTree] is an arena of [Node]s addressed by stable [NodeId]
//! handles. The tree's *shape* is fixed once it has been materialized from a
//! topology description; everything that changes afterwards (enablement,
//! probe results) is expressed through per-node properties, chiefly the
//! `status` property.
//!
//! Every node belongs to a *class* identified by a string tag. The tree
//! keeps an ordered member list per class, which is what all scoped and
//! unscoped target iteration runs over. A class can be declared without
//! members; such a class is known-but-empty, which callers must be able to
//! tell apart from a class this topology has never heard of.

mod iter;
mod resolve;
mod status;

pub use iter::ClassTargets;
pub use status::TargetStatus;

use std::collections::HashMap;

use power_probe_topology::{NodeDescription, Topology};
use thiserror::Error;

/// Errors produced by topology queries and the topology loader.
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The class tag was never declared by the loaded topology.
    ///
    /// Distinct from a declared class with zero members, which iterates as an
    /// empty sequence instead of raising this.
    #[error("class '{0}' is not declared by the loaded topology")]
    UnknownClass(String),
    /// A `status` property carries text outside the known vocabulary. The
    /// loader checks every node, so hitting this at load time means the
    /// topology image is corrupt.
    #[error("node '{node}' carries unrecognized status '{value}'")]
    InvalidStatus {
        /// Name of the offending node.
        node: String,
        /// The unrecognized property text.
        value: String,
    },
}

/// Stable handle of a node within its [DeviceTree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Property {
    name: String,
    value: Vec<u8>,
}

/// One entry of the topology tree.
///
/// Nodes are only ever created by the loader; the public surface hands out
/// [NodeId]s and answers queries through [DeviceTree] methods.
#[derive(Debug)]
struct Node {
    class: String,
    name: String,
    index: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: Vec<Property>,
    /// Position within the class member list, for O(1) class-order stepping.
    class_pos: usize,
    /// Whether the topology image itself carried a `status` property for
    /// this node. Such a status encodes a hard backend fact and is never
    /// removed or overwritten by the selection engine.
    baked_status: bool,
}

#[derive(Debug, Default)]
struct ClassEntry {
    members: Vec<NodeId>,
}

/// The loaded hardware tree, including the per-class target registry.
#[derive(Debug)]
pub struct DeviceTree {
    nodes: Vec<Node>,
    root: NodeId,
    classes: HashMap<String, ClassEntry>,
}

impl DeviceTree {
    /// Materialize a tree from a topology description.
    ///
    /// All-or-nothing: a description whose `status` vocabulary is invalid is
    /// rejected as a whole.
    pub fn from_description(description: &Topology) -> Result<Self, TopologyError> {
        let mut tree = DeviceTree {
            nodes: Vec::new(),
            root: NodeId(0),
            classes: HashMap::new(),
        };

        for class in &description.classes {
            tree.classes.entry(class.clone()).or_default();
        }

        tree.root = tree.add_subtree(&description.root, None);

        for id in tree.node_ids() {
            tree.status(id)?;
        }

        tracing::debug!(
            topology = %description.name,
            nodes = tree.nodes.len(),
            classes = tree.classes.len(),
            "materialized topology"
        );

        Ok(tree)
    }

    fn add_subtree(&mut self, description: &NodeDescription, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());

        let entry = self.classes.entry(description.class.clone()).or_default();
        let class_pos = entry.members.len();
        entry.members.push(id);

        let properties: Vec<Property> = description
            .properties
            .iter()
            .map(|p| Property {
                name: p.name.clone(),
                value: p.value.to_bytes(),
            })
            .collect();
        let baked_status = properties.iter().any(|p| p.name == "status");

        self.nodes.push(Node {
            class: description.class.clone(),
            name: description.name.clone(),
            index: description.index,
            parent,
            children: Vec::new(),
            properties,
            class_pos,
            baked_status,
        });

        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        for child in &description.children {
            self.add_subtree(child, Some(id));
        }

        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// The root of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// All node handles, in load order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// The node's class tag.
    pub fn class_name(&self, id: NodeId) -> &str {
        &self.node(id).class
    }

    /// The node's human-readable label.
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// The node's own index; `-1` means "inherit from an ancestor".
    pub fn index(&self, id: NodeId) -> i32 {
        self.node(id).index
    }

    /// The owning parent, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node's children in declaration order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Whether `ancestor` appears on `id`'s ancestor chain. A node counts as
    /// its own ancestor here; scoped class iteration relies on that.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Look up a property on this node. Never walks the tree.
    pub fn get_property(&self, id: NodeId, name: &str) -> Option<&[u8]> {
        self.node(id)
            .properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_slice())
    }

    /// Set a property on this node, creating it if absent.
    ///
    /// An existing value is overwritten in place; writing a shorter value
    /// keeps the allocated capacity, so repeated writes need at most one
    /// growth per property.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &[u8]) {
        let node = self.node_mut(id);
        if let Some(property) = node.properties.iter_mut().find(|p| p.name == name) {
            property.value.clear();
            property.value.extend_from_slice(value);
        } else {
            node.properties.push(Property {
                name: name.to_string(),
                value: value.to_vec(),
            });
        }
    }

    pub(crate) fn delete_property(&mut self, id: NodeId, name: &str) {
        self.node_mut(id).properties.retain(|p| p.name != name);
    }

    pub(crate) fn has_baked_status(&self, id: NodeId) -> bool {
        self.node(id).baked_status
    }

    pub(crate) fn class_pos(&self, id: NodeId) -> usize {
        self.node(id).class_pos
    }

    /// Whether the topology declared this class at all.
    pub fn class_declared(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// The ordered members of a class, or `None` if the class was never
    /// declared. A declared-but-empty class yields `Some` of an empty slice.
    pub fn members_of_class(&self, class: &str) -> Option<&[NodeId]> {
        self.classes.get(class).map(|e| e.members.as_slice())
    }

    /// All declared class tags, sorted for stable display.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
