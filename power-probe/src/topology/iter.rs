//! Class-scoped and parent-scoped target iteration.
//!
//! Iteration order is always topology-declaration order and is restartable.
//! The parent-scoped walk does not compare direct parents: for every
//! class-matching candidate it ascends the candidate's own ancestor chain
//! and treats "found the scope node on the ascent" as membership, because
//! not every class sits at a uniform depth.

use super::{DeviceTree, NodeId, TopologyError};

impl DeviceTree {
    fn class_members(&self, class: &str) -> Result<&[NodeId], TopologyError> {
        self.members_of_class(class)
            .ok_or_else(|| TopologyError::UnknownClass(class.to_string()))
    }

    /// First node of a class, in load order.
    pub fn first_of_class(&self, class: &str) -> Result<Option<NodeId>, TopologyError> {
        Ok(self.class_members(class)?.first().copied())
    }

    /// The node following `previous` within its class, or `None` past the
    /// last member.
    pub fn next_of_class(
        &self,
        class: &str,
        previous: NodeId,
    ) -> Result<Option<NodeId>, TopologyError> {
        let members = self.class_members(class)?;
        if self.class_name(previous) != class {
            return Ok(None);
        }
        Ok(members.get(self.class_pos(previous) + 1).copied())
    }

    /// First node of a class that has `parent` on its ancestor chain.
    pub fn first_child_of_class(
        &self,
        parent: NodeId,
        class: &str,
    ) -> Result<Option<NodeId>, TopologyError> {
        let mut candidate = self.first_of_class(class)?;
        while let Some(id) = candidate {
            if self.has_ancestor(id, parent) {
                return Ok(Some(id));
            }
            candidate = self.next_of_class(class, id)?;
        }
        Ok(None)
    }

    /// The node following `previous` within its class that has `parent` on
    /// its ancestor chain.
    pub fn next_child_of_class(
        &self,
        parent: NodeId,
        class: &str,
        previous: NodeId,
    ) -> Result<Option<NodeId>, TopologyError> {
        let mut candidate = self.next_of_class(class, previous)?;
        while let Some(id) = candidate {
            if self.has_ancestor(id, parent) {
                return Ok(Some(id));
            }
            candidate = self.next_of_class(class, id)?;
        }
        Ok(None)
    }

    /// Iterate all nodes of a class in load order.
    ///
    /// Errors if the class was never declared; a declared-but-empty class
    /// yields an empty iterator.
    pub fn targets_of_class<'a>(
        &'a self,
        class: &str,
    ) -> Result<ClassTargets<'a>, TopologyError> {
        Ok(ClassTargets {
            tree: self,
            members: self.class_members(class)?,
            pos: 0,
            scope: None,
        })
    }

    /// Iterate all nodes of a class that have `parent` on their ancestor
    /// chain, in load order.
    pub fn descendants_of_class<'a>(
        &'a self,
        parent: NodeId,
        class: &str,
    ) -> Result<ClassTargets<'a>, TopologyError> {
        Ok(ClassTargets {
            tree: self,
            members: self.class_members(class)?,
            pos: 0,
            scope: Some(parent),
        })
    }
}

/// Iterator over the members of one class, optionally scoped to a subtree.
#[derive(Debug)]
pub struct ClassTargets<'a> {
    tree: &'a DeviceTree,
    members: &'a [NodeId],
    pos: usize,
    scope: Option<NodeId>,
}

impl Iterator for ClassTargets<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(&id) = self.members.get(self.pos) {
            self.pos += 1;
            match self.scope {
                Some(scope) if !self.tree.has_ancestor(id, scope) => continue,
                _ => return Some(id),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::topology::testutil::{self, node, topology};
    use crate::topology::{DeviceTree, TopologyError};

    fn two_pib_tree() -> DeviceTree {
        let mut root = node("/", "root", -1);
        for p in 0..2 {
            let mut pib = node(&format!("pib{p}"), "pib", p);
            for c in 0..2 {
                pib.children.push(node(&format!("chiplet{p}{c}"), "chiplet", c));
            }
            root.children.push(pib);
        }
        DeviceTree::from_description(&topology(root)).unwrap()
    }

    #[test]
    fn class_iteration_follows_load_order_and_restarts() {
        let tree = two_pib_tree();

        let names: Vec<&str> = tree
            .targets_of_class("chiplet")
            .unwrap()
            .map(|id| tree.name(id))
            .collect();
        assert_eq!(names, vec!["chiplet00", "chiplet01", "chiplet10", "chiplet11"]);

        // Restarting the sequence yields the same order.
        let again: Vec<&str> = tree
            .targets_of_class("chiplet")
            .unwrap()
            .map(|id| tree.name(id))
            .collect();
        assert_eq!(names, again);
    }

    #[test]
    fn primitive_stepping_matches_the_iterator() {
        let tree = two_pib_tree();

        let mut stepped = Vec::new();
        let mut current = tree.first_of_class("pib").unwrap();
        while let Some(id) = current {
            stepped.push(id);
            current = tree.next_of_class("pib", id).unwrap();
        }

        let collected: Vec<_> = tree.targets_of_class("pib").unwrap().collect();
        assert_eq!(stepped, collected);
    }

    #[test]
    fn scoped_iteration_ascends_multiple_levels() {
        let tree = DeviceTree::from_description(&testutil::lopsided()).unwrap();
        let pib = tree.children(tree.root())[0];
        let chiplets = tree.children(pib);
        let (s1, s2) = (chiplets[0], chiplets[1]);

        // The thread hangs off chiplet1, two levels below the pib.
        let found = tree.first_child_of_class(pib, "thread").unwrap();
        assert_eq!(found.map(|id| tree.name(id)), Some("thread0"));

        assert_eq!(tree.first_child_of_class(s1, "thread").unwrap(), None);
        assert!(tree.first_child_of_class(s2, "thread").unwrap().is_some());
    }

    #[test]
    fn scope_node_is_its_own_descendant() {
        let tree = two_pib_tree();
        let pib0 = tree.children(tree.root())[0];

        assert_eq!(tree.first_child_of_class(pib0, "pib").unwrap(), Some(pib0));
        assert_eq!(tree.next_child_of_class(pib0, "pib", pib0).unwrap(), None);
    }

    #[test]
    fn scoped_iteration_stays_inside_the_subtree() {
        let tree = two_pib_tree();
        let pib1 = tree.children(tree.root())[1];

        let names: Vec<&str> = tree
            .descendants_of_class(pib1, "chiplet")
            .unwrap()
            .map(|id| tree.name(id))
            .collect();
        assert_eq!(names, vec!["chiplet10", "chiplet11"]);
    }

    #[test]
    fn unknown_class_is_distinct_from_empty_class() {
        let mut root = node("/", "root", -1);
        root.children.push(node("pib0", "pib", 0));
        let mut description = topology(root);
        description.classes.push("nhtm".to_string());

        let tree = DeviceTree::from_description(&description).unwrap();

        // Declared with zero members: empty-but-known sequence.
        assert_eq!(tree.targets_of_class("nhtm").unwrap().count(), 0);
        assert_eq!(tree.first_of_class("nhtm").unwrap(), None);

        // Never declared: explicit unknown-class condition.
        assert!(matches!(
            tree.targets_of_class("chtm"),
            Err(TopologyError::UnknownClass(_))
        ));
        assert!(matches!(
            tree.first_of_class("chtm"),
            Err(TopologyError::UnknownClass(_))
        ));
    }
}
