//! The per-invocation session: the loaded, selection-filtered topology plus
//! the backend bus handle.
//!
//! One invocation performs exactly one topology load, one selection pass,
//! then dispatches commands over the resulting tree. The session owns both
//! the tree and the bus handle; dropping the session releases the handle,
//! so teardown happens on every exit path.

use std::collections::HashMap;

use power_probe_topology::BackendKind;

use crate::bus::{self, BusDriver};
use crate::registry::Registry;
use crate::selection::Selection;
use crate::topology::{DeviceTree, NodeId, TargetStatus};
use crate::Error;

/// Everything needed to open a [Session].
#[derive(Debug)]
pub struct SessionConfig {
    /// The transport backend to reach the hardware through.
    pub backend: BackendKind,
    /// Backend device argument: the board variant for FSI and host, the bus
    /// node for I2C.
    pub device: Option<String>,
    /// The I2C device address. Unused by the other backends.
    pub slave_address: u16,
    /// The operator's processor/chip/thread selection.
    pub selection: Selection,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Kernel,
            device: None,
            slave_address: 0x50,
            selection: Selection::new(),
        }
    }
}

/// Operations a class of targets supports.
///
/// Command handlers attach one table per class tag after attach; the generic
/// tree never needs to know what a class can do.
pub trait ClassOps {
    /// Probe whether the unit behind this node is actually present.
    ///
    /// The default claims presence; backends override this for units that
    /// may be missing on a given system.
    fn probe(&self, tree: &mut DeviceTree, node: NodeId) -> Result<bool, Error> {
        let _ = (tree, node);
        Ok(true)
    }
}

/// An attached debug session.
pub struct Session {
    tree: DeviceTree,
    bus: Option<Box<dyn BusDriver>>,
    class_ops: HashMap<String, Box<dyn ClassOps>>,
}

impl Session {
    /// Load the backend's topology, apply the selection and acquire the bus
    /// handle.
    ///
    /// Any failure here aborts the invocation; no partial topology is ever
    /// handed out.
    pub fn attach(config: SessionConfig) -> Result<Session, Error> {
        let registry = Registry::from_builtin_topologies()?;
        let description = registry.get(config.backend, config.device.as_deref())?;

        let mut tree = DeviceTree::from_description(description)?;
        config.selection.apply(&mut tree)?;

        let bus = bus::open(config.backend, config.device.as_deref(), config.slave_address)?;
        tracing::debug!(backend = %config.backend, topology = %description.name, "attached");

        Ok(Session {
            tree,
            bus: Some(bus),
            class_ops: HashMap::new(),
        })
    }

    /// The loaded tree.
    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    /// The loaded tree, mutably. Operation handlers use this to record
    /// per-target state such as a failed probe.
    pub fn tree_mut(&mut self) -> &mut DeviceTree {
        &mut self.tree
    }

    /// Attach an operation table to a class tag.
    pub fn register_class_ops(&mut self, class: &str, ops: Box<dyn ClassOps>) {
        self.class_ops.insert(class.to_string(), ops);
    }

    /// Probe every enabled target of every class with registered
    /// operations, marking units that turn out to be absent.
    pub fn probe_all(&mut self) -> Result<(), Error> {
        let classes: Vec<String> = self.class_ops.keys().cloned().collect();
        for class in classes {
            if !self.tree.class_declared(&class) {
                continue;
            }
            let members: Vec<NodeId> = self.tree.targets_of_class(&class)?.collect();
            for node in members {
                if self.tree.status(node)? != TargetStatus::Enabled {
                    continue;
                }
                let ops = self.class_ops.get(&class).expect("key taken from the map");
                if !ops.probe(&mut self.tree, node)? {
                    tracing::debug!(node = %self.tree.name(node), "probe found no unit");
                    self.tree.set_property(node, "status", b"nonexistant");
                }
            }
        }
        Ok(())
    }

    /// Run `f` on every enabled target of a class, in load order.
    ///
    /// Returns the number of targets `f` ran on; "zero targets" is a normal
    /// outcome callers report, not an error. An undeclared class is an
    /// error, so callers can tell "none exist on this platform" from
    /// "command inapplicable to this backend".
    pub fn for_each_target<F>(&mut self, class: &str, f: F) -> Result<usize, Error>
    where
        F: FnMut(&mut DeviceTree, NodeId, u32) -> Result<(), Error>,
    {
        self.for_each_child_target(class, None, f)
    }

    /// As [Session::for_each_target], scoped to targets below `parent`.
    pub fn for_each_child_target<F>(
        &mut self,
        class: &str,
        parent: Option<NodeId>,
        mut f: F,
    ) -> Result<usize, Error>
    where
        F: FnMut(&mut DeviceTree, NodeId, u32) -> Result<(), Error>,
    {
        let members: Vec<NodeId> = match parent {
            None => self.tree.targets_of_class(class)?.collect(),
            Some(parent) => self.tree.descendants_of_class(parent, class)?.collect(),
        };

        let mut count = 0;
        for node in members {
            if self.tree.status(node)? != TargetStatus::Enabled {
                continue;
            }
            let Some(index) = self.tree.resolve_index(node) else {
                tracing::debug!(node = %self.tree.name(node), "target has no resolvable index");
                continue;
            };
            f(&mut self.tree, node, index)?;
            count += 1;
        }

        Ok(count)
    }

    /// Release the bus handle explicitly, surfacing any release error.
    ///
    /// Dropping the session releases the handle too, but swallows errors.
    pub fn close(mut self) -> Result<(), Error> {
        if let Some(mut bus) = self.bus.take() {
            bus.release()?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut bus) = self.bus.take() {
            if let Err(error) = bus.release() {
                tracing::warn!(bus = bus.name(), %error, "failed to release bus handle");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ClassOps, Session, SessionConfig};
    use crate::selection::Selection;
    use crate::topology::{DeviceTree, NodeId, TargetStatus};
    use crate::{BackendKind, Error};

    fn fake_session(selection: Selection) -> Session {
        Session::attach(SessionConfig {
            backend: BackendKind::Fake,
            selection,
            ..SessionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn for_each_counts_only_enabled_targets() {
        let mut selection = Selection::new();
        selection.processor(0).unwrap();
        let mut session = fake_session(selection);

        let mut seen = Vec::new();
        let count = session
            .for_each_target("thread", |tree, node, index| {
                seen.push((tree.name(node).to_string(), index));
                Ok(())
            })
            .unwrap();

        assert_eq!(count, seen.len());
        assert!(count > 0);
        for (_, index) in &seen {
            assert!(*index < 4);
        }
    }

    #[test]
    fn for_each_on_undeclared_class_is_an_error() {
        let mut session = fake_session(Selection::new());
        let result = session.for_each_target("no-such-class", |_, _, _| Ok(()));
        assert!(matches!(result, Err(Error::Topology(_))));
    }

    #[test]
    fn for_each_on_empty_class_counts_zero() {
        let mut session = fake_session(Selection::new());
        // The fake topology declares the nest trace class with no members.
        let count = session.for_each_target("nhtm", |_, _, _| Ok(())).unwrap();
        assert_eq!(count, 0);
    }

    struct AbsentEverywhere;

    impl ClassOps for AbsentEverywhere {
        fn probe(&self, _tree: &mut DeviceTree, _node: NodeId) -> Result<bool, Error> {
            Ok(false)
        }
    }

    #[test]
    fn failed_probe_marks_targets_nonexistent() {
        let mut session = fake_session(Selection::new());
        session.register_class_ops("chiplet", Box::new(AbsentEverywhere));
        session.probe_all().unwrap();

        let tree = session.tree();
        for chiplet in tree.targets_of_class("chiplet").unwrap() {
            assert_eq!(tree.status(chiplet).unwrap(), TargetStatus::Nonexistent);
        }

        // Nonexistent units are never dispatched to.
        let count = session.for_each_target("chiplet", |_, _, _| Ok(())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn close_releases_the_bus() {
        let session = fake_session(Selection::new());
        session.close().unwrap();
    }
}
