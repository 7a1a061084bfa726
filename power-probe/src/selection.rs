//! The operator's processor/chip/thread selection and the enablement pass
//! that applies it to a freshly loaded tree.
//!
//! A selection is three nested levels. Each level is either "everything"
//! (the default when no selector of that level was given) or an explicit
//! index set built from `-p`/`-c`/`-t` selectors. The pass runs exactly
//! once, after topology load and before any operation handler executes; it
//! recurses into unselected subtrees so every node ends up with its own
//! status, and it tolerates classes a backend simply does not declare.

use std::collections::HashMap;

use thiserror::Error;

use crate::topology::{DeviceTree, NodeId, TopologyError};

/// Highest processor index any platform exposes.
pub const MAX_PROCESSORS: u32 = 16;
/// Highest chip (chiplet) index per processor.
pub const MAX_CHIPS: u32 = 24;
/// Highest thread index per chip.
pub const MAX_THREADS: u32 = 8;

/// Errors for out-of-range or incomplete selectors. Reported to the
/// operator before any hardware access occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The processor index exceeds the platform maximum.
    #[error("processor {0} exceeds the platform maximum of {max}", max = MAX_PROCESSORS - 1)]
    ProcessorOutOfRange(u32),
    /// The chip index exceeds the platform maximum.
    #[error("chip {0} exceeds the platform maximum of {max}", max = MAX_CHIPS - 1)]
    ChipOutOfRange(u32),
    /// The thread index exceeds the platform maximum.
    #[error("thread {0} exceeds the platform maximum of {max}", max = MAX_THREADS - 1)]
    ThreadOutOfRange(u32),
    /// A chip selector was given without a processor to attach it to.
    #[error("chip selector given without a preceding processor selector")]
    MissingProcessor,
    /// A thread selector was given without a chip to attach it to.
    #[error("thread selector given without a preceding chip selector")]
    MissingChip,
}

#[derive(Debug, Clone, Default)]
struct ThreadSelection {
    /// `None` selects every thread of the chip.
    threads: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default)]
struct ChipSelection {
    /// `None` selects every chip of the processor.
    chips: Option<HashMap<u32, ThreadSelection>>,
}

/// The operator's 3-level target selection.
///
/// `Selection::new()` selects everything; adding a selector at some level
/// narrows that level to the given indices.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// `None` selects every processor.
    processors: Option<HashMap<u32, ChipSelection>>,
}

impl Selection {
    /// A selection covering all processors, chips and threads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a processor (with, so far, all of its chips and threads).
    pub fn processor(&mut self, processor: u32) -> Result<(), SelectionError> {
        if processor >= MAX_PROCESSORS {
            return Err(SelectionError::ProcessorOutOfRange(processor));
        }
        self.processors
            .get_or_insert_with(HashMap::new)
            .entry(processor)
            .or_default();
        Ok(())
    }

    /// Select a chip of a previously selected processor.
    pub fn chip(&mut self, processor: u32, chip: u32) -> Result<(), SelectionError> {
        if chip >= MAX_CHIPS {
            return Err(SelectionError::ChipOutOfRange(chip));
        }
        self.processor(processor)?;
        let processors = self.processors.as_mut().expect("just inserted");
        processors
            .get_mut(&processor)
            .expect("just inserted")
            .chips
            .get_or_insert_with(HashMap::new)
            .entry(chip)
            .or_default();
        Ok(())
    }

    /// Select a thread of a previously selected chip.
    pub fn thread(&mut self, processor: u32, chip: u32, thread: u32) -> Result<(), SelectionError> {
        if thread >= MAX_THREADS {
            return Err(SelectionError::ThreadOutOfRange(thread));
        }
        self.chip(processor, chip)?;
        let threads = self
            .processors
            .as_mut()
            .and_then(|p| p.get_mut(&processor))
            .and_then(|c| c.chips.as_mut())
            .and_then(|c| c.get_mut(&chip))
            .expect("just inserted");
        let set = threads.threads.get_or_insert_with(Vec::new);
        if !set.contains(&thread) {
            set.push(thread);
        }
        Ok(())
    }

    fn processor_selection(&self, processor: u32) -> Option<&ChipSelection> {
        const ALL: &ChipSelection = &ChipSelection { chips: None };
        match &self.processors {
            None => Some(ALL),
            Some(map) => map.get(&processor),
        }
    }

    fn chip_selection<'a>(
        selection: &'a ChipSelection,
        chip: u32,
    ) -> Option<&'a ThreadSelection> {
        const ALL: &ThreadSelection = &ThreadSelection { threads: None };
        match &selection.chips {
            None => Some(ALL),
            Some(map) => map.get(&chip),
        }
    }

    fn thread_selected(selection: &ThreadSelection, thread: u32) -> bool {
        match &selection.threads {
            None => true,
            Some(set) => set.contains(&thread),
        }
    }

    /// Apply the selection to a freshly loaded tree, enabling selected
    /// units and disabling everything else.
    ///
    /// Walks the `pib` class, then the `chiplet` and `thread` classes
    /// scoped below each pib, then the `fsi` class by processor index.
    /// Classes the topology does not declare are skipped gracefully.
    pub fn apply(&self, tree: &mut DeviceTree) -> Result<(), TopologyError> {
        for pib in members(tree, "pib") {
            let Some(processor) = tree.resolve_index(pib) else {
                continue;
            };

            let Some(chip_selection) = self.processor_selection(processor) else {
                disable_subtree(tree, pib);
                continue;
            };

            tree.enable(pib)?;
            self.apply_chiplets(tree, pib, chip_selection)?;
        }

        // The bus link for a processor is selected and deselected with it.
        for fsi in members(tree, "fsi") {
            let Some(processor) = tree.resolve_index(fsi) else {
                continue;
            };
            if self.processor_selection(processor).is_some() {
                tree.enable(fsi)?;
            } else {
                disable_subtree(tree, fsi);
            }
        }

        Ok(())
    }

    fn apply_chiplets(
        &self,
        tree: &mut DeviceTree,
        pib: NodeId,
        selection: &ChipSelection,
    ) -> Result<(), TopologyError> {
        if !tree.class_declared("chiplet") {
            return Ok(());
        }

        let chiplets: Vec<NodeId> = tree
            .descendants_of_class(pib, "chiplet")
            .expect("class checked above")
            .collect();

        for chiplet in chiplets {
            let Some(chip) = tree.resolve_index(chiplet) else {
                continue;
            };

            let Some(thread_selection) = Self::chip_selection(selection, chip) else {
                disable_subtree(tree, chiplet);
                continue;
            };

            tree.enable(chiplet)?;
            self.apply_threads(tree, chiplet, thread_selection)?;
        }

        Ok(())
    }

    fn apply_threads(
        &self,
        tree: &mut DeviceTree,
        chiplet: NodeId,
        selection: &ThreadSelection,
    ) -> Result<(), TopologyError> {
        if !tree.class_declared("thread") {
            return Ok(());
        }

        let threads: Vec<NodeId> = tree
            .descendants_of_class(chiplet, "thread")
            .expect("class checked above")
            .collect();

        for thread in threads {
            let selected = match tree.resolve_index(thread) {
                Some(index) => Self::thread_selected(selection, index),
                None => false,
            };
            if selected {
                tree.enable(thread)?;
            } else {
                disable_subtree(tree, thread);
            }
        }

        Ok(())
    }
}

fn members(tree: &DeviceTree, class: &str) -> Vec<NodeId> {
    tree.members_of_class(class).unwrap_or_default().to_vec()
}

/// Disable a node and each of its descendants individually, so every node
/// carries its own status and class-wide iteration can skip it without
/// consulting its ancestors.
fn disable_subtree(tree: &mut DeviceTree, id: NodeId) {
    tree.disable(id);
    for child in tree.children(id).to_vec() {
        disable_subtree(tree, child);
    }
}
