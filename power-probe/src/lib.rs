//! # Debugging toolset for POWER-style hardware
//!
//! power-probe talks to the low-level facilities of a multi-chip,
//! multi-thread platform (registers, memory, trace buffers, execution
//! control) through interchangeable bus backends. Every operation runs
//! against the *topology*: a tree of hardware units loaded from a compiled,
//! backend-specific image and filtered by the operator's
//! processor/chip/thread selection.
//!
//! # Examples
//!
//! ## Walking the selected threads
//! ```no_run
//! # use power_probe::Error;
//! use power_probe::{BackendKind, Selection, Session, SessionConfig};
//!
//! let mut selection = Selection::new();
//! selection.processor(0)?;
//!
//! let mut session = Session::attach(SessionConfig {
//!     backend: BackendKind::Fake,
//!     selection,
//!     ..SessionConfig::default()
//! })?;
//!
//! let threads = session.for_each_target("thread", |tree, thread, index| {
//!     println!("thread {index}: {}", tree.name(thread));
//!     Ok(())
//! })?;
//! println!("ran on {threads} threads");
//! # Ok::<(), Error>(())
//! ```
//!
//! power-probe is built around three interfaces: the [Registry] of built-in
//! topologies, the [DeviceTree] the registry materializes, and the [Session]
//! that owns the tree plus the backend bus handle.

pub mod bus;
mod error;
#[warn(missing_docs)]
pub mod registry;
#[warn(missing_docs)]
pub mod selection;
mod session;
#[warn(missing_docs)]
pub mod topology;

pub use power_probe_topology as schema;
pub use power_probe_topology::BackendKind;

pub use crate::bus::{BusDriver, BusError, FakeBus};
pub use crate::error::Error;
pub use crate::registry::{Registry, RegistryError};
pub use crate::selection::{Selection, SelectionError};
pub use crate::session::{ClassOps, Session, SessionConfig};
pub use crate::topology::{DeviceTree, NodeId, TargetStatus, TopologyError};
