use thiserror::Error;

use crate::bus::BusError;
use crate::registry::RegistryError;
use crate::selection::SelectionError;
use crate::topology::TopologyError;

/// The overall error type of this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable topology could be loaded for the requested backend.
    #[error("unable to load a topology for the requested backend")]
    Registry(#[from] RegistryError),
    /// A topology query or the topology image itself failed.
    #[error("a topology model error occurred")]
    Topology(#[from] TopologyError),
    /// The operator's target selection is invalid.
    #[error("the given target selection is invalid")]
    Selection(#[from] SelectionError),
    /// The backend bus handle could not be acquired or released.
    #[error("an error with the backend bus occurred")]
    Bus(#[from] BusError),
    /// Any other error, raised by operation handlers.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
