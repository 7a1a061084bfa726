//! The registry of built-in compiled topologies.
//!
//! One topology ships per backend/board-variant pair. The YAML descriptions
//! under `topologies/` are compiled into a single bincode image by the
//! build script; the registry decodes that image and answers
//! `(backend, variant)` lookups, including board-name aliases.

use power_probe_topology::{BackendKind, Topology};
use thiserror::Error;

/// The compiled topology image produced by the build script.
const BUILTIN_TOPOLOGIES: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/topologies.bincode"));

/// Errors raised while loading or selecting a built-in topology. All of
/// these are fatal for the invocation; no partial topology is ever exposed.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The embedded image could not be decoded.
    #[error("the built-in topology image is malformed")]
    Malformed(#[from] bincode::Error),
    /// The backend needs a board variant to pick a topology, but none was
    /// given.
    #[error("the {0} backend requires a device type")]
    VariantRequired(BackendKind),
    /// No built-in topology matches the requested backend and variant.
    #[error("no built-in topology for backend '{backend}'{}", variant_suffix(.variant))]
    TopologyNotFound {
        /// The requested backend.
        backend: BackendKind,
        /// The requested board variant, if any.
        variant: Option<String>,
    },
}

fn variant_suffix(variant: &Option<String>) -> String {
    match variant {
        Some(v) => format!(" and device type '{v}'"),
        None => String::new(),
    }
}

/// All topologies compiled into this binary.
#[derive(Debug)]
pub struct Registry {
    topologies: Vec<Topology>,
}

impl Registry {
    /// Decode the embedded topology image.
    pub fn from_builtin_topologies() -> Result<Self, RegistryError> {
        let topologies: Vec<Topology> = bincode::deserialize(BUILTIN_TOPOLOGIES)?;
        tracing::debug!(count = topologies.len(), "decoded built-in topologies");
        Ok(Self { topologies })
    }

    /// Every available topology.
    pub fn topologies(&self) -> &[Topology] {
        &self.topologies
    }

    /// Select the topology for a backend.
    ///
    /// For backends shipping several boards (FSI, host) `device` names the
    /// board variant and may be one of its aliases; the other backends have
    /// a single topology and ignore `device`.
    pub fn get(&self, backend: BackendKind, device: Option<&str>) -> Result<&Topology, RegistryError> {
        if !backend.requires_variant() {
            return self
                .topologies
                .iter()
                .find(|t| t.backend == backend)
                .ok_or(RegistryError::TopologyNotFound {
                    backend,
                    variant: None,
                });
        }

        let device = device.ok_or(RegistryError::VariantRequired(backend))?;
        self.topologies
            .iter()
            .find(|t| {
                t.backend == backend
                    && (t.variant.as_deref() == Some(device)
                        || t.aliases.iter().any(|alias| alias == device))
            })
            .ok_or_else(|| RegistryError::TopologyNotFound {
                backend,
                variant: Some(device.to_string()),
            })
    }
}
