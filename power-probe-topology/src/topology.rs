use serde::{Deserialize, Serialize};

use crate::NodeDescription;

/// The transport backend a topology image belongs to.
///
/// The backend decides how the tool reaches the hardware; each backend ships
/// its own compiled topology because the reachable units differ per bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Bit-banged FSI bus access. Requires a board variant.
    Fsi,
    /// I2C bus access (P8 only).
    I2c,
    /// The in-kernel FSI driver. The default backend.
    Kernel,
    /// Passthrough via the debugfs xscom nodes. Requires a board variant.
    Host,
    /// A synthetic topology with no hardware behind it, for tests and demos.
    Fake,
}

impl BackendKind {
    /// Whether a board variant must be given to select a topology for this
    /// backend.
    pub fn requires_variant(&self) -> bool {
        matches!(self, BackendKind::Fsi | BackendKind::Host)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendKind::Fsi => "fsi",
            BackendKind::I2c => "i2c",
            BackendKind::Kernel => "kernel",
            BackendKind::Host => "host",
            BackendKind::Fake => "fake",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl std::fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown backend '{}' (expected one of fsi, i2c, kernel, host, fake)",
            self.0
        )
    }
}

impl std::error::Error for UnknownBackend {}

impl std::str::FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fsi" => Ok(BackendKind::Fsi),
            "i2c" => Ok(BackendKind::I2c),
            "kernel" => Ok(BackendKind::Kernel),
            "host" => Ok(BackendKind::Host),
            "fake" => Ok(BackendKind::Fake),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// One complete topology description.
///
/// This corresponds to a single YAML file under `topologies/` and to a single
/// loadable image at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Unique name of this topology, e.g. `p9w-fsi`.
    pub name: String,
    /// The backend this topology is built for.
    pub backend: BackendKind,
    /// The board variant this topology is selected by, e.g. `p9w`.
    ///
    /// `None` for backends with a single topology (kernel, i2c, fake).
    #[serde(default)]
    pub variant: Option<String>,
    /// Alternative names for the variant, e.g. the board's marketing name.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Class tags declared by this topology in addition to the classes of the
    /// nodes below `root`.
    ///
    /// A class listed here but carried by no node is a *known, empty* class:
    /// commands targeting it report zero matching units rather than "not
    /// applicable to this backend".
    #[serde(default)]
    pub classes: Vec<String>,
    /// The root of the hardware tree.
    pub root: NodeDescription,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_round_trips_through_from_str() {
        for backend in [
            BackendKind::Fsi,
            BackendKind::I2c,
            BackendKind::Kernel,
            BackendKind::Host,
            BackendKind::Fake,
        ] {
            assert_eq!(backend.to_string().parse::<BackendKind>(), Ok(backend));
        }

        assert!("spi".parse::<BackendKind>().is_err());
    }

    #[test]
    fn variant_requirement() {
        assert!(BackendKind::Fsi.requires_variant());
        assert!(BackendKind::Host.requires_variant());
        assert!(!BackendKind::Kernel.requires_variant());
        assert!(!BackendKind::I2c.requires_variant());
        assert!(!BackendKind::Fake.requires_variant());
    }
}
