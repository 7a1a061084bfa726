//! Bus backend handles.
//!
//! The wire protocols themselves (FSI bit-banging, I2C framing, kernel
//! ioctls, debugfs file I/O) live behind this trait; the core only needs to
//! acquire a handle at attach time and guarantee its release on every exit
//! path.

use power_probe_topology::BackendKind;
use thiserror::Error;

/// Errors raised while acquiring or releasing a bus handle.
#[derive(Error, Debug)]
pub enum BusError {
    /// The backend's device handle could not be acquired.
    #[error("failed to acquire {backend} bus handle via '{device}'")]
    Acquisition {
        /// The requested backend.
        backend: BackendKind,
        /// The device node or board the handle was requested for.
        device: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The handle could not be released cleanly.
    #[error("failed to release {0} bus handle")]
    Release(String),
}

/// A held bus handle for one backend.
///
/// Implementations own whatever external resource the backend needs (a bus
/// master, a device node, a kernel driver handle). [BusDriver::release] is
/// called exactly once, from [crate::Session]'s teardown, regardless of how
/// the invocation ends.
pub trait BusDriver {
    /// Short backend name for diagnostics.
    fn name(&self) -> &str;

    /// Release the underlying resource.
    fn release(&mut self) -> Result<(), BusError>;
}

/// A bus handle with nothing behind it, used by the fake backend, tests and
/// demos.
#[derive(Debug, Default)]
pub struct FakeBus {
    released: bool,
}

impl FakeBus {
    /// Create an unreleased fake handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [BusDriver::release] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl BusDriver for FakeBus {
    fn name(&self) -> &str {
        "fake"
    }

    fn release(&mut self) -> Result<(), BusError> {
        self.released = true;
        Ok(())
    }
}

/// A handle for one of the real backends.
///
/// Acquisition and release of the device node are modeled here; the actual
/// transactions are the backend driver's concern.
#[derive(Debug)]
struct SystemBus {
    backend: BackendKind,
    device: String,
}

impl BusDriver for SystemBus {
    fn name(&self) -> &str {
        match self.backend {
            BackendKind::Fsi => "fsi",
            BackendKind::I2c => "i2c",
            BackendKind::Kernel => "kernel",
            BackendKind::Host => "host",
            BackendKind::Fake => "fake",
        }
    }

    fn release(&mut self) -> Result<(), BusError> {
        tracing::debug!(backend = %self.backend, device = %self.device, "releasing bus handle");
        Ok(())
    }
}

/// Acquire the bus handle for a backend.
///
/// `device` is the I2C bus node for the I2C backend (default `/dev/i2c4`)
/// and unused by the others; `slave_address` is the I2C device address
/// (default `0x50`).
pub(crate) fn open(
    backend: BackendKind,
    device: Option<&str>,
    slave_address: u16,
) -> Result<Box<dyn BusDriver>, BusError> {
    match backend {
        BackendKind::Fake => Ok(Box::new(FakeBus::new())),
        BackendKind::I2c => {
            let device = device.unwrap_or("/dev/i2c4").to_string();
            tracing::debug!(%device, slave_address, "acquiring i2c bus handle");
            Ok(Box::new(SystemBus {
                backend,
                device,
            }))
        }
        BackendKind::Fsi | BackendKind::Kernel | BackendKind::Host => {
            let device = device.unwrap_or_default().to_string();
            tracing::debug!(backend = %backend, %device, "acquiring bus handle");
            Ok(Box::new(SystemBus { backend, device }))
        }
    }
}
