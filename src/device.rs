//! Device lifecycle
//!
//! A [`Device`] is the root of the claim hierarchy: it owns one opened
//! native handle and at most one claimed configuration at a time.
//! Acquisition runs strictly top-down (device, then config, then interface)
//! and release strictly bottom-up; a parent refuses to close while a child
//! is still claimed.
//!
//! Lock order, crate-wide:
//! 1. config lock ([`Config`](crate::Config) claimed-interface set)
//! 2. device claim lock (`claimed` field below)
//! 3. device handle lock (the `Option` slot below, always a leaf)
//!
//! `Config::close` is the only path holding 1 and 2 together; `reset` and
//! `close` here are the only paths holding 2 and 3 together. No path ever
//! waits on a lower-numbered lock while holding a higher-numbered one.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::types::DeviceDescriptor;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Timeout applied to control transfers on a freshly selected configuration.
///
/// Adjustable per configuration with
/// [`Config::set_control_timeout`](crate::Config::set_control_timeout).
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// An opened USB device
///
/// Created from an externally opened native handle and the descriptor
/// captured at open time. All methods take `&self`; a `Device` is meant to
/// be shared across threads.
pub struct Device<H: HostHandle> {
    /// Native session handle; `None` once the device has been closed.
    ///
    /// Operations clone the `Arc` out of the lock so no lock is held across
    /// a blocking native call. A close concurrent with an in-flight transfer
    /// therefore defers the native close until the last borrower drops its
    /// clone.
    handle: Mutex<Option<Arc<H>>>,

    /// Descriptor captured when the device was opened.
    descriptor: DeviceDescriptor,

    /// Number of the configuration currently claimed via [`Device::config`].
    claimed: Mutex<Option<u8>>,
}

impl<H: HostHandle> Device<H> {
    /// Wrap an opened native handle and its descriptor.
    pub fn new(handle: H, descriptor: DeviceDescriptor) -> Self {
        Self {
            handle: Mutex::new(Some(Arc::new(handle))),
            descriptor,
            claimed: Mutex::new(None),
        }
    }

    /// The descriptor captured when the device was opened.
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Clone the native handle out of the slot, or fail if already closed.
    pub(crate) fn handle(&self) -> Result<Arc<H>> {
        self.handle
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::AlreadyClosed {
                device: self.to_string(),
            })
    }

    /// Clear the claimed-configuration slot. Called by `Config::close` while
    /// the config lock is held; see the module docs for the lock order.
    pub(crate) fn clear_claimed(&self) {
        *self.claimed.lock().unwrap() = None;
    }

    /// Performs a USB port reset to reinitialize the device.
    ///
    /// Fails with a busy error while a configuration is claimed: resetting
    /// under an open configuration would desynchronize the claim state. The
    /// claim lock is held for the duration of the native call so a
    /// configuration cannot be claimed mid-reset.
    pub fn reset(&self) -> Result<()> {
        let claimed = self.claimed.lock().unwrap();
        if let Some(config) = *claimed {
            return Err(Error::DeviceBusy {
                device: self.to_string(),
                config,
            });
        }
        let handle = self.handle()?;
        handle.reset().map_err(|e| Error::host("reset", self, e))?;
        debug!("Reset device {}", self);
        Ok(())
    }

    /// Returns the number of the configuration currently active on the bus.
    ///
    /// Queries the device directly; the claim bookkeeping is not consulted
    /// or mutated. This corresponds to [`ConfigInfo::number`], not an index.
    ///
    /// [`ConfigInfo::number`]: crate::ConfigInfo::number
    pub fn active_config(&self) -> Result<u8> {
        let handle = self.handle()?;
        handle
            .active_configuration()
            .map_err(|e| Error::host("get active configuration", self, e))
    }

    /// Selects configuration `number` on the device and claims it.
    ///
    /// `number` is the configuration number (the [`ConfigInfo::number`]
    /// value), not an index into the descriptor table. USB allows one active
    /// configuration per device; close the returned [`Config`] before
    /// selecting another one.
    ///
    /// [`ConfigInfo::number`]: crate::ConfigInfo::number
    pub fn config(&self, number: u8) -> Result<Config<'_, H>> {
        let info = self
            .descriptor
            .configs
            .iter()
            .find(|c| c.number == number)
            .ok_or_else(|| Error::ConfigNotFound {
                config: number,
                device: self.to_string(),
            })?
            .clone();

        let handle = self.handle()?;
        handle
            .set_configuration(number)
            .map_err(|e| Error::host("set active configuration", self, e))?;

        *self.claimed.lock().unwrap() = Some(number);
        debug!("Claimed configuration {} on device {}", number, self);
        Ok(Config::new(self, info))
    }

    /// Closes the device.
    ///
    /// Fails if the device was already closed, or with a busy error while a
    /// configuration is still claimed. On success the native handle is
    /// released and the slot left empty so a second close is detectable.
    pub fn close(&self) -> Result<()> {
        let claimed = self.claimed.lock().unwrap();
        let mut handle = self.handle.lock().unwrap();
        if handle.is_none() {
            return Err(Error::AlreadyClosed {
                device: self.to_string(),
            });
        }
        if let Some(config) = *claimed {
            return Err(Error::DeviceBusy {
                device: self.to_string(),
                config,
            });
        }
        *handle = None;
        debug!("Closed device {}", self);
        Ok(())
    }

    /// Returns the string descriptor with the given index, as ASCII.
    pub fn string_descriptor(&self, index: u8) -> Result<String> {
        let handle = self.handle()?;
        handle
            .read_string_descriptor(index)
            .map_err(|e| Error::host("read string descriptor", self, e))
    }

    /// Enables or disables automatic kernel driver detachment.
    ///
    /// When enabled the host stack detaches the kernel driver on interface
    /// claim and reattaches it on release. Disabled by default on newly
    /// opened handles.
    pub fn set_auto_detach(&self, enabled: bool) -> Result<()> {
        let handle = self.handle()?;
        handle
            .set_auto_detach(enabled)
            .map_err(|e| Error::host("set auto-detach", self, e))
    }
}

impl<H: HostHandle> fmt::Display for Device<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.descriptor.fmt(f)
    }
}

impl<H: HostHandle> fmt::Debug for Device<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("descriptor", &self.descriptor)
            .field("claimed", &*self.claimed.lock().unwrap())
            .field("open", &self.handle.lock().unwrap().is_some())
            .finish()
    }
}
