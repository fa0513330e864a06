//! Configuration lifecycle and the interface-claim protocol
//!
//! A [`Config`] represents one configuration selected on a device. It tracks
//! which interface numbers are claimed through it and refuses to close while
//! any remain, enforcing bottom-up release.

use crate::device::{DEFAULT_CONTROL_TIMEOUT, Device};
use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::interface::Interface;
use crate::types::ConfigInfo;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// A USB device set to use a particular configuration
///
/// Only one `Config` of a device is meant to be in use at any one time;
/// close it to allow switching the device to a different configuration.
pub struct Config<'d, H: HostHandle> {
    info: ConfigInfo,
    control_timeout: Duration,

    /// Parent device. A plain borrow: a `Config` can never outlive the
    /// `Device` that created it.
    device: &'d Device<H>,

    /// Interface numbers currently claimed through this configuration.
    claimed: Mutex<BTreeSet<u8>>,
}

impl<'d, H: HostHandle> Config<'d, H> {
    pub(crate) fn new(device: &'d Device<H>, info: ConfigInfo) -> Self {
        Self {
            info,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
            device,
            claimed: Mutex::new(BTreeSet::new()),
        }
    }

    /// Descriptor information for this configuration.
    pub fn info(&self) -> &ConfigInfo {
        &self.info
    }

    /// Sets the timeout applied to control transfers issued through this
    /// configuration.
    pub fn set_control_timeout(&mut self, timeout: Duration) {
        self.control_timeout = timeout;
    }

    /// Releases the configuration claim on the parent device.
    ///
    /// Fails with a busy error naming every still-claimed interface number;
    /// release those interfaces first. On success the parent device may
    /// select another configuration or close.
    pub fn close(&self) -> Result<()> {
        let claimed = self.claimed.lock().unwrap();
        if !claimed.is_empty() {
            return Err(Error::ConfigBusy {
                config: self.to_string(),
                interfaces: claimed.iter().copied().collect(),
            });
        }
        // Config lock before device claim lock; the one two-lock path.
        self.device.clear_claimed();
        debug!("Released configuration {}", self);
        Ok(())
    }

    /// Sends a control request to the device, bounded by the configuration's
    /// control timeout. Returns the number of bytes transferred.
    ///
    /// The transfer direction comes from the IN bit of `request_type`: IN
    /// transfers read into `data`, OUT transfers send its contents.
    pub fn control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
    ) -> Result<usize> {
        let handle = self.device.handle()?;
        handle
            .control(
                self.control_timeout,
                request_type,
                request,
                value,
                index,
                data,
            )
            .map_err(|e| Error::host("perform control transfer", self, e))
    }

    /// Claims interface `intf` at alternate setting `alt` and returns it.
    ///
    /// Both arguments are 0-based indices: `intf` into this configuration's
    /// interface table, `alt` into that interface's alternate-setting table.
    /// The claim is two-phase: the interface is claimed at the native layer,
    /// then the alternate setting is activated. If activation fails the
    /// claim is rolled back before the error is surfaced, so a failed call
    /// never leaves the interface half-held.
    pub fn interface(&self, intf: usize, alt: usize) -> Result<Interface<'_, H>> {
        let Some(if_info) = self.info.interfaces.get(intf) else {
            return Err(Error::InterfaceOutOfRange {
                interface: intf,
                config: self.to_string(),
                count: self.info.interfaces.len(),
            });
        };
        let Some(setting) = if_info.alt_settings.get(alt) else {
            return Err(Error::AltSettingOutOfRange {
                interface: intf,
                alt,
                count: if_info.alt_settings.len(),
            });
        };
        let number = if_info.number;

        let handle = self.device.handle()?;
        handle
            .claim_interface(number)
            .map_err(|e| Error::host("claim interface", self, e))?;

        if let Err(e) = handle.set_alternate_setting(number, setting.alternate) {
            // Roll back so the interface is not left claimed without its
            // requested setting.
            if let Err(release_err) = handle.release_interface(number) {
                warn!(
                    "Failed to release interface {} while rolling back on {}: {}",
                    number, self, release_err
                );
            }
            return Err(Error::host("set alternate setting", self, e));
        }

        self.claimed.lock().unwrap().insert(number);
        debug!(
            "Claimed interface {} alt {} on {}",
            number, setting.alternate, self
        );
        Ok(Interface::new(self, setting.clone()))
    }

    /// Release a claimed interface: native release first, bookkeeping second.
    ///
    /// The bookkeeping entry is removed even when the native release fails;
    /// the native layer has dropped or lost the claim either way, and keeping
    /// the entry would wedge `close` forever.
    pub(crate) fn release_interface(&self, number: u8) -> Result<()> {
        let handle = self.device.handle()?;
        let released = handle
            .release_interface(number)
            .map_err(|e| Error::host("release interface", self, e));

        self.claimed.lock().unwrap().remove(&number);
        debug!("Released interface {} on {}", number, self);
        released
    }
}

impl<H: HostHandle> fmt::Display for Config<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.device, self.info)
    }
}

impl<H: HostHandle> fmt::Debug for Config<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("info", &self.info)
            .field("control_timeout", &self.control_timeout)
            .field("claimed", &*self.claimed.lock().unwrap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHost, fake_config_info, fake_descriptor};

    fn open_config(host: &FakeHost, interfaces: usize, alts: usize) -> Device<FakeHost> {
        let info = fake_config_info(1, interfaces, alts);
        Device::new(host.clone(), fake_descriptor(vec![info]))
    }

    #[test]
    fn test_interface_index_out_of_range_without_native_call() {
        let host = FakeHost::new();
        let dev = open_config(&host, 3, 1);
        let cfg = dev.config(1).unwrap();
        let calls_before = host.calls().len();

        let err = cfg.interface(5, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::InterfaceOutOfRange { interface: 5, count: 3, .. }
        ));
        assert!(err.to_string().contains("3 entries"));
        assert_eq!(host.calls().len(), calls_before);
    }

    #[test]
    fn test_alt_index_out_of_range_without_native_call() {
        let host = FakeHost::new();
        let dev = open_config(&host, 1, 2);
        let cfg = dev.config(1).unwrap();
        let calls_before = host.calls().len();

        let err = cfg.interface(0, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::AltSettingOutOfRange { alt: 4, count: 2, .. }
        ));
        assert_eq!(host.calls().len(), calls_before);
    }

    #[test]
    fn test_alt_setting_failure_rolls_back_claim() {
        let host = FakeHost::new();
        host.fail_set_alt(0, 1);
        let dev = open_config(&host, 1, 2);
        let cfg = dev.config(1).unwrap();

        let err = cfg.interface(0, 1).unwrap_err();
        assert!(matches!(err, Error::Host { .. }));
        // The native claim was rolled back and nothing was recorded.
        assert!(host.claimed().is_empty());
        assert!(cfg.close().is_ok());

        // A subsequent claim on the same interface succeeds cleanly.
        let cfg = dev.config(1).unwrap();
        let intf = cfg.interface(0, 0).unwrap();
        assert_eq!(host.claimed(), vec![0]);
        intf.close().unwrap();
        cfg.close().unwrap();
    }

    #[test]
    fn test_claim_failure_surfaces_native_error() {
        let host = FakeHost::new();
        host.fail_claim(0);
        let dev = open_config(&host, 1, 1);
        let cfg = dev.config(1).unwrap();

        let err = cfg.interface(0, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::Host {
                operation: "claim interface",
                ..
            }
        ));
        assert!(host.claimed().is_empty());
        cfg.close().unwrap();
    }

    #[test]
    fn test_close_busy_names_claimed_interfaces() {
        let host = FakeHost::new();
        let dev = open_config(&host, 2, 1);
        let cfg = dev.config(1).unwrap();

        let i0 = cfg.interface(0, 0).unwrap();
        let i1 = cfg.interface(1, 0).unwrap();

        match cfg.close().unwrap_err() {
            Error::ConfigBusy { interfaces, .. } => assert_eq!(interfaces, vec![0, 1]),
            other => panic!("expected ConfigBusy, got {other}"),
        }

        i0.close().unwrap();
        i1.close().unwrap();
        cfg.close().unwrap();
        dev.close().unwrap();
    }

    #[test]
    fn test_reclaim_is_idempotent_in_bookkeeping() {
        let host = FakeHost::new();
        let dev = open_config(&host, 1, 1);
        let cfg = dev.config(1).unwrap();

        let first = cfg.interface(0, 0).unwrap();
        let second = cfg.interface(0, 0).unwrap();
        assert_eq!(host.claimed(), vec![0]);

        // Both handles alias the same underlying claim; the first release
        // clears the shared bookkeeping entry.
        first.close().unwrap();
        assert!(host.claimed().is_empty());
        assert!(second.close().is_err());
        cfg.close().unwrap();
    }

    #[test]
    fn test_control_uses_configured_timeout() {
        let host = FakeHost::new();
        let dev = open_config(&host, 1, 1);
        let mut cfg = dev.config(1).unwrap();
        cfg.set_control_timeout(Duration::from_millis(250));

        let mut buf = [0u8; 8];
        cfg.control(0x80, 0x06, 0x0100, 0, &mut buf).unwrap();

        let (timeout, request_type, request) = host.last_control().unwrap();
        assert_eq!(timeout, Duration::from_millis(250));
        assert_eq!(request_type, 0x80);
        assert_eq!(request, 0x06);
    }
}
