//! Claimed interface at an activated alternate setting

use crate::config::Config;
use crate::error::Result;
use crate::host::HostHandle;
use crate::types::InterfaceSetting;
use std::fmt;

/// A claimed interface with one activated alternate setting
///
/// Created only by a successful [`Config::interface`] call. Closing it
/// releases the claim at the native layer and removes the interface from the
/// owning configuration's bookkeeping; since [`close`](Interface::close)
/// consumes the value, a double release cannot be expressed.
pub struct Interface<'c, H: HostHandle> {
    setting: InterfaceSetting,

    /// Owning configuration; routes control transfers and the release.
    config: &'c Config<'c, H>,
}

impl<'c, H: HostHandle> Interface<'c, H> {
    pub(crate) fn new(config: &'c Config<'c, H>, setting: InterfaceSetting) -> Self {
        Self { setting, config }
    }

    /// The alternate-setting descriptor that was activated.
    pub fn setting(&self) -> &InterfaceSetting {
        &self.setting
    }

    /// Sends a control request through the owning configuration, bounded by
    /// its control timeout. Returns the number of bytes transferred.
    pub fn control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
    ) -> Result<usize> {
        self.config
            .control(request_type, request, value, index, data)
    }

    /// Releases the interface claim.
    ///
    /// The native release is issued first; the bookkeeping entry is removed
    /// either way, and a native failure is then surfaced.
    pub fn close(self) -> Result<()> {
        self.config.release_interface(self.setting.number)
    }
}

impl<H: HostHandle> fmt::Display for Interface<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.config, self.setting)
    }
}

impl<H: HostHandle> fmt::Debug for Interface<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("setting", &self.setting)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::Device;
    use crate::test_utils::{FakeHost, fake_config_info, fake_descriptor};

    #[test]
    fn test_setting_matches_requested_alt() {
        let host = FakeHost::new();
        let dev = Device::new(host.clone(), fake_descriptor(vec![fake_config_info(1, 2, 3)]));
        let cfg = dev.config(1).unwrap();

        let intf = cfg.interface(1, 2).unwrap();
        assert_eq!(intf.setting().number, 1);
        assert_eq!(intf.setting().alternate, 2);
        assert_eq!(host.alt_setting(1), Some(2));
        intf.close().unwrap();
    }

    #[test]
    fn test_control_routes_through_config() {
        let host = FakeHost::new();
        let dev = Device::new(host.clone(), fake_descriptor(vec![fake_config_info(1, 1, 1)]));
        let cfg = dev.config(1).unwrap();
        let intf = cfg.interface(0, 0).unwrap();

        let mut buf = [0u8; 4];
        intf.control(0x80, 0x06, 0, 0, &mut buf).unwrap();
        assert!(host.last_control().is_some());

        intf.close().unwrap();
        cfg.close().unwrap();
        dev.close().unwrap();
    }

    #[test]
    fn test_close_releases_native_claim() {
        let host = FakeHost::new();
        let dev = Device::new(host.clone(), fake_descriptor(vec![fake_config_info(1, 1, 1)]));
        let cfg = dev.config(1).unwrap();

        let intf = cfg.interface(0, 0).unwrap();
        assert_eq!(host.claimed(), vec![0]);

        intf.close().unwrap();
        assert!(host.claimed().is_empty());
        cfg.close().unwrap();
    }
}
