//! Test utilities for usb-session
//!
//! Provides a scripted in-memory [`HostHandle`] implementation and
//! descriptor builders for exercising the session layer without hardware.
//!
//! # Example
//!
//! ```
//! use usb_session::Device;
//! use usb_session::test_utils::{FakeHost, fake_config_info, fake_descriptor};
//!
//! let host = FakeHost::new();
//! let device = Device::new(host.clone(), fake_descriptor(vec![fake_config_info(1, 2, 1)]));
//! let config = device.config(1).unwrap();
//! assert_eq!(host.configured(), Some(1));
//! # config.close().unwrap();
//! # device.close().unwrap();
//! ```

use crate::host::HostHandle;
use crate::types::{ConfigInfo, DeviceDescriptor, InterfaceInfo, InterfaceSetting, Milliamperes, Speed};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory implementation of [`HostHandle`]
///
/// Clones share the same state, so a test can keep one clone for inspection
/// while a [`Device`](crate::Device) owns another. Mirrors the claim
/// semantics a libusb handle exposes: claims are idempotent per handle,
/// releasing an unclaimed interface fails, and an alternate setting can only
/// be activated on a claimed interface.
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    configured: Option<u8>,
    claimed: BTreeSet<u8>,
    alt_settings: HashMap<u8, u8>,
    strings: HashMap<u8, String>,
    auto_detach: bool,
    resets: u32,
    calls: Vec<&'static str>,
    last_control: Option<(Duration, u8, u8)>,
    fail_claim: BTreeSet<u8>,
    fail_set_alt: BTreeSet<(u8, u8)>,
    fail_set_configuration: BTreeSet<u8>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next claims of `interface` fail with `Busy`.
    pub fn fail_claim(&self, interface: u8) {
        self.state.lock().unwrap().fail_claim.insert(interface);
    }

    /// Make activation of `alt` on `interface` fail with `Pipe`.
    pub fn fail_set_alt(&self, interface: u8, alt: u8) {
        self.state
            .lock()
            .unwrap()
            .fail_set_alt
            .insert((interface, alt));
    }

    /// Make selection of configuration `config` fail with `Io`.
    pub fn fail_set_configuration(&self, config: u8) {
        self.state
            .lock()
            .unwrap()
            .fail_set_configuration
            .insert(config);
    }

    /// Install a string descriptor at `index`.
    pub fn set_string(&self, index: u8, value: &str) {
        self.state
            .lock()
            .unwrap()
            .strings
            .insert(index, value.to_string());
    }

    /// Configuration number most recently selected, if any.
    pub fn configured(&self) -> Option<u8> {
        self.state.lock().unwrap().configured
    }

    /// Interface numbers currently claimed, in sorted order.
    pub fn claimed(&self) -> Vec<u8> {
        self.state.lock().unwrap().claimed.iter().copied().collect()
    }

    /// Alternate setting active on `interface`, if one was activated.
    pub fn alt_setting(&self, interface: u8) -> Option<u8> {
        self.state.lock().unwrap().alt_settings.get(&interface).copied()
    }

    /// Whether auto-detach was enabled.
    pub fn auto_detach(&self) -> bool {
        self.state.lock().unwrap().auto_detach
    }

    /// Number of resets performed.
    pub fn resets(&self) -> u32 {
        self.state.lock().unwrap().resets
    }

    /// Names of the native calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Timeout, request type, and request of the last control transfer.
    pub fn last_control(&self) -> Option<(Duration, u8, u8)> {
        self.state.lock().unwrap().last_control
    }
}

impl HostHandle for FakeHost {
    fn control(
        &self,
        timeout: Duration,
        request_type: u8,
        request: u8,
        _value: u16,
        _index: u16,
        data: &mut [u8],
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("control");
        state.last_control = Some((timeout, request_type, request));
        Ok(data.len())
    }

    fn claim_interface(&self, interface: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("claim_interface");
        if state.fail_claim.contains(&interface) {
            return Err(rusb::Error::Busy);
        }
        state.claimed.insert(interface);
        Ok(())
    }

    fn release_interface(&self, interface: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("release_interface");
        if !state.claimed.remove(&interface) {
            return Err(rusb::Error::NotFound);
        }
        state.alt_settings.remove(&interface);
        Ok(())
    }

    fn set_alternate_setting(&self, interface: u8, alt: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("set_alternate_setting");
        if !state.claimed.contains(&interface) {
            return Err(rusb::Error::NotFound);
        }
        if state.fail_set_alt.contains(&(interface, alt)) {
            return Err(rusb::Error::Pipe);
        }
        state.alt_settings.insert(interface, alt);
        Ok(())
    }

    fn set_configuration(&self, config: u8) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("set_configuration");
        if state.fail_set_configuration.contains(&config) {
            return Err(rusb::Error::Io);
        }
        state.configured = Some(config);
        Ok(())
    }

    fn active_configuration(&self) -> Result<u8, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("active_configuration");
        state.configured.ok_or(rusb::Error::NotFound)
    }

    fn reset(&self) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("reset");
        state.resets += 1;
        Ok(())
    }

    fn read_string_descriptor(&self, index: u8) -> Result<String, rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("read_string_descriptor");
        state.strings.get(&index).cloned().ok_or(rusb::Error::NotFound)
    }

    fn set_auto_detach(&self, enabled: bool) -> Result<(), rusb::Error> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("set_auto_detach");
        state.auto_detach = enabled;
        Ok(())
    }
}

/// Build a configuration with `interfaces` interfaces, each offering `alts`
/// alternate settings. Interface numbers and alternates count up from 0.
pub fn fake_config_info(number: u8, interfaces: usize, alts: usize) -> ConfigInfo {
    ConfigInfo {
        number,
        self_powered: false,
        remote_wakeup: false,
        max_power: Milliamperes(100),
        interfaces: (0..interfaces as u8)
            .map(|n| InterfaceInfo {
                number: n,
                alt_settings: (0..alts as u8)
                    .map(|a| InterfaceSetting {
                        number: n,
                        alternate: a,
                        class: 0xff,
                        sub_class: 0,
                        protocol: 0,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Build a device descriptor carrying the given configurations.
pub fn fake_descriptor(configs: Vec<ConfigInfo>) -> DeviceDescriptor {
    DeviceDescriptor {
        bus_number: 1,
        address: 4,
        vendor_id: 0x1234,
        product_id: 0x5678,
        class: 0,
        subclass: 0,
        protocol: 0,
        speed: Speed::High,
        configs,
    }
}
