//! Native USB host boundary
//!
//! The session layer never talks to libusb directly; it goes through
//! [`HostHandle`], a small trait over the synchronous calls an opened device
//! needs. Production code uses the blanket implementation for
//! [`rusb::DeviceHandle`]; tests substitute
//! [`FakeHost`](crate::test_utils::FakeHost).
//!
//! Every method may block on the bus. Errors are plain [`rusb::Error`]
//! values; the session layer wraps them with device/config/interface context
//! before surfacing them.

use crate::types::Speed;
use rusb::UsbContext;
use rusb::constants::LIBUSB_ENDPOINT_IN;
use std::time::Duration;

/// Synchronous native host calls backing one opened device session
///
/// Closing the native handle is not a trait method: dropping the
/// implementation releases it.
pub trait HostHandle: Send + Sync {
    /// Perform a control transfer and return the number of bytes moved.
    ///
    /// The direction comes from the IN bit of `request_type`: IN transfers
    /// read into `data`, OUT transfers send its contents.
    fn control(
        &self,
        timeout: Duration,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
    ) -> Result<usize, rusb::Error>;

    /// Claim an interface by interface number.
    fn claim_interface(&self, interface: u8) -> Result<(), rusb::Error>;

    /// Release a previously claimed interface.
    fn release_interface(&self, interface: u8) -> Result<(), rusb::Error>;

    /// Activate an alternate setting on a claimed interface.
    fn set_alternate_setting(&self, interface: u8, alt: u8) -> Result<(), rusb::Error>;

    /// Select the active configuration by configuration number.
    fn set_configuration(&self, config: u8) -> Result<(), rusb::Error>;

    /// Query the configuration number currently active on the device.
    fn active_configuration(&self) -> Result<u8, rusb::Error>;

    /// Perform a USB port reset.
    fn reset(&self) -> Result<(), rusb::Error>;

    /// Read the string descriptor with the given index, as ASCII.
    fn read_string_descriptor(&self, index: u8) -> Result<String, rusb::Error>;

    /// Enable or disable automatic kernel driver detachment.
    fn set_auto_detach(&self, enabled: bool) -> Result<(), rusb::Error>;
}

impl<T: UsbContext> HostHandle for rusb::DeviceHandle<T> {
    fn control(
        &self,
        timeout: Duration,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
    ) -> Result<usize, rusb::Error> {
        if request_type & LIBUSB_ENDPOINT_IN != 0 {
            self.read_control(request_type, request, value, index, data, timeout)
        } else {
            self.write_control(request_type, request, value, index, data, timeout)
        }
    }

    fn claim_interface(&self, interface: u8) -> Result<(), rusb::Error> {
        rusb::DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&self, interface: u8) -> Result<(), rusb::Error> {
        rusb::DeviceHandle::release_interface(self, interface)
    }

    fn set_alternate_setting(&self, interface: u8, alt: u8) -> Result<(), rusb::Error> {
        rusb::DeviceHandle::set_alternate_setting(self, interface, alt)
    }

    fn set_configuration(&self, config: u8) -> Result<(), rusb::Error> {
        self.set_active_configuration(config)
    }

    fn active_configuration(&self) -> Result<u8, rusb::Error> {
        rusb::DeviceHandle::active_configuration(self)
    }

    fn reset(&self) -> Result<(), rusb::Error> {
        rusb::DeviceHandle::reset(self)
    }

    fn read_string_descriptor(&self, index: u8) -> Result<String, rusb::Error> {
        self.read_string_descriptor_ascii(index)
    }

    fn set_auto_detach(&self, enabled: bool) -> Result<(), rusb::Error> {
        self.set_auto_detach_kernel_driver(enabled)
    }
}

impl From<rusb::Speed> for Speed {
    fn from(speed: rusb::Speed) -> Self {
        match speed {
            rusb::Speed::Low => Speed::Low,
            rusb::Speed::Full => Speed::Full,
            rusb::Speed::High => Speed::High,
            rusb::Speed::Super => Speed::Super,
            rusb::Speed::SuperPlus => Speed::SuperPlus,
            _ => Speed::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_from_rusb() {
        assert_eq!(Speed::from(rusb::Speed::Low), Speed::Low);
        assert_eq!(Speed::from(rusb::Speed::Full), Speed::Full);
        assert_eq!(Speed::from(rusb::Speed::High), Speed::High);
        assert_eq!(Speed::from(rusb::Speed::Super), Speed::Super);
        assert_eq!(Speed::from(rusb::Speed::SuperPlus), Speed::SuperPlus);
        assert_eq!(Speed::from(rusb::Speed::Unknown), Speed::Unknown);
    }
}
