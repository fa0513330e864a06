//! Host-side USB session lifecycle
//!
//! Manages one opened USB device as a strict three-level claim hierarchy:
//! a [`Device`] selects and claims one of its configurations ([`Config`]),
//! and a configuration claims individual interfaces at a chosen alternate
//! setting ([`Interface`]). Acquisition runs top-down, release runs
//! bottom-up, and a parent refuses to close while children remain claimed,
//! so the ordering rules of the USB specification hold even under
//! concurrent use from multiple threads.
//!
//! The actual bus operations go through the [`HostHandle`] trait. Production
//! code hands a [`rusb::DeviceHandle`] to [`Device::new`]; tests use the
//! scripted fake in [`test_utils`]. Enumeration and descriptor parsing are
//! the caller's business: this crate consumes a ready
//! [`DeviceDescriptor`] snapshot.
//!
//! # Example
//!
//! ```
//! use usb_session::Device;
//! use usb_session::test_utils::{FakeHost, fake_config_info, fake_descriptor};
//!
//! # fn main() -> usb_session::Result<()> {
//! let descriptor = fake_descriptor(vec![fake_config_info(1, 2, 1)]);
//! let device = Device::new(FakeHost::new(), descriptor);
//!
//! let config = device.config(1)?;
//! let interface = config.interface(0, 0)?;
//!
//! // ... control transfers through `interface` or `config` ...
//!
//! // Release in reverse order of acquisition.
//! interface.close()?;
//! config.close()?;
//! device.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod host;
pub mod interface;
pub mod test_utils;
pub mod types;

pub use config::Config;
pub use device::{DEFAULT_CONTROL_TIMEOUT, Device};
pub use error::{Error, Result};
pub use host::HostHandle;
pub use interface::Interface;
pub use types::{
    ConfigInfo, DeviceDescriptor, InterfaceInfo, InterfaceSetting, Milliamperes, Speed,
};
