//! USB descriptor value types
//!
//! Plain-data snapshots of the device, configuration, interface, and
//! alternate-setting descriptors. These are populated by whatever layer
//! enumerates devices and parses descriptors; this crate only reads them.
//!
//! The `Display` implementations are used to identify objects in error
//! messages and log lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current draw from the USB bus, in milliamperes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Milliamperes(pub u16);

impl fmt::Display for Milliamperes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mA", self.0)
    }
}

/// USB device speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speed {
    /// Speed not known to the host stack
    Unknown,
    /// Low speed - 1.5 Mbps (USB 1.0)
    Low,
    /// Full speed - 12 Mbps (USB 1.1)
    Full,
    /// High speed - 480 Mbps (USB 2.0)
    High,
    /// SuperSpeed - 5 Gbps (USB 3.0)
    Super,
    /// SuperSpeed+ - 10 Gbps (USB 3.1)
    SuperPlus,
}

/// Device descriptor captured when the device was opened
///
/// Immutable for the lifetime of the [`Device`](crate::Device) that carries
/// it. `configs` lists every configuration the device declares, in descriptor
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Bus number the device is attached to
    pub bus_number: u8,
    /// Device address on the bus
    pub address: u8,
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// USB device class
    pub class: u8,
    /// USB device subclass
    pub subclass: u8,
    /// USB device protocol
    pub protocol: u8,
    /// Device speed
    pub speed: Speed,
    /// Configurations the device supports
    pub configs: Vec<ConfigInfo>,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (bus {}, addr {})",
            self.vendor_id, self.product_id, self.bus_number, self.address
        )
    }
}

/// Information about one USB device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigInfo {
    /// Configuration number (the value used on the wire, not an index)
    pub number: u8,
    /// True if the device is powered externally in this configuration
    pub self_powered: bool,
    /// True if the device supports remote wakeup in this configuration
    pub remote_wakeup: bool,
    /// Maximum current the device draws from the bus in this configuration
    pub max_power: Milliamperes,
    /// Interfaces available in this configuration, in descriptor order
    pub interfaces: Vec<InterfaceInfo>,
}

impl fmt::Display for ConfigInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config={}", self.number)
    }
}

/// Information about one interface and its alternate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInfo {
    /// Interface number
    pub number: u8,
    /// Alternate settings of this interface, in descriptor order
    pub alt_settings: Vec<InterfaceSetting>,
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface {}", self.number)
    }
}

/// One alternate setting of an interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSetting {
    /// Interface number this setting belongs to
    pub number: u8,
    /// Alternate setting number
    pub alternate: u8,
    /// USB interface class
    pub class: u8,
    /// USB interface subclass
    pub sub_class: u8,
    /// USB interface protocol
    pub protocol: u8,
}

impl fmt::Display for InterfaceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface {} alt {}", self.number, self.alternate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_display() {
        let desc = DeviceDescriptor {
            bus_number: 1,
            address: 4,
            vendor_id: 0x1d6b,
            product_id: 0x0002,
            class: 0,
            subclass: 0,
            protocol: 0,
            speed: Speed::High,
            configs: vec![],
        };
        assert_eq!(desc.to_string(), "1d6b:0002 (bus 1, addr 4)");
    }

    #[test]
    fn test_config_info_display() {
        let info = ConfigInfo {
            number: 2,
            self_powered: true,
            remote_wakeup: false,
            max_power: Milliamperes(500),
            interfaces: vec![],
        };
        assert_eq!(info.to_string(), "config=2");
        assert_eq!(info.max_power.to_string(), "500 mA");
    }

    #[test]
    fn test_config_info_serde_round_trip() {
        let info = ConfigInfo {
            number: 1,
            self_powered: false,
            remote_wakeup: true,
            max_power: Milliamperes(100),
            interfaces: vec![InterfaceInfo {
                number: 0,
                alt_settings: vec![InterfaceSetting {
                    number: 0,
                    alternate: 0,
                    class: 0xff,
                    sub_class: 0,
                    protocol: 0,
                }],
            }],
        };

        let json = serde_json::to_string(&info).unwrap();
        let back: ConfigInfo = serde_json::from_str(&json).unwrap();

        assert_eq!(back.number, 1);
        assert!(back.remote_wakeup);
        assert_eq!(back.interfaces.len(), 1);
        assert_eq!(back.interfaces[0].alt_settings[0].class, 0xff);
    }
}
