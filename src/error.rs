//! Session error types

use std::fmt;
use thiserror::Error;

/// Errors returned by device, configuration, and interface operations
#[derive(Debug, Error)]
pub enum Error {
    /// The device handle has already been closed
    #[error("double close on device {device}")]
    AlreadyClosed { device: String },

    /// The device still has an open configuration
    #[error("device {device} is busy: configuration {config} is still open")]
    DeviceBusy { device: String, config: u8 },

    /// The configuration still has claimed interfaces
    #[error("failed to release {config}: interfaces {interfaces:?} are still open")]
    ConfigBusy { config: String, interfaces: Vec<u8> },

    /// The requested configuration number is not in the device descriptor
    #[error("configuration {config} not found in the descriptor of device {device}")]
    ConfigNotFound { config: u8, device: String },

    /// The interface index is not a valid 0-based index into the interface table
    #[error(
        "interface {interface} not found in {config}: the interface table has {count} entries (0-based index)"
    )]
    InterfaceOutOfRange {
        interface: usize,
        config: String,
        count: usize,
    },

    /// The alt-setting index is not a valid 0-based index into the settings table
    #[error(
        "interface {interface} has no alternate setting {alt}: the settings table has {count} entries (0-based index)"
    )]
    AltSettingOutOfRange {
        interface: usize,
        alt: usize,
        count: usize,
    },

    /// A native host call failed
    #[error("failed to {operation} on {target}: {source}")]
    Host {
        operation: &'static str,
        target: String,
        #[source]
        source: rusb::Error,
    },
}

impl Error {
    /// Wrap a native error with the operation and the object it was issued on.
    pub(crate) fn host(operation: &'static str, target: &impl fmt::Display, source: rusb::Error) -> Self {
        Error::Host {
            operation,
            target: target.to_string(),
            source,
        }
    }
}

/// Type alias for session results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_busy_names_interfaces() {
        let err = Error::ConfigBusy {
            config: "1d6b:0002 (bus 1, addr 4),config=1".to_string(),
            interfaces: vec![0, 2],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("config=1"));
        assert!(msg.contains("[0, 2]"));
    }

    #[test]
    fn test_out_of_range_reports_table_size() {
        let err = Error::InterfaceOutOfRange {
            interface: 5,
            config: "config=1".to_string(),
            count: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("interface 5"));
        assert!(msg.contains("3 entries"));
    }

    #[test]
    fn test_host_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::host("claim interface", &"config=1", rusb::Error::Busy);
        let msg = format!("{}", err);
        assert!(msg.contains("claim interface"));
        assert!(msg.contains("config=1"));
        assert!(err.source().is_some());
    }
}
