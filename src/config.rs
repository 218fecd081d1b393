//! Device configuration types.
//!
//! These structs are the validated output of the configuration loader, which
//! lives outside this crate. The bridge trusts that the transport kind and
//! its parameter fields are already schema-valid; the one invariant restated
//! here is that exactly the parameter group matching the declared transport
//! kind must be present, and the others are ignored.
//!
//! The configuration is immutable once the adapter owns it.

use crate::comspec::ComSpec;
use serde::{Deserialize, Serialize};

/// The physical transport the driver should be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// TCP socket to the device's LAN interface.
    Network,
    /// RS-232/422/485 COM port on the control system.
    Serial,
    /// Shared command bus (CEC) session.
    CommandBus,
}

impl TransportKind {
    /// Human-readable name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Network => "network",
            TransportKind::Serial => "serial",
            TransportKind::CommandBus => "command-bus",
        }
    }
}

/// Network endpoint parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TcpProperties {
    /// IP address or host of the device.
    pub address: String,
    /// TCP port. Zero means "use the driver's default port".
    #[serde(default)]
    pub port: u16,
}

/// Control (transport) block of a device configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControlProperties {
    /// Declared transport kind.
    pub transport: TransportKind,
    /// Network parameters; required when `transport` is `Network`.
    #[serde(default)]
    pub tcp: Option<TcpProperties>,
    /// COM port name (e.g. "COM3"); required when `transport` is `Serial`.
    #[serde(default)]
    pub com_port: Option<String>,
    /// COM parameter override in the control-system schema.
    #[serde(default)]
    pub com_params: Option<ComSpec>,
}

/// Validated configuration for one bridged device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable device key used in logs and bus registration.
    pub key: String,
    /// Display name of the device.
    pub name: String,
    /// Driver-specific numeric identity, assigned before transport init.
    pub id: u8,
    /// Transport block.
    pub control: ControlProperties,
    /// When true, the translated `control.com_params` override the driver's
    /// built-in COM spec for serial transports.
    #[serde(default)]
    pub use_config_com_spec: bool,
}

impl DeviceConfig {
    /// Convenience constructor for a network-controlled device.
    pub fn network(key: &str, name: &str, id: u8, address: &str, port: u16) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            id,
            control: ControlProperties {
                transport: TransportKind::Network,
                tcp: Some(TcpProperties {
                    address: address.to_string(),
                    port,
                }),
                com_port: None,
                com_params: None,
            },
            use_config_com_spec: false,
        }
    }

    /// Convenience constructor for a serial-controlled device using the
    /// driver's built-in COM spec.
    pub fn serial(key: &str, name: &str, id: u8, com_port: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            id,
            control: ControlProperties {
                transport: TransportKind::Serial,
                tcp: None,
                com_port: Some(com_port.to_string()),
                com_params: None,
            },
            use_config_com_spec: false,
        }
    }

    /// Convenience constructor for a command-bus (CEC) controlled device.
    pub fn command_bus(key: &str, name: &str, id: u8) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            id,
            control: ControlProperties {
                transport: TransportKind::CommandBus,
                tcp: None,
                com_port: None,
                com_params: None,
            },
            use_config_com_spec: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_round_trips_through_serde() {
        let json = serde_json::to_string(&TransportKind::CommandBus).unwrap();
        assert_eq!(json, "\"command-bus\"");
        let back: TransportKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TransportKind::CommandBus);
    }

    #[test]
    fn network_config_defaults_port_to_zero() {
        let json = r#"{
            "key": "display-1",
            "name": "Projector",
            "id": 3,
            "control": {
                "transport": "network",
                "tcp": { "address": "10.0.0.5" }
            }
        }"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.control.transport, TransportKind::Network);
        assert_eq!(config.control.tcp.as_ref().unwrap().port, 0);
        assert!(!config.use_config_com_spec);
    }
}
