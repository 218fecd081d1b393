//! Transport selection and initialization.
//!
//! Given a validated [`DeviceConfig`] this module constructs and initializes
//! exactly one transport binding for the device driver. The three supported
//! kinds are physically incompatible, so selection happens once, at device
//! activation, and an unsupported kind is a construction-time error — never
//! a deferred runtime failure.
//!
//! No retry loop lives here. Reconnect attempts are the concern of whatever
//! drives the driver's `connect` command; the transport itself is opened
//! exactly once per device instance and owned by the driver afterwards.

pub mod mock;

use crate::comspec::{translate, DriverComSpec};
use crate::config::{DeviceConfig, TransportKind};
use crate::driver::DisplayDriver;
use crate::error::{BridgeError, BridgeResult};
use log::{debug, info};
use std::net::IpAddr;
use std::sync::Arc;

/// A named COM port handle supplied by the hosting environment.
///
/// Ports owned by the control system itself must be registered before first
/// use; registration is attempted once and failure is fatal.
pub trait ComPortHandle: Send + Sync {
    /// Port name (e.g. "COM3", "/dev/ttyUSB0").
    fn name(&self) -> &str;

    /// Whether this port requires one-time registration before use.
    fn needs_registration(&self) -> bool {
        false
    }

    /// Registers the port with its owning resource.
    fn register(&self) -> BridgeResult<()> {
        Ok(())
    }

    /// Applies a COM spec to the port, opening it if necessary.
    fn apply_spec(&self, spec: &DriverComSpec) -> BridgeResult<()>;
}

/// A low-level command-bus session supplied by the hosting environment.
pub trait CecSession: Send + Sync {
    /// Starts the session. Must be called before the driver uses it.
    fn start(&self) -> BridgeResult<()>;
}

/// Supplies port handles and command-bus sessions.
///
/// Implemented by the hosting environment; the mock implementation in
/// [`mock`] is used in tests, and [`SystemPortEnvironment`] (feature
/// `instrument_serial`) backs COM ports with real serial devices.
pub trait PortEnvironment: Send + Sync {
    /// Acquires a named COM port.
    fn acquire_com_port(&self, name: &str) -> BridgeResult<Arc<dyn ComPortHandle>>;

    /// Acquires a command-bus session.
    fn acquire_cec_session(&self) -> BridgeResult<Arc<dyn CecSession>>;
}

/// An opened serial channel ready to hand to a driver.
#[derive(Clone)]
pub struct SerialBinding {
    port: Arc<dyn ComPortHandle>,
    spec: DriverComSpec,
}

impl SerialBinding {
    /// Wraps a port handle with the COM spec the driver should run it at.
    pub fn new(port: Arc<dyn ComPortHandle>, spec: DriverComSpec) -> Self {
        Self { port, spec }
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        self.port.name()
    }

    /// The COM spec this binding was built with.
    pub fn spec(&self) -> &DriverComSpec {
        &self.spec
    }

    /// Applies the spec to the underlying port.
    pub fn apply(&self) -> BridgeResult<()> {
        self.port.apply_spec(&self.spec)
    }
}

impl std::fmt::Debug for SerialBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialBinding")
            .field("port", &self.port.name())
            .field("spec", &self.spec)
            .finish()
    }
}

/// A started command-bus session ready to hand to a driver.
#[derive(Clone)]
pub struct CecBinding {
    session: Arc<dyn CecSession>,
}

impl CecBinding {
    /// Wraps a session.
    pub fn new(session: Arc<dyn CecSession>) -> Self {
        Self { session }
    }

    /// Starts the underlying session.
    pub fn start(&self) -> BridgeResult<()> {
        self.session.start()
    }
}

impl std::fmt::Debug for CecBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CecBinding").finish_non_exhaustive()
    }
}

/// Record of the one transport opened for a device.
///
/// The live handle itself moves into the driver; this record is what the
/// bridge keeps for observability and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportBinding {
    /// TCP socket transport.
    Network {
        /// Resolved device address.
        address: IpAddr,
        /// Resolved port (explicit configuration or driver default).
        port: u16,
    },
    /// Serial COM port transport.
    Serial {
        /// Name of the bound port.
        port: String,
    },
    /// Shared command-bus session.
    CommandBus,
}

/// Selects, opens, and initializes the transport declared by `config`.
///
/// Exactly one transport is opened; it is handed to the driver before this
/// function returns. Errors here mean the device must not be constructed.
pub fn select(
    config: &DeviceConfig,
    driver: &dyn DisplayDriver,
    env: &dyn PortEnvironment,
) -> BridgeResult<TransportBinding> {
    match config.control.transport {
        TransportKind::Network => init_network(config, driver),
        TransportKind::Serial => init_serial(config, driver, env),
        TransportKind::CommandBus => init_command_bus(config, driver, env),
    }
}

fn init_network(config: &DeviceConfig, driver: &dyn DisplayDriver) -> BridgeResult<TransportBinding> {
    let tcp = driver
        .as_tcp()
        .ok_or_else(|| BridgeError::UnsupportedTransport(TransportKind::Network.as_str().into()))?;

    let props = config
        .control
        .tcp
        .as_ref()
        .ok_or(BridgeError::MissingParameter("control.tcp"))?;

    let address: IpAddr = props
        .address
        .parse()
        .map_err(|e| BridgeError::TransportInit(format!("bad address '{}': {}", props.address, e)))?;

    // Explicitly configured port wins; zero falls back to the driver default.
    let port = if props.port != 0 {
        props.port
    } else {
        tcp.default_port()
    };

    tcp.initialize(address, port)?;
    info!("[{}] network transport bound to {}:{}", config.key, address, port);

    Ok(TransportBinding::Network { address, port })
}

fn init_serial(
    config: &DeviceConfig,
    driver: &dyn DisplayDriver,
    env: &dyn PortEnvironment,
) -> BridgeResult<TransportBinding> {
    let serial = driver
        .as_serial()
        .ok_or_else(|| BridgeError::UnsupportedTransport(TransportKind::Serial.as_str().into()))?;

    let port_name = config
        .control
        .com_port
        .as_deref()
        .ok_or(BridgeError::MissingParameter("control.com_port"))?;

    let port = env.acquire_com_port(port_name)?;

    // One-shot registration; failure means the device is never constructed.
    if port.needs_registration() {
        port.register().map_err(|e| BridgeError::PortRegistration {
            port: port_name.to_string(),
            reason: e.to_string(),
        })?;
        info!("[{}] registered COM port {}", config.key, port_name);
    }

    let spec = if config.use_config_com_spec {
        let params = config
            .control
            .com_params
            .as_ref()
            .ok_or(BridgeError::MissingParameter("control.com_params"))?;
        debug!("[{}] using COM params from configuration", config.key);
        translate(params)
    } else {
        debug!("[{}] using driver default COM params", config.key);
        serial.com_spec()
    };

    let binding = SerialBinding::new(port, spec);
    binding.apply()?;
    serial.initialize(binding)?;
    info!("[{}] serial transport bound to {}", config.key, port_name);

    Ok(TransportBinding::Serial {
        port: port_name.to_string(),
    })
}

fn init_command_bus(
    config: &DeviceConfig,
    driver: &dyn DisplayDriver,
    env: &dyn PortEnvironment,
) -> BridgeResult<TransportBinding> {
    let cec = driver
        .as_cec()
        .ok_or_else(|| BridgeError::UnsupportedTransport(TransportKind::CommandBus.as_str().into()))?;

    let session = env.acquire_cec_session()?;
    let binding = CecBinding::new(session);
    binding.start()?;
    cec.initialize(binding)?;
    info!("[{}] command-bus transport started", config.key);

    Ok(TransportBinding::CommandBus)
}

// ---------------------------------------------------------------------------
// Real COM port environment (serialport crate)
// ---------------------------------------------------------------------------

/// Port environment backed by real serial devices.
///
/// COM ports open through the `serialport` crate with settings mapped from
/// the driver COM spec. Command-bus sessions are not available on a plain
/// host and are reported as unsupported.
#[cfg(feature = "instrument_serial")]
pub struct SystemPortEnvironment;

#[cfg(feature = "instrument_serial")]
mod system {
    use super::*;
    use crate::comspec::{
        DriverDataBits, DriverHardwareHandshake, DriverParity, DriverSoftwareHandshake,
        DriverStopBits,
    };
    use anyhow::Context;
    use std::sync::Mutex;
    use std::time::Duration;

    struct SystemComPort {
        name: String,
        port: Mutex<Option<Box<dyn serialport::SerialPort>>>,
    }

    fn baud_value(baud: crate::comspec::DriverBaudRate) -> u32 {
        use crate::comspec::DriverBaudRate::*;
        match baud {
            Baud300 => 300,
            Baud600 => 600,
            Baud1200 => 1200,
            Baud1800 => 1800,
            Baud2400 => 2400,
            Baud3600 => 3600,
            Baud7200 => 7200,
            Baud9600 | NotSpecified => 9600,
            Baud14400 => 14_400,
            Baud19200 => 19_200,
            Baud28800 => 28_800,
            Baud38400 => 38_400,
            Baud57600 => 57_600,
            Baud115200 => 115_200,
        }
    }

    impl ComPortHandle for SystemComPort {
        fn name(&self) -> &str {
            &self.name
        }

        fn apply_spec(&self, spec: &DriverComSpec) -> BridgeResult<()> {
            let data_bits = match spec.data_bits {
                DriverDataBits::Seven => serialport::DataBits::Seven,
                DriverDataBits::Eight | DriverDataBits::NotSpecified => serialport::DataBits::Eight,
            };
            let parity = match spec.parity {
                DriverParity::Even => serialport::Parity::Even,
                DriverParity::Odd => serialport::Parity::Odd,
                DriverParity::None | DriverParity::NotSpecified => serialport::Parity::None,
            };
            let stop_bits = match spec.stop_bits {
                DriverStopBits::Two => serialport::StopBits::Two,
                DriverStopBits::One | DriverStopBits::NotSpecified => serialport::StopBits::One,
            };
            let flow_control = match (spec.hardware_handshake, spec.software_handshake) {
                (DriverHardwareHandshake::None | DriverHardwareHandshake::NotSpecified, sw) => {
                    match sw {
                        DriverSoftwareHandshake::None | DriverSoftwareHandshake::NotSpecified => {
                            serialport::FlowControl::None
                        }
                        _ => serialport::FlowControl::Software,
                    }
                }
                _ => serialport::FlowControl::Hardware,
            };

            let port = serialport::new(&self.name, baud_value(spec.baud_rate))
                .data_bits(data_bits)
                .parity(parity)
                .stop_bits(stop_bits)
                .flow_control(flow_control)
                .timeout(Duration::from_millis(100))
                .open()
                .with_context(|| format!("failed to open serial port '{}'", self.name))?;

            let mut guard = self
                .port
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *guard = Some(port);
            Ok(())
        }
    }

    impl PortEnvironment for SystemPortEnvironment {
        fn acquire_com_port(&self, name: &str) -> BridgeResult<Arc<dyn ComPortHandle>> {
            Ok(Arc::new(SystemComPort {
                name: name.to_string(),
                port: Mutex::new(None),
            }))
        }

        fn acquire_cec_session(&self) -> BridgeResult<Arc<dyn CecSession>> {
            Err(BridgeError::UnsupportedTransport(
                TransportKind::CommandBus.as_str().into(),
            ))
        }
    }
}
