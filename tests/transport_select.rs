//! Transport selection against the mock port environment.

use display_bridge::comspec::{
    self, BaudRate, ComSpec, DataBits, DriverBaudRate, HardwareHandshake, Parity, SerialProtocol,
    SoftwareHandshake, StopBits,
};
use display_bridge::config::DeviceConfig;
use display_bridge::driver::MockDisplay;
use display_bridge::error::BridgeError;
use display_bridge::transport::mock::{MockComPort, MockPortEnvironment};
use display_bridge::transport::{self, TransportBinding};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

fn nine_six_console() -> ComSpec {
    ComSpec {
        baud_rate: BaudRate::Baud9600,
        data_bits: DataBits::Eight,
        hardware_handshake: HardwareHandshake::None,
        parity: Parity::None,
        protocol: SerialProtocol::Rs232,
        software_handshake: SoftwareHandshake::None,
        stop_bits: StopBits::One,
        report_cts_changes: false,
    }
}

#[test]
fn network_without_explicit_port_uses_the_driver_default() {
    let driver = MockDisplay::new().with_default_port(4352);
    let env = MockPortEnvironment::new();
    let config = DeviceConfig::network("display-1", "Projector", 1, "10.0.0.5", 0);

    let binding = transport::select(&config, &driver, &env).unwrap();
    assert_eq!(
        binding,
        TransportBinding::Network {
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 4352,
        }
    );
    assert_eq!(
        driver.tcp_endpoint(),
        Some((IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 4352))
    );
}

#[test]
fn explicit_network_port_wins_over_the_driver_default() {
    let driver = MockDisplay::new().with_default_port(23);
    let env = MockPortEnvironment::new();
    let config = DeviceConfig::network("display-1", "Projector", 1, "10.0.0.5", 10_023);

    let binding = transport::select(&config, &driver, &env).unwrap();
    assert_eq!(
        binding,
        TransportBinding::Network {
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 10_023,
        }
    );
}

#[test]
fn unparsable_address_fails_initialization() {
    let driver = MockDisplay::new();
    let env = MockPortEnvironment::new();
    let config = DeviceConfig::network("display-1", "Projector", 1, "not-an-address", 0);

    let err = transport::select(&config, &driver, &env).unwrap_err();
    assert!(matches!(err, BridgeError::TransportInit(_)), "{err:?}");
    assert!(driver.tcp_endpoint().is_none());
}

#[test]
fn serial_registers_owned_ports_once() {
    let driver = MockDisplay::new();
    let port = Arc::new(MockComPort::new("COM3").requiring_registration());
    let env = MockPortEnvironment::new().with_port(port.clone());
    let config = DeviceConfig::serial("display-1", "Projector", 1, "COM3");

    let binding = transport::select(&config, &driver, &env).unwrap();
    assert_eq!(
        binding,
        TransportBinding::Serial {
            port: "COM3".to_string(),
        }
    );
    assert!(port.is_registered());
    assert_eq!(driver.serial_binding().unwrap().port_name(), "COM3");
}

#[test]
fn serial_registration_failure_is_fatal() {
    let driver = MockDisplay::new();
    let port = Arc::new(MockComPort::new("COM3").failing_registration());
    let env = MockPortEnvironment::new().with_port(port.clone());
    let config = DeviceConfig::serial("display-1", "Projector", 1, "COM3");

    let err = transport::select(&config, &driver, &env).unwrap_err();
    assert!(
        matches!(err, BridgeError::PortRegistration { ref port, .. } if port == "COM3"),
        "{err:?}"
    );
    // The driver never sees a binding for a port that failed to register.
    assert!(driver.serial_binding().is_none());
    assert!(port.applied_spec().is_none());
}

#[test]
fn serial_uses_the_driver_spec_unless_the_config_overrides_it() {
    let mut driver_spec = comspec::DriverComSpec::unspecified();
    driver_spec.baud_rate = DriverBaudRate::Baud19200;
    let driver = MockDisplay::new().with_com_spec(driver_spec);

    let port = Arc::new(MockComPort::new("COM3"));
    let env = MockPortEnvironment::new().with_port(port.clone());
    let config = DeviceConfig::serial("display-1", "Projector", 1, "COM3");

    transport::select(&config, &driver, &env).unwrap();
    assert_eq!(port.applied_spec().unwrap().baud_rate, DriverBaudRate::Baud19200);
}

#[test]
fn config_com_spec_overrides_the_driver_spec_when_requested() {
    let mut driver_spec = comspec::DriverComSpec::unspecified();
    driver_spec.baud_rate = DriverBaudRate::Baud19200;
    let driver = MockDisplay::new().with_com_spec(driver_spec);

    let port = Arc::new(MockComPort::new("COM3"));
    let env = MockPortEnvironment::new().with_port(port.clone());
    let mut config = DeviceConfig::serial("display-1", "Projector", 1, "COM3");
    config.use_config_com_spec = true;
    config.control.com_params = Some(nine_six_console());

    transport::select(&config, &driver, &env).unwrap();
    let applied = port.applied_spec().unwrap();
    assert_eq!(applied, comspec::translate(&nine_six_console()));
    assert_eq!(applied.baud_rate, DriverBaudRate::Baud9600);
}

#[test]
fn config_com_spec_flag_without_params_is_a_missing_parameter() {
    let driver = MockDisplay::new();
    let env = MockPortEnvironment::new();
    let mut config = DeviceConfig::serial("display-1", "Projector", 1, "COM3");
    config.use_config_com_spec = true;

    let err = transport::select(&config, &driver, &env).unwrap_err();
    assert!(
        matches!(err, BridgeError::MissingParameter("control.com_params")),
        "{err:?}"
    );
}

#[test]
fn command_bus_starts_the_session_before_the_driver_sees_it() {
    let driver = MockDisplay::new();
    let env = MockPortEnvironment::new();
    let config = DeviceConfig::command_bus("display-1", "Projector", 1);

    let binding = transport::select(&config, &driver, &env).unwrap();
    assert_eq!(binding, TransportBinding::CommandBus);
    assert!(env.cec_session().is_started());
    assert!(driver.cec_initialized());
}
