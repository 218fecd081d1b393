//! End-to-end adapter behavior against the mock driver and mock bus.

use display_bridge::bridge::BridgeAdapter;
use display_bridge::bus::{MockBus, SignalBus};
use display_bridge::config::DeviceConfig;
use display_bridge::driver::{DisplayDriver, InputSourceId, MockDisplay, StateCategory};
use display_bridge::joinmap::BridgeJoinMap;
use display_bridge::monitor::HealthStatus;
use display_bridge::transport::mock::MockPortEnvironment;
use display_bridge::transport::TransportBinding;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

fn fixture() -> (Arc<MockDisplay>, BridgeAdapter, Arc<MockBus>, Arc<dyn SignalBus>, BridgeJoinMap) {
    let _ = env_logger::builder().is_test(true).try_init();
    let display = Arc::new(MockDisplay::new());
    let config = DeviceConfig::network("display-1", "Conference Projector", 1, "10.0.0.5", 0);
    let adapter = BridgeAdapter::new(config, display.clone());
    let mock = Arc::new(MockBus::new());
    let bus: Arc<dyn SignalBus> = mock.clone();
    (display, adapter, mock, bus, BridgeJoinMap::new(1))
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn link_writes_statics_and_initial_values() {
    let (_display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);

    // Statics.
    assert_eq!(
        mock.serial(map.driver_name).as_deref(),
        Some("MockDisplayDriver, Version=1.0.0")
    );
    assert_eq!(mock.serial(map.device_name).as_deref(), Some("Conference Projector"));
    assert_eq!(mock.digital(map.is_two_way_display), Some(true));
    assert_eq!(mock.digital(map.video_mute_supported), Some(true));
    assert_eq!(mock.digital(map.lamp_hours_supported), Some(true));

    // Feedbacks wrote their current values at bind time.
    assert_eq!(mock.digital(map.connect), Some(false));
    assert_eq!(mock.digital(map.power_on), Some(false));
    assert_eq!(mock.analog(map.volume_level), Some(50));
    assert_eq!(mock.analog(map.status), Some(HealthStatus::Ok.code()));
    assert_eq!(mock.analog(map.lamp_hours_1), Some(0));
    assert_eq!(mock.serial(map.current_input).as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn inbound_slots_drive_the_driver() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;

    mock.pulse_digital(map.power_on, true);
    assert!(display.power_is_on());

    mock.pulse_analog(map.volume_level, 30);
    assert_eq!(display.volume_percent(), 30);

    mock.pulse_digital(map.volume_up, true);
    assert_eq!(display.volume_percent(), 31);
    // The release edge of a pulse is not a command.
    mock.pulse_digital(map.volume_up, false);
    assert_eq!(display.volume_percent(), 31);

    mock.pulse_digital(map.mute_on, true);
    assert!(display.muted());
    mock.pulse_digital(map.mute_off, true);
    assert!(!display.muted());

    mock.pulse_digital(map.video_mute_on, true);
    assert!(display.video_mute_is_on());
    mock.pulse_digital(map.video_mute_off, true);
    assert!(!display.video_mute_is_on());

    // Connect slot: held means connected, released means disconnected.
    mock.pulse_digital(map.connect, false);
    assert!(!display.connected());
    mock.pulse_digital(map.connect, true);
    assert!(display.connected());
}

#[tokio::test(start_paused = true)]
async fn driver_events_project_onto_slots() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;

    display.set_volume(80);
    settle().await;
    assert_eq!(mock.analog(map.volume_level), Some(80));

    display.power_on();
    settle().await;
    assert_eq!(mock.digital(map.power_on), Some(true));
    assert_eq!(mock.digital(map.warming), Some(true));

    display.power_off();
    settle().await;
    assert_eq!(mock.digital(map.power_on), Some(false));
    assert_eq!(mock.digital(map.cooling), Some(true));

    display.mute_on();
    settle().await;
    assert_eq!(mock.digital(map.mute_on), Some(true));

    display.video_mute_on();
    settle().await;
    assert_eq!(mock.digital(map.video_mute_on), Some(true));
}

#[tokio::test(start_paused = true)]
async fn bus_reboot_resyncs_every_slot() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;

    display.seed_volume(72);
    display.seed_lamp_hours(vec![1234]);

    // Slots go stale relative to driver state while the bus is away.
    mock.poison_analog(map.volume_level, 7);
    mock.poison_digital(map.connect, false);
    mock.poison_analog(map.lamp_hours_1, 0);

    mock.set_online(false);
    settle().await;
    mock.set_online(true);
    settle().await;

    assert_eq!(mock.analog(map.volume_level), Some(72));
    assert_eq!(mock.digital(map.connect), Some(true));
    assert_eq!(mock.analog(map.lamp_hours_1), Some(1234));
    // Statics are rewritten too.
    assert_eq!(mock.serial(map.device_name).as_deref(), Some("Conference Projector"));
}

#[tokio::test(start_paused = true)]
async fn input_changes_raise_route_notifications() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;

    let mut routes = adapter.subscribe_route_changes();

    display.set_input_source(InputSourceId(1));
    settle().await;
    let change = routes.try_recv().unwrap();
    assert_eq!(change.port.unwrap().key, "Hdmi1");
    assert_eq!(mock.serial(map.current_input).as_deref(), Some("Hdmi1"));

    // An input identity outside the enumerated set still notifies, with no
    // descriptor attached.
    display.set_input_source(InputSourceId(99));
    settle().await;
    let change = routes.try_recv().unwrap();
    assert!(change.port.is_none());
    assert_eq!(mock.serial(map.current_input).as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn lamp_and_audio_events_do_not_disturb_slots() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;

    display.seed_lamp_hours(vec![500]);
    mock.poison_analog(map.lamp_hours_1, 0);
    display.emit(StateCategory::LampHours);
    display.emit(StateCategory::Audio);
    settle().await;

    // No slot is mapped for these categories yet, so nothing rewrites.
    assert_eq!(mock.analog(map.lamp_hours_1), Some(0));
}

#[tokio::test(start_paused = true)]
async fn health_transitions_project_to_the_status_slot() {
    let display = Arc::new(MockDisplay::new());
    let config = DeviceConfig::network("display-1", "Projector", 1, "10.0.0.5", 0);
    let adapter = BridgeAdapter::with_thresholds(
        config,
        display.clone(),
        Duration::from_secs(1),
        Duration::from_secs(2),
    );
    let mock = Arc::new(MockBus::new());
    let bus: Arc<dyn SignalBus> = mock.clone();
    let map = BridgeJoinMap::new(1);

    adapter.link_to_bus(&bus, 1);
    adapter.activate();
    settle().await;
    assert_eq!(mock.analog(map.status), Some(HealthStatus::Ok.code()));

    display.drop_link();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(adapter.health_status(), HealthStatus::Warning);
    assert_eq!(mock.analog(map.status), Some(HealthStatus::Warning.code()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(mock.analog(map.status), Some(HealthStatus::Error.code()));

    display.restore_link();
    settle().await;
    assert_eq!(mock.analog(map.status), Some(HealthStatus::Ok.code()));
}

#[tokio::test(start_paused = true)]
async fn activation_is_idempotent_across_cycles() {
    let (display, adapter, mock, bus, map) = fixture();
    adapter.link_to_bus(&bus, 1);

    assert!(adapter.activate());
    assert!(adapter.activate());
    assert!(adapter.is_active());
    settle().await;

    // Exactly one handler per inbound slot regardless of activation count;
    // handlers come from the single link call.
    assert_eq!(mock.digital_action_count(map.power_on), 1);

    assert!(adapter.deactivate());
    assert!(adapter.deactivate());
    assert!(!adapter.is_active());
    settle().await;

    // Projection is down: driver changes no longer reach the bus.
    mock.poison_analog(map.volume_level, 7);
    display.set_volume(90);
    settle().await;
    assert_eq!(mock.analog(map.volume_level), Some(7));

    // A fresh activation reconnects and resynchronizes.
    assert!(adapter.activate());
    settle().await;
    assert_eq!(mock.analog(map.volume_level), Some(90));
    assert_eq!(mock.digital(map.connect), Some(true));
}

#[tokio::test(start_paused = true)]
async fn command_surface_drives_the_driver() {
    let (display, adapter, _mock, bus, _map) = fixture();
    adapter.link_to_bus(&bus, 1);

    adapter.power_on();
    assert!(display.power_is_on());
    adapter.power_toggle();
    assert!(!display.power_is_on());

    adapter.set_volume(42);
    assert_eq!(display.volume_percent(), 42);
    adapter.volume_down();
    assert_eq!(display.volume_percent(), 41);

    // Toggle tracks actual mute state in both directions.
    adapter.mute_toggle();
    assert!(display.muted());
    adapter.mute_toggle();
    assert!(!display.muted());

    let ports = adapter.input_ports();
    assert_eq!(ports.len(), 3);
    adapter.execute_switch(&ports[1]);
    assert_eq!(display.input_source(), Some(InputSourceId(2)));
}

#[tokio::test(start_paused = true)]
async fn init_transport_records_the_binding() {
    let (display, adapter, _mock, _bus, _map) = fixture();
    let env = MockPortEnvironment::new();

    assert!(adapter.transport_binding().is_none());
    let binding = adapter.init_transport(&env).unwrap();
    assert_eq!(
        binding,
        TransportBinding::Network {
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 23,
        }
    );
    assert_eq!(adapter.transport_binding(), Some(binding));
    assert!(display.tcp_endpoint().is_some());
}

#[tokio::test(start_paused = true)]
async fn construction_assigns_the_driver_identity() {
    let display = Arc::new(MockDisplay::new());
    let config = DeviceConfig::network("display-7", "Projector", 7, "10.0.0.5", 0);
    let adapter = BridgeAdapter::new(config, display.clone());
    assert_eq!(display.id(), 7);
    assert_eq!(adapter.key(), "display-7");
    assert_eq!(adapter.name(), "Projector");
}
