//! Mock display driver.
//!
//! Simulates a vendor driver without hardware: commands mutate in-memory
//! state and emit the same state-change events a real driver would. All
//! three transport capabilities are implemented and record what they were
//! initialized with so tests can assert on the selector's behavior.

use super::{
    CecDevice, DisplayDriver, DriverInfo, InputDetail, InputSourceId, SerialDevice, StateCategory,
    StateEvent, TcpDevice, VideoConnector,
};
use crate::comspec::DriverComSpec;
use crate::error::BridgeResult;
use crate::transport::{CecBinding, SerialBinding};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
struct MockState {
    connected: bool,
    power_is_on: bool,
    warming_up: bool,
    cooling_down: bool,
    muted: bool,
    video_mute: bool,
    volume: u16,
    lamp_hours: Vec<u32>,
    input: Option<InputSourceId>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connected: false,
            power_is_on: false,
            warming_up: false,
            cooling_down: false,
            muted: false,
            video_mute: false,
            volume: 50,
            lamp_hours: vec![0],
            input: None,
        }
    }
}

/// A simulated display for tests and hardware-free development.
pub struct MockDisplay {
    state: Mutex<MockState>,
    id: AtomicU8,
    events: broadcast::Sender<StateEvent>,
    inputs: Vec<InputDetail>,
    default_port: u16,
    supports_disconnect: bool,
    tcp_endpoint: Mutex<Option<(IpAddr, u16)>>,
    serial_binding: Mutex<Option<SerialBinding>>,
    cec_initialized: Mutex<bool>,
    default_com_spec: DriverComSpec,
}

impl MockDisplay {
    /// Creates a mock with two HDMI inputs, one VGA input, and the
    /// customary telnet default port.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(MockState::default()),
            id: AtomicU8::new(0),
            events,
            inputs: vec![
                InputDetail {
                    id: InputSourceId(1),
                    name: "Hdmi1".to_string(),
                    description: "HDMI input 1".to_string(),
                    connector: VideoConnector::Hdmi,
                },
                InputDetail {
                    id: InputSourceId(2),
                    name: "Hdmi2".to_string(),
                    description: "HDMI input 2".to_string(),
                    connector: VideoConnector::Hdmi,
                },
                InputDetail {
                    id: InputSourceId(3),
                    name: "Vga1".to_string(),
                    description: "VGA input".to_string(),
                    connector: VideoConnector::Vga,
                },
            ],
            default_port: 23,
            supports_disconnect: true,
            tcp_endpoint: Mutex::new(None),
            serial_binding: Mutex::new(None),
            cec_initialized: Mutex::new(false),
            default_com_spec: DriverComSpec::unspecified(),
        }
    }

    /// Overrides the declared input list.
    pub fn with_inputs(mut self, inputs: Vec<InputDetail>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Overrides the default TCP port.
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Overrides the driver's built-in COM spec.
    pub fn with_com_spec(mut self, spec: DriverComSpec) -> Self {
        self.default_com_spec = spec;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emits a bare state-change event without mutating state. Lets tests
    /// exercise projection paths (LampHours, Audio, ...) directly.
    pub fn emit(&self, category: StateCategory) {
        let _ = self.events.send(StateEvent::new(category));
    }

    /// Simulates the device dropping the link without a disconnect command.
    pub fn drop_link(&self) {
        self.lock().connected = false;
        self.emit(StateCategory::Connection);
    }

    /// Simulates the device link coming back.
    pub fn restore_link(&self) {
        self.lock().connected = true;
        self.emit(StateCategory::Connection);
    }

    /// Directly seeds driver-side state, bypassing commands. Used by tests
    /// that need slots to go stale relative to the driver.
    pub fn seed_volume(&self, volume: u16) {
        self.lock().volume = volume;
    }

    /// Seeds a lamp-hours counter.
    pub fn seed_lamp_hours(&self, hours: Vec<u32>) {
        self.lock().lamp_hours = hours;
    }

    /// The TCP endpoint the selector initialized, if any.
    pub fn tcp_endpoint(&self) -> Option<(IpAddr, u16)> {
        *self
            .tcp_endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The serial binding the selector handed over, if any.
    pub fn serial_binding(&self) -> Option<SerialBinding> {
        self.serial_binding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the command-bus capability was initialized.
    pub fn cec_initialized(&self) -> bool {
        *self
            .cec_initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDriver for MockDisplay {
    fn info(&self) -> DriverInfo {
        DriverInfo {
            driver_name: "MockDisplayDriver, Version=1.0.0".to_string(),
            base_model: "MOCK-1000".to_string(),
            description: "Simulated two-way display".to_string(),
            driver_version: "1.0.0".to_string(),
            manufacturer: "Acme".to_string(),
            supported_models: vec!["MOCK-1000".to_string(), "MOCK-2000".to_string()],
        }
    }

    fn id(&self) -> u8 {
        self.id.load(Ordering::SeqCst)
    }

    fn set_id(&self, id: u8) {
        self.id.store(id, Ordering::SeqCst);
    }

    fn connected(&self) -> bool {
        self.lock().connected
    }

    fn power_is_on(&self) -> bool {
        self.lock().power_is_on
    }

    fn warming_up(&self) -> bool {
        self.lock().warming_up
    }

    fn cooling_down(&self) -> bool {
        self.lock().cooling_down
    }

    fn muted(&self) -> bool {
        self.lock().muted
    }

    fn video_mute_is_on(&self) -> bool {
        self.lock().video_mute
    }

    fn volume_percent(&self) -> u16 {
        self.lock().volume
    }

    fn lamp_hours(&self) -> Vec<u32> {
        self.lock().lamp_hours.clone()
    }

    fn input_source(&self) -> Option<InputSourceId> {
        self.lock().input
    }

    fn supports_disconnect(&self) -> bool {
        self.supports_disconnect
    }

    fn supports_set_input_source(&self) -> bool {
        !self.inputs.is_empty()
    }

    fn supports_video_mute_feedback(&self) -> bool {
        true
    }

    fn supports_lamp_hours(&self) -> bool {
        true
    }

    fn usable_inputs(&self) -> Vec<InputDetail> {
        self.inputs.clone()
    }

    fn connect(&self) {
        self.lock().connected = true;
        self.emit(StateCategory::Connection);
    }

    fn disconnect(&self) {
        self.lock().connected = false;
        self.emit(StateCategory::Connection);
    }

    fn power_on(&self) {
        {
            let mut state = self.lock();
            state.power_is_on = true;
            state.warming_up = true;
        }
        self.emit(StateCategory::Power);
        self.emit(StateCategory::WarmingUp);
    }

    fn power_off(&self) {
        {
            let mut state = self.lock();
            state.power_is_on = false;
            state.cooling_down = true;
        }
        self.emit(StateCategory::Power);
        self.emit(StateCategory::CoolingDown);
    }

    fn power_toggle(&self) {
        if self.power_is_on() {
            self.power_off();
        } else {
            self.power_on();
        }
    }

    fn set_volume(&self, level: u16) {
        self.lock().volume = level.min(100);
        self.emit(StateCategory::Volume);
    }

    fn volume_up(&self) {
        {
            let mut state = self.lock();
            state.volume = (state.volume + 1).min(100);
        }
        self.emit(StateCategory::Volume);
    }

    fn volume_down(&self) {
        {
            let mut state = self.lock();
            state.volume = state.volume.saturating_sub(1);
        }
        self.emit(StateCategory::Volume);
    }

    fn mute_on(&self) {
        self.lock().muted = true;
        self.emit(StateCategory::Mute);
    }

    fn mute_off(&self) {
        self.lock().muted = false;
        self.emit(StateCategory::Mute);
    }

    fn video_mute_on(&self) {
        self.lock().video_mute = true;
        self.emit(StateCategory::VideoMute);
    }

    fn video_mute_off(&self) {
        self.lock().video_mute = false;
        self.emit(StateCategory::VideoMute);
    }

    fn set_input_source(&self, input: InputSourceId) {
        self.lock().input = Some(input);
        self.emit(StateCategory::Input);
    }

    fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    fn as_tcp(&self) -> Option<&dyn TcpDevice> {
        Some(self)
    }

    fn as_serial(&self) -> Option<&dyn SerialDevice> {
        Some(self)
    }

    fn as_cec(&self) -> Option<&dyn CecDevice> {
        Some(self)
    }
}

impl TcpDevice for MockDisplay {
    fn default_port(&self) -> u16 {
        self.default_port
    }

    fn initialize(&self, address: IpAddr, port: u16) -> BridgeResult<()> {
        let mut guard = self
            .tcp_endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some((address, port));
        Ok(())
    }
}

impl SerialDevice for MockDisplay {
    fn com_spec(&self) -> DriverComSpec {
        self.default_com_spec
    }

    fn initialize(&self, binding: SerialBinding) -> BridgeResult<()> {
        let mut guard = self
            .serial_binding
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(binding);
        Ok(())
    }
}

impl CecDevice for MockDisplay {
    fn initialize(&self, _binding: CecBinding) -> BridgeResult<()> {
        let mut guard = self
            .cec_initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_mutate_state_and_emit_events() {
        let display = MockDisplay::new();
        let mut rx = display.subscribe();

        display.connect();
        assert!(display.connected());
        let event = rx.try_recv().unwrap();
        assert_eq!(event.category, StateCategory::Connection);

        display.set_volume(80);
        assert_eq!(display.volume_percent(), 80);
        assert_eq!(rx.try_recv().unwrap().category, StateCategory::Volume);
    }

    #[test]
    fn volume_clamps_to_percentage_range() {
        let display = MockDisplay::new();
        display.set_volume(400);
        assert_eq!(display.volume_percent(), 100);
        display.seed_volume(0);
        display.volume_down();
        assert_eq!(display.volume_percent(), 0);
    }
}
