//! Mock signal bus.
//!
//! Records every slot write so tests can assert on projected values, lets
//! tests pulse inbound slots, and drives the online watch channel directly.

use super::{AnalogAction, DigitalAction, SignalBus};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// In-memory signal bus for tests.
pub struct MockBus {
    digitals: Mutex<HashMap<u32, bool>>,
    analogs: Mutex<HashMap<u32, u16>>,
    serials: Mutex<HashMap<u32, String>>,
    digital_actions: Mutex<HashMap<u32, Vec<DigitalAction>>>,
    analog_actions: Mutex<HashMap<u32, Vec<AnalogAction>>>,
    online_tx: watch::Sender<bool>,
}

impl MockBus {
    /// Creates a bus that starts online.
    pub fn new() -> Self {
        Self::with_online(true)
    }

    /// Creates a bus in the given initial online state.
    pub fn with_online(online: bool) -> Self {
        let (online_tx, _) = watch::channel(online);
        Self {
            digitals: Mutex::new(HashMap::new()),
            analogs: Mutex::new(HashMap::new()),
            serials: Mutex::new(HashMap::new()),
            digital_actions: Mutex::new(HashMap::new()),
            analog_actions: Mutex::new(HashMap::new()),
            online_tx,
        }
    }

    /// Flips the bus online state, notifying watchers.
    pub fn set_online(&self, online: bool) {
        self.online_tx.send_replace(online);
    }

    /// Last value written to a boolean slot.
    pub fn digital(&self, join: u32) -> Option<bool> {
        self.digitals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&join)
            .copied()
    }

    /// Last value written to a numeric slot.
    pub fn analog(&self, join: u32) -> Option<u16> {
        self.analogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&join)
            .copied()
    }

    /// Last value written to a string slot.
    pub fn serial(&self, join: u32) -> Option<String> {
        self.serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&join)
            .cloned()
    }

    /// Overwrites a stored slot value without going through the bridge.
    /// Lets tests make slots stale relative to driver state.
    pub fn poison_digital(&self, join: u32, value: bool) {
        self.digitals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(join, value);
    }

    /// Overwrites a stored numeric slot value.
    pub fn poison_analog(&self, join: u32, value: u16) {
        self.analogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(join, value);
    }

    /// Simulates the control processor writing a boolean slot.
    pub fn pulse_digital(&self, join: u32, value: bool) {
        let actions = self
            .digital_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = actions.get(&join) {
            for handler in handlers {
                handler(value);
            }
        }
    }

    /// Simulates the control processor writing a numeric slot.
    pub fn pulse_analog(&self, join: u32, value: u16) {
        let actions = self
            .analog_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = actions.get(&join) {
            for handler in handlers {
                handler(value);
            }
        }
    }

    /// Number of handlers registered on a boolean slot.
    pub fn digital_action_count(&self, join: u32) -> usize {
        self.digital_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&join)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus for MockBus {
    fn set_digital(&self, join: u32, value: bool) {
        self.digitals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(join, value);
    }

    fn set_analog(&self, join: u32, value: u16) {
        self.analogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(join, value);
    }

    fn set_serial(&self, join: u32, value: &str) {
        self.serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(join, value.to_string());
    }

    fn set_digital_action(&self, join: u32, action: DigitalAction) {
        self.digital_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(join)
            .or_default()
            .push(action);
    }

    fn set_analog_action(&self, join: u32, action: AnalogAction) {
        self.analog_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(join)
            .or_default()
            .push(action);
    }

    fn is_online(&self) -> bool {
        *self.online_tx.borrow()
    }

    fn online_events(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_per_slot() {
        let bus = MockBus::new();
        bus.set_digital(52, true);
        bus.set_analog(52, 2);
        bus.set_serial(52, "Projector");
        assert_eq!(bus.digital(52), Some(true));
        assert_eq!(bus.analog(52), Some(2));
        assert_eq!(bus.serial(52).as_deref(), Some("Projector"));
    }

    #[test]
    fn pulse_invokes_every_registered_handler() {
        let bus = MockBus::new();
        let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            bus.set_digital_action(
                7,
                Box::new(move |value| {
                    if value {
                        hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    }
                }),
            );
        }
        bus.pulse_digital(7, true);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
