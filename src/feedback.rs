//! Lazy read-through feedbacks.
//!
//! A feedback pairs a source closure (always re-reading current driver or
//! monitor state, never caching) with the bus slots it has been bound to.
//! `fire_update` re-evaluates the source and rewrites every bound slot; the
//! broad-invalidation `resync_all` in the bridge is just `fire_update` over
//! the whole set.
//!
//! Binding writes the current value immediately, so a freshly attached bus
//! starts consistent without waiting for the next state change.

use crate::bus::SignalBus;
use std::sync::{Arc, Mutex, PoisonError};

type Sink = (Arc<dyn SignalBus>, u32);

fn lock_sinks(sinks: &Mutex<Vec<Sink>>) -> std::sync::MutexGuard<'_, Vec<Sink>> {
    sinks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Boolean-valued feedback bound to digital slots.
pub struct BoolFeedback {
    name: &'static str,
    source: Arc<dyn Fn() -> bool + Send + Sync>,
    sinks: Mutex<Vec<Sink>>,
}

impl BoolFeedback {
    /// Creates a feedback around a source closure.
    pub fn new<F>(name: &'static str, source: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            source: Arc::new(source),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Feedback name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Re-reads the current value from the source.
    pub fn value(&self) -> bool {
        (self.source)()
    }

    /// Binds this feedback to a slot and writes the current value.
    pub fn link(&self, bus: &Arc<dyn SignalBus>, join: u32) {
        bus.set_digital(join, self.value());
        lock_sinks(&self.sinks).push((Arc::clone(bus), join));
    }

    /// Re-reads the source and rewrites every bound slot.
    pub fn fire_update(&self) {
        let value = self.value();
        for (bus, join) in lock_sinks(&self.sinks).iter() {
            bus.set_digital(*join, value);
        }
    }
}

/// Numeric feedback bound to analog slots.
pub struct IntFeedback {
    name: &'static str,
    source: Arc<dyn Fn() -> u16 + Send + Sync>,
    sinks: Mutex<Vec<Sink>>,
}

impl IntFeedback {
    /// Creates a feedback around a source closure.
    pub fn new<F>(name: &'static str, source: F) -> Self
    where
        F: Fn() -> u16 + Send + Sync + 'static,
    {
        Self {
            name,
            source: Arc::new(source),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Feedback name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Re-reads the current value from the source.
    pub fn value(&self) -> u16 {
        (self.source)()
    }

    /// Binds this feedback to a slot and writes the current value.
    pub fn link(&self, bus: &Arc<dyn SignalBus>, join: u32) {
        bus.set_analog(join, self.value());
        lock_sinks(&self.sinks).push((Arc::clone(bus), join));
    }

    /// Re-reads the source and rewrites every bound slot.
    pub fn fire_update(&self) {
        let value = self.value();
        for (bus, join) in lock_sinks(&self.sinks).iter() {
            bus.set_analog(*join, value);
        }
    }
}

/// String feedback bound to serial slots.
pub struct StringFeedback {
    name: &'static str,
    source: Arc<dyn Fn() -> String + Send + Sync>,
    sinks: Mutex<Vec<Sink>>,
}

impl StringFeedback {
    /// Creates a feedback around a source closure.
    pub fn new<F>(name: &'static str, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            name,
            source: Arc::new(source),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Feedback name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Re-reads the current value from the source.
    pub fn value(&self) -> String {
        (self.source)()
    }

    /// Binds this feedback to a slot and writes the current value.
    pub fn link(&self, bus: &Arc<dyn SignalBus>, join: u32) {
        bus.set_serial(join, &self.value());
        lock_sinks(&self.sinks).push((Arc::clone(bus), join));
    }

    /// Re-reads the source and rewrites every bound slot.
    pub fn fire_update(&self) {
        let value = self.value();
        for (bus, join) in lock_sinks(&self.sinks).iter() {
            bus.set_serial(*join, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockBus;
    use std::sync::atomic::{AtomicU16, Ordering};

    #[test]
    fn link_writes_the_current_value_immediately() {
        let mock = Arc::new(MockBus::new());
        let bus: Arc<dyn SignalBus> = mock.clone();

        let feedback = BoolFeedback::new("connect", || true);
        feedback.link(&bus, 52);
        assert_eq!(mock.digital(52), Some(true));
        assert_eq!(feedback.name(), "connect");
    }

    #[test]
    fn fire_update_rereads_the_source() {
        let level = Arc::new(AtomicU16::new(10));
        let mock = Arc::new(MockBus::new());
        let bus: Arc<dyn SignalBus> = mock.clone();

        let source = level.clone();
        let feedback = IntFeedback::new("volume", move || source.load(Ordering::SeqCst));
        feedback.link(&bus, 5);
        assert_eq!(mock.analog(5), Some(10));

        level.store(42, Ordering::SeqCst);
        feedback.fire_update();
        assert_eq!(mock.analog(5), Some(42));
    }

    #[test]
    fn fire_update_rewrites_every_bound_slot() {
        let first = Arc::new(MockBus::new());
        let second = Arc::new(MockBus::new());
        let bus1: Arc<dyn SignalBus> = first.clone();
        let bus2: Arc<dyn SignalBus> = second.clone();

        let feedback = BoolFeedback::new("power", || true);
        feedback.link(&bus1, 2);
        feedback.link(&bus2, 102);
        first.poison_digital(2, false);
        second.poison_digital(102, false);

        feedback.fire_update();
        assert_eq!(first.digital(2), Some(true));
        assert_eq!(second.digital(102), Some(true));
    }

    #[test]
    fn string_feedback_writes_serial_slots() {
        let mock = Arc::new(MockBus::new());
        let bus: Arc<dyn SignalBus> = mock.clone();
        let feedback = StringFeedback::new("input", || "Hdmi1".to_string());
        feedback.link(&bus, 11);
        assert_eq!(mock.serial(11).as_deref(), Some("Hdmi1"));
    }
}
