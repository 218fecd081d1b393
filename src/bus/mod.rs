//! The signal bus seam.
//!
//! The control processor exposes a fixed-width, numbered-signal bus:
//! boolean ("digital"), numeric ("analog"), and string ("serial") slots
//! addressed by stable offsets. The bridge writes slot values, registers
//! inbound actions for the few slots it consumes, and watches the bus's
//! online state so it can resynchronize after the bus reboots.
//!
//! The bus is externally owned and shared by many devices concurrently —
//! the bridge never assumes exclusive access.

pub mod mock;

pub use mock::MockBus;

use tokio::sync::watch;

/// Handler invoked when the control processor writes a boolean slot.
pub type DigitalAction = Box<dyn Fn(bool) + Send + Sync>;

/// Handler invoked when the control processor writes a numeric slot.
pub type AnalogAction = Box<dyn Fn(u16) + Send + Sync>;

/// Addressable slot interface of the external control-processor link.
///
/// Slot writes must be cheap and non-blocking: they are invoked from event
/// handlers that may run on the driver's notification context.
pub trait SignalBus: Send + Sync {
    /// Writes a boolean slot.
    fn set_digital(&self, join: u32, value: bool);

    /// Writes a numeric slot.
    fn set_analog(&self, join: u32, value: u16);

    /// Writes a string slot.
    fn set_serial(&self, join: u32, value: &str);

    /// Registers a handler for inbound writes to a boolean slot.
    fn set_digital_action(&self, join: u32, action: DigitalAction);

    /// Registers a handler for inbound writes to a numeric slot.
    fn set_analog_action(&self, join: u32, action: AnalogAction);

    /// Whether the bus is currently online.
    fn is_online(&self) -> bool;

    /// Watches online/offline transitions. The receiver has already
    /// observed the current value; `changed()` resolves on the next
    /// transition.
    fn online_events(&self) -> watch::Receiver<bool>;
}
