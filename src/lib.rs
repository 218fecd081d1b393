//! Bridge between third-party display drivers and a fixed-width
//! numbered-signal bus.
//!
//! A vendor driver exposes display state (power, volume, mute, input,
//! connectivity) through typed getters and a state-change event stream; a
//! control processor exposes a bus of numbered boolean, numeric, and string
//! slots. This crate adapts one to the other:
//!
//! - [`bridge::BridgeAdapter`] owns one driver, projects its state onto
//!   fixed slots, and turns inbound slot writes into driver commands;
//! - [`monitor::CommunicationMonitor`] stages raw connectivity into an
//!   Ok/Warning/Error health status on configurable thresholds;
//! - [`transport`] selects and initializes the declared transport
//!   (network, serial, or command bus), translating serial parameters
//!   between the configuration schema and the driver schema;
//! - [`routing`] classifies driver input connectors into the bus taxonomy
//!   and raises routing-changed notifications.
//!
//! Drivers are integrated by implementing [`driver::DisplayDriver`] plus
//! whichever transport capability traits apply; [`driver::MockDisplay`] and
//! [`bus::MockBus`] provide in-memory counterparts for tests.

pub mod bridge;
pub mod bus;
pub mod comspec;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod feedback;
pub mod joinmap;
pub mod monitor;
pub mod routing;
pub mod transport;

pub use bridge::BridgeAdapter;
pub use error::{BridgeError, BridgeResult};
