//! The display driver seam.
//!
//! The bridge never talks to hardware itself — a vendor-supplied driver does.
//! This module defines the narrow contract the bridge requires of any such
//! driver: live state getters, command methods, static metadata, and a
//! state-change event stream with a closed set of categories.
//!
//! The vendor's callback registration model is re-expressed here as a typed
//! broadcast stream of [`StateEvent`]s so the adapter can pattern-match
//! categories exhaustively instead of relying on an open switch with a
//! silent default.
//!
//! Transport capabilities are modeled the way instrument capabilities are
//! layered elsewhere in the ecosystem: a driver that can be reached over TCP
//! also implements [`TcpDevice`] and exposes it through
//! [`DisplayDriver::as_tcp`]; likewise for serial and command-bus devices.

pub mod mock;

pub use mock::MockDisplay;

use crate::comspec::DriverComSpec;
use crate::error::BridgeResult;
use crate::transport::{CecBinding, SerialBinding};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tokio::sync::broadcast;

/// State categories reported by the driver's event stream.
///
/// This is a closed enum: projection code matches it exhaustively, so a new
/// category is a compile error at every handler rather than a silently
/// ignored tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateCategory {
    /// Connectivity to the physical device changed.
    Connection,
    /// Power state changed.
    Power,
    /// The device finished powering on.
    PoweredOn,
    /// The device finished powering off.
    PoweredOff,
    /// The device started warming up.
    WarmingUp,
    /// The device finished warming up.
    WarmedUp,
    /// The device started cooling down.
    CoolingDown,
    /// The device finished cooling down.
    CooledDown,
    /// Video mute state changed.
    VideoMute,
    /// Audio mute state changed.
    Mute,
    /// Volume level changed.
    Volume,
    /// Active input changed.
    Input,
    /// Lamp usage counters changed.
    LampHours,
    /// Audio routing/level metadata changed.
    Audio,
}

/// One state-change notification from the driver.
#[derive(Clone, Copy, Debug)]
pub struct StateEvent {
    /// Which state category changed.
    pub category: StateCategory,
}

impl StateEvent {
    /// Creates an event for the given category.
    pub fn new(category: StateCategory) -> Self {
        Self { category }
    }
}

/// Opaque identity of one selectable input on the device.
///
/// Used as the match token between the driver's reported active input and
/// the routing descriptors the bridge enumerates at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSourceId(pub u16);

/// Physical connector taxonomy of the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoConnector {
    /// HDMI.
    Hdmi,
    /// DVI.
    Dvi,
    /// HDBaseT over twisted pair.
    HdBaseT,
    /// RF antenna / tuner.
    Antenna,
    /// Component video.
    Component,
    /// Composite video.
    Composite,
    /// DisplayPort.
    DisplayPort,
    /// Generic audio/video input.
    GenericAv,
    /// Generic video-only input.
    GenericVideo,
    /// Network stream.
    Network,
    /// Vendor-specific connector.
    Other,
    /// S-Video.
    SVideo,
    /// Universal (auto-sensing) connector.
    Universal,
    /// Connector type not reported by the driver.
    Unknown,
    /// USB input.
    Usb,
    /// VGA.
    Vga,
}

/// One usable input as declared by the driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputDetail {
    /// Match token for routing notifications.
    pub id: InputSourceId,
    /// Short name (e.g. "Hdmi1").
    pub name: String,
    /// Free-form description from the driver metadata.
    pub description: String,
    /// Physical connector type.
    pub connector: VideoConnector,
}

/// Static descriptive metadata about the loaded driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Fully qualified driver name, written once to the bus.
    pub driver_name: String,
    /// Base model the driver was written against.
    pub base_model: String,
    /// Driver description.
    pub description: String,
    /// Driver version string.
    pub driver_version: String,
    /// Manufacturer of the device.
    pub manufacturer: String,
    /// Models this driver claims to support.
    pub supported_models: Vec<String>,
}

/// TCP transport capability of a driver.
pub trait TcpDevice: Send + Sync {
    /// Default TCP port when the configuration does not specify one.
    fn default_port(&self) -> u16;

    /// Binds the driver to the given address and port and opens the socket.
    fn initialize(&self, address: IpAddr, port: u16) -> BridgeResult<()>;
}

/// Serial transport capability of a driver.
pub trait SerialDevice: Send + Sync {
    /// The driver's built-in COM spec, used unless the configuration
    /// overrides it.
    fn com_spec(&self) -> DriverComSpec;

    /// Hands an opened serial binding to the driver.
    fn initialize(&self, binding: SerialBinding) -> BridgeResult<()>;
}

/// Command-bus (CEC) transport capability of a driver.
pub trait CecDevice: Send + Sync {
    /// Hands a started command-bus session to the driver.
    fn initialize(&self, binding: CecBinding) -> BridgeResult<()>;
}

/// Narrow contract of a vendor display driver.
///
/// All state getters are cheap property reads; all command methods are
/// fire-and-forget (the driver performs the actual I/O on its own context
/// and reports the outcome through the event stream). The bridge only ever
/// mutates driver state through the command methods.
pub trait DisplayDriver: Send + Sync {
    /// Static metadata about the driver.
    fn info(&self) -> DriverInfo;

    /// Driver-specific numeric identity.
    fn id(&self) -> u8;

    /// Assigns the numeric identity. Must happen before transport init.
    fn set_id(&self, id: u8);

    /// True while the driver has a live session with the device.
    fn connected(&self) -> bool;

    /// True while the display is powered on.
    fn power_is_on(&self) -> bool;

    /// True while the display is warming up.
    fn warming_up(&self) -> bool;

    /// True while the display is cooling down.
    fn cooling_down(&self) -> bool;

    /// True while audio is muted.
    fn muted(&self) -> bool;

    /// True while video is muted.
    fn video_mute_is_on(&self) -> bool;

    /// Current volume as a percentage (0-100).
    fn volume_percent(&self) -> u16;

    /// Lamp usage counters, one entry per lamp. May be empty.
    fn lamp_hours(&self) -> Vec<u32>;

    /// Currently active input, if the driver knows it.
    fn input_source(&self) -> Option<InputSourceId>;

    /// Whether the driver supports an explicit disconnect command.
    fn supports_disconnect(&self) -> bool;

    /// Whether the driver supports selecting inputs.
    fn supports_set_input_source(&self) -> bool;

    /// Whether video-mute feedback is real (vs. always false).
    fn supports_video_mute_feedback(&self) -> bool;

    /// Whether lamp-hour counters are real.
    fn supports_lamp_hours(&self) -> bool;

    /// Inputs the device can actually switch to.
    fn usable_inputs(&self) -> Vec<InputDetail>;

    /// Opens the device session.
    fn connect(&self);

    /// Closes the device session (only meaningful when
    /// [`supports_disconnect`](Self::supports_disconnect) is true).
    fn disconnect(&self);

    /// Powers the display on.
    fn power_on(&self);

    /// Powers the display off.
    fn power_off(&self);

    /// Toggles display power.
    fn power_toggle(&self);

    /// Sets the volume percentage.
    fn set_volume(&self, level: u16);

    /// Nudges the volume up one step.
    fn volume_up(&self);

    /// Nudges the volume down one step.
    fn volume_down(&self);

    /// Mutes audio.
    fn mute_on(&self);

    /// Unmutes audio.
    fn mute_off(&self);

    /// Mutes video.
    fn video_mute_on(&self);

    /// Unmutes video.
    fn video_mute_off(&self);

    /// Switches to the given input.
    fn set_input_source(&self, input: InputSourceId);

    /// Subscribes to the state-change event stream.
    ///
    /// Every subscription is independent; dropping the receiver
    /// unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<StateEvent>;

    /// TCP capability, if this driver can be reached over the network.
    fn as_tcp(&self) -> Option<&dyn TcpDevice> {
        None
    }

    /// Serial capability, if this driver can be reached over a COM port.
    fn as_serial(&self) -> Option<&dyn SerialDevice> {
        None
    }

    /// Command-bus capability, if this driver can be reached over CEC.
    fn as_cec(&self) -> Option<&dyn CecDevice> {
        None
    }
}
