//! Input routing descriptors.
//!
//! The driver describes its inputs in its own connector taxonomy; the bus
//! has a different one. [`classify`] maps between them with an exhaustive
//! match over the closed connector enum — connectors without a specific bus
//! counterpart classify as the generic backplane-only, audio-video pair
//! rather than failing.

use crate::driver::{InputSourceId, VideoConnector};
use serde::{Deserialize, Serialize};

/// Bus-side connector classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortConnectionType {
    /// HDMI.
    Hdmi,
    /// DVI.
    Dvi,
    /// Twisted-pair media (HDBaseT class).
    DmCat,
    /// Not routable outside the device.
    BackplaneOnly,
    /// Component video.
    Component,
    /// Composite video.
    Composite,
    /// DisplayPort.
    DisplayPort,
    /// Network stream.
    Streaming,
    /// VGA.
    Vga,
}

/// Bus-side signal classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Combined audio and video.
    AudioVideo,
    /// Video only.
    Video,
    /// USB data output.
    UsbOutput,
}

/// Maps a driver connector onto the bus taxonomy.
pub fn classify(connector: VideoConnector) -> (PortConnectionType, SignalKind) {
    match connector {
        VideoConnector::Hdmi => (PortConnectionType::Hdmi, SignalKind::AudioVideo),
        VideoConnector::Dvi => (PortConnectionType::Dvi, SignalKind::Video),
        VideoConnector::HdBaseT => (PortConnectionType::DmCat, SignalKind::AudioVideo),
        VideoConnector::Component => (PortConnectionType::Component, SignalKind::AudioVideo),
        VideoConnector::Composite => (PortConnectionType::Composite, SignalKind::AudioVideo),
        VideoConnector::DisplayPort => (PortConnectionType::DisplayPort, SignalKind::AudioVideo),
        VideoConnector::Network => (PortConnectionType::Streaming, SignalKind::AudioVideo),
        VideoConnector::Usb => (PortConnectionType::DmCat, SignalKind::UsbOutput),
        VideoConnector::Vga => (PortConnectionType::Vga, SignalKind::Video),
        VideoConnector::GenericVideo => (PortConnectionType::BackplaneOnly, SignalKind::Video),
        // Everything without a specific bus counterpart routes as generic
        // backplane-only audio-video.
        VideoConnector::Antenna
        | VideoConnector::GenericAv
        | VideoConnector::Other
        | VideoConnector::SVideo
        | VideoConnector::Universal
        | VideoConnector::Unknown => (PortConnectionType::BackplaneOnly, SignalKind::AudioVideo),
    }
}

/// One selectable input as exposed to the bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingInputPort {
    /// Stable key, taken from the driver's input name.
    pub key: String,
    /// Bus-side signal classification.
    pub signal_kind: SignalKind,
    /// Bus-side connector classification.
    pub connection_type: PortConnectionType,
    /// Opaque token matched against the driver's reported active input.
    pub match_token: InputSourceId,
}

/// Routing-changed notification raised on every input change.
///
/// `port` is `None` when the driver reported an input identity absent from
/// the enumerated input set — observable "unknown input", not an error.
#[derive(Clone, Debug)]
pub struct RouteChange {
    /// The descriptor of the newly active input, if it matched.
    pub port: Option<RoutingInputPort>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_connectors_map_one_to_one() {
        assert_eq!(
            classify(VideoConnector::Hdmi),
            (PortConnectionType::Hdmi, SignalKind::AudioVideo)
        );
        assert_eq!(
            classify(VideoConnector::Dvi),
            (PortConnectionType::Dvi, SignalKind::Video)
        );
        assert_eq!(
            classify(VideoConnector::Usb),
            (PortConnectionType::DmCat, SignalKind::UsbOutput)
        );
        assert_eq!(
            classify(VideoConnector::Vga),
            (PortConnectionType::Vga, SignalKind::Video)
        );
    }

    #[test]
    fn unrecognized_connectors_fall_back_to_backplane_audio_video() {
        for connector in [
            VideoConnector::Antenna,
            VideoConnector::GenericAv,
            VideoConnector::Other,
            VideoConnector::SVideo,
            VideoConnector::Universal,
            VideoConnector::Unknown,
        ] {
            assert_eq!(
                classify(connector),
                (PortConnectionType::BackplaneOnly, SignalKind::AudioVideo),
                "connector {:?}",
                connector
            );
        }
    }

    #[test]
    fn generic_video_keeps_video_only_signal_kind() {
        assert_eq!(
            classify(VideoConnector::GenericVideo),
            (PortConnectionType::BackplaneOnly, SignalKind::Video)
        );
    }
}
