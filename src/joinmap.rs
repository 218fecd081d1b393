//! Fixed slot addressing.
//!
//! Slots are numbered from a per-device join start handed over at bus
//! attach. Offsets are declared once here and never renumbered at runtime;
//! the digital, analog, and serial spaces are independent, so the same
//! offset can appear in all three (the original map reused 52 across all
//! spaces for connect/status/device-name).

/// Absolute slot numbers for one attached device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeJoinMap {
    // -- digital --
    /// Power off command/feedback.
    pub power_off: u32,
    /// Power on command/feedback.
    pub power_on: u32,
    /// Static flag: this is a two-way (feedback-capable) display.
    pub is_two_way_display: u32,
    /// Volume up pulse.
    pub volume_up: u32,
    /// Volume down pulse.
    pub volume_down: u32,
    /// Audio mute on command/feedback.
    pub mute_on: u32,
    /// Audio mute off command.
    pub mute_off: u32,
    /// Connect (held) / disconnect (release) command and feedback.
    pub connect: u32,
    /// Warming-up feedback.
    pub warming: u32,
    /// Cooling-down feedback.
    pub cooling: u32,
    /// Video mute on command and feedback.
    pub video_mute_on: u32,
    /// Video mute off command.
    pub video_mute_off: u32,
    /// Static flag: video-mute feedback is real.
    pub video_mute_supported: u32,
    /// Static flag: lamp-hour counters are real.
    pub lamp_hours_supported: u32,

    // -- analog --
    /// Volume level command/feedback.
    pub volume_level: u32,
    /// Communication status code (health monitor).
    pub status: u32,
    /// First lamp usage counter.
    pub lamp_hours_1: u32,

    // -- serial --
    /// Device name, written once per attach.
    pub device_name: u32,
    /// Fully qualified driver name, written once per attach.
    pub driver_name: u32,
    /// Currently active input name.
    pub current_input: u32,
}

impl BridgeJoinMap {
    /// Computes absolute joins from the attach-time join start.
    pub fn new(join_start: u32) -> Self {
        let offset = join_start.saturating_sub(1);
        Self {
            power_off: offset + 1,
            power_on: offset + 2,
            is_two_way_display: offset + 3,
            volume_up: offset + 5,
            volume_down: offset + 6,
            mute_on: offset + 8,
            mute_off: offset + 9,
            connect: offset + 52,
            warming: offset + 53,
            cooling: offset + 54,
            video_mute_on: offset + 55,
            video_mute_off: offset + 56,
            video_mute_supported: offset + 57,
            lamp_hours_supported: offset + 58,
            volume_level: offset + 5,
            status: offset + 52,
            lamp_hours_1: offset + 53,
            device_name: offset + 52,
            driver_name: offset + 51,
            current_input: offset + 11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_are_relative_to_the_join_start() {
        let map = BridgeJoinMap::new(1);
        assert_eq!(map.connect, 52);
        assert_eq!(map.status, 52);
        assert_eq!(map.device_name, 52);

        let shifted = BridgeJoinMap::new(101);
        assert_eq!(shifted.connect, 152);
        assert_eq!(shifted.power_off, 101);
        assert_eq!(shifted.current_input, 111);
    }
}
