//! Serial parameter translation between the control-system schema and the
//! driver schema.
//!
//! The control processor and the device driver each carry their own COM
//! parameter enumerations. They overlap almost completely, but not exactly —
//! the control-system schema has values (mark parity, for one) the driver
//! schema never defined. [`translate`] converts field by field; any source
//! value without a same-meaning counterpart degrades to the driver's
//! `NotSpecified` sentinel for that field only. Translation is total: it can
//! never fail and never blocks device construction.
//!
//! The mapping is kept as data tables rather than match arms so the "no
//! mapping exists" branch is structurally explicit and every pair can be
//! enumerated by the tests below.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Control-system (external) schema
// ---------------------------------------------------------------------------

/// Baud rate as declared by the control-system configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaudRate {
    /// 300 baud.
    Baud300,
    /// 600 baud.
    Baud600,
    /// 1200 baud.
    Baud1200,
    /// 1800 baud.
    Baud1800,
    /// 2400 baud.
    Baud2400,
    /// 3600 baud.
    Baud3600,
    /// 7200 baud.
    Baud7200,
    /// 9600 baud.
    Baud9600,
    /// 14400 baud.
    Baud14400,
    /// 19200 baud.
    Baud19200,
    /// 28800 baud.
    Baud28800,
    /// 38400 baud.
    Baud38400,
    /// 57600 baud.
    Baud57600,
    /// 115200 baud.
    Baud115200,
}

/// Data bits per character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    Eight,
}

/// Hardware (RTS/CTS) handshake mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardwareHandshake {
    /// No hardware handshake.
    None,
    /// RTS only.
    Rts,
    /// CTS only.
    Cts,
    /// RTS and CTS.
    RtsCts,
}

/// Parity mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
    /// Mark parity. The driver schema has no counterpart for this value.
    Mark,
}

/// Electrical protocol of the port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerialProtocol {
    /// RS-232 point to point.
    Rs232,
    /// RS-422 differential.
    Rs422,
    /// RS-485 multidrop.
    Rs485,
}

/// Software (XON/XOFF) handshake mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoftwareHandshake {
    /// No software handshake.
    None,
    /// XON both directions.
    Xon,
    /// XON transmit only.
    Xont,
    /// XON receive only.
    Xonr,
}

/// Stop bits per character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

/// Complete COM parameter set in the control-system schema.
///
/// This is the shape that arrives from device configuration when the
/// integrator overrides the driver's built-in defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComSpec {
    /// Baud rate.
    pub baud_rate: BaudRate,
    /// Data bits.
    pub data_bits: DataBits,
    /// Hardware handshake mode.
    pub hardware_handshake: HardwareHandshake,
    /// Parity mode.
    pub parity: Parity,
    /// Electrical protocol.
    pub protocol: SerialProtocol,
    /// Software handshake mode.
    pub software_handshake: SoftwareHandshake,
    /// Stop bits.
    pub stop_bits: StopBits,
    /// Whether CTS line changes are reported. Passed through untranslated.
    pub report_cts_changes: bool,
}

// ---------------------------------------------------------------------------
// Driver schema (every field carries a NotSpecified sentinel)
// ---------------------------------------------------------------------------

/// Baud rate in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverBaudRate {
    /// No usable mapping from the source value.
    NotSpecified,
    /// 300 baud.
    Baud300,
    /// 600 baud.
    Baud600,
    /// 1200 baud.
    Baud1200,
    /// 1800 baud.
    Baud1800,
    /// 2400 baud.
    Baud2400,
    /// 3600 baud.
    Baud3600,
    /// 7200 baud.
    Baud7200,
    /// 9600 baud.
    Baud9600,
    /// 14400 baud.
    Baud14400,
    /// 19200 baud.
    Baud19200,
    /// 28800 baud.
    Baud28800,
    /// 38400 baud.
    Baud38400,
    /// 57600 baud.
    Baud57600,
    /// 115200 baud.
    Baud115200,
}

/// Data bits in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverDataBits {
    /// No usable mapping from the source value.
    NotSpecified,
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    Eight,
}

/// Hardware handshake in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverHardwareHandshake {
    /// No usable mapping from the source value.
    NotSpecified,
    /// No hardware handshake.
    None,
    /// RTS only.
    Rts,
    /// CTS only.
    Cts,
    /// RTS and CTS.
    RtsCts,
}

/// Parity in the driver schema. There is no mark parity here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverParity {
    /// No usable mapping from the source value.
    NotSpecified,
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Electrical protocol in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverSerialProtocol {
    /// No usable mapping from the source value.
    NotSpecified,
    /// RS-232 point to point.
    Rs232,
    /// RS-422 differential.
    Rs422,
    /// RS-485 multidrop.
    Rs485,
}

/// Software handshake in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverSoftwareHandshake {
    /// No usable mapping from the source value.
    NotSpecified,
    /// No software handshake.
    None,
    /// XON both directions.
    Xon,
    /// XON transmit only.
    Xont,
    /// XON receive only.
    Xonr,
}

/// Stop bits in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverStopBits {
    /// No usable mapping from the source value.
    NotSpecified,
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

/// Complete COM parameter set in the driver schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverComSpec {
    /// Baud rate.
    pub baud_rate: DriverBaudRate,
    /// Data bits.
    pub data_bits: DriverDataBits,
    /// Hardware handshake mode.
    pub hardware_handshake: DriverHardwareHandshake,
    /// Parity mode.
    pub parity: DriverParity,
    /// Electrical protocol.
    pub protocol: DriverSerialProtocol,
    /// Software handshake mode.
    pub software_handshake: DriverSoftwareHandshake,
    /// Stop bits.
    pub stop_bits: DriverStopBits,
    /// Whether CTS line changes are reported.
    pub report_cts_changes: bool,
}

impl DriverComSpec {
    /// A spec with every field set to `NotSpecified` and CTS reporting off.
    ///
    /// This is the starting point of every translation; table hits overwrite
    /// individual fields.
    pub fn unspecified() -> Self {
        Self {
            baud_rate: DriverBaudRate::NotSpecified,
            data_bits: DriverDataBits::NotSpecified,
            hardware_handshake: DriverHardwareHandshake::NotSpecified,
            parity: DriverParity::NotSpecified,
            protocol: DriverSerialProtocol::NotSpecified,
            software_handshake: DriverSoftwareHandshake::NotSpecified,
            stop_bits: DriverStopBits::NotSpecified,
            report_cts_changes: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

/// Baud rate source/target pairs. Every external value maps 1:1.
pub const BAUD_RATE_MAP: &[(BaudRate, DriverBaudRate)] = &[
    (BaudRate::Baud300, DriverBaudRate::Baud300),
    (BaudRate::Baud600, DriverBaudRate::Baud600),
    (BaudRate::Baud1200, DriverBaudRate::Baud1200),
    (BaudRate::Baud1800, DriverBaudRate::Baud1800),
    (BaudRate::Baud2400, DriverBaudRate::Baud2400),
    (BaudRate::Baud3600, DriverBaudRate::Baud3600),
    (BaudRate::Baud7200, DriverBaudRate::Baud7200),
    (BaudRate::Baud9600, DriverBaudRate::Baud9600),
    (BaudRate::Baud14400, DriverBaudRate::Baud14400),
    (BaudRate::Baud19200, DriverBaudRate::Baud19200),
    (BaudRate::Baud28800, DriverBaudRate::Baud28800),
    (BaudRate::Baud38400, DriverBaudRate::Baud38400),
    (BaudRate::Baud57600, DriverBaudRate::Baud57600),
    (BaudRate::Baud115200, DriverBaudRate::Baud115200),
];

/// Data bits source/target pairs.
pub const DATA_BITS_MAP: &[(DataBits, DriverDataBits)] = &[
    (DataBits::Seven, DriverDataBits::Seven),
    (DataBits::Eight, DriverDataBits::Eight),
];

/// Hardware handshake source/target pairs.
pub const HARDWARE_HANDSHAKE_MAP: &[(HardwareHandshake, DriverHardwareHandshake)] = &[
    (HardwareHandshake::None, DriverHardwareHandshake::None),
    (HardwareHandshake::Rts, DriverHardwareHandshake::Rts),
    (HardwareHandshake::Cts, DriverHardwareHandshake::Cts),
    (HardwareHandshake::RtsCts, DriverHardwareHandshake::RtsCts),
];

/// Parity source/target pairs. `Parity::Mark` is deliberately absent: the
/// driver schema never defined mark parity, so it falls through to
/// `NotSpecified`.
pub const PARITY_MAP: &[(Parity, DriverParity)] = &[
    (Parity::None, DriverParity::None),
    (Parity::Even, DriverParity::Even),
    (Parity::Odd, DriverParity::Odd),
];

/// Protocol source/target pairs.
pub const PROTOCOL_MAP: &[(SerialProtocol, DriverSerialProtocol)] = &[
    (SerialProtocol::Rs232, DriverSerialProtocol::Rs232),
    (SerialProtocol::Rs422, DriverSerialProtocol::Rs422),
    (SerialProtocol::Rs485, DriverSerialProtocol::Rs485),
];

/// Software handshake source/target pairs.
pub const SOFTWARE_HANDSHAKE_MAP: &[(SoftwareHandshake, DriverSoftwareHandshake)] = &[
    (SoftwareHandshake::None, DriverSoftwareHandshake::None),
    (SoftwareHandshake::Xon, DriverSoftwareHandshake::Xon),
    (SoftwareHandshake::Xont, DriverSoftwareHandshake::Xont),
    (SoftwareHandshake::Xonr, DriverSoftwareHandshake::Xonr),
];

/// Stop bits source/target pairs.
pub const STOP_BITS_MAP: &[(StopBits, DriverStopBits)] = &[
    (StopBits::One, DriverStopBits::One),
    (StopBits::Two, DriverStopBits::Two),
];

fn lookup<S, T>(table: &[(S, T)], source: S, fallback: T) -> T
where
    S: PartialEq + Copy,
    T: Copy,
{
    table
        .iter()
        .find(|(s, _)| *s == source)
        .map(|(_, t)| *t)
        .unwrap_or(fallback)
}

/// Translates a control-system COM spec into the driver schema.
///
/// Pure and total. Fields with no table entry come out as `NotSpecified`;
/// `report_cts_changes` passes through untouched.
pub fn translate(spec: &ComSpec) -> DriverComSpec {
    let base = DriverComSpec::unspecified();
    DriverComSpec {
        baud_rate: lookup(BAUD_RATE_MAP, spec.baud_rate, base.baud_rate),
        data_bits: lookup(DATA_BITS_MAP, spec.data_bits, base.data_bits),
        hardware_handshake: lookup(
            HARDWARE_HANDSHAKE_MAP,
            spec.hardware_handshake,
            base.hardware_handshake,
        ),
        parity: lookup(PARITY_MAP, spec.parity, base.parity),
        protocol: lookup(PROTOCOL_MAP, spec.protocol, base.protocol),
        software_handshake: lookup(
            SOFTWARE_HANDSHAKE_MAP,
            spec.software_handshake,
            base.software_handshake,
        ),
        stop_bits: lookup(STOP_BITS_MAP, spec.stop_bits, base.stop_bits),
        report_cts_changes: spec.report_cts_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_BAUD_RATES: &[BaudRate] = &[
        BaudRate::Baud300,
        BaudRate::Baud600,
        BaudRate::Baud1200,
        BaudRate::Baud1800,
        BaudRate::Baud2400,
        BaudRate::Baud3600,
        BaudRate::Baud7200,
        BaudRate::Baud9600,
        BaudRate::Baud14400,
        BaudRate::Baud19200,
        BaudRate::Baud28800,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
    ];
    const ALL_DATA_BITS: &[DataBits] = &[DataBits::Seven, DataBits::Eight];
    const ALL_HW_HANDSHAKES: &[HardwareHandshake] = &[
        HardwareHandshake::None,
        HardwareHandshake::Rts,
        HardwareHandshake::Cts,
        HardwareHandshake::RtsCts,
    ];
    const ALL_PARITIES: &[Parity] = &[Parity::None, Parity::Even, Parity::Odd, Parity::Mark];
    const ALL_PROTOCOLS: &[SerialProtocol] = &[
        SerialProtocol::Rs232,
        SerialProtocol::Rs422,
        SerialProtocol::Rs485,
    ];
    const ALL_SW_HANDSHAKES: &[SoftwareHandshake] = &[
        SoftwareHandshake::None,
        SoftwareHandshake::Xon,
        SoftwareHandshake::Xont,
        SoftwareHandshake::Xonr,
    ];
    const ALL_STOP_BITS: &[StopBits] = &[StopBits::One, StopBits::Two];

    fn spec_with_parity(parity: Parity) -> ComSpec {
        ComSpec {
            baud_rate: BaudRate::Baud9600,
            data_bits: DataBits::Eight,
            hardware_handshake: HardwareHandshake::None,
            parity,
            protocol: SerialProtocol::Rs232,
            software_handshake: SoftwareHandshake::None,
            stop_bits: StopBits::One,
            report_cts_changes: false,
        }
    }

    #[test]
    fn every_baud_rate_has_a_direct_mapping() {
        for &baud in ALL_BAUD_RATES {
            let mut spec = spec_with_parity(Parity::None);
            spec.baud_rate = baud;
            let out = translate(&spec);
            assert_ne!(
                out.baud_rate,
                DriverBaudRate::NotSpecified,
                "baud {:?} must map directly",
                baud
            );
        }
    }

    #[test]
    fn translation_is_total_over_the_full_cartesian_schema() {
        // Every combination of source values produces a defined target value
        // for every field; nothing panics, nothing errors.
        for &baud in ALL_BAUD_RATES {
            for &bits in ALL_DATA_BITS {
                for &hw in ALL_HW_HANDSHAKES {
                    for &parity in ALL_PARITIES {
                        for &proto in ALL_PROTOCOLS {
                            for &sw in ALL_SW_HANDSHAKES {
                                for &stop in ALL_STOP_BITS {
                                    let spec = ComSpec {
                                        baud_rate: baud,
                                        data_bits: bits,
                                        hardware_handshake: hw,
                                        parity,
                                        protocol: proto,
                                        software_handshake: sw,
                                        stop_bits: stop,
                                        report_cts_changes: true,
                                    };
                                    let out = translate(&spec);
                                    assert!(out.report_cts_changes);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn mark_parity_degrades_to_not_specified_without_touching_other_fields() {
        let out = translate(&spec_with_parity(Parity::Mark));
        assert_eq!(out.parity, DriverParity::NotSpecified);
        // Every other field still maps 1:1.
        assert_eq!(out.baud_rate, DriverBaudRate::Baud9600);
        assert_eq!(out.data_bits, DriverDataBits::Eight);
        assert_eq!(out.hardware_handshake, DriverHardwareHandshake::None);
        assert_eq!(out.protocol, DriverSerialProtocol::Rs232);
        assert_eq!(out.software_handshake, DriverSoftwareHandshake::None);
        assert_eq!(out.stop_bits, DriverStopBits::One);
    }

    #[test]
    fn supported_parities_map_one_to_one() {
        for (&parity, expected) in [Parity::None, Parity::Even, Parity::Odd].iter().zip([
            DriverParity::None,
            DriverParity::Even,
            DriverParity::Odd,
        ]) {
            assert_eq!(translate(&spec_with_parity(parity)).parity, expected);
        }
    }

    #[test]
    fn cts_reporting_passes_through() {
        let mut spec = spec_with_parity(Parity::None);
        spec.report_cts_changes = true;
        assert!(translate(&spec).report_cts_changes);
        spec.report_cts_changes = false;
        assert!(!translate(&spec).report_cts_changes);
    }
}
