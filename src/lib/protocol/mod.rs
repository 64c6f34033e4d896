pub mod checksum;
pub mod frame;

use std::{fmt::Display, io, str::FromStr};

use num_derive::FromPrimitive;
use thiserror::Error;

use crate::types::TransmissionState;

pub use checksum::crc16;
pub use frame::{InputFrame, OutputFrame};

/// Seconds between the unix epoch and the inverter firmware epoch
/// (2000-01-01 06:00:00 UTC).
pub const INVERTER_EPOCH_OFFSET: i64 = 946_706_400;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("CRC Failure")]
    CrcFailure,
    #[error("{0}")]
    Transmission(TransmissionState),
    #[error("response too short: need {expected} bytes, got {available}")]
    Decode { expected: usize, available: usize },
    #[error("time {0} is outside the inverter clock range")]
    TimeOutOfRange(i64),
}

impl ProtocolError {
    /// Whether repeating the whole exchange may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProtocolError::CrcFailure => true,
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof | io::ErrorKind::WouldBlock
            ),
            ProtocolError::Transmission(state) => matches!(
                *state,
                TransmissionState::MICRO_ERROR
                    | TransmissionState::NOT_EXECUTED
                    | TransmissionState::VARIABLE_NOT_AVAILABLE
            ),
            ProtocolError::Decode { .. } | ProtocolError::TimeOutOfRange(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Command codes understood by the inverter. Gaps in the numbering are
/// reserved by the vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Command {
    GetState = 50,
    GetPartNumber = 52,
    GetVersion = 58,
    GetDSP = 59,
    GetSerialNumber = 63,
    GetManufacturingDate = 65,
    GetTime = 70,
    SetTime = 71,
    GetFirmwareVersion = 72,
    GetLast10SecEnergy = 76,
    GetConfiguration = 77,
    GetCumulatedEnergy = 78,
    GetCounters = 80,
    GetLast4Alarms = 86,
}

impl Command {
    /// Commands answering with six bytes of ASCII and no transmission state.
    pub fn is_ascii(self) -> bool {
        matches!(self, Command::GetPartNumber | Command::GetSerialNumber)
    }

    /// Where the command specific data starts in a response payload.
    pub fn payload_offset(self) -> usize {
        match self {
            Command::GetPartNumber | Command::GetSerialNumber => 0,
            Command::GetState => 1,
            _ => 2,
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for super::Counter {}
    impl Sealed for super::CumulationPeriod {}
    impl Sealed for super::DSParameter {}
}

/// A value occupying exactly one argument byte of a request.
pub trait Argument: sealed::Sealed {
    fn byte(&self) -> u8;
}

impl Argument for u8 {
    fn byte(&self) -> u8 {
        *self
    }
}

impl Argument for Counter {
    fn byte(&self) -> u8 {
        *self as u8
    }
}

impl Argument for CumulationPeriod {
    fn byte(&self) -> u8 {
        *self as u8
    }
}

impl Argument for DSParameter {
    fn byte(&self) -> u8 {
        *self as u8
    }
}

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("invalid cumulation period '{0}'")]
    BadPeriod(String),
    #[error("invalid counter '{0}'")]
    BadCounter(String),
}

/// Run time counters selectable with [`Command::GetCounters`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Counter {
    Total = 0,
    Partial = 1,
    Grid = 2,
    Reset = 3,
}

impl Counter {
    pub const ALL: [Counter; 4] = [Counter::Total, Counter::Partial, Counter::Grid, Counter::Reset];
}

impl Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Counter::Total => "total".fmt(f),
            Counter::Partial => "partial".fmt(f),
            Counter::Grid => "grid".fmt(f),
            Counter::Reset => "reset".fmt(f),
        }
    }
}

impl FromStr for Counter {
    type Err = SelectorError;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "total" => Ok(Counter::Total),
            "partial" => Ok(Counter::Partial),
            "grid" => Ok(Counter::Grid),
            "reset" => Ok(Counter::Reset),
            _ => Err(SelectorError::BadCounter(input.to_string())),
        }
    }
}

/// Energy aggregation windows selectable with [`Command::GetCumulatedEnergy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum CumulationPeriod {
    Daily = 0,
    Weekly = 1,
    Monthly = 3,
    Yearly = 4,
    Total = 5,
    Partial = 6,
}

impl CumulationPeriod {
    pub const ALL: [CumulationPeriod; 6] = [
        CumulationPeriod::Daily,
        CumulationPeriod::Weekly,
        CumulationPeriod::Monthly,
        CumulationPeriod::Yearly,
        CumulationPeriod::Total,
        CumulationPeriod::Partial,
    ];
}

impl Display for CumulationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CumulationPeriod::Daily => "daily".fmt(f),
            CumulationPeriod::Weekly => "weekly".fmt(f),
            CumulationPeriod::Monthly => "monthly".fmt(f),
            CumulationPeriod::Yearly => "yearly".fmt(f),
            CumulationPeriod::Total => "total".fmt(f),
            CumulationPeriod::Partial => "partial".fmt(f),
        }
    }
}

impl FromStr for CumulationPeriod {
    type Err = SelectorError;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "daily" => Ok(CumulationPeriod::Daily),
            "weekly" => Ok(CumulationPeriod::Weekly),
            "monthly" => Ok(CumulationPeriod::Monthly),
            "yearly" => Ok(CumulationPeriod::Yearly),
            "total" => Ok(CumulationPeriod::Total),
            "partial" => Ok(CumulationPeriod::Partial),
            _ => Err(SelectorError::BadPeriod(input.to_string())),
        }
    }
}

/// Live measurements selectable with [`Command::GetDSP`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum DSParameter {
    GridVoltage = 1,
    GridCurrent = 2,
    GridPower = 3,
    Frequency = 4,
    Vbulk = 5,
    IleakDCDC = 6,
    IleakInverter = 7,
    Pin1 = 8,
    Pin2 = 9,
    InverterTemperature = 21,
    BoosterTemperature = 22,
    Input1Voltage = 23,
    Input1Current = 25,
    Input2Voltage = 26,
    Input2Current = 27,
    GridVoltageDCDC = 28,
    GridFrequencyDCDC = 29,
    IsolationResistance = 30,
    VbulkDCDC = 31,
    AverageGridVoltage = 32,
    VbulkMid = 33,
    PowerPeak = 34,
    PowerPeakToday = 35,
    GridVoltageNeutral = 36,
    WindGeneratorFrequency = 37,
    GridVoltageNeutralPhase = 38,
    GridCurrentPhaseR = 39,
    GridCurrentPhaseS = 40,
    GridCurrentPhaseT = 41,
    FrequencyPhaseR = 42,
    FrequencyPhaseS = 43,
    FrequencyPhaseT = 44,
    VbulkPositive = 45,
    VbulkNegative = 46,
    SupervisorTemperature = 47,
    AlimTemperature = 48,
    HeatSinkTemperature = 49,
    Temperature1 = 50,
    Temperature2 = 51,
    Temperature3 = 52,
    Fan1Speed = 53,
    Fan2Speed = 54,
    Fan3Speed = 55,
    Fan4Speed = 56,
    Fan5Speed = 57,
    PowerSaturationLimit = 58,
    RiferimentoAnelloBulk = 59,
    VpanelMicro = 60,
    GridVoltagePhaseR = 61,
    GridVoltagePhaseS = 62,
    GridVoltagePhaseT = 63,
}

impl DSParameter {
    pub fn label(self) -> &'static str {
        match self {
            DSParameter::GridVoltage => "Grid Voltage",
            DSParameter::GridCurrent => "Grid Current",
            DSParameter::GridPower => "Grid Power",
            DSParameter::Frequency => "Frequency",
            DSParameter::Vbulk => "Vbulk",
            DSParameter::IleakDCDC => "Ileak (Dc/Dc)",
            DSParameter::IleakInverter => "Ileak (Inverter)",
            DSParameter::Pin1 => "Pin1",
            DSParameter::Pin2 => "Pin2",
            DSParameter::InverterTemperature => "Inverter Temperature",
            DSParameter::BoosterTemperature => "Booster Temperature",
            DSParameter::Input1Voltage => "Input 1 Voltage",
            DSParameter::Input1Current => "Input 1 Current",
            DSParameter::Input2Voltage => "Input 2 Voltage",
            DSParameter::Input2Current => "Input 2 Current",
            DSParameter::GridVoltageDCDC => "Grid Voltage (Dc/Dc)",
            DSParameter::GridFrequencyDCDC => "Grid Frequency (Dc/Dc)",
            DSParameter::IsolationResistance => "Isolation Resistance (Riso)",
            DSParameter::VbulkDCDC => "Vbulk (Dc/Dc)",
            DSParameter::AverageGridVoltage => "Average Grid Voltage (VgridAvg)",
            DSParameter::VbulkMid => "VbulkMid",
            DSParameter::PowerPeak => "Power Peak",
            DSParameter::PowerPeakToday => "Power Peak Today",
            DSParameter::GridVoltageNeutral => "Grid Voltage neutral",
            DSParameter::WindGeneratorFrequency => "Wind Generator Frequency",
            DSParameter::GridVoltageNeutralPhase => "Grid Voltage neutral-phase",
            DSParameter::GridCurrentPhaseR => "Grid Current phase r",
            DSParameter::GridCurrentPhaseS => "Grid Current phase s",
            DSParameter::GridCurrentPhaseT => "Grid Current phase t",
            DSParameter::FrequencyPhaseR => "Frequency phase r",
            DSParameter::FrequencyPhaseS => "Frequency phase s",
            DSParameter::FrequencyPhaseT => "Frequency phase t",
            DSParameter::VbulkPositive => "Vbulk +",
            DSParameter::VbulkNegative => "Vbulk -",
            DSParameter::SupervisorTemperature => "Supervisor Temperature",
            DSParameter::AlimTemperature => "Alim. Temperature",
            DSParameter::HeatSinkTemperature => "Heat Sink Temperature",
            DSParameter::Temperature1 => "Temperature 1",
            DSParameter::Temperature2 => "Temperature 2",
            DSParameter::Temperature3 => "Temperature 3",
            DSParameter::Fan1Speed => "Fan 1 Speed",
            DSParameter::Fan2Speed => "Fan 2 Speed",
            DSParameter::Fan3Speed => "Fan 3 Speed",
            DSParameter::Fan4Speed => "Fan 4 Speed",
            DSParameter::Fan5Speed => "Fan 5 Speed",
            DSParameter::PowerSaturationLimit => "Power Saturation limit (Der.)",
            DSParameter::RiferimentoAnelloBulk => "Riferimento Anello Bulk",
            DSParameter::VpanelMicro => "Vpanel micro",
            DSParameter::GridVoltagePhaseR => "Grid Voltage phase r",
            DSParameter::GridVoltagePhaseS => "Grid Voltage phase s",
            DSParameter::GridVoltagePhaseT => "Grid Voltage phase t",
        }
    }

    /// Label for a raw parameter byte, including codes this table does not know.
    pub fn describe(code: u8) -> String {
        match <DSParameter as num_traits::FromPrimitive>::from_u8(code) {
            Some(parameter) => parameter.label().to_string(),
            None => format!("Unknown DSParameter({})", code),
        }
    }
}

impl Display for DSParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.label().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn command_codes() {
        assert_eq!(Command::GetState as u8, 50);
        assert_eq!(Command::GetVersion as u8, 0x3a);
        assert_eq!(Command::GetCumulatedEnergy as u8, 0x4e);
        assert_eq!(Command::GetLast4Alarms as u8, 0x56);
        assert_eq!(Command::from_u8(51), None);
        assert_eq!(Command::from_u8(71), Some(Command::SetTime));
    }

    #[test]
    fn payload_offsets() {
        assert_eq!(Command::GetState.payload_offset(), 1);
        assert_eq!(Command::GetPartNumber.payload_offset(), 0);
        assert_eq!(Command::GetSerialNumber.payload_offset(), 0);
        assert_eq!(Command::GetDSP.payload_offset(), 2);
        assert!(Command::GetSerialNumber.is_ascii());
        assert!(!Command::GetState.is_ascii());
    }

    #[test]
    fn selector_gaps() {
        assert_eq!(CumulationPeriod::from_u8(2), None);
        assert_eq!(CumulationPeriod::Monthly.byte(), 3);
        assert_eq!(DSParameter::from_u8(24), None);
        assert_eq!(DSParameter::Input1Voltage.byte(), 0x17);
        assert_eq!(DSParameter::Input1Current.byte(), 0x19);
        assert_eq!(Counter::Reset.byte(), 3);
    }

    #[test]
    fn dsp_labels() {
        assert_eq!(DSParameter::IleakInverter.to_string(), "Ileak (Inverter)");
        assert_eq!(DSParameter::describe(0), "Unknown DSParameter(0)");
        assert_eq!(DSParameter::describe(99), "Unknown DSParameter(99)");
        assert_eq!(DSParameter::describe(4), "Frequency");
    }

    #[test]
    fn parse_selectors() {
        assert_eq!("monthly".parse::<CumulationPeriod>().unwrap(), CumulationPeriod::Monthly);
        assert!("fortnightly".parse::<CumulationPeriod>().is_err());
        assert_eq!("grid".parse::<Counter>().unwrap(), Counter::Grid);
        assert_eq!(CumulationPeriod::Partial.to_string(), "partial");
    }

    #[test]
    fn retryable_errors() {
        assert!(ProtocolError::CrcFailure.is_retryable());
        assert!(ProtocolError::Transmission(TransmissionState::NOT_EXECUTED).is_retryable());
        assert!(!ProtocolError::Transmission(TransmissionState::VARIABLE_DOES_NOT_EXIST).is_retryable());
        assert!(ProtocolError::Io(io::Error::from(io::ErrorKind::TimedOut)).is_retryable());
        assert!(!ProtocolError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_retryable());
        assert!(!ProtocolError::Decode { expected: 5, available: 4 }.is_retryable());
    }

    #[test]
    fn error_messages() {
        assert_eq!(ProtocolError::CrcFailure.to_string(), "CRC Failure");
        assert_eq!(
            ProtocolError::Transmission(TransmissionState::EEPROM_NOT_ACCESSIBLE).to_string(),
            "EEProm not accessible"
        );
        assert_eq!(
            ProtocolError::Transmission(TransmissionState(99)).to_string(),
            "Unknown TransmissionState(99)"
        );
    }
}
