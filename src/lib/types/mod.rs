mod codes;

use std::fmt::Display;

use itertools::Itertools;

use crate::inverter::Decode;

pub use codes::{
    AlarmState, ConfigurationState, DCDCState, GlobalState, InputType, InverterState,
    InverterType, Product, ProductSpec, TransmissionState,
};

/// Answer to [`crate::Command::GetState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub global: GlobalState,
    pub inverter: InverterState,
    pub channel1: DCDCState,
    pub channel2: DCDCState,
    pub alarm: AlarmState,
}

impl Decode for State {
    const SIZE: usize = 5;

    fn decode(bytes: &[u8]) -> Self {
        State {
            global: GlobalState(bytes[0]),
            inverter: InverterState(bytes[1]),
            channel1: DCDCState(bytes[2]),
            channel2: DCDCState(bytes[3]),
            alarm: AlarmState(bytes[4]),
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Global: {}, Inverter: {}, Channel1: {}, Channel2: {}, Alarm: {}",
            self.global, self.inverter, self.channel1, self.channel2, self.alarm
        )
    }
}

/// Answer to [`crate::Command::GetVersion`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Version {
    pub model: Product,
    pub regulation: ProductSpec,
    pub transformer: InverterType,
    pub input: InputType,
}

impl Decode for Version {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        Version {
            model: Product(bytes[0]),
            regulation: ProductSpec(bytes[1]),
            transformer: InverterType(bytes[2]),
            input: InputType(bytes[3]),
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model: {}, Regulation: {}, Transformer: {}, Type: {}",
            self.model, self.regulation, self.transformer, self.input
        )
    }
}

/// Answer to [`crate::Command::GetLast4Alarms`], oldest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlarmStates(pub [AlarmState; 4]);

impl AlarmStates {
    pub fn iter(&self) -> impl Iterator<Item = &AlarmState> {
        self.0.iter()
    }
}

impl Decode for AlarmStates {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        AlarmStates([
            AlarmState(bytes[0]),
            AlarmState(bytes[1]),
            AlarmState(bytes[2]),
            AlarmState(bytes[3]),
        ])
    }
}

impl Display for AlarmStates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().join(", ").fmt(f)
    }
}

/// Week and two digit year of manufacture, as the ASCII the inverter reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManufactureDate {
    pub week: String,
    pub year: String,
}

impl Decode for ManufactureDate {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        ManufactureDate {
            week: latin1(&bytes[0..2]),
            year: latin1(&bytes[2..4]),
        }
    }
}

/// One char per byte, so nothing the inverter sent is lost or replaced.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

impl Display for ManufactureDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "week {}, year {}", self.week, self.year)
    }
}
