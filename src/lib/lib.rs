//! Serial protocol for Power-One / ABB Aurora photovoltaic inverters.
//!
//! Every exchange is one fixed 10 byte request followed by one fixed 8 byte
//! response on a caller-owned byte stream. [`Inverter`] wraps that stream and
//! an RS-485 address and exposes typed accessors on top of
//! [`Inverter::communicate`].

pub mod inverter;
pub mod port;
pub mod protocol;
pub mod types;

pub use inverter::{Decode, Inverter};
pub use protocol::{
    Argument, Command, Counter, CumulationPeriod, DSParameter, ProtocolError, Result,
    INVERTER_EPOCH_OFFSET,
};
pub use types::{
    AlarmState, AlarmStates, ConfigurationState, DCDCState, GlobalState, InputType,
    InverterState, InverterType, ManufactureDate, Product, ProductSpec, State,
    TransmissionState, Version,
};
