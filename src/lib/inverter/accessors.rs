use std::{
    io::{Read, Write},
    time::Duration,
};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::warn;

use super::{decode_prefix, Inverter};
use crate::protocol::{
    Command, Counter, CumulationPeriod, DSParameter, ProtocolError, Result,
    INVERTER_EPOCH_OFFSET,
};
use crate::types::{latin1, AlarmStates, ConfigurationState, ManufactureDate, State, Version};

impl<P: Read + Write> Inverter<P> {
    /// Cheapest round trip the inverter supports. Callers usually wrap it in
    /// a timeout.
    pub fn comm_check(&mut self) -> Result<()> {
        self.communicate(Command::GetVersion, &[]).map(|_| ())
    }

    pub fn state(&mut self) -> Result<State> {
        self.communicate_var(Command::GetState, &[])
    }

    pub fn last_4_alarms(&mut self) -> Result<AlarmStates> {
        self.communicate_var(Command::GetLast4Alarms, &[])
    }

    pub fn part_number(&mut self) -> Result<String> {
        self.ascii(Command::GetPartNumber)
    }

    pub fn serial_number(&mut self) -> Result<String> {
        self.ascii(Command::GetSerialNumber)
    }

    fn ascii(&mut self, command: Command) -> Result<String> {
        let bytes = self.communicate(command, &[])?;
        Ok(latin1(&bytes))
    }

    pub fn version(&mut self) -> Result<Version> {
        self.communicate_var(Command::GetVersion, &[])
    }

    pub fn manufacture_date(&mut self) -> Result<ManufactureDate> {
        self.communicate_var(Command::GetManufacturingDate, &[])
    }

    /// Four ASCII characters joined with dots, e.g. `C.0.1.1`.
    pub fn firmware_version(&mut self) -> Result<String> {
        let bytes = self.communicate(Command::GetFirmwareVersion, &[])?;
        let bytes = bytes.get(..4).ok_or(ProtocolError::Decode {
            expected: 4,
            available: bytes.len(),
        })?;
        Ok(bytes.iter().map(|&b| char::from(b)).join("."))
    }

    pub fn configuration(&mut self) -> Result<ConfigurationState> {
        self.communicate_var::<u8>(Command::GetConfiguration, &[])
            .map(ConfigurationState)
    }

    pub fn cumulated_energy(&mut self, period: CumulationPeriod) -> Result<u32> {
        self.communicate_var(Command::GetCumulatedEnergy, &[&period])
    }

    pub fn daily_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Daily)
    }

    pub fn weekly_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Weekly)
    }

    pub fn monthly_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Monthly)
    }

    pub fn yearly_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Yearly)
    }

    pub fn total_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Total)
    }

    /// Energy since the partial counters were last reset.
    pub fn partial_energy(&mut self) -> Result<u32> {
        self.cumulated_energy(CumulationPeriod::Partial)
    }

    pub fn dsp(&mut self, parameter: DSParameter) -> Result<f32> {
        self.communicate_var(Command::GetDSP, &[&parameter])
    }

    /// Grid frequency in Hz.
    pub fn frequency(&mut self) -> Result<f32> {
        self.dsp(DSParameter::Frequency)
    }

    pub fn grid_voltage(&mut self) -> Result<f32> {
        self.dsp(DSParameter::GridVoltage)
    }

    /// Current pushed to the grid, in amps.
    pub fn grid_current(&mut self) -> Result<f32> {
        self.dsp(DSParameter::GridCurrent)
    }

    /// Power pushed to the grid, in watts.
    pub fn grid_power(&mut self) -> Result<f32> {
        self.dsp(DSParameter::GridPower)
    }

    pub fn input1_voltage(&mut self) -> Result<f32> {
        self.dsp(DSParameter::Input1Voltage)
    }

    pub fn input1_current(&mut self) -> Result<f32> {
        self.dsp(DSParameter::Input1Current)
    }

    pub fn input2_voltage(&mut self) -> Result<f32> {
        self.dsp(DSParameter::Input2Voltage)
    }

    pub fn input2_current(&mut self) -> Result<f32> {
        self.dsp(DSParameter::Input2Current)
    }

    /// Celsius.
    pub fn inverter_temperature(&mut self) -> Result<f32> {
        self.dsp(DSParameter::InverterTemperature)
    }

    /// Celsius.
    pub fn booster_temperature(&mut self) -> Result<f32> {
        self.dsp(DSParameter::BoosterTemperature)
    }

    /// Energy produced over the last ten seconds, in joules.
    pub fn joules(&mut self) -> Result<u16> {
        self.communicate_var(Command::GetLast10SecEnergy, &[])
    }

    pub fn time(&mut self) -> Result<DateTime<Utc>> {
        let raw: u32 = self.communicate_var(Command::GetTime, &[])?;
        let seconds = INVERTER_EPOCH_OFFSET + i64::from(raw);
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(ProtocolError::TimeOutOfRange(seconds))
    }

    /// Sets the inverter clock.
    ///
    /// Not idempotent: the inverter may reset its partial counters and
    /// cumulated values every time this is issued, so do not blindly retry it.
    pub fn set_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        let seconds = time.timestamp();
        let value = u32::try_from(seconds - INVERTER_EPOCH_OFFSET)
            .map_err(|_| ProtocolError::TimeOutOfRange(seconds))?;
        let [b0, b1, b2, b3] = value.to_be_bytes();

        warn!("setting clock of inverter {} to {}", self.address, time);
        self.communicate(Command::SetTime, &[&b0, &b1, &b2, &b3])
            .map(|_| ())
    }

    /// Raw counter value in seconds.
    pub fn counter(&mut self, counter: Counter) -> Result<u32> {
        self.communicate_var(Command::GetCounters, &[&counter])
    }

    fn run_time(&mut self, counter: Counter) -> Result<Duration> {
        self.counter(counter).map(|s| Duration::from_secs(u64::from(s)))
    }

    pub fn total_run_time(&mut self) -> Result<Duration> {
        self.run_time(Counter::Total)
    }

    pub fn partial_run_time(&mut self) -> Result<Duration> {
        self.run_time(Counter::Partial)
    }

    /// Time spent connected to the grid.
    pub fn grid_run_time(&mut self) -> Result<Duration> {
        self.run_time(Counter::Grid)
    }

    /// Time since the user-resettable counter was last cleared.
    pub fn reset_run_time(&mut self) -> Result<Duration> {
        self.run_time(Counter::Reset)
    }
}
