use anyhow::Result;
use clap::{Parser, Subcommand};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

use aurora::port::DEFAULT_BAUDRATE;
use aurora::CumulationPeriod;

#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("invalid address range '{0}'")]
    BadRange(String),
}

/// Inverter addresses given as `2`, `2,3` or `2-4`, sorted and deduplicated.
#[derive(Debug, PartialEq)]
pub struct AddressRange(Vec<u8>);

impl Deref for AddressRange {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for AddressRange {
    type Err = RangeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap();
        }

        let parse = |s: &str, m: Option<regex::Match>| -> Result<Option<u8>, RangeError> {
            m.map(|m| {
                m.as_str()
                    .parse::<u8>()
                    .map_err(|_| RangeError::BadRange(s.to_string()))
            })
            .transpose()
        };

        let mut result: Vec<u8> = Vec::new();

        for s in input.split(',') {
            let c = RE
                .captures(s)
                .ok_or_else(|| RangeError::BadRange(s.to_string()))?;
            match (parse(s, c.get(1))?, parse(s, c.get(2))?) {
                (Some(val), None) => result.push(val),
                (Some(val1), Some(val2)) => {
                    result.extend(cmp::min(val1, val2)..=cmp::max(val1, val2))
                }
                _ => return Err(RangeError::BadRange(s.to_string())),
            }
        }

        result.sort_unstable();
        result.dedup();
        Ok(AddressRange(result))
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Skip sanity checks
    #[clap(long, short)]
    pub force: bool,

    /// enable debug output
    #[clap(long, short)]
    pub debug: bool,

    /// UART device or 'auto'
    #[clap(long, short, default_value = "auto")]
    pub port: String,

    /// UART baud rate
    #[clap(long, short, default_value_t = DEFAULT_BAUDRATE)]
    pub baudrate: u32,

    /// Response timeout in milliseconds
    #[clap(long, short, default_value_t = 200)]
    pub timeout_ms: u64,

    /// Retry count for failed reads
    #[clap(long, short, default_value_t = 0)]
    pub retries: usize,

    /// Use json-formatted output
    #[clap(long, short)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Identify inverters: part and serial number, version, firmware, build date
    Info { addresses: AddressRange },

    /// Read global, inverter, DC/DC and alarm state
    State { addresses: AddressRange },

    /// Read the last four alarms
    Alarms { addresses: AddressRange },

    /// Read cumulated energy in Wh (daily, weekly, monthly, yearly, total, partial)
    Energy {
        addresses: AddressRange,
        period: Option<CumulationPeriod>,
    },

    /// Read grid and input measurements
    Measure { addresses: AddressRange },

    /// Read one DSP parameter by code
    Dsp { addresses: AddressRange, code: u8 },

    /// Read run time counters
    Counters { addresses: AddressRange },

    /// Read the inverter clock
    Time { addresses: AddressRange },

    /// Set the inverter clock; may reset partial counters
    SetTime {
        addresses: AddressRange,
        /// Unix seconds, defaults to now
        unix_seconds: Option<i64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_address() {
        assert_eq!(*"2".parse::<AddressRange>().unwrap(), vec![2]);
    }

    #[test]
    fn address_list_and_ranges() {
        assert_eq!(*"3,2".parse::<AddressRange>().unwrap(), vec![2, 3]);
        assert_eq!(*"4-2".parse::<AddressRange>().unwrap(), vec![2, 3, 4]);
        assert_eq!(*"2-4,3,7".parse::<AddressRange>().unwrap(), vec![2, 3, 4, 7]);
    }

    #[test]
    fn bad_ranges() {
        assert_eq!(
            "2,x".parse::<AddressRange>(),
            Err(RangeError::BadRange("x".to_string()))
        );
        assert_eq!(
            "256".parse::<AddressRange>(),
            Err(RangeError::BadRange("256".to_string()))
        );
        assert!("2-".parse::<AddressRange>().is_err());
        assert!("".parse::<AddressRange>().is_err());
    }

    #[test]
    fn parse_command_line() {
        let cli = Cli::parse_from(["aurora-tool", "-p", "/dev/ttyUSB0", "energy", "2-3", "monthly"]);
        assert_eq!(cli.port, "/dev/ttyUSB0");
        assert_eq!(cli.baudrate, 19200);
        assert_eq!(cli.timeout_ms, 200);
        match cli.command {
            Commands::Energy { addresses, period } => {
                assert_eq!(*addresses, vec![2, 3]);
                assert_eq!(period, Some(CumulationPeriod::Monthly));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
