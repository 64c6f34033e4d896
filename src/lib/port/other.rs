use super::{OpenPortError, Rs485};
use anyhow::Result;
use serialport::{DataBits, Parity, SerialPort, StopBits};

pub type NativePort = Box<dyn SerialPort>;

pub fn do_open_port(port_name: &str, baudrate: u32) -> Result<NativePort> {
    Ok(serialport::new(port_name, baudrate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open()?)
}

// TODO: detect busy ports on macOS and Windows
pub fn is_port_open(_port_name: &str) -> bool {
    false
}

impl Rs485 for NativePort {
    fn rs485_is_enabled(&self) -> Result<bool> {
        Err(OpenPortError::Rs485Error {
            port_name: self.name().unwrap_or_default(),
        }
        .into())
    }

    fn rs485_enable(&self, _enable: bool) -> Result<()> {
        Err(OpenPortError::Rs485Error {
            port_name: self.name().unwrap_or_default(),
        }
        .into())
    }
}
