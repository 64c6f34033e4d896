use super::Rs485;

use anyhow::Result;
use glob::glob;
use nix::{ioctl_read_bad, ioctl_write_ptr_bad};
pub use serialport::TTYPort as NativePort;
use serialport::{DataBits, Parity, StopBits};
use std::fs;
use std::os::unix::io::AsRawFd;
use std::path::Path;

pub fn do_open_port(port_name: &str, baudrate: u32) -> Result<NativePort> {
    Ok(serialport::new(port_name, baudrate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open_native()?)
}

/// True when some process has a descriptor on `port_name`.
pub fn is_port_open(port_name: &str) -> bool {
    let target = Path::new(port_name);
    match glob("/proc/[0-9]*/fd/*") {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .filter_map(|path| fs::read_link(path).ok())
            .any(|link| link == target),
        Err(_) => false,
    }
}

impl Rs485 for NativePort {
    fn rs485_is_enabled(&self) -> Result<bool> {
        let mut rs485 = ioctl::serial_rs485::default();
        unsafe { ioctl::serial_rs485_get(self.as_raw_fd(), &mut rs485) }?;
        Ok(rs485.flags & ioctl::SER_RS485_ENABLED != 0)
    }

    fn rs485_enable(&self, enable: bool) -> Result<()> {
        let mut rs485 = ioctl::serial_rs485::default();
        if enable {
            rs485.flags |= ioctl::SER_RS485_ENABLED | ioctl::SER_RS485_RTS_ON_SEND;
        }
        unsafe { ioctl::serial_rs485_set(self.as_raw_fd(), &rs485) }?;
        Ok(())
    }
}

mod ioctl {
    use super::*;
    pub const SER_RS485_ENABLED: u32 = 1 << 0;
    pub const SER_RS485_RTS_ON_SEND: u32 = 1 << 1;

    #[allow(non_camel_case_types)]
    #[derive(Debug, Default)]
    #[repr(C)]
    pub struct serial_rs485 {
        pub flags: u32,
        delay_rts_before_send: u32,
        delay_rts_after_send: u32,
        padding: [u32; 5],
    }

    const TIOCGRS485: u32 = 0x542E;
    const TIOCSRS485: u32 = 0x542F;

    ioctl_read_bad!(serial_rs485_get, TIOCGRS485, serial_rs485);
    ioctl_write_ptr_bad!(serial_rs485_set, TIOCSRS485, serial_rs485);
}
