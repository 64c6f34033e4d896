//! Opening the RS-485 line an inverter chain hangs off.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod other;

#[cfg(target_os = "linux")]
pub use linux::NativePort;
#[cfg(target_os = "linux")]
use linux::{do_open_port, is_port_open};

#[cfg(not(target_os = "linux"))]
pub use other::NativePort;
#[cfg(not(target_os = "linux"))]
use other::{do_open_port, is_port_open};

use anyhow::Result;
use core::time::Duration;
use log::debug;
use serialport::{self, SerialPort, SerialPortType};
use thiserror::Error;

/// Line speed every Aurora model ships with.
pub const DEFAULT_BAUDRATE: u32 = 19200;

#[derive(Error, Debug)]
pub enum OpenPortError {
    #[error("no RS-485 adapter found")]
    NoCompatiblePort,
    #[error("{port_name:?} busy")]
    PortBusy { port_name: String },
    #[error("rs485 configuration failed on {port_name:?}")]
    Rs485Error { port_name: String },
}

trait Rs485 {
    fn rs485_is_enabled(&self) -> Result<bool>;
    fn rs485_enable(&self, enable: bool) -> Result<()>;

    fn rs485_is_supported(&self) -> bool {
        match self.rs485_is_enabled() {
            Ok(enabled) => self.rs485_enable(enabled).is_ok(),
            Err(_) => false,
        }
    }
}

#[derive(PartialEq)]
struct UsbId(u16, u16);

static COMPATIBLE_IDS: &[UsbId] = &[
    UsbId(0x0403, 0x6001), // FTDI FT232R
    UsbId(0x0403, 0x6014), // FTDI FT232H
    UsbId(0x1a86, 0x7523), // QinHeng HL-340
    UsbId(0x10c4, 0xea60), // Silicon Labs CP210x
];

/// Opens `port_name` (or the first adapter that looks like RS-485 when it is
/// `auto`) at 8N1 with the given read timeout.
///
/// Unless `force` is set, refuses ports another process holds open and ports
/// whose RS-485 mode can not be switched on.
pub fn open_port(
    port_name: &str,
    baudrate: u32,
    timeout: Duration,
    force: bool,
) -> Result<NativePort> {
    let true_name: String = if port_name == "auto" {
        guess_port()?
    } else {
        port_name.to_string()
    };

    if !force && is_port_open(&true_name) {
        return Err(OpenPortError::PortBusy {
            port_name: true_name,
        }
        .into());
    }

    let mut port = do_open_port(&true_name, baudrate)?;

    if port.rs485_is_supported() && port.rs485_enable(true).is_err() && !force {
        return Err(OpenPortError::Rs485Error {
            port_name: true_name,
        }
        .into());
    }

    port.set_timeout(timeout)?;

    debug!("open_port OK: {} @ {} baud", &true_name, baudrate);
    Ok(port)
}

fn guess_port() -> Result<String> {
    serialport::available_ports()?
        .into_iter()
        .filter(|info| match &info.port_type {
            SerialPortType::UsbPort(usb_info) => {
                COMPATIBLE_IDS.contains(&UsbId(usb_info.vid, usb_info.pid))
            }
            SerialPortType::Unknown => {
                !is_port_open(&info.port_name)
                    && match do_open_port(&info.port_name, DEFAULT_BAUDRATE) {
                        Ok(p) => p.rs485_is_supported(),
                        Err(_) => false,
                    }
            }
            SerialPortType::PciPort | SerialPortType::BluetoothPort => false,
        })
        .map(|info| info.port_name)
        .next()
        .ok_or_else(|| OpenPortError::NoCompatiblePort.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    struct FakeLine {
        ioctl_ok: bool,
        enabled: Cell<bool>,
    }

    impl Rs485 for FakeLine {
        fn rs485_is_enabled(&self) -> Result<bool> {
            if self.ioctl_ok {
                Ok(self.enabled.get())
            } else {
                Err(anyhow!("ENOTTY"))
            }
        }

        fn rs485_enable(&self, enable: bool) -> Result<()> {
            if self.ioctl_ok {
                self.enabled.set(enable);
                Ok(())
            } else {
                Err(anyhow!("ENOTTY"))
            }
        }
    }

    #[test]
    fn rs485_probe_keeps_current_mode() {
        let line = FakeLine {
            ioctl_ok: true,
            enabled: Cell::new(false),
        };
        assert!(line.rs485_is_supported());
        assert!(!line.enabled.get());
    }

    #[test]
    fn rs485_probe_on_plain_uart() {
        let line = FakeLine {
            ioctl_ok: false,
            enabled: Cell::new(false),
        };
        assert!(!line.rs485_is_supported());
    }

    #[test]
    fn known_adapters() {
        assert!(COMPATIBLE_IDS.contains(&UsbId(0x0403, 0x6001)));
        assert!(COMPATIBLE_IDS.contains(&UsbId(0x10c4, 0xea60)));
        assert!(!COMPATIBLE_IDS.contains(&UsbId(0x16d0, 0x06a7)));
    }

    #[test]
    fn open_error_messages() {
        let err = OpenPortError::PortBusy {
            port_name: "/dev/ttyUSB0".to_string(),
        };
        assert_eq!(err.to_string(), "\"/dev/ttyUSB0\" busy");
        assert_eq!(
            OpenPortError::NoCompatiblePort.to_string(),
            "no RS-485 adapter found"
        );
    }
}
