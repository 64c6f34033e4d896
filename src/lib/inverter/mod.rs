mod accessors;
#[cfg(test)]
pub(crate) mod mock;

use std::io::{Read, Write};

use log::debug;

use crate::protocol::{Argument, Command, InputFrame, OutputFrame, ProtocolError, Result};
use crate::types::TransmissionState;

/// A typed value carried big-endian in a response.
pub trait Decode: Sized {
    const SIZE: usize;

    /// `bytes` is exactly `SIZE` long.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! decode_be {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_be_bytes(raw)
                }
            }
        )*
    };
}

decode_be!(u8, u16, u32, f32);

/// Decodes `T` from the front of `bytes`, ignoring anything after it.
pub fn decode_prefix<T: Decode>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < T::SIZE {
        return Err(ProtocolError::Decode {
            expected: T::SIZE,
            available: bytes.len(),
        });
    }
    Ok(T::decode(&bytes[..T::SIZE]))
}

/// One inverter reachable at `address` on a shared byte stream.
///
/// Requests and responses are matched purely by order, so a stream must not
/// be used by two exchanges at the same time, whatever the addresses. Pass
/// `&mut port` to keep ownership of the stream with the caller.
pub struct Inverter<P> {
    port: P,
    address: u8,
}

impl<P: Read + Write> Inverter<P> {
    pub fn new(port: P, address: u8) -> Self {
        Self { port, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Performs one request/response exchange and returns the command
    /// specific part of the response payload: the full six bytes for part and
    /// serial number, five for state, four for everything else.
    pub fn communicate(&mut self, command: Command, args: &[&dyn Argument]) -> Result<Vec<u8>> {
        let request = OutputFrame::new(self.address, command, args);

        debug!("{:?} @ {}", command, self.address);
        debug!("send {:02X?}", request.to_bytes());
        request.write_to(&mut self.port)?;

        let response = InputFrame::read_from(&mut self.port)?;
        debug!("recv {:02X?}", response.to_bytes());

        let payload = response.validate().map_err(|e| {
            debug!("crc mismatch: {}", response);
            e
        })?;

        if command.is_ascii() {
            return Ok(payload.to_vec());
        }

        let state = TransmissionState(payload[0]);
        if state != TransmissionState::OK {
            debug!("transmission state {}: {}", state.0, state);
            return Err(ProtocolError::Transmission(state));
        }

        Ok(payload[command.payload_offset()..].to_vec())
    }

    /// Like [`Inverter::communicate`], decoding the response into `T`.
    pub fn communicate_var<T: Decode>(&mut self, command: Command, args: &[&dyn Argument]) -> Result<T> {
        let bytes = self.communicate(command, args)?;
        decode_prefix(&bytes)
    }
}
