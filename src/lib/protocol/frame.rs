use std::{
    fmt::Display,
    io::{Read, Write},
};

use itertools::Itertools;

use super::{checksum::crc16, Argument, Command, ProtocolError, Result};

pub const OUTPUT_PAYLOAD_LEN: usize = 8;
pub const OUTPUT_FRAME_LEN: usize = OUTPUT_PAYLOAD_LEN + 2;
pub const INPUT_PAYLOAD_LEN: usize = 6;
pub const INPUT_FRAME_LEN: usize = INPUT_PAYLOAD_LEN + 2;

pub const MAX_ARGUMENTS: usize = 6;

const PADDING: u8 = b' ';

/// Request frame: address, command, six argument bytes and a CRC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputFrame {
    pub payload: [u8; OUTPUT_PAYLOAD_LEN],
    pub crc: u16,
}

impl OutputFrame {
    /// Arguments past the sixth are dropped. Unused slots hold spaces, except
    /// the slot right after the last argument which the inverter expects to
    /// be zero.
    pub fn new(address: u8, command: Command, args: &[&dyn Argument]) -> Self {
        let mut payload = [
            address,
            command as u8,
            PADDING,
            PADDING,
            PADDING,
            PADDING,
            PADDING,
            PADDING,
        ];

        let mut last = 1;
        for (index, arg) in args.iter().take(MAX_ARGUMENTS).enumerate() {
            last = index + 2;
            payload[last] = arg.byte();
        }

        if last < OUTPUT_PAYLOAD_LEN - 1 {
            payload[last + 1] = 0;
        }

        Self {
            payload,
            crc: crc16(&payload),
        }
    }

    pub fn to_bytes(&self) -> [u8; OUTPUT_FRAME_LEN] {
        let mut buffer = [0u8; OUTPUT_FRAME_LEN];
        buffer[..OUTPUT_PAYLOAD_LEN].copy_from_slice(&self.payload);
        buffer[OUTPUT_PAYLOAD_LEN..].copy_from_slice(&self.crc.to_le_bytes());
        buffer
    }

    pub fn write_to<W: Write + ?Sized>(&self, port: &mut W) -> Result<()> {
        port.write_all(&self.to_bytes())?;
        port.flush()?;
        Ok(())
    }
}

impl Display for OutputFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_frame(f, &self.payload, self.crc)
    }
}

/// Response frame: six payload bytes and a CRC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub payload: [u8; INPUT_PAYLOAD_LEN],
    pub crc: u16,
}

impl InputFrame {
    /// Frame carrying `payload` with a matching CRC, as the inverter sends it.
    pub fn new(payload: [u8; INPUT_PAYLOAD_LEN]) -> Self {
        Self {
            payload,
            crc: crc16(&payload),
        }
    }

    pub fn from_bytes(buffer: &[u8; INPUT_FRAME_LEN]) -> Self {
        let mut payload = [0u8; INPUT_PAYLOAD_LEN];
        payload.copy_from_slice(&buffer[..INPUT_PAYLOAD_LEN]);
        Self {
            payload,
            crc: u16::from_le_bytes([buffer[INPUT_PAYLOAD_LEN], buffer[INPUT_PAYLOAD_LEN + 1]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; INPUT_FRAME_LEN] {
        let mut buffer = [0u8; INPUT_FRAME_LEN];
        buffer[..INPUT_PAYLOAD_LEN].copy_from_slice(&self.payload);
        buffer[INPUT_PAYLOAD_LEN..].copy_from_slice(&self.crc.to_le_bytes());
        buffer
    }

    /// Reads exactly one frame. A short read surfaces as an io error.
    pub fn read_from<R: Read + ?Sized>(port: &mut R) -> Result<Self> {
        let mut buffer = [0u8; INPUT_FRAME_LEN];
        port.read_exact(&mut buffer)?;
        Ok(Self::from_bytes(&buffer))
    }

    pub fn is_valid(&self) -> bool {
        crc16(&self.payload) == self.crc
    }

    pub fn validate(&self) -> Result<&[u8; INPUT_PAYLOAD_LEN]> {
        if self.is_valid() {
            Ok(&self.payload)
        } else {
            Err(ProtocolError::CrcFailure)
        }
    }
}

impl Display for InputFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_frame(f, &self.payload, self.crc)
    }
}

fn write_frame(f: &mut std::fmt::Formatter<'_>, payload: &[u8], crc: u16) -> std::fmt::Result {
    write!(
        f,
        "{} ({})",
        payload.iter().map(|b| format!("{:02X}", b)).join(" "),
        crc
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CumulationPeriod, DSParameter};
    use assert_matches::assert_matches;

    #[test]
    fn encode_without_arguments() {
        let frame = OutputFrame::new(2, Command::GetVersion, &[]);
        assert_eq!(
            frame.to_bytes(),
            [0x02, 0x3a, 0x00, 0x20, 0x20, 0x20, 0x20, 0x20, 0xc9, 0x59]
        );
    }

    #[test]
    fn encode_one_argument() {
        let frame = OutputFrame::new(2, Command::GetCumulatedEnergy, &[&CumulationPeriod::Daily]);
        assert_eq!(
            frame.to_bytes(),
            [0x02, 0x4e, 0x00, 0x00, 0x20, 0x20, 0x20, 0x20, 0x62, 0x47]
        );

        let frame = OutputFrame::new(2, Command::GetDSP, &[&DSParameter::Frequency]);
        assert_eq!(
            frame.to_bytes(),
            [0x02, 0x3b, 0x04, 0x00, 0x20, 0x20, 0x20, 0x20, 0x21, 0xb6]
        );
    }

    #[test]
    fn encode_three_arguments() {
        let frame = OutputFrame::new(2, Command::SetTime, &[&1u8, &2u8, &3u8]);
        assert_eq!(frame.payload, [0x02, 0x47, 1, 2, 3, 0x00, 0x20, 0x20]);
        assert_eq!(frame.crc, crc16(&frame.payload));
    }

    #[test]
    fn encode_all_six_arguments() {
        let frame = OutputFrame::new(2, Command::GetCumulatedEnergy, &[&1u8, &2u8, &3u8, &4u8, &5u8, &6u8]);
        assert_eq!(frame.payload, [2, 78, 1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.crc, crc16(&[2, 78, 1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn encode_truncates_extra_arguments() {
        let b = 0x01u8;
        let seven = OutputFrame::new(2, Command::GetCumulatedEnergy, &[&b, &b, &b, &b, &b, &b, &b]);
        let six = OutputFrame::new(2, Command::GetCumulatedEnergy, &[&b, &b, &b, &b, &b, &b]);
        assert_eq!(seven, six);
        assert_eq!(seven.to_bytes().len(), OUTPUT_FRAME_LEN);
    }

    #[test]
    fn encode_crc_is_little_endian() {
        let frame = OutputFrame::new(2, Command::GetState, &[]);
        let bytes = frame.to_bytes();
        assert_eq!(bytes[8], (frame.crc & 0xFF) as u8);
        assert_eq!(bytes[9], (frame.crc >> 8) as u8);
        assert_eq!(&bytes[8..], &[0x25, 0x87]);
    }

    #[test]
    fn decode_round_trip() {
        let sent = InputFrame::new([0x00, 0x06, 0x02, 0x07, 0x02, 0x00]);
        let mut wire: &[u8] = &sent.to_bytes();
        let received = InputFrame::read_from(&mut wire).unwrap();
        assert_eq!(received, sent);
        assert_eq!(received.validate().unwrap(), &[0x00, 0x06, 0x02, 0x07, 0x02, 0x00]);
    }

    #[test]
    fn decode_bad_crc() {
        let mut frame = InputFrame::new([0, 2, 3, 4, 5, 6]);
        frame.crc = frame.crc.wrapping_add(1);
        assert!(!frame.is_valid());
        assert_matches!(frame.validate(), Err(ProtocolError::CrcFailure));
    }

    #[test]
    fn decode_short_read() {
        let mut wire: &[u8] = &[0x01, 0x02, 0x03, 0x04];
        assert_matches!(InputFrame::read_from(&mut wire), Err(ProtocolError::Io(_)));
    }

    #[test]
    fn render() {
        assert_eq!(OutputFrame::default().to_string(), "00 00 00 00 00 00 00 00 (0)");
        assert_eq!(InputFrame::default().to_string(), "00 00 00 00 00 00 (0)");
        let frame = InputFrame {
            payload: [0x2d, 0x31, 0xAB, 0, 0, 0xFF],
            crc: 513,
        };
        assert_eq!(frame.to_string(), "2D 31 AB 00 00 FF (513)");
    }
}
