use std::{
    collections::VecDeque,
    io::{self, Read, Write},
};

use crate::protocol::InputFrame;

/// In-memory byte stream: records what is written, replays queued responses.
#[derive(Debug, Default)]
pub struct MockPort {
    pub written: Vec<u8>,
    pub fail_writes: bool,
    incoming: VecDeque<u8>,
}

impl MockPort {
    /// Queues a well formed response frame.
    pub fn respond(&mut self, payload: [u8; 6]) {
        self.respond_bytes(&InputFrame::new(payload).to_bytes());
    }

    /// Queues a response frame whose CRC is off by one.
    pub fn respond_bad_crc(&mut self, payload: [u8; 6]) {
        let mut frame = InputFrame::new(payload);
        frame.crc = frame.crc.wrapping_add(1);
        self.respond_bytes(&frame.to_bytes());
    }

    pub fn respond_raw(&mut self, payload: &[u8; 6], crc: u16) {
        self.respond_bytes(payload);
        self.respond_bytes(&crc.to_le_bytes());
    }

    pub fn respond_bytes(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Splits everything written so far into request frames.
    pub fn requests(&self) -> Vec<[u8; 10]> {
        self.written
            .chunks_exact(10)
            .map(|chunk| {
                let mut frame = [0u8; 10];
                frame.copy_from_slice(chunk);
                frame
            })
            .collect()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
