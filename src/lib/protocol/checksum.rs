use crc::{Crc, CRC_16_IBM_SDLC};

// Reflected 0x1021 (0x8408), init 0xFFFF, output inverted: CRC-16/X-25.
const AURORA_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Frame checksum over payload bytes only. Transmitted little-endian.
pub fn crc16(data: &[u8]) -> u16 {
    AURORA_CRC.checksum(data)
}
