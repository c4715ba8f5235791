//! SAE J1850 frame checksum: CRC-8 with polynomial `x^8 + x^4 + x^3 + x^2 + 1`
//! (`0x1D`), register preset to `0xFF`, and the final value inverted.
//!
//! The register is fed one message bit at a time, most significant bit first,
//! so the result can be checked against a bit-serial implementation on the bus.

/// Polynomial applied when the register's top bit is set and the input bit is 0.
const POLY: u8 = 0x1D;
/// Register preset.
const CRC_INIT: u8 = 0xFF;

/// Compute the checksum trailer of `bytes`. Pure and infallible.
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut crc_reg = CRC_INIT;
    for &byte in bytes {
        let mut mask = 0x80u8;
        while mask != 0 {
            crc_reg = shift_bit(crc_reg, byte & mask != 0);
            mask >>= 1;
        }
    }
    !crc_reg
}

/// Feed one message bit into the register.
#[inline]
fn shift_bit(crc_reg: u8, bit: bool) -> u8 {
    let top = crc_reg & 0x80 != 0;
    if bit {
        // Low bit already forced to 1: 0x1D becomes 0x01 and 0x00 becomes 0x1C.
        let poly = if top { POLY ^ 0x1C } else { 0x1C };
        ((crc_reg << 1) | 1) ^ poly
    } else {
        let poly = if top { POLY } else { 0x00 };
        (crc_reg << 1) ^ poly
    }
}
