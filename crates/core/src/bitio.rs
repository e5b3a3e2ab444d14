//! Conversion between ordered bit sequences and bytes.
//!
//! Bits are modelled as `bool` (`true` = 1). The packing order is
//! LSB-first: bit 0 of the sequence lands in the least significant bit of
//! the first byte, bit 7 in its most significant bit, bit 8 in the least
//! significant bit of the second byte, and so on. `unpack` is the exact
//! inverse of `pack`.
//!
//! # Padding Rules
//! - `pack` refuses partial bytes; the caller pads first
//! - `BitBuffer` only ever drains whole bytes and leaves trailing bits in place
//!
//! # Example
//! ```
//! use ahuff_core::bitio::{pack, unpack};
//!
//! let bits = [true, true, false, false, false, false, false, false];
//! let bytes = pack(&bits).unwrap();
//! assert_eq!(bytes, vec![0b0000_0011]);
//! assert_eq!(unpack(&bytes), bits.to_vec());
//! ```

use crate::error::{BitIoError, Result};

/// Pack a bit sequence whose length is a multiple of 8 into bytes.
///
/// # Errors
/// Returns `BitIoError::PartialByte` if `bits.len()` is not a multiple of 8.
pub fn pack(bits: &[bool]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(BitIoError::PartialByte { bits: bits.len() }.into());
    }

    Ok(pack_whole_bytes(bits))
}

/// Pack every complete group of 8 bits, ignoring any trailing remainder.
fn pack_whole_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | ((bit as u8) << i))
        })
        .collect()
}

/// Unpack bytes into a bit sequence, 8 bits per byte, LSB-first.
pub fn unpack(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        bits.extend((0..8).map(|i| (byte >> i) & 1 == 1));
    }
    bits
}

/// Pending bits waiting to be written out as whole bytes.
///
/// Append-only at the back, drained from the front.
///
/// # Invariants
/// - After `take_whole_bytes`, `len() < 8`
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    /// Create an empty buffer with room for `bytes` whole bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bytes * 8),
        }
    }

    /// Append bits in order.
    pub fn extend_from_slice(&mut self, bits: &[bool]) {
        self.bits.extend_from_slice(bits);
    }

    /// Append `1` bits until the length is a multiple of 8.
    ///
    /// Returns the number of padding bits added.
    pub fn pad_with_ones(&mut self) -> usize {
        let padding = (8 - self.bits.len() % 8) % 8;
        self.bits.extend(std::iter::repeat(true).take(padding));
        padding
    }

    /// Remove every complete byte from the front of the buffer and pack it.
    ///
    /// Trailing bits that do not fill a byte stay in the buffer.
    pub fn take_whole_bytes(&mut self) -> Vec<u8> {
        let whole = self.whole_bytes() * 8;
        if whole == 0 {
            return Vec::new();
        }

        let bytes = pack_whole_bytes(&self.bits[..whole]);
        self.bits.drain(..whole);
        bytes
    }

    /// Number of complete bytes currently buffered.
    pub fn whole_bytes(&self) -> usize {
        self.bits.len() / 8
    }

    /// Total number of buffered bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Drop every buffered bit.
    pub fn clear(&mut self) {
        self.bits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(pattern: &str) -> Vec<bool> {
        pattern.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_pack_lsb_first() {
        // First bit of the sequence is the low bit of the byte
        let bytes = pack(&bits_of("10000000")).unwrap();
        assert_eq!(bytes, vec![0x01]);

        let bytes = pack(&bits_of("00000001")).unwrap();
        assert_eq!(bytes, vec![0x80]);
    }

    #[test]
    fn test_pack_multi_byte() {
        let bytes = pack(&bits_of("1111000000001111")).unwrap();
        assert_eq!(bytes, vec![0x0F, 0xF0]);
    }

    #[test]
    fn test_pack_partial_byte_rejected() {
        let result = pack(&bits_of("101"));
        assert!(matches!(
            result,
            Err(crate::error::Error::BitIo(BitIoError::PartialByte { bits: 3 }))
        ));
    }

    #[test]
    fn test_pack_empty() {
        assert_eq!(pack(&[]).unwrap(), Vec::<u8>::new());
        assert!(unpack(&[]).is_empty());
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let data = [0x00, 0xFF, 0xA5, 0x3C, 0x01];
        let bits = unpack(&data);
        assert_eq!(bits.len(), 40);
        assert_eq!(pack(&bits).unwrap(), data.to_vec());
    }

    #[test]
    fn test_buffer_keeps_trailing_bits() {
        let mut buffer = BitBuffer::default();
        buffer.extend_from_slice(&bits_of("1100000011"));
        assert_eq!(buffer.whole_bytes(), 1);

        let bytes = buffer.take_whole_bytes();
        assert_eq!(bytes, vec![0x03]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.whole_bytes(), 0);
        assert!(buffer.take_whole_bytes().is_empty());
    }

    #[test]
    fn test_buffer_drains_many_bytes() {
        let mut buffer = BitBuffer::default();
        let data = [0xA5, 0x00, 0xFF, 0x3C];
        buffer.extend_from_slice(&unpack(&data));
        buffer.extend_from_slice(&bits_of("101"));

        assert_eq!(buffer.take_whole_bytes(), data.to_vec());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_buffer_pad_with_ones() {
        let mut buffer = BitBuffer::with_capacity(4);
        buffer.extend_from_slice(&bits_of("000"));
        assert_eq!(buffer.pad_with_ones(), 5);
        assert_eq!(buffer.take_whole_bytes(), vec![0b1111_1000]);

        // Already aligned: nothing to pad
        buffer.extend_from_slice(&bits_of("00000000"));
        assert_eq!(buffer.pad_with_ones(), 0);
        assert_eq!(buffer.len(), 8);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pad_with_ones(), 0);
    }
}
