//! Synthetic stored block that re-seeds the decompressor window.
//!
//! A non-final stored block carrying the checkpoint seed decompresses to the
//! seed itself and leaves it in the sliding window, so back-references of the
//! following block resolve exactly as they did in the original stream. The
//! block ends on a byte boundary, which lets the realigned block bits be
//! appended directly.

use std::io;

use bitstream_io::{BitWrite, BitWriter, LittleEndian};

/// DEFLATE sliding window size.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// Largest payload a single stored block can carry.
pub const MAX_SEED_LEN: usize = u16::MAX as usize;

const BTYPE_STORED: u8 = 0b00;

/// Most tail bytes reserved up front; larger tails grow on append.
const MAX_TAIL_RESERVE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct PrimingBlock {
    bytes: Vec<u8>,
    seed_len: usize,
}

impl PrimingBlock {
    /// Writes the stored-block header followed by `seed`.
    ///
    /// `tail_capacity` is a hint for the block bytes appended later; at most
    /// 64 KiB of it is reserved here.
    pub fn new(seed: &[u8], tail_capacity: usize) -> io::Result<Self> {
        let len = u16::try_from(seed.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seed of {} bytes exceeds a stored block", seed.len()),
            )
        })?;

        let mut bytes = Vec::with_capacity(5 + seed.len() + tail_capacity.min(MAX_TAIL_RESERVE));

        {
            let mut header = BitWriter::endian(&mut bytes, LittleEndian);
            header.write_bit(false)?; // BFINAL
            header.write_bit(BTYPE_STORED & 1 != 0)?;
            header.write_bit(BTYPE_STORED & 2 != 0)?;
            header.byte_align()?;
        }

        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&(!len).to_le_bytes());
        bytes.extend_from_slice(seed);

        Ok(Self {
            bytes,
            seed_len: seed.len(),
        })
    }

    pub fn seed_len(&self) -> usize {
        self.seed_len
    }

    /// Appends realigned block bytes after the seed.
    pub fn append(&mut self, tail: &[u8]) {
        self.bytes.extend_from_slice(tail);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::inflate::{Flate2Inflater, RawInflate};

    #[test]
    fn header_layout() {
        let block = PrimingBlock::new(b"ABCD", 0).unwrap();
        assert_eq!(
            block.as_bytes(),
            &[0x00, 0x04, 0x00, 0xFB, 0xFF, b'A', b'B', b'C', b'D']
        );
        assert_eq!(block.seed_len(), 4);
    }

    #[test]
    fn empty_seed() {
        let block = PrimingBlock::new(&[], 0).unwrap();
        assert_eq!(block.as_bytes(), &[0x00, 0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn oversized_seed_is_rejected() {
        let err = PrimingBlock::new(&vec![0; MAX_SEED_LEN + 1], 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn tail_hint_is_bounded() {
        let mut block = PrimingBlock::new(b"AB", usize::MAX).unwrap();
        assert_eq!(block.as_bytes().len(), 7);

        block.append(&[0xAA; 3]);
        assert_eq!(&block.as_bytes()[5..], &[b'A', b'B', 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn inflates_to_seed() {
        let seed: Vec<u8> = (0..WINDOW_SIZE).map(|i| (i * 7 % 251) as u8).collect();
        let block = PrimingBlock::new(&seed, 0).unwrap();

        let out = Flate2Inflater.inflate(block.as_bytes(), seed.len()).unwrap();
        assert_eq!(out, seed);
    }
}
