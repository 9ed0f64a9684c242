//! Hand encoder for fixed-Huffman DEFLATE blocks, used to build test streams
//! whose block boundaries land on known bit offsets.

use bitstream_io::{BitWrite, BitWriter, LittleEndian};

pub struct DeflateBitWriter {
    bw: BitWriter<Vec<u8>, LittleEndian>,
    bits: u64,
}

impl DeflateBitWriter {
    pub fn new() -> Self {
        Self {
            bw: BitWriter::endian(Vec::new(), LittleEndian),
            bits: 0,
        }
    }

    /// Bits written so far.
    pub fn bit_position(&self) -> u64 {
        self.bits
    }

    /// Writes `count` bits that do not belong to any block of interest.
    pub fn filler(&mut self, count: u64) {
        for i in 0..count {
            self.put_bits(((i / 3) & 1) as u32, 1);
        }
    }

    pub fn fixed_block_header(&mut self, last: bool) {
        self.put_bits(last as u32, 1);
        self.put_bits(0b01, 2);
    }

    pub fn literal(&mut self, byte: u8) {
        if byte < 144 {
            self.put_code(0x30 + byte as u32, 8);
        } else {
            self.put_code(0x190 + (byte as u32 - 144), 9);
        }
    }

    pub fn literals(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.literal(byte);
        }
    }

    /// Back-reference restricted to the codes that carry no extra bits.
    pub fn copy(&mut self, length: u32, distance: u32) {
        assert!((3..=10).contains(&length), "length {length} needs extra bits");
        assert!((1..=4).contains(&distance), "distance {distance} needs extra bits");

        self.put_code(length - 2, 7);
        self.put_code(distance - 1, 5);
    }

    pub fn end_of_block(&mut self) {
        self.put_code(0, 7);
    }

    /// Pads to a byte boundary with zero bits and returns the stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.bw.byte_align().unwrap();
        self.bw.into_writer()
    }

    // Huffman codes go out most significant bit first.
    fn put_code(&mut self, code: u32, len: u32) {
        for i in (0..len).rev() {
            self.bw.write_bit((code >> i) & 1 == 1).unwrap();
        }
        self.bits += len as u64;
    }

    fn put_bits(&mut self, value: u32, len: u32) {
        for i in 0..len {
            self.bw.write_bit((value >> i) & 1 == 1).unwrap();
        }
        self.bits += len as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn fixed_block_decodes_with_flate2() {
        let mut w = DeflateBitWriter::new();
        w.fixed_block_header(true);
        w.literals(b"ab\xF0");
        w.copy(3, 3);
        w.end_of_block();
        assert_eq!(w.bit_position(), 3 + 8 + 8 + 9 + 7 + 5 + 7);

        let stream = w.finish();
        let mut out = Vec::new();
        flate2::read::DeflateDecoder::new(&stream[..])
            .read_to_end(&mut out)
            .unwrap();

        assert_eq!(out, b"ab\xF0ab\xF0");
    }
}
