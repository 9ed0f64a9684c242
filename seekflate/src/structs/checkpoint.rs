use std::fmt::Display;
use std::str::FromStr;

use crate::structs::priming::MAX_SEED_LEN;
use crate::utils::errors::ExtractError;

/// DEFLATE block type recorded by the checkpoint producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    NoCompression,
    FixedHuffman,
    DynamicHuffman,
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nocompression" => Ok(Self::NoCompression),
            "fixed" => Ok(Self::FixedHuffman),
            "dynamic" => Ok(Self::DynamicHuffman),
            _ => Err(s.to_string()),
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::NoCompression => write!(f, "nocompression"),
            BlockType::FixedHuffman => write!(f, "fixed"),
            BlockType::DynamicHuffman => write!(f, "dynamic"),
        }
    }
}

/// A recorded resume point inside a raw DEFLATE stream.
///
/// `from_byte`/`from_bit` locate the first bit of the block header in the
/// compressed stream. `data` is the tail of the decompressor window just
/// before that block; decompressing the block needs nothing else from the
/// stream before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub id: i64,
    pub from_byte: u64,
    /// Bit within `from_byte`, counted from the least significant bit.
    pub from_bit: u8,
    /// Window contents preceding the block.
    pub data: Vec<u8>,
    /// Recorded length of `data`.
    pub len: usize,
    /// Upper bound of the encoded block length, header included.
    pub block_len_bits: u64,
    /// Decompressed length of the block.
    pub len_out: usize,

    /// Offset of the block in the decompressed stream.
    pub to_byte: Option<u64>,
    pub block_type: Option<BlockType>,
    /// CRC-32 of the decompressed block.
    pub crc32: Option<u32>,
    pub header_len_bits: Option<u64>,
}

impl Checkpoint {
    /// Builds a checkpoint whose recorded seed length matches `data`.
    pub fn new(
        id: i64,
        from_byte: u64,
        from_bit: u8,
        data: Vec<u8>,
        block_len_bits: u64,
        len_out: usize,
    ) -> Self {
        Self {
            id,
            from_byte,
            from_bit,
            len: data.len(),
            data,
            block_len_bits,
            len_out,
            to_byte: None,
            block_type: None,
            crc32: None,
            header_len_bits: None,
        }
    }

    pub fn with_crc32(mut self, crc32: u32) -> Self {
        self.crc32 = Some(crc32);
        self
    }

    /// Checks the invariants extraction depends on.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.from_bit >= 8 {
            return Err(ExtractError::corrupt(
                self.id,
                format!("from_bit must be below 8, got {}", self.from_bit),
            ));
        }

        if self.data.len() != self.len {
            return Err(ExtractError::corrupt(
                self.id,
                format!(
                    "seed holds {} bytes but {} are recorded",
                    self.data.len(),
                    self.len
                ),
            ));
        }

        if self.data.len() > MAX_SEED_LEN {
            return Err(ExtractError::corrupt(
                self.id,
                format!(
                    "seed of {} bytes does not fit a stored block",
                    self.data.len()
                ),
            ));
        }

        Ok(())
    }

    /// Realigned bytes to pull for this block with the given safety margin.
    pub fn bytes_needed(&self, margin_bytes: u64) -> Result<usize, ExtractError> {
        (self.block_len_bits >> 3)
            .checked_add(margin_bytes)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| {
                ExtractError::corrupt(
                    self.id,
                    format!(
                        "block length of {} bits plus {margin_bytes} margin bytes",
                        self.block_len_bits
                    ),
                )
            })
    }

    /// Output cap for decompressing the priming block plus this block.
    pub fn max_output_len(&self) -> Result<usize, ExtractError> {
        self.len.checked_add(self.len_out).ok_or_else(|| {
            ExtractError::corrupt(
                self.id,
                format!("output length of {} bytes", self.len_out),
            )
        })
    }
}
