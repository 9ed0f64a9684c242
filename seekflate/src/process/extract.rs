use std::io::{BufReader, Read, Seek, SeekFrom};

use log::Level;

use crate::log_or_err;
use crate::process::inflate::{Flate2Inflater, RawInflate};
use crate::process::realign::BitRealigner;
use crate::store::CheckpointStore;
use crate::structs::checkpoint::Checkpoint;
use crate::structs::priming::{PrimingBlock, WINDOW_SIZE};
use crate::utils::crc::crc32;
use crate::utils::errors::{ExtractError, InflateError};

/// Extra margin added per retry, on top of doubling.
const RETRY_MARGIN_STEP: u64 = 64;

/// Tuning for [`BlockExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Realigned bytes pulled beyond `block_len_bits / 8`.
    pub margin_bytes: u64,
    /// Extra attempts with a larger margin after the input ran dry.
    pub retries: u32,
    /// Compare the block against the recorded CRC-32, when one exists.
    ///
    /// The stored value must be the CRC-32 of this block's decompressed bytes
    /// alone, not a running checksum of the stream up to the block. Turn this
    /// off for producers that record anything else in that column.
    pub verify_checksum: bool,
    /// Findings at or above this level fail the extraction; weaker ones are
    /// only logged.
    pub fail_level: Level,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            margin_bytes: 1,
            retries: 0,
            verify_checksum: true,
            fail_level: Level::Error,
        }
    }
}

/// Extracts single decompressed blocks from a raw DEFLATE stream.
///
/// Each call seeks the source to the checkpoint, realigns the block bits to a
/// byte boundary, prefixes them with a stored block carrying the seed, and
/// inflates with an output cap of seed plus block length. Output is all or
/// nothing.
///
/// The extractor holds no per-call state and can be shared between threads;
/// each call needs exclusive use of its source handle.
///
/// # Example
///
/// ```rust,no_run
/// use seekflate::process::extract::BlockExtractor;
/// use seekflate::store::sqlite::SqliteStore;
///
/// let store = SqliteStore::open("stream.checkpoints")?;
/// let mut source = std::fs::File::open("stream.deflate")?;
///
/// let extractor = BlockExtractor::default();
/// let block = extractor.extract_by_id(&store, &mut source, 42)?;
/// println!("block 42 holds {} bytes", block.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct BlockExtractor<I = Flate2Inflater> {
    options: ExtractOptions,
    inflater: I,
}

impl BlockExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self::with_inflater(options, Flate2Inflater)
    }
}

impl Default for BlockExtractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl<I: RawInflate> BlockExtractor<I> {
    pub fn with_inflater(options: ExtractOptions, inflater: I) -> Self {
        Self { options, inflater }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Looks up `id` in `store` and extracts its block.
    pub fn extract_by_id<S, R>(
        &self,
        store: &S,
        source: &mut R,
        id: i64,
    ) -> Result<Vec<u8>, ExtractError>
    where
        S: CheckpointStore + ?Sized,
        R: Read + Seek,
    {
        let checkpoint = store.get(id)?.ok_or(ExtractError::CheckpointNotFound(id))?;
        self.extract(source, &checkpoint)
    }

    /// Extracts the decompressed block described by `checkpoint`.
    pub fn extract<R: Read + Seek>(
        &self,
        source: &mut R,
        checkpoint: &Checkpoint,
    ) -> Result<Vec<u8>, ExtractError> {
        checkpoint.validate()?;

        if checkpoint.data.len() > WINDOW_SIZE {
            log_or_err!(
                self.options,
                Level::Warn,
                ExtractError::SeedExceedsWindow {
                    id: checkpoint.id,
                    len: checkpoint.data.len(),
                    window: WINDOW_SIZE,
                }
            );
        }

        log::debug!(
            "checkpoint {}: byte {} bit {}, {} seed bytes, {} block bits, {} output bytes",
            checkpoint.id,
            checkpoint.from_byte,
            checkpoint.from_bit,
            checkpoint.len,
            checkpoint.block_len_bits,
            checkpoint.len_out
        );

        let mut margin = self.options.margin_bytes;
        let mut attempt = 0;

        let block = loop {
            // Only the first attempt holds the source to the exact byte count;
            // retries zero-pad the bits left over at source end.
            match self.extract_once(source, checkpoint, margin, attempt == 0) {
                Err(e) if attempt < self.options.retries && e.is_short_input() => {
                    let next = margin
                        .saturating_mul(2)
                        .max(margin.saturating_add(RETRY_MARGIN_STEP));
                    log::debug!(
                        "checkpoint {}: {e} with margin {margin}, retrying with {next}",
                        checkpoint.id
                    );
                    margin = next;
                    attempt += 1;
                }
                result => break result?,
            }
        };

        self.verify(checkpoint, &block)?;

        Ok(block)
    }

    fn extract_once<R: Read + Seek>(
        &self,
        source: &mut R,
        checkpoint: &Checkpoint,
        margin: u64,
        exact: bool,
    ) -> Result<Vec<u8>, ExtractError> {
        let id = checkpoint.id;
        let wanted = checkpoint.bytes_needed(margin)?;
        let expected = checkpoint.max_output_len()?;

        let mut container = PrimingBlock::new(&checkpoint.data, wanted)
            .map_err(|e| ExtractError::corrupt(id, e.to_string()))?;

        source
            .seek(SeekFrom::Start(checkpoint.from_byte))
            .map_err(|source| ExtractError::StreamRead {
                offset: checkpoint.from_byte,
                source,
            })?;

        let mut realigner = BitRealigner::new(BufReader::new(&mut *source), checkpoint.from_bit)
            .map_err(|e| ExtractError::corrupt(id, e.to_string()))?;

        let pulled = if exact {
            realigner.pull(wanted)
        } else {
            realigner.pull_padded(wanted)
        }
        .map_err(|source| ExtractError::StreamRead {
            offset: checkpoint.from_byte.saturating_add(realigner.consumed()),
            source,
        })?;

        log::trace!(
            "checkpoint {id}: pulled {} of {wanted} realigned bytes from {} source bytes",
            pulled.len(),
            realigner.consumed()
        );
        container.append(&pulled);

        let mut out = self
            .inflater
            .inflate(container.as_bytes(), expected)
            .map_err(|source| ExtractError::Decompression { id, source })?;

        if out.len() < expected {
            return Err(ExtractError::Decompression {
                id,
                source: InflateError::Underflow {
                    produced: out.len(),
                    expected,
                },
            });
        }

        let seed_len = container.seed_len();
        if out[..seed_len] != checkpoint.data[..] {
            return Err(ExtractError::Decompression {
                id,
                source: InflateError::SeedMismatch,
            });
        }

        Ok(out.split_off(seed_len))
    }

    fn verify(&self, checkpoint: &Checkpoint, block: &[u8]) -> Result<(), ExtractError> {
        if !self.options.verify_checksum {
            return Ok(());
        }

        let Some(expected) = checkpoint.crc32 else {
            log::debug!("checkpoint {}: no recorded CRC-32", checkpoint.id);
            return Ok(());
        };

        let actual = crc32(block);
        if actual != expected {
            log_or_err!(
                self.options,
                Level::Error,
                ExtractError::ChecksumMismatch {
                    id: checkpoint.id,
                    expected,
                    actual,
                }
            );
        }

        Ok(())
    }
}
