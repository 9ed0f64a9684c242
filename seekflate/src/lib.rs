#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! DEFLATE decoders normally start at the first bit of a stream, because every
//! block may refer back up to 32 KiB into earlier output. A checkpoint records
//! where a block begins (byte and bit) together with the window contents just
//! before it, which is all a decoder needs to resume there.
//!
//! ### Extraction Pipeline
//!
//! 1. **Lookup**: fetch the [`structs::checkpoint::Checkpoint`] from a
//!    [`store::CheckpointStore`].
//! 2. **Priming**: write a non-final stored block carrying the seed bytes
//!    ([`structs::priming::PrimingBlock`]).
//! 3. **Realignment**: shift the block bits so they start on a byte boundary
//!    ([`process::realign::BitRealigner`]) and append them.
//! 4. **Inflate**: decompress with an output cap of seed plus block length
//!    ([`process::inflate::RawInflate`]).
//! 5. **Trim**: drop the re-derived seed and return the block.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seekflate::process::extract::{BlockExtractor, ExtractOptions};
//! use seekflate::store::sqlite::SqliteStore;
//! use seekflate::utils::errors::ExtractError;
//!
//! let store = SqliteStore::open("archive.checkpoints")?;
//! let mut source = std::fs::File::open("archive.deflate")?;
//!
//! let extractor = BlockExtractor::new(ExtractOptions {
//!     retries: 2,
//!     ..Default::default()
//! });
//!
//! match extractor.extract_by_id(&store, &mut source, 17) {
//!     Ok(block) => println!("{} bytes", block.len()),
//!     Err(ExtractError::CheckpointNotFound(id)) => eprintln!("no checkpoint {id}"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Extraction pipeline.
///
/// - **Extraction** ([`process::extract`]): Checkpoint-driven block extraction
/// - **Realignment** ([`process::realign`]): Sub-byte offset handling
/// - **Inflate** ([`process::inflate`]): Capped raw DEFLATE decompression
pub mod process;

/// Checkpoint storage backends.
///
/// - **SQLite** ([`store::sqlite`]): Tables written by the checkpoint producer
/// - **Memory** ([`store::memory`]): Embedded use and tests
pub mod store;

/// Data structures shared by the pipeline.
///
/// - **Checkpoints** ([`structs::checkpoint`]): Recorded resume points
/// - **Priming** ([`structs::priming`]): Synthetic window-seeding block
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **CRC Validation** ([`utils::crc`]): Block checksums
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
