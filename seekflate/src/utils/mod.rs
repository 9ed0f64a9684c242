//! Utility functions and supporting infrastructure.
//!
//! Provides CRC-32 verification and error types shared by the extraction
//! pipeline and the checkpoint stores.

pub mod crc;
#[cfg(test)]
pub(crate) mod deflate_writer;
pub mod errors;
