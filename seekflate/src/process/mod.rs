/// Block extraction from checkpoints.
///
/// Provides the [`BlockExtractor`](extract::BlockExtractor), which combines a
/// checkpoint, the realigned block bits and a synthetic priming block into a
/// decompressible buffer and trims the result to the requested block.
pub mod extract;

/// Raw DEFLATE decompression with an output cap.
///
/// Provides the [`RawInflate`](inflate::RawInflate) seam and its `flate2`
/// implementation.
pub mod inflate;

/// Bit realignment of byte streams.
///
/// Provides the [`BitRealigner`](realign::BitRealigner), which shifts a stream
/// starting at a sub-byte offset back to byte alignment.
pub mod realign;
