use flate2::{Decompress, FlushDecompress, Status};

use crate::utils::errors::InflateError;

/// Raw DEFLATE decompression with a hard output cap.
///
/// Implementations must stop after `max_output_len` bytes even when `input`
/// continues with further blocks, and return whatever was produced when the
/// input runs out early. No preset-dictionary support is assumed; window
/// priming happens through the input itself.
pub trait RawInflate {
    fn inflate(&self, input: &[u8], max_output_len: usize) -> Result<Vec<u8>, InflateError>;
}

/// Output buffer growth step.
const OUTPUT_CHUNK: usize = 64 * 1024;

/// [`RawInflate`] backed by `flate2`.
///
/// The output buffer grows in 64 KiB steps up to the cap, so a large cap
/// costs nothing unless the input really decodes that far.
#[derive(Debug, Default, Clone, Copy)]
pub struct Flate2Inflater;

impl RawInflate for Flate2Inflater {
    fn inflate(&self, input: &[u8], max_output_len: usize) -> Result<Vec<u8>, InflateError> {
        let mut decompress = Decompress::new(false);
        let mut out = Vec::new();
        let mut written = 0;

        while written < max_output_len {
            if written == out.len() {
                let grown = written.saturating_add(OUTPUT_CHUNK).min(max_output_len);
                out.resize(grown, 0);
            }

            let in_before = decompress.total_in();
            let out_before = decompress.total_out();

            let status = decompress.decompress(
                &input[in_before as usize..],
                &mut out[written..],
                FlushDecompress::None,
            )?;
            written = decompress.total_out() as usize;

            if status == Status::StreamEnd {
                break;
            }

            if decompress.total_in() == in_before && decompress.total_out() == out_before {
                log::trace!(
                    "inflate stalled after {} input and {written} output bytes",
                    in_before
                );
                break;
            }
        }

        out.truncate(written);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn output_is_capped() {
        let data: Vec<u8> = b"a quick brown fox ".repeat(200);
        let compressed = deflate(&data);

        let out = Flate2Inflater.inflate(&compressed, 100).unwrap();
        assert_eq!(out, &data[..100]);

        let out = Flate2Inflater.inflate(&compressed, data.len()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn stream_end_before_cap() {
        let compressed = deflate(b"short");
        let out = Flate2Inflater.inflate(&compressed, 1000).unwrap();
        assert_eq!(out, b"short");
    }

    #[test]
    fn truncated_input_returns_partial_output() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 253) as u8).collect();
        let compressed = deflate(&data);

        let out = Flate2Inflater
            .inflate(&compressed[..compressed.len() / 2], data.len())
            .unwrap();
        assert!(out.len() < data.len());
        assert_eq!(out, &data[..out.len()]);
    }

    #[test]
    fn invalid_block_type() {
        // BFINAL=1, BTYPE=11 is reserved.
        let err = Flate2Inflater.inflate(&[0x07, 0x00], 10).unwrap_err();
        assert!(matches!(err, InflateError::Corrupt(_)));
    }

    #[test]
    fn huge_cap_only_holds_decoded_bytes() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 97) as u8).collect();
        let compressed = deflate(&data);

        let out = Flate2Inflater.inflate(&compressed, usize::MAX / 2).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zero_cap() {
        let out = Flate2Inflater.inflate(&deflate(b"abc"), 0).unwrap();
        assert!(out.is_empty());
    }
}
