use std::fs::File;
use std::io::{Read, Seek, Write};

use anyhow::{Context, Result, bail};
use seekflate::process::extract::BlockExtractor;
use seekflate::store::CheckpointStore;
use seekflate::store::sqlite::SqliteStore;
use seekflate::utils::errors::ExtractError;

use super::command::{Cli, ExtractArgs};
use crate::output::OutputWriter;

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli) -> Result<()> {
    let (Some(source_path), Some(checkpoints_path), Some(block_id)) =
        (&args.source, &args.checkpoints, args.block_id)
    else {
        bail!("SOURCE, CHECKPOINTS and BLOCK_ID are required");
    };

    let store = SqliteStore::open(checkpoints_path).with_context(|| {
        format!("opening checkpoint database {}", checkpoints_path.display())
    })?;
    let mut source = File::open(source_path)
        .with_context(|| format!("opening source stream {}", source_path.display()))?;

    let extractor = BlockExtractor::new(cli.extract_options());

    extract_block(&extractor, &store, &mut source, block_id, || {
        OutputWriter::new(args.output.as_deref())
    })?;

    Ok(())
}

/// Extracts `block_id` and writes it to the output returned by `open_output`.
///
/// A missing checkpoint is reported on stderr and is not an error; the output
/// is only opened once the whole block is in hand. Returns the number of bytes
/// written, or `None` when the block does not exist.
fn extract_block<S, R, W, F>(
    extractor: &BlockExtractor,
    store: &S,
    source: &mut R,
    block_id: i64,
    open_output: F,
) -> Result<Option<usize>>
where
    S: CheckpointStore,
    R: Read + Seek,
    W: Write,
    F: FnOnce() -> Result<W>,
{
    let block = match extractor.extract_by_id(store, source, block_id) {
        Ok(block) => block,
        Err(ExtractError::CheckpointNotFound(id)) => {
            eprintln!("No checkpoint found with id {id}");
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("extracting block {block_id}")),
    };

    let mut output = open_output()?;
    output.write_all(&block)?;
    output.flush()?;

    log::info!("Extracted block {block_id}: {} bytes", block.len());

    Ok(Some(block.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seekflate::store::memory::MemoryStore;
    use seekflate::structs::checkpoint::Checkpoint;
    use std::io::Cursor;

    /// A final stored block holding `payload`, plus one byte of slack.
    fn stored_stream(payload: &[u8]) -> Vec<u8> {
        let len = payload.len() as u16;
        let mut stream = vec![0x01];
        stream.extend_from_slice(&len.to_le_bytes());
        stream.extend_from_slice(&(!len).to_le_bytes());
        stream.extend_from_slice(payload);
        stream.push(0x00);
        stream
    }

    fn store_for(payload: &[u8]) -> MemoryStore {
        let bits = (5 + payload.len() as u64) * 8;
        [Checkpoint::new(1, 0, 0, Vec::new(), bits, payload.len())]
            .into_iter()
            .collect()
    }

    #[test]
    fn writes_block_to_output() {
        let stream = stored_stream(b"hello block");
        let store = store_for(b"hello block");
        let mut written = Vec::new();

        let len = extract_block(
            &BlockExtractor::default(),
            &store,
            &mut Cursor::new(&stream),
            1,
            || Ok(&mut written),
        )
        .unwrap();

        assert_eq!(len, Some(11));
        assert_eq!(written, b"hello block");
    }

    #[test]
    fn missing_block_succeeds_without_output() {
        let stream = stored_stream(b"hello block");
        let store = store_for(b"hello block");
        let mut opened = false;

        let len = extract_block(
            &BlockExtractor::default(),
            &store,
            &mut Cursor::new(&stream),
            7,
            || {
                opened = true;
                Ok(Vec::new())
            },
        )
        .unwrap();

        assert_eq!(len, None);
        assert!(!opened);
    }

    #[test]
    fn failed_extraction_opens_no_output() {
        let stream = stored_stream(b"hello block");
        let mut checkpoint = Checkpoint::new(1, 0, 0, Vec::new(), 128, 11);
        checkpoint.len = 3;
        let store: MemoryStore = [checkpoint].into_iter().collect();
        let mut opened = false;

        let result = extract_block(
            &BlockExtractor::default(),
            &store,
            &mut Cursor::new(&stream),
            1,
            || {
                opened = true;
                Ok(Vec::new())
            },
        );

        assert!(result.is_err());
        assert!(!opened);
    }
}
