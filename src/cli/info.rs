use anyhow::{Context, Result};
use seekflate::store::CheckpointStore;
use seekflate::store::sqlite::SqliteStore;
use seekflate::structs::checkpoint::Checkpoint;

use super::command::{Cli, InfoArgs};

pub fn cmd_info(args: &InfoArgs, cli: &Cli) -> Result<()> {
    log::info!("Reading checkpoints: {}", args.checkpoints.display());

    let store = SqliteStore::open(&args.checkpoints).with_context(|| {
        format!("opening checkpoint database {}", args.checkpoints.display())
    })?;

    let ids = store.ids()?;
    if ids.is_empty() {
        println!("No checkpoints recorded in the database.");
        return Ok(());
    }

    let mut summary = Summary::default();

    println!();
    println!("Checkpoints");
    println!("===========");
    println!();
    println!(
        "  {:>6}  {:>14}  {:>14}  {:<13}  {:>10}  {:>10}  {:>6}  {:>8}",
        "id", "from", "to", "type", "bits", "bytes", "seed", "crc32"
    );

    for id in ids {
        let checkpoint = match store.get(id) {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => continue,
            Err(e) => {
                if cli.strict {
                    return Err(e.into());
                }
                log::warn!("Skipping checkpoint {id}: {e}");
                summary.unreadable += 1;
                continue;
            }
        };

        display_checkpoint(&checkpoint);
        summary.add(&checkpoint);
    }

    println!();
    summary.display();

    Ok(())
}

fn display_checkpoint(checkpoint: &Checkpoint) {
    let position = format!("{}.{}", checkpoint.from_byte, checkpoint.from_bit);
    let to_byte = checkpoint
        .to_byte
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    let block_type = checkpoint
        .block_type
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    let crc32 = checkpoint
        .crc32
        .map_or_else(|| "-".to_string(), |v| format!("{v:08x}"));

    println!(
        "  {:>6}  {:>14}  {:>14}  {:<13}  {:>10}  {:>10}  {:>6}  {:>8}",
        checkpoint.id,
        position,
        to_byte,
        block_type,
        checkpoint.block_len_bits,
        checkpoint.len_out,
        checkpoint.len,
        crc32
    );
}

#[derive(Default)]
struct Summary {
    count: usize,
    compressed_bits: u64,
    decompressed_bytes: u64,
    without_crc: usize,
    unreadable: usize,
}

impl Summary {
    fn add(&mut self, checkpoint: &Checkpoint) {
        self.count += 1;
        self.compressed_bits += checkpoint.block_len_bits;
        self.decompressed_bytes += checkpoint.len_out as u64;
        if checkpoint.crc32.is_none() {
            self.without_crc += 1;
        }
    }

    fn display(&self) {
        println!("Summary");
        println!("  Checkpoints               {}", self.count);
        println!(
            "  Compressed size           {} bytes",
            self.compressed_bits.div_ceil(8)
        );
        println!("  Decompressed size         {} bytes", self.decompressed_bytes);

        if self.decompressed_bytes > 0 {
            let ratio = self.compressed_bits as f64 / 8.0 / self.decompressed_bytes as f64;
            println!("  Ratio                     {:.3}", ratio);
        }

        if self.without_crc > 0 {
            println!("  Without CRC-32            {}", self.without_crc);
        }
        if self.unreadable > 0 {
            println!("  Unreadable                {}", self.unreadable);
        }
        println!();
    }
}
