use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use indicatif::{HumanBytes, HumanDuration, MultiProgress, ProgressBar, ProgressStyle};
use seekflate::process::extract::BlockExtractor;
use seekflate::store::CheckpointStore;
use seekflate::store::sqlite::SqliteStore;
use seekflate::utils::errors::ExtractError;

use super::command::{Cli, VerifyArgs};

pub fn cmd_verify(args: &VerifyArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Verifying {} against {}",
        args.source.display(),
        args.checkpoints.display()
    );

    let store = SqliteStore::open(&args.checkpoints).with_context(|| {
        format!("opening checkpoint database {}", args.checkpoints.display())
    })?;
    let file = File::open(&args.source)
        .with_context(|| format!("opening source stream {}", args.source.display()))?;
    let mut source = BufReader::new(file);

    let ids = store.ids()?;
    let pb = multi.map(|multi| create_progress_bar(multi, ids.len() as u64)).transpose()?;

    let extractor = BlockExtractor::new(cli.extract_options());
    let mut tally = Tally::default();
    let start = Instant::now();

    for id in ids {
        let result = store
            .get(id)
            .map_err(ExtractError::from)
            .and_then(|checkpoint| {
                let checkpoint = checkpoint.ok_or(ExtractError::CheckpointNotFound(id))?;
                let checked = checkpoint.crc32.is_some() && extractor.options().verify_checksum;
                extractor
                    .extract(&mut source, &checkpoint)
                    .map(|block| (block.len(), checked))
            });

        match result {
            Ok((len, checked)) => {
                tally.bytes += len as u64;
                if checked {
                    tally.verified += 1;
                } else {
                    tally.unchecked += 1;
                }
            }
            Err(e) => {
                if cli.strict {
                    if let Some(pb) = &pb {
                        pb.finish_and_clear();
                    }
                    return Err(e).with_context(|| format!("verifying block {id}"));
                }
                log::error!("Block {id}: {e}");
                tally.failed += 1;
            }
        }

        if let Some(pb) = &pb {
            pb.inc(1);
            pb.set_message(format!("{} extracted", HumanBytes(tally.bytes)));
        }
    }

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    tally.display(start);

    if tally.failed > 0 {
        bail!("{} of {} blocks failed", tally.failed, tally.total());
    }

    Ok(())
}

fn create_progress_bar(multi: &MultiProgress, total: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} blocks ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("opening source");

    Ok(pb)
}

#[derive(Default)]
struct Tally {
    verified: usize,
    unchecked: usize,
    failed: usize,
    bytes: u64,
}

impl Tally {
    fn total(&self) -> usize {
        self.verified + self.unchecked + self.failed
    }

    fn display(&self, start: Instant) {
        println!("Verification Summary");
        println!("  Blocks                    {}", self.total());
        println!("  CRC-32 verified           {}", self.verified);
        println!("  Without CRC-32            {}", self.unchecked);
        println!("  Failed                    {}", self.failed);
        println!("  Extracted                 {}", HumanBytes(self.bytes));
        println!("  Elapsed                   {}", HumanDuration(start.elapsed()));
        println!();
    }
}
