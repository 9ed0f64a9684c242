use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Destination for extracted block bytes, either a file or stdout.
pub struct OutputWriter {
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new OutputWriter for a path
    /// `None` or "-" selects stdout
    pub fn new(output_path: Option<&Path>) -> Result<Self> {
        let writer: Box<dyn Write> = match output_path {
            Some(path) if path.to_string_lossy() != "-" => {
                let file = File::create(path)
                    .with_context(|| format!("creating output file {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            _ => Box::new(io::stdout().lock()),
        };

        Ok(Self { writer })
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
