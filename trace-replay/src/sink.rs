//! Run output sinks

use anyhow::{Context, Result};
use script_runner::RunOutput;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for finished runs
pub trait RunSink {
    fn publish(&mut self, output: &RunOutput) -> Result<()>;
}

/// Writes each run as one JSON document followed by a newline
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonSink<BufWriter<File>> {
    /// Sink writing to a newly created file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RunSink for JsonSink<W> {
    fn publish(&mut self, output: &RunOutput) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, output)?;
        } else {
            serde_json::to_writer(&mut self.writer, output)?;
        }
        writeln!(self.writer)?;
        self.writer.flush().context("Failed to flush run output")?;

        tracing::debug!("Published run {}", output.run_id);
        Ok(())
    }
}
