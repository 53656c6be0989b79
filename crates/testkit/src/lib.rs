#![warn(missing_docs)]
//! Test and run instrumentation: metrics reports, tick event logs, replays.

mod metrics;
mod replay;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use voxstream_core::SimTick;

pub use metrics::*;
pub use replay::*;

/// Event record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, P: Serialize> {
    /// Scheduler tick when the event occurred.
    pub tick: SimTick,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Structured payload.
    pub payload: &'a P,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
    lines: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Append an event to the log.
    pub fn write<P: Serialize>(&mut self, event: &EventRecord<'_, P>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Number of events written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush buffered events to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
