//! JSON Lines output of match records.

use crate::error::Result;
use echidna_core::MatchRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes each match record as one JSON line to a file and/or stdout.
#[derive(Debug, Default)]
pub struct RecordSink {
    file: Option<File>,
    stdout: bool,
}

impl RecordSink {
    /// Create a sink. The file, if any, is opened for appending and created
    /// if missing.
    ///
    /// # Errors
    /// Returns error if the output file cannot be opened.
    pub fn new(output_file: Option<&Path>, stdout: bool) -> Result<Self> {
        let file = match output_file {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        Ok(Self { file, stdout })
    }

    /// Whether records go anywhere at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.file.is_some() || self.stdout
    }

    /// Write one record. Each line is flushed immediately so an
    /// interrupted run keeps everything emitted so far.
    ///
    /// # Errors
    /// Returns error if serialization or writing fails.
    pub fn emit(&mut self, record: &MatchRecord) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let line = serde_json::to_string(record)?;

        if self.stdout {
            let mut out = io::stdout().lock();
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{line}")?;
            file.flush()?;
        }
        Ok(())
    }
}
