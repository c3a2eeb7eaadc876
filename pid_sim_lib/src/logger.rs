//! Comma-separated trajectory log, one row per simulation tick.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::TickRecord;

/// Column layout of the trajectory log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVariant {
    /// `time,reference,output,control`
    #[default]
    Basic,
    /// `time,reference,output,u_sat,u_unsat,integrator,disturbance`
    Disturbance,
}

impl LogVariant {
    pub fn header(&self) -> &'static str {
        match self {
            LogVariant::Basic => "time,reference,output,control",
            LogVariant::Disturbance => "time,reference,output,u_sat,u_unsat,integrator,disturbance",
        }
    }
}

impl std::fmt::Display for LogVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogVariant::Basic => write!(f, "basic"),
            LogVariant::Disturbance => write!(f, "disturbance"),
        }
    }
}

/// Append-only writer for [`TickRecord`] rows
pub struct TrajectoryLogger<W: Write> {
    writer: W,
    variant: LogVariant,
    rows: usize,
}

impl TrajectoryLogger<BufWriter<File>> {
    /// Create (or truncate) the log file and write the header
    pub fn create(path: impl AsRef<Path>, variant: LogVariant) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .wrap_err_with(|| format!("Failed to create log file {}", path.display()))?;
        Self::new(BufWriter::new(file), variant)
    }
}

impl<W: Write> TrajectoryLogger<W> {
    pub fn new(mut writer: W, variant: LogVariant) -> Result<Self> {
        writeln!(writer, "{}", variant.header())?;
        Ok(Self {
            writer,
            variant,
            rows: 0,
        })
    }

    pub fn write_record(&mut self, record: &TickRecord) -> Result<()> {
        match self.variant {
            LogVariant::Basic => writeln!(
                self.writer,
                "{},{},{},{}",
                record.time, record.reference, record.output, record.u_sat
            )?,
            LogVariant::Disturbance => writeln!(
                self.writer,
                "{},{},{},{},{},{},{}",
                record.time,
                record.reference,
                record.output,
                record.u_sat,
                record.u_unsat,
                record.integrator,
                record.disturbance
            )?,
        }
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far (header excluded)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
