//! The queue statistics CSV loaded into the warehouse.

use crate::github::RepoQueue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const QUEUE_STAT_COLUMNS: [&str; 5] = [
    "repository_owner",
    "repository_name",
    "queued",
    "in_progress",
    "timestamp",
];

/// One queue sample for one repository. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStat {
    pub repository_owner: String,
    pub repository_name: String,
    pub queued: u64,
    pub in_progress: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&RepoQueue> for QueueStat {
    fn from(queue: &RepoQueue) -> Self {
        QueueStat {
            repository_owner: queue.owner.clone(),
            repository_name: queue.repo.clone(),
            queued: queue.queued,
            in_progress: queue.in_progress,
            timestamp: queue.timestamp,
        }
    }
}

/// CSV writer for [`QueueStat`] rows. The header is written up front so an
/// empty run still produces a loadable file.
pub struct QueueStatWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl QueueStatWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> QueueStatWriter<W> {
    pub fn new(writer: W) -> Result<Self, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(QUEUE_STAT_COLUMNS)?;
        Ok(QueueStatWriter { writer, rows: 0 })
    }

    pub fn write(&mut self, stat: &QueueStat) -> Result<(), csv::Error> {
        self.writer.serialize(stat)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), csv::Error> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, csv::Error> {
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}
