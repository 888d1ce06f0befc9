//! Compressed history of save bodies replaced by writes.
//!
//! Each backup is one JSON line appended to the archive as its own zstd
//! frame. Reading decompresses all concatenated frames as one stream.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// A save body as it was just before being overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Milliseconds since the Unix epoch when the body was replaced.
    pub replaced_at: u64,
    /// The replaced body, verbatim (lossily decoded if it was not UTF-8).
    pub content: String,
}

/// Append `previous` to the archive at `archive_path`, creating it if needed.
pub fn append_backup(archive_path: &Path, previous: &[u8]) -> io::Result<()> {
    let record = BackupRecord {
        replaced_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
        content: String::from_utf8_lossy(previous).into_owned(),
    };
    let mut line = serde_json::to_vec(&record)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(archive_path)?;
    let mut encoder = zstd::Encoder::new(file, 3)?;
    encoder.write_all(&line)?;
    let file = encoder.finish()?;
    file.sync_data()?;
    Ok(())
}

/// Read every backup, oldest first. A missing archive has no backups.
pub fn read_backups(archive_path: &Path) -> io::Result<Vec<BackupRecord>> {
    if !archive_path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(archive_path)?;
    let reader = BufReader::new(zstd::Decoder::new(file)?);

    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        records.push(record);
    }
    Ok(records)
}
