//! External resources a save document can be bound to.

use crate::archive;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Last-modification time of a resource, in milliseconds since the Unix epoch.
///
/// Only compared for equality and order; the sync controller never does
/// arithmetic on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModifiedStamp(pub u64);

impl ModifiedStamp {
    pub fn from_system_time(t: SystemTime) -> Self {
        let millis = t
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        ModifiedStamp(millis)
    }
}

/// Hex-encoded xxh64 of a resource body, used to tell a touched file from an
/// edited one.
pub fn content_hash(bytes: &[u8]) -> String {
    let hash = xxhash_rust::xxh64::xxh64(bytes, 0);
    format!("{:016x}", hash)
}

/// Something a save document can be read from and written back to.
pub trait SaveResource {
    /// Read the full body along with its current modification stamp.
    fn read_all(&mut self) -> io::Result<(Vec<u8>, ModifiedStamp)>;

    /// Overwrite the body and return the stamp the write produced.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<ModifiedStamp>;

    /// The current modification stamp, without reading the body.
    fn modified(&self) -> io::Result<ModifiedStamp>;

    /// Short human-readable name for log lines.
    fn describe(&self) -> String;

    /// A file-system path that can be watched for changes, if there is one.
    fn watch_path(&self) -> Option<&Path> {
        None
    }
}

/// A save file on disk.
///
/// Writes go to a `.tmp` sibling first, are synced, then renamed over the
/// target, so a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
    backup_archive: Option<PathBuf>,
}

impl FileResource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileResource {
            path: path.as_ref().to_path_buf(),
            backup_archive: None,
        }
    }

    /// Before every write, append the body being replaced to a compressed
    /// backup archive at `archive_path`.
    pub fn with_backups(mut self, archive_path: impl AsRef<Path>) -> Self {
        self.backup_archive = Some(archive_path.as_ref().to_path_buf());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_archive(&self) -> Option<&Path> {
        self.backup_archive.as_deref()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn back_up_current(&self, archive_path: &Path) -> io::Result<()> {
        let previous = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        archive::append_backup(archive_path, &previous)
    }
}

impl SaveResource for FileResource {
    fn read_all(&mut self) -> io::Result<(Vec<u8>, ModifiedStamp)> {
        // Stat before reading. A write landing in between then pairs an old
        // stamp with the new body and shows up again on the next poll.
        let stamp = self.modified()?;
        let bytes = fs::read(&self.path)?;
        Ok((bytes, stamp))
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<ModifiedStamp> {
        if let Some(archive_path) = &self.backup_archive {
            self.back_up_current(archive_path)?;
        }

        let tmp_path = self.tmp_path();
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_data()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        self.modified()
    }

    fn modified(&self) -> io::Result<ModifiedStamp> {
        let mtime = fs::metadata(&self.path)?.modified()?;
        Ok(ModifiedStamp::from_system_time(mtime))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// An in-memory resource with a manual clock.
///
/// Clones share the same buffer, so one clone can be bound to a controller
/// while another plays the part of the game editing the file underneath it.
/// Every write (through either side) advances the stamp by one.
#[derive(Debug, Clone, Default)]
pub struct MemoryResource {
    inner: Arc<Mutex<MemoryInner>>,
    name: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    bytes: Vec<u8>,
    stamp: u64,
    fail_io: bool,
    writes: usize,
}

impl MemoryResource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        MemoryResource {
            inner: Arc::new(Mutex::new(MemoryInner {
                bytes: bytes.into(),
                stamp: 1,
                fail_io: false,
                writes: 0,
            })),
            name: name.into(),
        }
    }

    /// Replace the body from outside the controller, advancing the stamp.
    pub fn write_external(&self, bytes: impl Into<Vec<u8>>) -> ModifiedStamp {
        let mut inner = self.lock();
        inner.bytes = bytes.into();
        inner.stamp += 1;
        ModifiedStamp(inner.stamp)
    }

    /// Advance the stamp without changing the body.
    pub fn touch(&self) -> ModifiedStamp {
        let mut inner = self.lock();
        inner.stamp += 1;
        ModifiedStamp(inner.stamp)
    }

    /// Make every subsequent operation fail with an I/O error (or stop doing so).
    pub fn set_failing(&self, failing: bool) {
        self.lock().fail_io = failing;
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().bytes.clone()
    }

    pub fn stamp(&self) -> ModifiedStamp {
        ModifiedStamp(self.lock().stamp)
    }

    /// How many times the body was written through [`SaveResource::write_all`].
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means a test panicked while holding it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &MemoryInner) -> io::Result<()> {
        if inner.fail_io {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "resource access revoked",
            ));
        }
        Ok(())
    }
}

impl SaveResource for MemoryResource {
    fn read_all(&mut self) -> io::Result<(Vec<u8>, ModifiedStamp)> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok((inner.bytes.clone(), ModifiedStamp(inner.stamp)))
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<ModifiedStamp> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        inner.bytes = bytes.to_vec();
        inner.stamp += 1;
        inner.writes += 1;
        Ok(ModifiedStamp(inner.stamp))
    }

    fn modified(&self) -> io::Result<ModifiedStamp> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok(ModifiedStamp(inner.stamp))
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
