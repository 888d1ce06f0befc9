//! File-system notifications for a single save file.
//!
//! The watcher is only a wake-up hint. Whether the file actually changed is
//! still decided by comparing modification stamps.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Watches one file and calls `on_change` when something touches it.
///
/// The parent directory is watched rather than the file itself, so the watch
/// survives the file being replaced by a rename (which is how
/// [`FileResource`](crate::FileResource) writes).
pub struct FileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn new(path: &Path, on_change: impl Fn() + Send + 'static) -> notify::Result<Self> {
        let target = path.to_path_buf();
        let file_name = target.file_name().map(|n| n.to_os_string());
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if ours {
                        on_change();
                    }
                }
                Err(e) => log::warn!("file watcher error: {e}"),
            },
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        log::debug!("watching {}", target.display());

        Ok(FileWatcher {
            path: target,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").field("path", &self.path).finish()
    }
}
