//! Keeping a [`DocumentStore`] in step with the resource it was loaded from.
//!
//! The controller owns two deadlines: the next poll of the resource's
//! modification stamp, and a trailing-edge debounced persist. Time is passed
//! in explicitly (`now`), and nothing happens until the owner calls
//! [`SyncController::tick`]. That keeps the controller single-threaded and
//! deterministic; [`crate::driver`] runs one on a worker thread.

use crate::command::Command;
use crate::diff;
use crate::document::SaveDocument;
use crate::error::{Error, Result};
use crate::resource::{ModifiedStamp, SaveResource, content_hash};
use crate::store::DocumentStore;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Timing and policy knobs for a [`SyncController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// How often the resource's modification stamp is checked.
    pub poll_interval: Duration,
    /// Quiet period after the last edit before the document is written back.
    pub debounce: Duration,
    /// Reload on external change and save after edits.
    pub auto_sync: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(500),
            auto_sync: true,
        }
    }
}

/// Builder for a [`SyncController`].
///
/// ```
/// use savefold::{MemoryResource, SyncController};
/// use std::time::Duration;
///
/// let controller = SyncController::<MemoryResource>::builder()
///     .poll_interval(Duration::from_millis(250))
///     .debounce(Duration::from_millis(100))
///     .auto_sync(false)
///     .build();
/// assert!(!controller.auto_sync());
/// assert_eq!(controller.settings().poll_interval, Duration::from_millis(250));
/// ```
pub struct SyncControllerBuilder<R> {
    settings: SyncSettings,
    _resource: PhantomData<R>,
}

impl<R> Default for SyncControllerBuilder<R> {
    fn default() -> Self {
        SyncControllerBuilder {
            settings: SyncSettings::default(),
            _resource: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for SyncControllerBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncControllerBuilder")
            .field("settings", &self.settings)
            .finish()
    }
}

impl<R: SaveResource> SyncControllerBuilder<R> {
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.settings.debounce = debounce;
        self
    }

    pub fn auto_sync(mut self, enabled: bool) -> Self {
        self.settings.auto_sync = enabled;
        self
    }

    pub fn build(self) -> SyncController<R> {
        SyncController::with_settings(self.settings)
    }
}

/// What a call to [`SyncController::tick`] (or a poll) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The debounced persist fired and the write succeeded.
    pub persisted: bool,
    /// An external change was loaded into the store.
    pub reloaded: bool,
    /// An external change was seen but skipped because of local edits.
    pub skipped_dirty: bool,
}

impl TickReport {
    fn merge(self, other: TickReport) -> TickReport {
        TickReport {
            persisted: self.persisted || other.persisted,
            reloaded: self.reloaded || other.reloaded,
            skipped_dirty: self.skipped_dirty || other.skipped_dirty,
        }
    }
}

/// Binds a [`DocumentStore`] to a [`SaveResource`].
///
/// Invariant: polling is active exactly when auto-sync is enabled and a
/// resource is bound.
pub struct SyncController<R> {
    store: DocumentStore,
    resource: Option<R>,
    last_stamp: Option<ModifiedStamp>,
    last_hash: Option<String>,
    settings: SyncSettings,
    next_poll: Option<Instant>,
    pending_persist: Option<Instant>,
}

impl<R: SaveResource> SyncController<R> {
    pub fn new() -> Self {
        Self::with_settings(SyncSettings::default())
    }

    pub fn builder() -> SyncControllerBuilder<R> {
        SyncControllerBuilder::default()
    }

    pub fn with_settings(settings: SyncSettings) -> Self {
        SyncController {
            store: DocumentStore::new(),
            resource: None,
            last_stamp: None,
            last_hash: None,
            settings,
            next_poll: None,
            pending_persist: None,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn document(&self) -> Option<&SaveDocument> {
        self.store.document()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    pub fn auto_sync(&self) -> bool {
        self.settings.auto_sync
    }

    pub fn is_polling(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Whether a debounced persist is scheduled.
    pub fn persist_pending(&self) -> bool {
        self.pending_persist.is_some()
    }

    pub fn last_known_stamp(&self) -> Option<ModifiedStamp> {
        self.last_stamp
    }

    /// The earliest scheduled deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_poll, self.pending_persist) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Read `resource`, load it into the store and bind it.
    ///
    /// # Errors
    ///
    /// [`Error::ResourceAccess`] if reading fails, [`Error::MalformedSaveData`]
    /// if the body is not a valid save. In both cases nothing is bound and the
    /// current document is kept.
    pub fn load_from_resource(&mut self, mut resource: R, now: Instant) -> Result<()> {
        let (bytes, stamp) = resource.read_all()?;
        self.store.load(&bytes)?;
        log::info!("loaded save from {}", resource.describe());

        self.resource = Some(resource);
        self.last_stamp = Some(stamp);
        self.last_hash = Some(content_hash(&bytes));
        self.pending_persist = None;
        self.reconcile_polling(now);
        Ok(())
    }

    /// Load a body that did not come from the bound resource (a file picked
    /// without a handle). The binding, if any, is left alone.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.store.load(bytes)?;
        self.pending_persist = None;
        Ok(())
    }

    /// Unbind the resource. Stops polling and drops a pending persist.
    pub fn unbind_resource(&mut self) -> Option<R> {
        let resource = self.resource.take();
        self.last_stamp = None;
        self.last_hash = None;
        self.pending_persist = None;
        self.next_poll = None;
        resource
    }

    /// Apply an edit to the store and schedule the debounced persist.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<()> {
        self.edit(now, |store| store.apply(command))
    }

    /// Run a closure against the store as one edit.
    ///
    /// The closure works on a copy of the store, which replaces the live one
    /// only if the closure returns `Ok`. A closure that fails part way leaves
    /// the document and dirty flag as they were. On success, if the store is
    /// dirty afterwards, the debounced persist is (re)scheduled. This is how
    /// the convenience methods on [`DocumentStore`] are driven through the
    /// controller.
    pub fn edit<T>(
        &mut self,
        now: Instant,
        f: impl FnOnce(&mut DocumentStore) -> Result<T>,
    ) -> Result<T> {
        let mut draft = self.store.clone();
        let out = f(&mut draft)?;
        self.store = draft;
        if self.store.is_dirty() {
            self.schedule_persist(now);
        }
        Ok(out)
    }

    /// Override the dirty flag. Clearing it cancels a pending persist.
    pub fn mark_dirty(&mut self, dirty: bool, now: Instant) -> Result<()> {
        self.store.mark_dirty(dirty)?;
        if dirty {
            self.schedule_persist(now);
        } else {
            self.pending_persist = None;
        }
        Ok(())
    }

    /// Drop the document and the binding. Only the auto-sync preference survives.
    pub fn reset(&mut self) {
        self.store.reset();
        self.unbind_resource();
    }

    /// Enable or disable auto-sync and start or stop polling to match.
    /// Disabling also cancels a pending persist.
    pub fn set_auto_sync(&mut self, enabled: bool, now: Instant) {
        self.settings.auto_sync = enabled;
        if !enabled {
            self.pending_persist = None;
        } else if self.store.is_dirty() {
            self.schedule_persist(now);
        }
        self.reconcile_polling(now);
    }

    /// Start polling. A no-op if already polling, or if auto-sync is off or
    /// no resource is bound.
    pub fn start_polling(&mut self, now: Instant) {
        if self.next_poll.is_some() {
            return;
        }
        if !self.settings.auto_sync || self.resource.is_none() {
            log::debug!("not starting polling: auto-sync off or no resource bound");
            return;
        }
        log::debug!("polling started");
        self.next_poll = Some(now + self.settings.poll_interval);
    }

    /// Stop polling. A scheduled persist is not affected.
    pub fn stop_polling(&mut self) {
        if self.next_poll.take().is_some() {
            log::debug!("polling stopped");
        }
    }

    /// Write the document to the bound resource.
    ///
    /// # Errors
    ///
    /// [`Error::NoDocumentLoaded`], [`Error::NoFileHandle`], or
    /// [`Error::ResourceAccess`] if the write fails (the store stays dirty).
    pub fn persist(&mut self) -> Result<()> {
        let bytes = self.store.serialize()?;
        let resource = self.resource.as_mut().ok_or(Error::NoFileHandle)?;
        let stamp = resource.write_all(&bytes)?;
        log::info!("saved {}", resource.describe());

        self.last_stamp = Some(stamp);
        self.last_hash = Some(content_hash(&bytes));
        self.pending_persist = None;
        // Cannot fail: serialize() above proved a document is loaded.
        let _ = self.store.mark_dirty(false);
        Ok(())
    }

    /// Fire whatever is due at `now`: the debounced persist first, then the
    /// poll. Failures are logged and do not stop future ticks.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        if self.pending_persist.is_some_and(|due| due <= now) {
            self.pending_persist = None;
            match self.persist() {
                Ok(()) => report.persisted = true,
                Err(e) => log::warn!("auto-save failed: {e}"),
            }
        }

        if self.next_poll.is_some_and(|due| due <= now) {
            self.next_poll = Some(now + self.settings.poll_interval);
            report = report.merge(self.poll_once());
        }

        report
    }

    /// Check the resource right away, e.g. after a file-system notification.
    /// Does nothing unless polling is active.
    pub fn check_external(&mut self, now: Instant) -> TickReport {
        if self.next_poll.is_none() {
            return TickReport::default();
        }
        self.next_poll = Some(now + self.settings.poll_interval);
        self.poll_once()
    }

    fn poll_once(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let Some(resource) = self.resource.as_mut() else {
            return report;
        };

        let stamp = match resource.modified() {
            Ok(stamp) => stamp,
            Err(e) => {
                log::warn!("checking {} failed: {e}", resource.describe());
                return report;
            }
        };
        if Some(stamp) == self.last_stamp {
            return report;
        }

        if self.store.is_dirty() {
            // Retried on every poll until the local edits are saved.
            log::debug!(
                "{} changed externally; keeping unsaved local edits",
                resource.describe()
            );
            report.skipped_dirty = true;
            return report;
        }

        let (bytes, read_stamp) = match resource.read_all() {
            Ok(read) => read,
            Err(e) => {
                log::warn!("reading {} failed: {e}", resource.describe());
                return report;
            }
        };

        let hash = content_hash(&bytes);
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            log::debug!("{} touched without content change", resource.describe());
            self.last_stamp = Some(read_stamp);
            return report;
        }

        let name = resource.describe();
        let previous = self.store.document().cloned();
        match self.store.load(&bytes) {
            Ok(doc) => {
                let changed = match &previous {
                    Some(old) => diff::describe(&diff::changed_sections(old, doc)),
                    None => "everything".to_string(),
                };
                log::info!("reloaded {name} after external change ({changed})");
                self.last_stamp = Some(read_stamp);
                self.last_hash = Some(hash);
                report.reloaded = true;
            }
            Err(e) => log::warn!("ignoring external change to {name}: {e}"),
        }
        report
    }

    fn schedule_persist(&mut self, now: Instant) {
        if self.settings.auto_sync && self.resource.is_some() {
            self.pending_persist = Some(now + self.settings.debounce);
        }
    }

    fn reconcile_polling(&mut self, now: Instant) {
        if self.settings.auto_sync && self.resource.is_some() {
            self.start_polling(now);
        } else {
            self.stop_polling();
        }
    }
}

impl<R: SaveResource> Default for SyncController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SaveResource> std::fmt::Debug for SyncController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("resource", &self.resource.as_ref().map(|r| r.describe()))
            .field("dirty", &self.store.is_dirty())
            .field("last_stamp", &self.last_stamp)
            .field("settings", &self.settings)
            .field("polling", &self.is_polling())
            .field("persist_pending", &self.persist_pending())
            .finish()
    }
}
