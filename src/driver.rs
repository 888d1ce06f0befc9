//! Running a [`SyncController`] on its own thread.
//!
//! The worker owns the controller and handles one message at a time, so
//! edits, poll ticks and debounced saves never interleave. Between messages
//! it sleeps until the controller's next deadline. If the bound resource is a
//! file, a [`FileWatcher`] wakes the worker early when the file is touched.

use crate::command::Command;
use crate::document::SaveDocument;
use crate::error::{Error, Result};
use crate::resource::SaveResource;
use crate::stats::AreaStatistics;
use crate::store::DocumentStore;
use crate::sync::SyncController;
use crate::watch::FileWatcher;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

type EditFn = Box<dyn FnOnce(&mut DocumentStore) -> Result<()> + Send>;
type Reply<T> = Sender<Result<T>>;

enum Message<R> {
    Load(R, Reply<()>),
    LoadBytes(Vec<u8>, Reply<()>),
    Apply(Command, Reply<()>),
    Edit(EditFn, Reply<()>),
    MarkDirty(bool, Reply<()>),
    SetAutoSync(bool, Reply<()>),
    Persist(Reply<()>),
    Reset(Reply<()>),
    Status(Reply<SyncStatus>),
    ExternalChange,
    Shutdown,
}

/// A point-in-time view of the worker's state.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub document: Option<SaveDocument>,
    pub statistics: Option<AreaStatistics>,
    pub dirty: bool,
    pub auto_sync: bool,
    pub polling: bool,
    pub persist_pending: bool,
}

/// Client side of a running sync worker.
///
/// Dropping the handle stops the worker.
pub struct SyncHandle<R> {
    tx: Sender<Message<R>>,
    worker: Option<JoinHandle<SyncController<R>>>,
}

/// Move `controller` onto a new worker thread.
///
/// # Errors
///
/// [`Error::ResourceAccess`] if the thread cannot be spawned.
pub fn spawn<R>(controller: SyncController<R>) -> Result<SyncHandle<R>>
where
    R: SaveResource + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let wake = tx.clone();
    let worker = thread::Builder::new()
        .name("savefold-sync".to_string())
        .spawn(move || run(controller, rx, wake))?;
    Ok(SyncHandle {
        tx,
        worker: Some(worker),
    })
}

impl<R: SaveResource + Send + 'static> SyncHandle<R> {
    /// Load from `resource` and bind it.
    pub fn load(&self, resource: R) -> Result<()> {
        self.request(|reply| Message::Load(resource, reply))
    }

    /// Load a body without binding a resource.
    pub fn load_bytes(&self, bytes: Vec<u8>) -> Result<()> {
        self.request(|reply| Message::LoadBytes(bytes, reply))
    }

    pub fn apply(&self, command: Command) -> Result<()> {
        self.request(|reply| Message::Apply(command, reply))
    }

    /// Run `f` against the store on the worker as a single edit. Nothing
    /// sticks if `f` fails.
    pub fn edit(
        &self,
        f: impl FnOnce(&mut DocumentStore) -> Result<()> + Send + 'static,
    ) -> Result<()> {
        self.request(|reply| Message::Edit(Box::new(f), reply))
    }

    pub fn mark_dirty(&self, dirty: bool) -> Result<()> {
        self.request(|reply| Message::MarkDirty(dirty, reply))
    }

    pub fn set_auto_sync(&self, enabled: bool) -> Result<()> {
        self.request(|reply| Message::SetAutoSync(enabled, reply))
    }

    /// Save now instead of waiting for the debounce.
    pub fn persist(&self) -> Result<()> {
        self.request(Message::Persist)
    }

    pub fn reset(&self) -> Result<()> {
        self.request(Message::Reset)
    }

    pub fn status(&self) -> Result<SyncStatus> {
        self.request(Message::Status)
    }

    /// Stop the worker and take the controller back.
    pub fn shutdown(mut self) -> Result<SyncController<R>> {
        let _ = self.tx.send(Message::Shutdown);
        let worker = self.worker.take().ok_or(Error::DriverStopped)?;
        worker.join().map_err(|_| Error::DriverStopped)
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Message<R>) -> Result<T> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| Error::DriverStopped)?;
        reply_rx.recv().map_err(|_| Error::DriverStopped)?
    }
}

impl<R> Drop for SyncHandle<R> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Message::Shutdown);
            let _ = worker.join();
        }
    }
}

fn run<R>(
    mut controller: SyncController<R>,
    rx: Receiver<Message<R>>,
    wake: Sender<Message<R>>,
) -> SyncController<R>
where
    R: SaveResource + Send + 'static,
{
    let mut watcher: Option<FileWatcher> = None;
    sync_watcher(&controller, &mut watcher, &wake);

    loop {
        let received = match controller.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(msg) => Some(msg),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            },
        };

        let now = Instant::now();
        if let Some(msg) = received {
            if !handle(&mut controller, msg, now) {
                break;
            }
            sync_watcher(&controller, &mut watcher, &wake);
        }
        controller.tick(now);
    }

    log::debug!("sync worker stopped");
    controller
}

/// Returns `false` when the worker should stop.
fn handle<R: SaveResource>(
    controller: &mut SyncController<R>,
    msg: Message<R>,
    now: Instant,
) -> bool {
    match msg {
        Message::Load(resource, reply) => {
            let _ = reply.send(controller.load_from_resource(resource, now));
        }
        Message::LoadBytes(bytes, reply) => {
            let _ = reply.send(controller.load_bytes(&bytes));
        }
        Message::Apply(command, reply) => {
            let _ = reply.send(controller.apply(command, now));
        }
        Message::Edit(f, reply) => {
            let _ = reply.send(controller.edit(now, f));
        }
        Message::MarkDirty(dirty, reply) => {
            let _ = reply.send(controller.mark_dirty(dirty, now));
        }
        Message::SetAutoSync(enabled, reply) => {
            controller.set_auto_sync(enabled, now);
            let _ = reply.send(Ok(()));
        }
        Message::Persist(reply) => {
            let _ = reply.send(controller.persist());
        }
        Message::Reset(reply) => {
            controller.reset();
            let _ = reply.send(Ok(()));
        }
        Message::Status(reply) => {
            let store = controller.store();
            let _ = reply.send(Ok(SyncStatus {
                document: store.document().cloned(),
                statistics: store.statistics(),
                dirty: store.is_dirty(),
                auto_sync: controller.auto_sync(),
                polling: controller.is_polling(),
                persist_pending: controller.persist_pending(),
            }));
        }
        Message::ExternalChange => {
            controller.check_external(now);
        }
        Message::Shutdown => return false,
    }
    true
}

/// Keep the watcher pointed at the bound file while polling is active.
fn sync_watcher<R: SaveResource + Send + 'static>(
    controller: &SyncController<R>,
    watcher: &mut Option<FileWatcher>,
    wake: &Sender<Message<R>>,
) {
    let wanted: Option<PathBuf> = controller
        .is_polling()
        .then(|| controller.resource().and_then(|r| r.watch_path()))
        .flatten()
        .map(|p| p.to_path_buf());

    let current = watcher.as_ref().map(|w| w.path().to_path_buf());
    if wanted == current {
        return;
    }

    *watcher = None;
    if let Some(path) = wanted {
        let wake = wake.clone();
        let on_change = move || {
            let _ = wake.send(Message::ExternalChange);
        };
        match FileWatcher::new(&path, on_change) {
            Ok(w) => *watcher = Some(w),
            Err(e) => log::warn!(
                "cannot watch {}: {e}; relying on polling alone",
                path.display()
            ),
        }
    }
}
