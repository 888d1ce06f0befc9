//! In-memory model of a tower-defense save file, with reducer-style edits and
//! live synchronization against the file on disk.
//!
//! - [`DocumentStore`] holds the loaded [`SaveDocument`] and applies
//!   [`Command`]s through the pure [`command::reduce`] fold.
//! - [`SyncController`] binds the store to a [`SaveResource`]: it reloads on
//!   external change unless there are unsaved edits, and writes edits back
//!   after a debounce.
//! - [`driver::spawn`] runs a controller on a worker thread.

pub mod archive;
pub mod area;
pub mod command;
pub mod diff;
pub mod document;
pub mod driver;
mod error;
pub mod faction;
pub mod resource;
pub mod stats;
mod store;
pub mod sync;
pub mod watch;
pub mod wave;

pub use area::{Accessibility, AreaCell, AreaDetails, CombatStats, ConstructionMode};
pub use command::{Command, KingsPatch, WaveDataPatch};
pub use document::{
    Blessing, BlessingOffset, HandCards, Kings, Policy, PolicyList, PolicyValue, PolicyVariables,
    SaveDocument, WaveData,
};
pub use driver::{SyncHandle, SyncStatus};
pub use error::{Error, Result};
pub use faction::{Faction, FactionId};
pub use resource::{FileResource, MemoryResource, ModifiedStamp, SaveResource};
pub use stats::{AreaStatistics, compute_statistics};
pub use store::DocumentStore;
pub use sync::{SyncController, SyncControllerBuilder, SyncSettings, TickReport};
pub use wave::{WaveEntry, WaveKind};
