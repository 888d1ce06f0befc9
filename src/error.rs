use std::io;
use thiserror::Error;

/// Errors returned by the document store, the sync controller and the driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The bytes could not be parsed as a save document, or the parsed
    /// document does not have the expected shape.
    #[error("malformed save data: {reason}")]
    MalformedSaveData { reason: String },

    /// A command was issued before any document was loaded.
    #[error("no save document loaded")]
    NoDocumentLoaded,

    /// A positional command referenced an entry outside the sequence.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A persist was requested but no resource is bound.
    #[error("no file handle bound")]
    NoFileHandle,

    /// A replacement area grid does not cover the 5x5 board exactly once.
    #[error("invalid area grid: {reason}")]
    InvalidAreaGrid { reason: String },

    /// A cell-addressed command named a coordinate outside [-2, 2].
    #[error("coordinate ({x}, {y}) is outside the grid")]
    CoordinateOutOfRange { x: i32, y: i32 },

    /// Reading, writing or stat-ing the external resource failed.
    #[error("resource access failed: {0}")]
    ResourceAccess(#[from] io::Error),

    /// The sync driver thread has exited.
    #[error("sync driver stopped")]
    DriverStopped,
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedSaveData {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::malformed(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
