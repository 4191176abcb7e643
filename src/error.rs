use std::io;
use thiserror::Error;

/// Errors raised by the windowed buffer core.
///
/// None of these end the session: the presentation layer turns them into a
/// status message (or, for `StaleLoad`, drops them on the floor).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A window-relative row outside `[0, len)` was addressed.
    #[error("row {row} is not resident in the window")]
    OutOfWindow { row: usize },

    #[error("column {col} is past the end of row {row}")]
    ColumnOutOfRange { row: usize, col: usize },

    /// The background rebuild could not read the document.
    #[error("load failed: {0}")]
    LoadFailed(String),

    /// Re-reading or rewriting the document failed; dirty lines are kept.
    #[error("save failed: {0}")]
    SaveFailed(#[source] io::Error),

    /// A rebuild finished after a newer one was requested.
    #[error("discarded stale load (generation {generation})")]
    StaleLoad { generation: u64 },

    #[error("busy loading, try again when the window is ready")]
    Busy,

    #[error("window has unsaved lines, save (^O) before scrolling away")]
    WindowDirty,

    /// A split would push the window past its capacity and every row it
    /// could drop holds unsaved text.
    #[error("window is full of unsaved lines, save (^O) first")]
    WindowFull,
}

impl CoreError {
    /// Whether the error should reach the user at all.
    pub fn is_silent(&self) -> bool {
        matches!(self, CoreError::StaleLoad { .. })
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
