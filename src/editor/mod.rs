use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Instant;
use tracing::{debug, info};

use crate::buffer::{self, Cursor, Document, Motion, MoveOutcome, Resident, SharedWindow};
use crate::config::Config;
use crate::edit::{EditOperations, EditOutcome};
use crate::error::{CoreError, CoreResult};
use crate::loader::{LoaderResponse, PrefetchLoader, Source};
use crate::persist::{self, SaveOptions, SaveReport};
use crate::search::{Match, SearchState};

/// One open file: the shared window, its loader, and the cursor.
///
/// The session is driven from the foreground loop only. The loader thread
/// touches nothing but the shared `Resident`.
pub struct Session {
    config: Config,
    document: Document,
    shared: SharedWindow,
    loader: PrefetchLoader,
    cursor: Cursor,
    /// Absolute row the cursor goes to once the load in flight publishes
    pending_target: Option<usize>,
    /// Most recent motion received while busy
    deferred: Option<Motion>,
    search: SearchState,
    status: String,
    rows_scanned: Option<usize>,
}

impl Session {
    pub fn open(path: &Path, config: Config) -> CoreResult<Self> {
        let (document, resident) = buffer::open(path, config.cache_size)?;
        info!(
            path = %path.display(),
            total_lines = resident.total_lines,
            resident = resident.window.len(),
            new_file = document.is_new(),
            "opened"
        );

        let status = if document.is_new() {
            format!("{} (new file)", path.display())
        } else {
            path.display().to_string()
        };

        let shared = Arc::new(Mutex::new(resident));
        let loader = PrefetchLoader::new(Arc::clone(&shared), config.cache_size, config.tolerance);

        Ok(Self {
            config,
            document,
            shared,
            loader,
            cursor: Cursor::new(),
            pending_target: None,
            deferred: None,
            search: SearchState::new(),
            status,
            rows_scanned: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    /// Show an error in the status line unless it is one the user never sees
    pub fn report<T>(&mut self, result: CoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                if e.is_silent() {
                    debug!(error = %e, "suppressed");
                } else {
                    self.status = e.to_string();
                }
                None
            }
        }
    }

    /// True while a window rebuild is in flight
    pub fn is_busy(&self) -> bool {
        self.loader.is_busy()
    }

    /// Rows read so far by the rebuild in flight
    pub fn rows_scanned(&self) -> Option<usize> {
        self.rows_scanned
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn shared(&self) -> &SharedWindow {
        &self.shared
    }

    /// Lock the window for drawing without waiting. `None` means the loader
    /// holds it right now and the frame should be skipped.
    pub fn try_resident(&self) -> Option<MutexGuard<'_, Resident>> {
        match self.shared.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        buffer::lock(&self.shared).window.has_dirty()
    }

    /// Absolute `(row, col)` of the cursor
    pub fn absolute_cursor(&self) -> (usize, usize) {
        let resident = buffer::lock(&self.shared);
        (self.cursor.absolute_row(&resident.window), self.cursor.col)
    }

    pub fn move_cursor(&mut self, motion: Motion) -> CoreResult<()> {
        if self.is_busy() {
            self.deferred = Some(motion);
            return Ok(());
        }

        let outcome = {
            let resident = buffer::lock(&self.shared);
            self.cursor.apply(motion, &resident.window, resident.total_lines)
        };

        match outcome {
            MoveOutcome::Reload { target } => self.request_window(target),
            MoveOutcome::Moved | MoveOutcome::Blocked => Ok(()),
        }
    }

    pub fn insert_char(&mut self, ch: char) -> CoreResult<()> {
        self.edit(|resident, cursor| EditOperations::insert_char(resident, cursor, ch))
    }

    pub fn newline(&mut self) -> CoreResult<()> {
        match self.edit(EditOperations::newline) {
            Err(CoreError::WindowFull) => self.make_room(),
            other => other,
        }
    }

    /// The window is at capacity and cannot drop a row without losing
    /// edits. Save (when allowed) so the bottom row becomes droppable and
    /// retry; if the cursor sits on the bottom row itself, recentre the
    /// window on it instead.
    fn make_room(&mut self) -> CoreResult<()> {
        if !self.config.save_before_reload {
            return Err(CoreError::WindowFull);
        }
        self.save()?;

        match self.edit(EditOperations::newline) {
            Err(CoreError::WindowFull) => {
                let (target, _) = self.absolute_cursor();
                debug!(target, "window full, recentring");
                self.request_window(target)
            }
            other => other,
        }
    }

    pub fn backspace(&mut self) -> CoreResult<()> {
        self.edit(EditOperations::backspace)
    }

    pub fn delete_forward(&mut self) -> CoreResult<()> {
        self.edit(EditOperations::delete_forward)
    }

    fn edit(
        &mut self,
        op: impl FnOnce(&mut Resident, &mut Cursor) -> CoreResult<EditOutcome>,
    ) -> CoreResult<()> {
        if self.is_busy() {
            return Err(CoreError::Busy);
        }

        let outcome = {
            let mut resident = buffer::lock(&self.shared);
            op(&mut resident, &mut self.cursor)?
        };

        match outcome {
            EditOutcome::NeedsRow { target } => self.request_window(target),
            EditOutcome::Edited | EditOutcome::Unchanged => Ok(()),
        }
    }

    /// Save to the document's own path
    pub fn save(&mut self) -> CoreResult<SaveReport> {
        let dest = self.document.path().to_path_buf();
        self.save_as(&dest)
    }

    pub fn save_as(&mut self, dest: &Path) -> CoreResult<SaveReport> {
        if self.is_busy() {
            return Err(CoreError::Busy);
        }

        let options = SaveOptions {
            backup: self.config.backup,
        };
        let report = {
            let mut resident = buffer::lock(&self.shared);
            persist::save(&mut resident, &mut self.document, dest, options)?
        };

        self.status = format!("Wrote {} lines", report.lines_written);
        Ok(report)
    }

    /// Run the find command.
    ///
    /// A non-empty entry starts a new search of the window; an empty entry
    /// steps to the next match of the previous search.
    ///
    /// Jumping moves the cursor, so it is refused with `Busy` while a
    /// rebuild is in flight.
    pub fn find(&mut self, entry: &str) -> CoreResult<Option<Match>> {
        if self.is_busy() {
            return Err(CoreError::Busy);
        }

        let found = {
            let resident = buffer::lock(&self.shared);
            if !entry.is_empty() {
                self.search.search(&resident.window, entry);
                self.search.active_match()
            } else if self.search.needle().is_empty() {
                None
            } else if self.search.matches().is_empty() {
                // Results were dropped with the previous window
                let needle = self.search.needle().to_string();
                self.search.search(&resident.window, &needle);
                self.search.active_match()
            } else {
                self.search.next_match()
            }
        };

        match found {
            Some(m) => {
                self.cursor = Cursor::at(m.row, m.col);
                self.search.flash(Instant::now(), self.config.highlight);
                let index = self
                    .search
                    .matches()
                    .iter()
                    .position(|other| *other == m)
                    .unwrap_or(0);
                self.status = format!("Match {} of {}", index + 1, self.search.matches().len());
            }
            None if entry.is_empty() && self.search.needle().is_empty() => {}
            None => self.status = "Not found".to_string(),
        }
        Ok(found)
    }

    /// The match to draw highlighted right now, if any
    pub fn search_highlight(&self, now: Instant) -> Option<(Match, usize)> {
        self.search.highlight(now)
    }

    /// Abandon the rebuild in flight. The current window stays.
    pub fn cancel_load(&mut self) -> bool {
        let cancelled = self.loader.cancel().is_some();
        if cancelled {
            self.pending_target = None;
            self.deferred = None;
            self.rows_scanned = None;
            self.status = "Load cancelled".to_string();
        }
        cancelled
    }

    /// Apply everything the loader has reported since the last call
    pub fn poll(&mut self) {
        while let Some(response) = self.loader.try_recv_response() {
            match response {
                LoaderResponse::Progress {
                    generation,
                    rows_scanned,
                } => {
                    if self.loader.active().map(|r| r.generation) == Some(generation) {
                        self.rows_scanned = Some(rows_scanned);
                    }
                }
                LoaderResponse::Published { request } => {
                    self.search.invalidate();
                    let newest = request.generation == self.loader.latest_generation();
                    {
                        let resident = buffer::lock(&self.shared);
                        match self.pending_target {
                            Some(target) if newest => {
                                self.cursor.place_absolute(&resident.window, target)
                            }
                            _ => self.cursor.clamp(&resident.window),
                        }
                        let anchor = resident.window.anchor();
                        self.status = format!(
                            "Lines {}-{} of {}",
                            anchor + 1,
                            anchor + resident.window.len(),
                            resident.total_lines
                        );
                    }
                    if newest {
                        self.pending_target = None;
                        self.rows_scanned = None;
                        if let Some(motion) = self.deferred.take() {
                            let replayed = self.move_cursor(motion);
                            self.report(replayed);
                        }
                    }
                }
                LoaderResponse::Failed { generation, error } => {
                    if generation == self.loader.latest_generation() {
                        self.pending_target = None;
                        self.deferred = None;
                        self.rows_scanned = None;
                        self.report::<()>(Err(error));
                    }
                }
                LoaderResponse::Cancelled { .. } | LoaderResponse::Stale { .. } => {}
            }
        }
    }

    /// Ask for a window around absolute row `target`.
    ///
    /// A window with unsaved lines is saved first (or, if that is turned off,
    /// kept and the move refused), since the rebuild replaces it wholesale.
    fn request_window(&mut self, target: usize) -> CoreResult<()> {
        if buffer::lock(&self.shared).window.has_dirty() {
            if !self.config.save_before_reload {
                return Err(CoreError::WindowDirty);
            }
            self.save()?;
        }

        let source = Source {
            path: self.document.path().to_path_buf(),
            ending: self.document.format().line_ending,
        };
        self.loader.request(target, source)?;
        self.pending_target = Some(target);
        self.rows_scanned = Some(0);
        self.status = format!("Loading around line {}...", target + 1);
        Ok(())
    }

    pub fn shutdown(self) {
        self.loader.shutdown();
    }
}
