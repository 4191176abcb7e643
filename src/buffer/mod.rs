pub mod cursor;
pub mod document;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{CoreError, CoreResult};

pub use cursor::{Cursor, Motion, MoveOutcome};
pub use document::{Document, Format, LineEnding};

/// Default number of lines kept resident
pub const CACHE_SIZE: usize = 100;

/// The resident slice of a document.
///
/// `lines`, `dirty` and `origin` always have the same length. `origin[i]` is
/// the on-disk row `lines[i]` was read from (`None` for rows created by a
/// split), and `extent` is how many on-disk rows starting at `anchor` the
/// window stands in for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    anchor: usize,
    capacity: usize,
    lines: Vec<String>,
    dirty: Vec<bool>,
    origin: Vec<Option<usize>>,
    extent: usize,
}

impl Window {
    /// Build a clean window over rows `anchor..anchor + lines.len()`
    pub fn from_rows(anchor: usize, mut lines: Vec<String>, capacity: usize) -> Self {
        lines.truncate(capacity);
        let len = lines.len();
        Self {
            anchor,
            capacity,
            dirty: vec![false; len],
            origin: (anchor..anchor + len).map(Some).collect(),
            lines,
            extent: len,
        }
    }

    /// The single empty line shown for an empty or missing file.
    /// It stands in for no on-disk row.
    pub fn synthetic(capacity: usize) -> Self {
        Self {
            anchor: 0,
            capacity,
            lines: vec![String::new()],
            dirty: vec![false],
            origin: vec![None],
            extent: 0,
        }
    }

    /// First row of a window centred on `target_row`
    pub fn start_for(target_row: usize, capacity: usize) -> usize {
        target_row.saturating_sub(capacity / 2)
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.dirty.get(row).copied().unwrap_or(false)
    }

    pub fn dirty_flags(&self) -> &[bool] {
        &self.dirty
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    pub fn has_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    pub fn origin(&self, row: usize) -> Option<usize> {
        self.origin.get(row).copied().flatten()
    }

    /// True while row `i` still mirrors disk row `anchor + i` for every row,
    /// i.e. nothing was split or joined since the window was loaded or saved.
    pub fn is_aligned(&self) -> bool {
        self.lines.len() == self.extent
            && self
                .origin
                .iter()
                .enumerate()
                .all(|(i, origin)| *origin == Some(self.anchor + i))
    }

    /// Whether absolute row `row` is currently resident
    pub fn contains_absolute(&self, row: usize) -> bool {
        row >= self.anchor && row < self.anchor + self.lines.len()
    }

    pub fn line_at(&self, row: usize) -> CoreResult<&str> {
        self.lines
            .get(row)
            .map(String::as_str)
            .ok_or(CoreError::OutOfWindow { row })
    }

    /// Length of a row in characters
    pub fn line_len(&self, row: usize) -> CoreResult<usize> {
        Ok(self.line_at(row)?.chars().count())
    }

    pub fn insert_char(&mut self, row: usize, col: usize, ch: char) -> CoreResult<()> {
        let at = self.byte_index(row, col)?;
        self.lines[row].insert(at, ch);
        self.dirty[row] = true;
        Ok(())
    }

    /// Remove and return the character at `col`
    pub fn delete_char(&mut self, row: usize, col: usize) -> CoreResult<char> {
        let at = self.byte_index(row, col)?;
        if at == self.lines[row].len() {
            return Err(CoreError::ColumnOutOfRange { row, col });
        }
        let ch = self.lines[row].remove(at);
        self.dirty[row] = true;
        Ok(ch)
    }

    /// Break `row` at `col`, moving the tail onto a new row below.
    ///
    /// A full window makes room by dropping its bottom row, which must be an
    /// untouched copy of the last on-disk row it covers. If it is not, the
    /// split fails with `WindowFull` and nothing changes.
    pub fn split_line(&mut self, row: usize, col: usize) -> CoreResult<()> {
        let at = self.byte_index(row, col)?;
        let full = self.lines.len() >= self.capacity;
        if full && !self.can_evict_last(row) {
            return Err(CoreError::WindowFull);
        }

        let tail = self.lines[row].split_off(at);
        self.dirty[row] = true;

        self.lines.insert(row + 1, tail);
        self.dirty.insert(row + 1, true);
        self.origin.insert(row + 1, None);

        if full {
            self.lines.pop();
            self.dirty.pop();
            self.origin.pop();
            self.extent -= 1;
        }
        Ok(())
    }

    /// Append `row` to the row above it and remove `row`.
    /// Returns the column where the two lines meet.
    pub fn join_with_previous(&mut self, row: usize) -> CoreResult<usize> {
        // Row 0 has no resident row above it
        if row == 0 || row >= self.lines.len() {
            return Err(CoreError::OutOfWindow { row });
        }

        let line = self.lines.remove(row);
        self.dirty.remove(row);
        self.origin.remove(row);

        let prev = &mut self.lines[row - 1];
        let col = prev.chars().count();
        prev.push_str(&line);
        self.dirty[row - 1] = true;
        Ok(col)
    }

    /// Forget every modification: the window now mirrors disk rows
    /// `anchor..anchor + len`.
    pub(crate) fn mark_saved(&mut self) {
        let len = self.lines.len();
        self.dirty.iter_mut().for_each(|d| *d = false);
        self.origin = (self.anchor..self.anchor + len).map(Some).collect();
        self.extent = len;
    }

    /// Whether the bottom row can be dropped to make room for a split of
    /// `split_row`. The split row itself is about to become dirty.
    fn can_evict_last(&self, split_row: usize) -> bool {
        let Some(last) = self.lines.len().checked_sub(1) else {
            return false;
        };
        let tail_row = (self.anchor + self.extent).checked_sub(1);
        split_row < last
            && !self.dirty[last]
            && self.origin[last].is_some()
            && self.origin[last] == tail_row
    }

    fn byte_index(&self, row: usize, col: usize) -> CoreResult<usize> {
        let line = self.line_at(row)?;
        line.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .nth(col)
            .ok_or(CoreError::ColumnOutOfRange { row, col })
    }
}

/// Everything the loader and the editor share, behind one lock.
#[derive(Debug)]
pub struct Resident {
    pub window: Window,
    /// Cached line count of the document, including unsaved structural edits
    pub total_lines: usize,
    /// Generation of the last published rebuild
    pub applied_generation: u64,
}

impl Resident {
    pub fn new(window: Window, total_lines: usize) -> Self {
        Self {
            window,
            total_lines,
            applied_generation: 0,
        }
    }

    pub fn split_line(&mut self, row: usize, col: usize) -> CoreResult<()> {
        self.window.split_line(row, col)?;
        self.total_lines += 1;
        Ok(())
    }

    pub fn join_with_previous(&mut self, row: usize) -> CoreResult<usize> {
        let col = self.window.join_with_previous(row)?;
        self.total_lines = self.total_lines.saturating_sub(1).max(1);
        Ok(col)
    }

    /// Swap in a rebuilt window.
    ///
    /// `latest` is the newest generation issued. Anything older, or not newer
    /// than what is already applied, is rejected as stale.
    pub fn publish(
        &mut self,
        generation: u64,
        latest: u64,
        window: Window,
        total_lines: usize,
    ) -> CoreResult<()> {
        if generation != latest || generation <= self.applied_generation {
            return Err(CoreError::StaleLoad { generation });
        }
        self.window = window;
        self.total_lines = total_lines;
        self.applied_generation = generation;
        Ok(())
    }
}

pub type SharedWindow = Arc<Mutex<Resident>>;

/// Lock the resident state. A panic while holding the lock cannot leave the
/// window half-swapped (the swap is a plain assignment), so poisoning is
/// ignored.
pub fn lock(shared: &SharedWindow) -> MutexGuard<'_, Resident> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open `path` and load its first `capacity` lines.
///
/// A missing or empty file presents a single clean empty line.
pub fn open(path: &Path, capacity: usize) -> CoreResult<(Document, Resident)> {
    let load_err = |e: std::io::Error| CoreError::LoadFailed(format!("{}: {}", path.display(), e));

    let document = Document::new(path).map_err(load_err)?;
    if document.is_new() {
        return Ok((document, Resident::new(Window::synthetic(capacity), 1)));
    }

    let mut reader = document.reader().map_err(load_err)?;
    let mut lines = Vec::with_capacity(capacity);
    while lines.len() < capacity {
        match reader.next_line().map_err(load_err)? {
            Some(line) => lines.push(line),
            None => break,
        }
    }

    if lines.is_empty() {
        return Ok((document, Resident::new(Window::synthetic(capacity), 1)));
    }

    let total_lines = document.line_count().max(lines.len());
    Ok((document, Resident::new(Window::from_rows(0, lines, capacity), total_lines)))
}
