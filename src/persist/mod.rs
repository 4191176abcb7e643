use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::buffer::{Document, Format, Resident, Window};
use crate::error::{CoreError, CoreResult};

/// Result of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub lines_written: usize,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Copy the previous contents to `<dest>~` before replacing them
    pub backup: bool,
}

/// Write the window's edits back into the document.
///
/// The document is re-read in full (it may have changed since it was opened),
/// the dirty rows are merged in, and the result replaces `dest` through a
/// temporary file and a rename. On any failure the dirty flags are left as
/// they were so the save can be retried.
pub fn save(
    resident: &mut Resident,
    document: &mut Document,
    dest: &Path,
    options: SaveOptions,
) -> CoreResult<SaveReport> {
    let (mut all_lines, format) = document.read_all().map_err(|e| {
        warn!(path = %document.path().display(), error = %e, "re-read before save failed");
        CoreError::SaveFailed(e)
    })?;

    let dirty = resident.window.dirty_count();
    merge(&mut all_lines, &resident.window);

    let bytes_written = write_lines(dest, &all_lines, format, options.backup).map_err(|e| {
        warn!(path = %dest.display(), error = %e, "write failed");
        CoreError::SaveFailed(e)
    })?;

    resident.window.mark_saved();
    resident.total_lines = all_lines.len().max(1);
    document.mark_written(dest, format, all_lines.len());

    info!(
        path = %dest.display(),
        lines = all_lines.len(),
        dirty,
        bytes = bytes_written,
        "saved"
    );
    Ok(SaveReport {
        lines_written: all_lines.len(),
        bytes_written,
    })
}

/// Merge the window into a freshly read copy of the whole document.
///
/// While every row still sits on the disk row it was read from, each dirty
/// row overwrites `anchor + i` in place. Once rows were split or joined
/// (even when the length came back to the same value) the window no longer
/// lines up with the file, so the rows it was loaded from are replaced by its
/// current lines instead; clean lines are taken from the fresh copy. Rows
/// outside the window's extent are never touched.
pub fn merge(all_lines: &mut Vec<String>, window: &Window) {
    let anchor = window.anchor();
    if all_lines.len() < anchor {
        all_lines.resize(anchor, String::new());
    }

    if window.is_aligned() {
        for (i, line) in window.lines().iter().enumerate() {
            if !window.is_dirty(i) {
                continue;
            }
            let row = anchor + i;
            if row >= all_lines.len() {
                all_lines.resize(row + 1, String::new());
            }
            all_lines[row] = line.clone();
        }
        return;
    }

    let segment: Vec<String> = window
        .lines()
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            if window.is_dirty(i) {
                Some(line.clone())
            } else {
                window.origin(i).and_then(|row| all_lines.get(row).cloned())
            }
        })
        .collect();

    let end = (anchor + window.extent()).min(all_lines.len());
    all_lines.splice(anchor..end, segment);
}

fn write_lines(dest: &Path, lines: &[String], format: Format, backup: bool) -> io::Result<u64> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    let ending = format.line_ending.as_str().as_bytes();
    let mut bytes = 0u64;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                writer.write_all(ending)?;
                bytes += ending.len() as u64;
            }
            writer.write_all(line.as_bytes())?;
            bytes += line.len() as u64;
        }
        if format.trailing_newline && !lines.is_empty() {
            writer.write_all(ending)?;
            bytes += ending.len() as u64;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(dest) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
        if backup {
            reflink_copy::reflink_or_copy(dest, backup_path(dest))?;
        }
    }

    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(bytes)
}

/// `notes.txt` -> `notes.txt~`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("~");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests;
