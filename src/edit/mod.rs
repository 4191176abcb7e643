use crate::buffer::{Cursor, Resident};
use crate::error::CoreResult;

/// Result of a keystroke-level edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// Nothing to do at this position
    Unchanged,
    /// The edit touches absolute row `target`, which is not resident
    NeedsRow { target: usize },
}

/// Editing keystrokes applied at the cursor.
///
/// Each one goes through a `Window` operation, so dirty flags and the
/// cached line count stay in step; the cursor ends up where the user
/// expects it.
pub struct EditOperations;

impl EditOperations {
    /// Type `ch` at the cursor
    pub fn insert_char(resident: &mut Resident, cursor: &mut Cursor, ch: char) -> CoreResult<EditOutcome> {
        resident.window.insert_char(cursor.row, cursor.col, ch)?;
        cursor.col += 1;
        Ok(EditOutcome::Edited)
    }

    /// Break the line at the cursor
    pub fn newline(resident: &mut Resident, cursor: &mut Cursor) -> CoreResult<EditOutcome> {
        resident.split_line(cursor.row, cursor.col)?;
        cursor.row += 1;
        cursor.col = 0;
        Ok(EditOutcome::Edited)
    }

    /// Delete the character before the cursor, joining lines at column 0
    pub fn backspace(resident: &mut Resident, cursor: &mut Cursor) -> CoreResult<EditOutcome> {
        if cursor.col > 0 {
            resident.window.delete_char(cursor.row, cursor.col - 1)?;
            cursor.col -= 1;
            return Ok(EditOutcome::Edited);
        }

        if cursor.row > 0 {
            cursor.col = resident.join_with_previous(cursor.row)?;
            cursor.row -= 1;
            return Ok(EditOutcome::Edited);
        }

        match resident.window.anchor().checked_sub(1) {
            Some(target) => Ok(EditOutcome::NeedsRow { target }),
            None => Ok(EditOutcome::Unchanged),
        }
    }

    /// Delete the character under the cursor, joining the next line at the
    /// end of a line
    pub fn delete_forward(resident: &mut Resident, cursor: &mut Cursor) -> CoreResult<EditOutcome> {
        let len = resident.window.line_len(cursor.row)?;
        if cursor.col < len {
            resident.window.delete_char(cursor.row, cursor.col)?;
            return Ok(EditOutcome::Edited);
        }

        if cursor.row + 1 < resident.window.len() {
            resident.join_with_previous(cursor.row + 1)?;
            return Ok(EditOutcome::Edited);
        }

        let below = resident.window.anchor() + resident.window.len();
        if below < resident.total_lines {
            Ok(EditOutcome::NeedsRow { target: below })
        } else {
            Ok(EditOutcome::Unchanged)
        }
    }
}
