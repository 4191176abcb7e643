use super::Window;

/// Cursor position relative to the resident window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Row within the window (0-indexed)
    pub row: usize,
    /// Column in characters (0-indexed, may equal the line length)
    pub col: usize,
}

/// A cursor motion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp(usize),
    PageDown(usize),
}

impl Motion {
    pub fn is_vertical(&self) -> bool {
        matches!(
            self,
            Motion::Up | Motion::Down | Motion::PageUp(_) | Motion::PageDown(_)
        )
    }
}

/// What the coordinator decided for a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The cursor moved inside the window
    Moved,
    /// The target row exists but is not resident; the cursor was clamped to
    /// the nearest window edge and the window must be rebuilt around `target`
    Reload { target: usize },
    /// Nothing to move to
    Blocked,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Absolute file row under the cursor
    pub fn absolute_row(&self, window: &Window) -> usize {
        window.anchor() + self.row
    }

    /// Pull the cursor back inside the window and its line
    pub fn clamp(&mut self, window: &Window) {
        self.row = self.row.min(window.len().saturating_sub(1));
        self.col = self.col.min(window.line_len(self.row).unwrap_or(0));
    }

    /// Place the cursor on absolute row `target` of a freshly loaded window
    pub fn place_absolute(&mut self, window: &Window, target: usize) {
        self.row = target.saturating_sub(window.anchor());
        self.clamp(window);
    }

    /// Apply `motion`, deciding whether the window has to move.
    pub fn apply(&mut self, motion: Motion, window: &Window, total_lines: usize) -> MoveOutcome {
        match motion {
            Motion::Up => self.vertical(-1, false, window, total_lines),
            Motion::Down => self.vertical(1, false, window, total_lines),
            Motion::PageUp(n) => self.vertical(-(n.max(1) as isize), true, window, total_lines),
            Motion::PageDown(n) => self.vertical(n.max(1) as isize, true, window, total_lines),
            Motion::Left => self.move_left(window),
            Motion::Right => self.move_right(window),
            Motion::Home => {
                self.col = 0;
                MoveOutcome::Moved
            }
            Motion::End => {
                self.col = window.line_len(self.row).unwrap_or(0);
                MoveOutcome::Moved
            }
        }
    }

    fn vertical(
        &mut self,
        delta: isize,
        clamp_to_document: bool,
        window: &Window,
        total_lines: usize,
    ) -> MoveOutcome {
        if window.is_empty() || total_lines == 0 {
            return MoveOutcome::Blocked;
        }

        let current = self.absolute_row(window) as isize;
        let mut target = current + delta;
        if clamp_to_document {
            target = target.clamp(0, total_lines as isize - 1);
        }
        if target < 0 || target >= total_lines as isize || target == current {
            return MoveOutcome::Blocked;
        }

        let target = target as usize;
        if window.contains_absolute(target) {
            self.row = target - window.anchor();
            self.clamp(window);
            return MoveOutcome::Moved;
        }

        // Stay on the edge nearest the target until the new window arrives
        self.row = if target < window.anchor() {
            0
        } else {
            window.len() - 1
        };
        self.clamp(window);
        MoveOutcome::Reload { target }
    }

    fn move_left(&mut self, window: &Window) -> MoveOutcome {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = window.line_len(self.row).unwrap_or(0);
        } else {
            return MoveOutcome::Blocked;
        }
        MoveOutcome::Moved
    }

    fn move_right(&mut self, window: &Window) -> MoveOutcome {
        let len = window.line_len(self.row).unwrap_or(0);
        if self.col < len {
            self.col += 1;
        } else if self.row + 1 < window.len() {
            self.row += 1;
            self.col = 0;
        } else {
            return MoveOutcome::Blocked;
        }
        MoveOutcome::Moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(anchor: usize, count: usize) -> Window {
        let lines = (anchor..anchor + count).map(|i| format!("line {}", i)).collect();
        Window::from_rows(anchor, lines, 100)
    }

    #[test]
    fn test_cursor_creation() {
        let cursor = Cursor::new();
        assert_eq!(cursor.row, 0);
        assert_eq!(cursor.col, 0);
    }

    #[test]
    fn test_vertical_movement_inside_window() {
        let win = window(0, 10);
        let mut cursor = Cursor::at(3, 6);

        assert_eq!(cursor.apply(Motion::Down, &win, 10), MoveOutcome::Moved);
        assert_eq!(cursor, Cursor::at(4, 6));

        assert_eq!(cursor.apply(Motion::Up, &win, 10), MoveOutcome::Moved);
        assert_eq!(cursor.row, 3);
    }

    #[test]
    fn test_down_past_window_edge_requests_reload() {
        let win = window(0, 100);
        let mut cursor = Cursor::at(99, 2);

        let outcome = cursor.apply(Motion::Down, &win, 250);
        assert_eq!(outcome, MoveOutcome::Reload { target: 100 });
        assert_eq!(cursor.row, 99);
    }

    #[test]
    fn test_up_past_window_edge_requests_reload() {
        let win = window(50, 100);
        let mut cursor = Cursor::at(0, 0);

        assert_eq!(
            cursor.apply(Motion::Up, &win, 250),
            MoveOutcome::Reload { target: 49 }
        );
        assert_eq!(cursor.row, 0);
    }

    #[test]
    fn test_motion_outside_document_is_noop() {
        let win = window(0, 5);
        let mut cursor = Cursor::at(4, 0);
        assert_eq!(cursor.apply(Motion::Down, &win, 5), MoveOutcome::Blocked);
        assert_eq!(cursor.row, 4);

        let mut cursor = Cursor::at(0, 0);
        assert_eq!(cursor.apply(Motion::Up, &win, 5), MoveOutcome::Blocked);
    }

    #[test]
    fn test_page_motion_clamps_to_document() {
        let win = window(0, 100);
        let mut cursor = Cursor::at(10, 0);

        assert_eq!(
            cursor.apply(Motion::PageDown(500), &win, 250),
            MoveOutcome::Reload { target: 249 }
        );
        assert_eq!(cursor.row, 99);

        let mut cursor = Cursor::at(10, 0);
        assert_eq!(cursor.apply(Motion::PageUp(40), &win, 250), MoveOutcome::Moved);
        assert_eq!(cursor.row, 0);
    }

    #[test]
    fn test_horizontal_wraps_within_window() {
        let win = window(0, 3);
        let mut cursor = Cursor::at(1, 0);

        assert_eq!(cursor.apply(Motion::Left, &win, 3), MoveOutcome::Moved);
        assert_eq!(cursor, Cursor::at(0, 6));

        assert_eq!(cursor.apply(Motion::Right, &win, 3), MoveOutcome::Moved);
        assert_eq!(cursor, Cursor::at(1, 0));
    }

    #[test]
    fn test_horizontal_never_reloads() {
        let win = window(50, 2);
        let mut cursor = Cursor::at(0, 0);
        assert_eq!(cursor.apply(Motion::Left, &win, 250), MoveOutcome::Blocked);

        let mut cursor = Cursor::at(1, 7);
        assert_eq!(cursor.apply(Motion::Right, &win, 250), MoveOutcome::Blocked);
    }

    #[test]
    fn test_line_navigation() {
        let win = window(0, 1);
        let mut cursor = Cursor::at(0, 3);

        cursor.apply(Motion::Home, &win, 1);
        assert_eq!(cursor.col, 0);

        cursor.apply(Motion::End, &win, 1);
        assert_eq!(cursor.col, 6);
    }

    #[test]
    fn test_place_absolute_after_reload() {
        let win = window(50, 100);
        let mut cursor = Cursor::new();

        cursor.place_absolute(&win, 100);
        assert_eq!(cursor.row, 50);
        assert_eq!(cursor.absolute_row(&win), 100);
    }
}
