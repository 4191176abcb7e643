/// The rows of the window currently on screen
pub struct Viewport {
    /// First visible window row
    pub top: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    /// Scroll just enough to keep `row` visible
    pub fn follow(&mut self, row: usize) {
        if row < self.top {
            self.top = row;
        } else if row >= self.top + self.height {
            self.top = row + 1 - self.height;
        }
    }

    /// Half a screen, used for page motions
    pub fn page(&self) -> usize {
        (self.height / 2).max(1)
    }
}
