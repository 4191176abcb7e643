use std::time::{Duration, Instant};

use crate::buffer::Window;

/// A match position, window-relative, column in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub row: usize,
    pub col: usize,
}

/// Matches of the last search within the resident window.
///
/// Rows outside the window are never scanned.
#[derive(Debug, Default)]
pub struct SearchState {
    needle: String,
    matches: Vec<Match>,
    active: usize,
    highlight_until: Option<Instant>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search the window for `needle`, replacing any previous results.
    /// Returns the number of matches.
    pub fn search(&mut self, window: &Window, needle: &str) -> usize {
        self.needle = needle.to_string();
        self.matches = find_all(window, needle);
        self.active = 0;
        self.highlight_until = None;
        self.matches.len()
    }

    /// Advance to the next match, wrapping around
    pub fn next_match(&mut self) -> Option<Match> {
        if self.matches.is_empty() {
            return None;
        }
        self.active = (self.active + 1) % self.matches.len();
        self.active_match()
    }

    pub fn active_match(&self) -> Option<Match> {
        self.matches.get(self.active).copied()
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Drop results that refer to a window that is gone
    pub fn invalidate(&mut self) {
        self.matches.clear();
        self.active = 0;
        self.highlight_until = None;
    }

    /// Start showing the active match for `duration`
    pub fn flash(&mut self, now: Instant, duration: Duration) {
        self.highlight_until = Some(now + duration);
    }

    /// The match to draw highlighted at `now`, together with its length in
    /// characters
    pub fn highlight(&self, now: Instant) -> Option<(Match, usize)> {
        match self.highlight_until {
            Some(until) if now < until => self
                .active_match()
                .map(|m| (m, self.needle.chars().count())),
            _ => None,
        }
    }
}

/// Non-overlapping left-to-right occurrences of `needle`, by row then column
pub fn find_all(window: &Window, needle: &str) -> Vec<Match> {
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for (row, line) in window.lines().iter().enumerate() {
        let mut from = 0;
        while let Some(pos) = line[from..].find(needle) {
            let at = from + pos;
            matches.push(Match {
                row,
                col: line[..at].chars().count(),
            });
            from = at + needle.len();
        }
    }
    matches
}
