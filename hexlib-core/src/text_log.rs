//! Bounded log of game-facing text lines

use std::collections::VecDeque;

pub const DEFAULT_LINES: usize = 13;

/// The last few lines shown to players. An identical consecutive line
/// replaces the newest entry with a repeat count instead of scrolling.
#[derive(Clone, Debug)]
pub struct TextLog {
    lines: VecDeque<String>,
    capacity: usize,
    last_line: String,
    n_reps: usize,
}

impl Default for TextLog {
    fn default() -> Self {
        Self::new(DEFAULT_LINES)
    }
}

impl TextLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            last_line: String::new(),
            n_reps: 0,
        }
    }

    /// Flatten `line` to one line and append it; returns the flattened text.
    pub fn log(&mut self, line: &str, from: &str) -> String {
        let line = line.replace('\n', "-");
        tracing::info!("{}: {}", from, line);
        if !self.lines.is_empty() && line == self.last_line {
            self.n_reps += 1;
            if let Some(last) = self.lines.back_mut() {
                *last = format!("[{}] {}", self.n_reps, line);
            }
        } else {
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.clone());
            self.last_line = line.clone();
            self.n_reps = 0;
        }
        line
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.last_line.clear();
        self.n_reps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeats_collapse() {
        let mut log = TextLog::new(3);
        log.log("a", "test");
        log.log("a", "test");
        log.log("a", "test");
        assert_eq!(log.len(), 1);
        assert_eq!(log.last(), Some("[2] a"));

        log.log("b", "test");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["[2] a", "b"]);
    }

    #[test]
    fn test_capacity_and_flattening() {
        let mut log = TextLog::new(2);
        assert_eq!(log.log("x\ny", "test"), "x-y");
        log.log("2", "test");
        log.log("3", "test");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["2", "3"]);
        log.clear();
        assert!(log.is_empty());
    }
}
