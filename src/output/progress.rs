//! In-place progress line for scans.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

/// Minimum time between two redraws.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// A progress line on stderr: `Hashing files: 42% (420/1000)`.
///
/// Silent when stderr is not a terminal, so piped reports stay clean.
pub struct Progress {
    /// Label shown before the counters
    title: String,
    /// Number of items expected
    total: usize,
    /// Items completed so far
    current: usize,
    /// Whether anything is drawn at all
    is_tty: bool,
    /// When the line was last drawn
    last_draw: Option<Instant>,
}

impl Progress {
    /// Creates a progress line for `total` items.
    #[must_use]
    pub fn new(title: &str, total: usize) -> Self {
        Self::with_terminal(title, total, io::stderr().is_terminal())
    }

    /// Constructor with explicit terminal detection.
    fn with_terminal(title: &str, total: usize, is_tty: bool) -> Self {
        let mut progress = Self {
            title: title.to_string(),
            total,
            current: 0,
            is_tty: is_tty && total > 0,
            last_draw: None,
        };
        progress.draw();
        progress
    }

    /// Moves to `current` completed items, redrawing at most every 100ms.
    pub fn update(&mut self, current: usize) {
        self.current = current.min(self.total);
        let due = self
            .last_draw
            .is_none_or(|at| at.elapsed() >= REDRAW_INTERVAL);
        if due || self.current == self.total {
            self.draw();
        }
    }

    /// Completion percentage, 0 for an empty job.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.current * 100 / self.total
        }
    }

    /// Prints the final line.
    pub fn finish(mut self) {
        self.current = self.total;
        if self.is_tty {
            eprintln!(
                "\r{}: 100% ({}/{}), done.",
                self.title.dimmed(),
                self.total,
                self.total
            );
            // Line already terminated
            self.is_tty = false;
        }
    }

    /// Redraws the line in place.
    fn draw(&mut self) {
        if !self.is_tty {
            return;
        }
        eprint!(
            "\r{}: {}% ({}/{})",
            self.title.dimmed(),
            self.percent().to_string().dimmed(),
            self.current,
            self.total
        );
        let _ = io::stderr().flush();
        self.last_draw = Some(Instant::now());
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        // Abandoned mid-scan (cancellation, error): leave the cursor on a fresh line
        if self.is_tty {
            eprintln!();
        }
    }
}
