//! Terminal logging with colored module prefixes.
//!
//! - `log!` prints a single `[module] message` line, truncated to the
//!   terminal width.
//! - `ProgressBar` draws one in-place bar while the exporter walks routes.
//!
//! ```ignore
//! log!("export"; "{} routes", urls.len());
//!
//! let progress = ProgressBar::new("export", urls.len());
//! progress.inc();
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Set while a progress bar owns the current terminal line
static BAR_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Layout Constants
// ============================================================================
//
// Progress bar format: "[module] [████░░░░] 42/100"

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;
/// Minimum progress bar width in characters
const MIN_BAR_WIDTH: usize = 10;
/// Maximum progress bar width in characters
const MAX_BAR_WIDTH: usize = 40;

#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Falls back to 120 columns if detection fails (e.g. output is piped).
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Write one log line. Multiline messages are printed in full, single
/// lines are cut at the terminal width.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();

    // Progress bar lines are redrawn on the next tick
    if BAR_ACTIVE.load(Ordering::SeqCst) {
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
    }

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "export" | "static" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate to at most `max_len` bytes on a UTF-8 boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Progress Bar
// ============================================================================

/// Single-line progress bar, safe to tick from rayon workers.
///
/// Draws nothing when stdout is not a terminal.
pub struct ProgressBar {
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    enabled: bool,
    lock: Mutex<()>,
}

impl ProgressBar {
    pub fn new(module: &'static str, total: usize) -> Self {
        let enabled = total > 1 && stdout().is_terminal();
        BAR_ACTIVE.store(enabled, Ordering::SeqCst);
        Self {
            prefix: colorize_prefix(module),
            prefix_len: calc_prefix_len(module.len()),
            total,
            current: AtomicUsize::new(0),
            enabled,
            lock: Mutex::new(()),
        }
    }

    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        if self.enabled {
            self.display(current);
        }
    }

    fn display(&self, current: usize) {
        let _guard = self.lock.lock().ok();

        let progress_text = format!("{}/{}", current, self.total);
        let overhead = self.prefix_len + 3 + 1 + progress_text.len();
        let bar_width = (get_terminal_width() as usize)
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        let filled = (current * bar_width) / self.total.max(1);
        let bar = "█".repeat(filled) + &"░".repeat(bar_width.saturating_sub(filled));

        let mut stdout = stdout().lock();
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{bar}] {progress_text}", self.prefix).ok();
        stdout.flush().ok();
    }

    /// Clear the bar line. Also runs on drop.
    pub fn finish(&self) {
        if !BAR_ACTIVE.swap(false, Ordering::SeqCst) || !self.enabled {
            return;
        }
        let _guard = self.lock.lock().ok();
        let mut stdout = stdout().lock();
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }

    pub fn count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "export" -> "[export] " = 6 + 2 + 1
        assert_eq!(calc_prefix_len(6), 9);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_ascii() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "€" is 3 bytes, cutting at 4 keeps one char
        assert_eq!(truncate_str("€€", 4), "€");
        assert_eq!(truncate_str("a€b", 3), "a");
    }

    #[test]
    fn test_progress_bar_counts_without_terminal() {
        let bar = ProgressBar::new("export", 3);
        bar.inc();
        bar.inc();
        assert_eq!(bar.count(), 2);
        bar.finish();
    }
}
