//! Terminal logging with colored module prefixes.
//!
//! - `log!` prints one line per event: `[module] message`
//! - `Progress` keeps a single in-place counter line for long loops
//!
//! ```ignore
//! log!("data"; "loaded {} tables", count);
//!
//! let progress = Progress::new("export", routes.len());
//! routes.par_iter().for_each(|_| progress.inc());
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Whether a progress line currently occupies the last terminal row
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

/// "[" + "]" + trailing space
const PREFIX_OVERHEAD: usize = 3;

fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

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

/// Write a log line, truncated to the terminal width.
///
/// Multi-line messages (error chains) are printed as-is.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        write!(stdout, "\r").ok();
    }
    execute!(stdout, Clear(ClearType::CurrentLine)).ok();

    let message = if message.contains('\n') {
        message
    } else {
        let max_len = terminal_width().saturating_sub(module.len() + PREFIX_OVERHEAD);
        truncate_str(message, max_len)
    };
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "data" => prefix.bright_cyan().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
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
// Progress
// ============================================================================

/// Single-line progress counter: `[module] 42/100`.
///
/// Safe to increment from rayon workers; redraws are serialized by a mutex.
pub struct Progress {
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl Progress {
    pub fn new(module: &str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        Self {
            prefix: colorize_prefix(module),
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        }
    }

    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let _guard = self.lock.lock().ok();
        let mut stdout = stdout().lock();
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} {}/{}", self.prefix, current, self.total).ok();
        stdout.flush().ok();
    }

    /// Erase the counter line.
    pub fn finish(&self) {
        if !PROGRESS_ACTIVE.swap(false, Ordering::SeqCst) {
            return;
        }
        let _guard = self.lock.lock().ok();
        let mut stdout = stdout().lock();
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine), cursor::MoveToColumn(0)).ok();
        stdout.flush().ok();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}
