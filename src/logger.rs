//! Terminal output for the cache compiler.
//!
//! - `log!` prints one line under a `[stage]` prefix colored by pipeline
//!   stage (`source`, `svg`, `cache`, `write`, `watch`, ...)
//! - `debug!` does the same, only with `--verbose`
//! - [`report_rebuild`] keeps a single rebuild status block in watch mode
//!
//! ```ignore
//! log!("build"; "wrote {} scripts", count);
//! debug!("source"; "{} matched {} files", pattern, n);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{AnsiColors, OwoColorize};
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
    time::SystemTime,
};

use crate::utils::plural_count;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set by `--verbose`.
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message under a colored `[stage]` prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `--verbose` is set.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = format!("[{module}]");
    let colored = prefix.color(stage_color(module));
    let prefix = colored.bold();

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Prefix color for each pipeline stage.
///
/// Reading stages are cool colors, output stages blue or green, problems
/// red or yellow.
fn stage_color(module: &str) -> AnsiColors {
    match module.to_ascii_lowercase().as_str() {
        "source" => AnsiColors::Cyan,
        "svg" => AnsiColors::Magenta,
        "cache" => AnsiColors::BrightCyan,
        "write" | "build" => AnsiColors::BrightBlue,
        "watch" | "init" => AnsiColors::BrightGreen,
        "error" => AnsiColors::BrightRed,
        "warning" => AnsiColors::BrightYellow,
        _ => AnsiColors::White,
    }
}

// ============================================================================
// Rebuild status (watch mode)
// ============================================================================

/// Result of one watch-mode rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rebuild {
    Wrote {
        scripts: usize,
        templates: usize,
        bytes: usize,
    },
    /// Nothing that feeds a script changed.
    Unchanged,
    Failed {
        /// Which step failed, e.g. `build` or `config reload`.
        stage: &'static str,
        detail: String,
    },
}

impl Rebuild {
    pub fn failed(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            detail: detail.into(),
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::Wrote {
                scripts,
                templates,
                bytes,
            } => format!(
                "wrote {} ({}, {})",
                plural_count(*scripts, "script"),
                plural_count(*templates, "template"),
                format_size(*bytes)
            ),
            Self::Unchanged => "no template changes".to_string(),
            Self::Failed { stage, detail } if detail.is_empty() => format!("{stage} failed"),
            Self::Failed { stage, detail } => format!("{stage} failed\n{detail}"),
        }
    }

    fn symbol(&self) -> String {
        match self {
            Self::Wrote { .. } => "✓".green().to_string(),
            Self::Unchanged => "·".dimmed().to_string(),
            Self::Failed { .. } => "✗".red().to_string(),
        }
    }
}

/// Status block that overwrites itself on every rebuild.
///
/// Each line carries the rebuild number so repeated identical results
/// are still distinguishable.
#[derive(Debug, Default)]
struct RebuildStatus {
    /// Lines of previous output to clear
    last_lines: usize,
    rebuilds: usize,
}

static STATUS: LazyLock<Mutex<RebuildStatus>> =
    LazyLock::new(|| Mutex::new(RebuildStatus::default()));

impl RebuildStatus {
    fn next_line(&mut self, outcome: &Rebuild) -> String {
        self.rebuilds += 1;
        let stamp = format!("[{} #{}]", now(), self.rebuilds).dimmed().to_string();
        let summary = match outcome {
            Rebuild::Unchanged => outcome.summary().dimmed().to_string(),
            _ => outcome.summary(),
        };
        format!("{stamp} {} {summary}", outcome.symbol())
    }

    fn show(&mut self, outcome: &Rebuild) {
        let line = self.next_line(outcome);
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }
        writeln!(stdout, "{line}").ok();
        stdout.flush().ok();

        self.last_lines = line_count(&line);
    }
}

/// Replace the watch-mode status block with `outcome`.
pub fn report_rebuild(outcome: &Rebuild) {
    STATUS.lock().show(outcome);
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

/// `512 B`, `1.5 KiB`, `2.0 MiB`.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = KIB * 1024;
    match bytes {
        b if b < KIB => format!("{b} B"),
        b if b < MIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{:.1} MiB", b as f64 / MIB as f64),
    }
}

/// Current UTC time as HH:MM:SS.
fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}
