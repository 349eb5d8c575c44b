//! Run log: every step echoed to the console and appended to a per-run file.

use chrono::{Local, NaiveDateTime};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::advisory::Advisory;
use crate::error::{Result, SyncError};
use crate::ui;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Formats a line as `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`.
pub fn format_line(at: NaiveDateTime, level: Level, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        level.label(),
        message
    )
}

/// Append-only log for one invocation.
///
/// Lines are also kept in memory so a caller (or a test) can inspect what a
/// run reported. Failures to write the file are ignored; the console echo is
/// the primary channel.
pub struct RunLog {
    file: Option<PathBuf>,
    echo: bool,
    lines: RefCell<Vec<String>>,
}

impl RunLog {
    /// Log into `<dir>/<YYYY-MM-DD_HHMMSS>_sync.log`, echoing to the console.
    pub fn in_dir(dir: &Path) -> Self {
        let name = format!("{}_sync.log", Local::now().format("%Y-%m-%d_%H%M%S"));
        RunLog {
            file: Some(dir.join(name)),
            echo: true,
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Log kept in memory only, without console output.
    pub fn memory() -> Self {
        RunLog {
            file: None,
            echo: false,
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Log file path, if this log writes one
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn log(&self, level: Level, message: &str) {
        let line = format_line(Local::now().naive_local(), level, message);

        if self.echo {
            match level {
                Level::Debug => ui::display_detail(&line),
                Level::Info => ui::display_status(&line),
                Level::Warning => ui::display_warning(&line),
                Level::Error => ui::display_error(&line),
            }
        }

        if let Some(path) = &self.file {
            let _ = append(path, &line);
        }

        self.lines.borrow_mut().push(line);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn advisory(&self, advisory: &Advisory) {
        self.warn(&advisory.to_string());
    }

    /// All lines logged so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Whether any logged line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

fn append(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}

/// Opens a log file with the configured editor, or the platform's default opener.
pub fn open_log(path: &Path, editor: Option<&str>) -> Result<()> {
    let mut command = match editor {
        Some(editor) if !editor.trim().is_empty() => {
            let mut cmd = Command::new(editor);
            cmd.arg(path);
            cmd
        }
        _ => platform_opener(path),
    };

    command
        .spawn()
        .map(|_| ())
        .map_err(|e| SyncError::command(format!("open {}", path.display()), e.to_string()))
}

fn platform_opener(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}
