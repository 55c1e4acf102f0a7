//! Logging for the Solar3D engine
//!
//! Every subsystem logs through the `engine_*!` macros, which forward to the
//! logger installed on [`Engine`](crate::solar3d::Engine). Entries below the
//! engine's minimum severity are discarded before they reach the logger.
//! ERROR entries carry the file and line of the call site.

use std::fmt;
use std::time::SystemTime;
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

/// Destination for engine log entries.
///
/// Installed with `Engine::set_logger`; called from whichever thread logged,
/// so implementations must be thread-safe.
///
/// ```no_run
/// use std::sync::Mutex;
/// use solar_engine::solar3d::log::{LogEntry, LogSeverity, Logger};
///
/// /// Keeps the frame orchestrator's warnings for an on-screen overlay
/// struct FrameWarnings(Mutex<Vec<String>>);
///
/// impl Logger for FrameWarnings {
///     fn log(&self, entry: &LogEntry) {
///         if entry.source == "solar3d::frame" && entry.severity >= LogSeverity::Warn {
///             if let Ok(mut lines) = self.0.lock() {
///                 lines.push(entry.message.clone());
///             }
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One message as handed to a [`Logger`]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Subsystem tag such as `solar3d::graph` or `solar_demo`
    pub source: String,
    pub message: String,
    /// Call site, filled in by `engine_error!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` of the call site when it was recorded
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    /// Parse a severity name as found in the `SOLAR_LOG` environment variable.
    ///
    /// Matching is case-insensitive; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogSeverity::Trace),
            "debug" => Some(LogSeverity::Debug),
            "info" => Some(LogSeverity::Info),
            "warn" | "warning" => Some(LogSeverity::Warn),
            "error" => Some(LogSeverity::Error),
            _ => None,
        }
    }

    /// Fixed-width tag used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Console logger installed until `Engine::set_logger` replaces it.
///
/// Lines look like `[2026-01-01 12:00:00.000] [WARN ] [solar3d::frame] message`,
/// with ` (file:line)` appended for errors. WARN and ERROR go to stderr,
/// everything else to stdout.
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let local: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            local.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            entry.message,
        );
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }

        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

#[doc(hidden)]
#[macro_export]
macro_rules! __engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::solar3d::Engine::log(
            $crate::solar3d::log::LogSeverity::$severity,
            $source,
            format!($($arg)*),
        )
    };
}

/// Per-step detail, e.g. `engine_trace!("solar3d::frame", "slot {} acquired", slot)`
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Trace, $source, $($arg)*) };
}

/// Object creation and rebuilds
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Debug, $source, $($arg)*) };
}

/// Lifecycle events: device chosen, targets rebuilt, cache saved
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Info, $source, $($arg)*) };
}

/// Recoverable trouble such as a dropped frame or a missing validation layer
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__engine_log!(Warn, $source, $($arg)*) };
}

/// Failure, logged together with the call site.
///
/// ```no_run
/// # use solar_engine::engine_error;
/// # let err = "VK_ERROR_DEVICE_LOST";
/// engine_error!("solar3d::vulkan", "vkQueueSubmit failed: {}", err);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::solar3d::Engine::log_detailed(
            $crate::solar3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
