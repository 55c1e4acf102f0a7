//! Unit tests for log.rs
//!
//! Tests LogSeverity ordering and parsing, LogEntry, and DefaultLogger.

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "solar3d::tests".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_parse() {
    assert_eq!(LogSeverity::parse("trace"), Some(LogSeverity::Trace));
    assert_eq!(LogSeverity::parse("DEBUG"), Some(LogSeverity::Debug));
    assert_eq!(LogSeverity::parse(" Info "), Some(LogSeverity::Info));
    assert_eq!(LogSeverity::parse("warning"), Some(LogSeverity::Warn));
    assert_eq!(LogSeverity::parse("error"), Some(LogSeverity::Error));
    assert_eq!(LogSeverity::parse("verbose"), None);
    assert_eq!(LogSeverity::parse(""), None);
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_with_file_line() {
    let e = entry(LogSeverity::Error, Some("vulkan.rs"), Some(42));
    assert_eq!(e.source, "solar3d::tests");
    assert_eq!(e.file, Some("vulkan.rs"));
    assert_eq!(e.line, Some(42));
}

#[test]
fn test_log_entry_location() {
    assert_eq!(entry(LogSeverity::Error, Some("picker.rs"), Some(12)).location().as_deref(), Some("picker.rs:12"));
    assert_eq!(entry(LogSeverity::Info, None, None).location(), None);
    assert_eq!(entry(LogSeverity::Error, Some("picker.rs"), None).location(), None);
}

#[test]
fn test_severity_labels_are_fixed_width() {
    for severity in [LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Warn.to_string(), "WARN");
    assert_eq!(LogSeverity::Error.to_string(), "ERROR");
}

#[test]
fn test_log_entry_debug_format() {
    let e = entry(LogSeverity::Debug, None, None);
    let debug_str = format!("{:?}", e);
    assert!(debug_str.contains("Debug"));
    assert!(debug_str.contains("solar3d::tests"));
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        // Both formatting branches, must not panic
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("frame.rs"), Some(7)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}
