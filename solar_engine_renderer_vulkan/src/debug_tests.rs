//! Unit tests for the validation message bookkeeping

use ash::vk;
use super::*;

// ============================================================================
// STATS
// ============================================================================

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats { errors: 2, warnings: 3, info: 1, verbose: 4 };
    assert_eq!(stats.total(), 10);
    assert_eq!(ValidationStats::default().total(), 0);
}

#[test]
fn test_tracker_counts_by_severity() {
    let tracker = ValidationStatsTracker::new();
    tracker.record(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    tracker.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
    tracker.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
    tracker.record(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE);

    let stats = tracker.get_stats();
    assert_eq!(stats, ValidationStats { errors: 1, warnings: 2, info: 0, verbose: 1 });

    tracker.reset();
    assert_eq!(tracker.get_stats().total(), 0);
}

// ============================================================================
// DUPLICATES
// ============================================================================

#[test]
fn test_message_tracker_counts_repeats() {
    let mut tracker = MessageTracker::default();
    assert_eq!(tracker.track_message("a"), 1);
    assert_eq!(tracker.track_message("b"), 1);
    assert_eq!(tracker.track_message("a"), 2);
    assert_eq!(tracker.duplicate_count(), 1);
}

// ============================================================================
// SEVERITY MASK
// ============================================================================

#[test]
fn test_severity_mask_excludes_info_by_default() {
    let mask = severity_mask(&Config::default());
    assert!(mask.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR));
    assert!(mask.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
    assert!(!mask.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));

    let verbose = severity_mask(&Config { include_info: true, enable_stats: false });
    assert!(verbose.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
}
