//! Logging macros for the schedulers with verbosity level control.
//!
//! Nothing is emitted below the requested level, so verbosity 0 costs a
//! comparison per call site. Events go to `tracing`:
//! - 0: SILENT (nothing)
//! - 1: CHANGES (pass boundaries, project finish) at info
//! - 2: CHECKS (per-activity computed dates) at debug
//! - 3: DEBUG (per-relation intermediate values) at trace

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: pass boundaries, project start and finish.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            ::tracing::info!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: dates computed for each activity.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: per-relation candidate dates.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            ::tracing::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_ordering() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_at_every_level() {
        for verbosity in [VERBOSITY_SILENT, VERBOSITY_CHANGES, VERBOSITY_CHECKS, VERBOSITY_DEBUG] {
            log_changes!(verbosity, "pass {}", 1);
            log_checks!(verbosity, "activity {} early start {}", "A", 2);
            log_debug!(verbosity, "relation {}", 3);
        }
    }
}
