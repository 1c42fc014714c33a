//! Verbosity-gated logging for the schedule generator.
//!
//! Messages go to stderr and cost nothing beyond an integer comparison when
//! the configured verbosity is below the message level:
//! - 0: SILENT
//! - 1: CHANGES (placements, accepted optimizer moves, phase summaries)
//! - 2: CHECKS (rejected candidates, skipped locked sessions)
//! - 3: DEBUG (every candidate score, sweep internals)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Emit a message when `verbosity` reaches `level`.
#[macro_export]
macro_rules! log_at {
    ($level:expr, $verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $level {
            eprintln!("[confsched] {}", format_args!($($arg)*));
        }
    };
}

/// Placements, accepted improvements, phase summaries.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_CHANGES, $verbosity, $($arg)*)
    };
}

/// Candidate rejections and skip reasons.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_CHECKS, $verbosity, $($arg)*)
    };
}

/// Per-candidate scores and optimizer sweep internals.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::VERBOSITY_DEBUG, $verbosity, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_CHECKS);
        assert!(VERBOSITY_CHECKS < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_silent_macros_do_not_evaluate_output() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "placed {} in {}", "s1", "hall-a");
        log_checks!(verbosity, "rejected {}", "s2");
        log_debug!(verbosity, "score={:.2}", 42.0);
    }
}
