use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turns verbose scan tracing on or off for the whole process.
pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Local wall-clock prefix for debug lines, e.g. `[14:03:11.482]`.
pub fn stamp() -> String {
    chrono::Local::now().format("[%H:%M:%S%.3f]").to_string()
}

/// Prints to stdout with a timestamp, only when `--debug` is set.
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            println!("{} {}", $crate::debug::stamp(), format!($($arg)*));
        }
    };
}

/// Same as `debug_println!` but on stderr; used for extraction and fetch failures.
#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("{} {}", $crate::debug::stamp(), format!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_is_bracketed_time() {
        let s = stamp();
        assert!(s.starts_with('[') && s.ends_with(']'));
        assert_eq!(s.matches(':').count(), 2);
    }
}
