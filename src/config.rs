//! Global runtime switches.
//!
//! Set once at startup from the command line and read by the sweeps.

use std::sync::atomic::{AtomicBool, Ordering};

/// When set, a window that goes backwards behind a committed marker is an
/// error instead of a rescan from the partition head.
static STRICT_ORDER: AtomicBool = AtomicBool::new(false);

/// Enable or disable strict sweep ordering.
///
/// # Example
///
/// ```
/// use gatools::config;
///
/// config::set_strict_order(true);
/// assert!(config::is_strict_order());
/// config::set_strict_order(false);
/// ```
#[inline]
pub fn set_strict_order(enabled: bool) {
    STRICT_ORDER.store(enabled, Ordering::Release);
}

/// Check whether strict sweep ordering is enabled.
#[inline]
pub fn is_strict_order() -> bool {
    STRICT_ORDER.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_is_lenient() {
        set_strict_order(false);
        assert!(!is_strict_order());
    }

    #[test]
    #[serial]
    fn test_toggle_strict_order() {
        set_strict_order(true);
        assert!(is_strict_order());
        set_strict_order(false);
        assert!(!is_strict_order());
    }
}
