//! Platform capability flags
//!
//! Screen readers and rendering engines disagree on when ARIA state is
//! (re-)read. The two axes that change component behavior are resolved once
//! at construction and injected, never probed inline:
//!
//! - `touch`: focus cannot practically be moved to have a change read, so
//!   announcements go through the live region instead of a focus divert
//! - `blink`: the platform family re-announces an element whenever its
//!   accessible label mutates while it stays focused, so announcement-prefix
//!   cleanup must wait for blur instead of running on a timer
//!
//! The axes are orthogonal; all four combinations are valid.

/// Injected platform capability table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformQuirks {
    /// Touch/mobile platform: announce via the live region, never by
    /// diverting focus
    pub touch: bool,
    /// Label-change re-announcing engine family: defer prefix reset to blur
    pub blink: bool,
}

impl PlatformQuirks {
    /// Desktop defaults: focus diverts allowed, timer-based reset
    pub fn desktop() -> Self {
        Self::default()
    }

    /// Touch/mobile platform
    pub fn touch_device() -> Self {
        Self { touch: true, blink: false }
    }

    /// Desktop on the re-announcing engine family
    pub fn blink_desktop() -> Self {
        Self { touch: false, blink: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_are_independent() {
        let all = [
            PlatformQuirks { touch: false, blink: false },
            PlatformQuirks { touch: true, blink: false },
            PlatformQuirks { touch: false, blink: true },
            PlatformQuirks { touch: true, blink: true },
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}
