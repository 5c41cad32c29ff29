//! auxel Accessibility
//!
//! Accessibility substrate shared by the auxel elements:
//! - screen-reader announcement channel (shared off-screen live region)
//! - document focus tracking
//! - injected platform capability flags
//!
//! Everything here is dependency-injected into components so tests can
//! exercise every platform branch deterministically.

pub mod focus;
pub mod live_region;
pub mod quirks;

pub use focus::FocusTracker;
pub use live_region::AnnouncementChannel;
pub use quirks::PlatformQuirks;

/// Bundle of the injected accessibility collaborators.
///
/// One per document; shared by every component instance living in it.
#[derive(Debug, Default)]
pub struct A11yContext {
    pub quirks: PlatformQuirks,
    pub channel: AnnouncementChannel,
    pub focus: FocusTracker,
}

impl A11yContext {
    pub fn new(quirks: PlatformQuirks) -> Self {
        Self {
            quirks,
            channel: AnnouncementChannel::new(),
            focus: FocusTracker::new(),
        }
    }
}
