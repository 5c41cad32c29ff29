//! Focus/announcement state machine
//!
//! Decides whether and how a structural change (one item added or removed)
//! is announced, where focus temporarily moves so the announcement is read,
//! and how everything is restored afterwards. Behavior branches on two
//! independent platform axes (see `auxel_a11y::PlatformQuirks`):
//!
//! - touch platforms cannot have focus moved to read a change, so the text
//!   goes through the live region instead
//! - one engine family re-announces on any label mutation while the element
//!   stays focused, so the announcement prefix is cleared on blur there
//!   rather than on the restore timer
//!
//! At most one announcement is in flight per component; a new structural
//! change replaces a pending one instead of queuing behind it.

use auxel_a11y::A11yContext;
use auxel_dom::{Document, NodeId};

use crate::config::Messages;
use crate::schedule::{Scheduler, TimerKey, RESTORE_DELAY_MS};

/// Machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncePhase {
    Idle,
    AnnouncePending,
    FocusDiverted,
    Restoring,
}

/// One item-level structural change
#[derive(Debug)]
pub struct StructuralChange {
    /// true for an addition, false for a removal
    pub added: bool,
    /// Display label of the changed item
    pub label: String,
    /// Element focus is diverted to so the new label is read
    pub divert: NodeId,
    /// Element focus returns to after the platform has read the change
    pub restore: NodeId,
}

/// Per-component announcement state
#[derive(Debug)]
pub struct AnnounceMachine {
    phase: AnnouncePhase,
    prefix: String,
    restore_focus: Option<NodeId>,
    /// Old `aria-expanded` value temporarily removed from the control so
    /// the divert does not trigger an unrelated announcement
    suppressed_expanded: Option<String>,
    last_announced: String,
}

impl Default for AnnounceMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnounceMachine {
    pub fn new() -> Self {
        Self {
            phase: AnnouncePhase::Idle,
            prefix: String::new(),
            restore_focus: None,
            suppressed_expanded: None,
            last_announced: String::new(),
        }
    }

    pub fn phase(&self) -> AnnouncePhase {
        self.phase
    }

    /// Pending-announcement prefix composed into item labels
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `aria-expanded` writes must currently be skipped
    pub fn is_suppressing_expanded(&self) -> bool {
        self.suppressed_expanded.is_some()
    }

    /// Most recently composed announcement (test observability)
    pub fn last_announced(&self) -> &str {
        &self.last_announced
    }

    /// React to exactly one structural change while focus is inside the
    /// component. Replaces any announcement already in flight.
    pub fn on_structural_change(
        &mut self,
        doc: &mut Document,
        a11y: &mut A11yContext,
        scheduler: &mut Scheduler,
        control: Option<NodeId>,
        messages: &Messages,
        change: StructuralChange,
    ) {
        let text = if change.added {
            messages.announce_added(&change.label)
        } else {
            messages.announce_removed(&change.label)
        };
        self.last_announced = text.clone();

        // Replace, never queue.
        scheduler.cancel(TimerKey::AnnounceRestore);
        self.restore_focus = None;
        self.restore_suppressed(doc, control);

        if a11y.quirks.touch {
            a11y.channel.speak(doc, &text);
            self.prefix.clear();
            self.phase = AnnouncePhase::Idle;
            return;
        }

        self.phase = AnnouncePhase::AnnouncePending;
        self.prefix = format!("{} ", text);

        if let Some(control) = control {
            if let Some(old) = doc.attr(control, "aria-expanded").map(str::to_string) {
                doc.remove_attr(control, "aria-expanded");
                self.suppressed_expanded = Some(old);
            }
        }

        a11y.focus.focus(change.divert);
        self.restore_focus = Some(change.restore);
        self.phase = AnnouncePhase::FocusDiverted;
        scheduler.schedule_in(TimerKey::AnnounceRestore, RESTORE_DELAY_MS);
    }

    /// Restore timer fired. Returns true when the prefix was cleared and
    /// item labels need a rewrite.
    pub fn on_restore_timer(
        &mut self,
        doc: &mut Document,
        a11y: &mut A11yContext,
        host: NodeId,
        control: Option<NodeId>,
    ) -> bool {
        if self.phase != AnnouncePhase::FocusDiverted {
            return false;
        }
        self.restore_suppressed(doc, control);
        if !a11y.focus.is_within(doc, host) {
            // The user moved on mid-divert; restoring would steal focus.
            self.restore_focus = None;
            self.prefix.clear();
            self.phase = AnnouncePhase::Idle;
            return true;
        }
        self.phase = AnnouncePhase::Restoring;
        if let Some(target) = self.restore_focus.take() {
            if doc.is_connected(target) {
                a11y.focus.focus(target);
            }
        }
        if a11y.quirks.blink {
            // This family re-reads on label mutation while focused; clearing
            // the prefix now would double-announce. Wait for blur.
            false
        } else {
            self.prefix.clear();
            self.phase = AnnouncePhase::Idle;
            true
        }
    }

    /// The component definitively lost focus. Returns true when the prefix
    /// was cleared and item labels need a rewrite.
    pub fn on_blur_complete(&mut self, scheduler: &mut Scheduler) -> bool {
        scheduler.cancel(TimerKey::AnnounceRestore);
        let had_prefix = !self.prefix.is_empty();
        self.prefix.clear();
        self.suppressed_expanded = None;
        self.restore_focus = None;
        self.phase = AnnouncePhase::Idle;
        had_prefix
    }

    /// Component torn out of the tree: cancel everything, restore nothing.
    pub fn on_disconnect(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel_all();
        self.prefix.clear();
        self.suppressed_expanded = None;
        self.restore_focus = None;
        self.phase = AnnouncePhase::Idle;
    }

    fn restore_suppressed(&mut self, doc: &mut Document, control: Option<NodeId>) {
        if let (Some(old), Some(control)) = (self.suppressed_expanded.take(), control) {
            doc.set_attr(control, "aria-expanded", &old);
        }
    }
}
