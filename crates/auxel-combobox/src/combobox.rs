//! The tag-combobox component
//!
//! Owns per-instance state (config, timers, announcement machine, mutation
//! watcher) and ties the layers together. The host application drives it:
//! key/click events go to the input controller, external DOM changes arrive
//! through `handle_mutations`, and time advances through `tick`.
//!
//! Structural children are re-resolved at every use; nothing is cached
//! across disconnect.

use auxel_a11y::A11yContext;
use auxel_dom::{Document, Event, NodeId};

use crate::announce::{AnnounceMachine, StructuralChange};
use crate::config::ComboConfig;
use crate::reconcile::{self, reconcile, ComboParts, ReconcileInput, ReconcileOutcome};
use crate::schedule::{Scheduler, TimerKey, BLUR_DEBOUNCE_MS};
use crate::signals::SignalListeners;
use crate::watch::MutationWatcher;

/// Host element tag name
pub const HOST_TAG: &str = "auxel-combobox";

/// Selected-item chip tag name
pub const ITEM_TAG: &str = "auxel-item";

/// Component construction errors
#[derive(Debug, thiserror::Error)]
pub enum ComboboxError {
    #[error("host element has unexpected tag (want {HOST_TAG})")]
    WrongHostTag,
    #[error("host node not found in document")]
    HostNotFound,
}

/// A multi-value combobox/tag-input instance
pub struct TagCombobox {
    host: NodeId,
    config: ComboConfig,
    scheduler: Scheduler,
    watcher: MutationWatcher,
    announce: AnnounceMachine,
    listeners: SignalListeners,
    outbox: Vec<Event>,
    last_values: Vec<String>,
    /// Dismiss affordance temporarily made focusable by Tab
    pub(crate) armed_dismiss: Option<NodeId>,
    connected: bool,
}

impl TagCombobox {
    /// Bind a component instance to a host element
    pub fn new(doc: &Document, host: NodeId) -> Result<Self, ComboboxError> {
        if doc.node(host).is_none() {
            return Err(ComboboxError::HostNotFound);
        }
        if !doc.has_tag(host, HOST_TAG) {
            return Err(ComboboxError::WrongHostTag);
        }
        Ok(Self {
            host,
            config: ComboConfig::from_host(doc, host),
            scheduler: Scheduler::new(),
            watcher: MutationWatcher::new(doc, host),
            announce: AnnounceMachine::new(),
            listeners: SignalListeners::new(),
            outbox: Vec::new(),
            last_values: Vec::new(),
            armed_dismiss: None,
            connected: false,
        })
    }

    /// Host element
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Current configuration
    pub fn config(&self) -> &ComboConfig {
        &self.config
    }

    /// Announcement machine (test observability)
    pub fn announce(&self) -> &AnnounceMachine {
        &self.announce
    }

    /// Registered signal listeners
    pub fn listeners_mut(&mut self) -> &mut SignalListeners {
        &mut self.listeners
    }

    /// Drain emitted events (the change funnel)
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // --- public read surface ---------------------------------------------

    /// Live view of the selected item elements, in document order
    pub fn items(&self, doc: &Document) -> Vec<NodeId> {
        self.parts(doc).items
    }

    /// Current selected values, in document order
    pub fn values(&self, doc: &Document) -> Vec<String> {
        self.parts(doc)
            .items
            .into_iter()
            .filter_map(|item| reconcile::item_value(doc, item))
            .collect()
    }

    /// The text control, if present
    pub fn control(&self, doc: &Document) -> Option<NodeId> {
        self.parts(doc).control
    }

    /// The hidden mirror control
    pub fn mirror(&self, doc: &Document) -> Option<NodeId> {
        self.parts(doc).mirror
    }

    /// The referenced suggestion listbox, re-resolved on every call
    pub fn listbox(&self, doc: &Document) -> Option<NodeId> {
        self.parts(doc).listbox
    }

    pub(crate) fn parts(&self, doc: &Document) -> ComboParts {
        ComboParts::resolve(doc, self.host, self.config.list_id.as_deref())
    }

    // --- lifecycle --------------------------------------------------------

    /// The host element was connected to the document
    pub fn connected(&mut self, doc: &mut Document, _a11y: &mut A11yContext) {
        // The hidden mirror is owned by the engine; create it if the host
        // markup did not carry one.
        if self.parts(doc).mirror.is_none() {
            let mirror = doc.create_element("select");
            if let Err(err) = doc.append_child(self.host, mirror) {
                tracing::warn!("failed to attach mirror control: {}", err);
            }
        }
        self.connected = true;
        // Mount is a bulk state: never announced, and not a value change.
        self.reconcile_and_settle(doc);
        self.outbox.clear();
    }

    /// The host element was disconnected from the document
    pub fn disconnected(&mut self, doc: &Document, a11y: &mut A11yContext) {
        self.announce.on_disconnect(&mut self.scheduler);
        a11y.focus.clear_if_within(doc, self.host);
        self.armed_dismiss = None;
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // --- reconciliation ---------------------------------------------------

    /// Run one reconciliation pass, emit a change event if the committed
    /// values moved, and discard the resulting self-write records.
    pub(crate) fn reconcile_and_settle(&mut self, doc: &mut Document) -> ReconcileOutcome {
        let outcome = {
            let input = ReconcileInput {
                list_id: self.config.list_id.as_deref(),
                messages: &self.config.messages,
                prefix: self.announce.prefix(),
                suppress_expanded: self.announce.is_suppressing_expanded(),
            };
            reconcile(doc, self.host, &input)
        };
        if outcome.values != self.last_values {
            if let Some(mirror) = self.parts(doc).mirror {
                self.outbox.push(Event::change(mirror));
            }
            self.last_values = outcome.values.clone();
        }
        self.watcher.drain_self_writes(doc);
        outcome
    }

    // --- external mutation ------------------------------------------------

    /// Process one event-loop turn's worth of external DOM mutations.
    ///
    /// The batch is treated atomically: one consistent end state is computed
    /// from the whole batch, and only a batch containing exactly one item
    /// insertion or removal is announced.
    pub fn handle_mutations(&mut self, doc: &mut Document, a11y: &mut A11yContext) {
        if !self.connected {
            return;
        }
        let batch = self.watcher.take_batch(doc);
        if batch.is_empty() {
            return;
        }

        // Host attribute edits can change config and messages.
        if batch.attr_changes.iter().any(|(target, _)| *target == self.host) {
            self.config = ComboConfig::from_host(doc, self.host);
        }

        let single_change = if batch.structural_count() == 1 {
            let (added, node) = match batch.items_added.first() {
                Some(&n) => (true, n),
                None => (false, batch.items_removed[0]),
            };
            Some((added, node))
        } else {
            None
        };

        // An externally removed item may have held focus; the focused node is
        // detached by now, so containment alone misses that case.
        let focus_inside = match single_change {
            Some((added, node)) => {
                a11y.focus.is_within(doc, self.host)
                    || (!added && a11y.focus.focused() == Some(node))
            }
            None => false,
        };

        match single_change {
            Some((added, node)) if focus_inside => {
                let label = reconcile::item_display(doc, node);
                let parts = self.parts(doc);
                let target = if added {
                    Some(node)
                } else {
                    // The removed node's position is gone; land on the last
                    // remaining item, or the control when none remain.
                    parts.items.last().copied().or(parts.control)
                };
                if let Some(divert) = target {
                    let restore = if added {
                        parts.control.unwrap_or(divert)
                    } else {
                        divert
                    };
                    self.announce.on_structural_change(
                        doc,
                        a11y,
                        &mut self.scheduler,
                        parts.control,
                        &self.config.messages,
                        StructuralChange { added, label, divert, restore },
                    );
                }
            }
            _ => {}
        }

        self.reconcile_and_settle(doc);
    }

    // --- focus and time ---------------------------------------------------

    /// Called by the host after document focus moved
    pub fn handle_focus_change(&mut self, doc: &Document, a11y: &A11yContext) {
        if !self.connected {
            return;
        }
        if a11y.focus.is_within(doc, self.host) {
            self.scheduler.cancel(TimerKey::BlurDebounce);
        } else {
            self.scheduler.schedule_in(TimerKey::BlurDebounce, BLUR_DEBOUNCE_MS);
        }
    }

    /// Advance the clock and run any due deferred work
    pub fn tick(&mut self, doc: &mut Document, a11y: &mut A11yContext, now: u64) {
        let fired = self.scheduler.run_due(now);
        for key in fired {
            match key {
                TimerKey::AnnounceRestore => {
                    let control = self.parts(doc).control;
                    self.announce.on_restore_timer(doc, a11y, self.host, control);
                    // Rewrites labels without the prefix (unless the blink
                    // family deferred that to blur) and restores expanded.
                    self.reconcile_and_settle(doc);
                }
                TimerKey::BlurDebounce => {
                    if !a11y.focus.is_within(doc, self.host) {
                        self.announce.on_blur_complete(&mut self.scheduler);
                        self.revert_armed_dismiss(doc);
                        self.reconcile_and_settle(doc);
                    }
                }
                TimerKey::TabRevert => {
                    self.revert_armed_dismiss(doc);
                }
            }
        }
    }

    pub(crate) fn revert_armed_dismiss(&mut self, doc: &mut Document) {
        if let Some(dismiss) = self.armed_dismiss.take() {
            doc.set_attr(dismiss, "tabindex", "-1");
            self.watcher.drain_self_writes(doc);
        }
        self.scheduler.cancel(TimerKey::TabRevert);
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Split borrow for callers that drive the machine and its timers.
    pub(crate) fn announce_and_scheduler(&mut self) -> (&mut AnnounceMachine, &mut Scheduler) {
        (&mut self.announce, &mut self.scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_tag() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div).unwrap();
        assert!(matches!(
            TagCombobox::new(&doc, div),
            Err(ComboboxError::WrongHostTag)
        ));
    }

    #[test]
    fn test_connected_creates_mirror() {
        let mut doc = Document::new();
        let host = doc.create_element(HOST_TAG);
        doc.append_child(doc.root(), host).unwrap();
        let control = doc.create_element("input");
        doc.append_child(host, control).unwrap();

        let mut a11y = A11yContext::default();
        let mut combo = TagCombobox::new(&doc, host).unwrap();
        combo.connected(&mut doc, &mut a11y);

        let mirror = combo.mirror(&doc).expect("mirror created on connect");
        assert!(doc.has_attr(mirror, "hidden"));
        assert_eq!(doc.attr(mirror, "aria-hidden"), Some("true"));
        assert!(combo.is_connected());
    }

    #[test]
    fn test_self_writes_do_not_reenter() {
        let mut doc = Document::new();
        let host = doc.create_element(HOST_TAG);
        doc.append_child(doc.root(), host).unwrap();
        let control = doc.create_element("input");
        doc.append_child(host, control).unwrap();
        doc.take_records();

        let mut a11y = A11yContext::default();
        let mut combo = TagCombobox::new(&doc, host).unwrap();
        combo.connected(&mut doc, &mut a11y);

        // Everything the engine just wrote has been drained; the next
        // mutation pass sees an empty queue and does nothing.
        let writes = doc.write_count();
        combo.handle_mutations(&mut doc, &mut a11y);
        assert_eq!(doc.write_count(), writes);
    }
}
