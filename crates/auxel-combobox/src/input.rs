//! Input/keyboard controller
//!
//! Translates keystrokes and pointer clicks on the control, the item list
//! and the suggestion list into reconciler and state-machine operations.
//! Every mutating path fires a cancellable before-signal first; a vetoed
//! signal means no mutation and no focus movement. A disabled or read-only
//! control suppresses the whole controller.

use auxel_a11y::A11yContext;
use auxel_dom::{Document, NodeId};

use crate::announce::StructuralChange;
use crate::combobox::{TagCombobox, ITEM_TAG};
use crate::reconcile::{self, ComboParts};
use crate::schedule::{TimerKey, TAB_REVERT_MS};
use crate::signals::{MatchSignal, SelectOp, SelectSignal};

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    Tab,
}

/// One keydown as delivered by the host
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: Key,
    /// Key auto-repeat (held key); removal is suppressed for these
    pub repeat: bool,
    /// Caret position inside the control, when focus is there
    pub caret: Option<usize>,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, repeat: false, caret: None }
    }

    pub fn repeated(key: Key) -> Self {
        Self { key, repeat: true, caret: None }
    }

    pub fn with_caret(mut self, caret: usize) -> Self {
        self.caret = Some(caret);
        self
    }
}

impl TagCombobox {
    /// Handle a keydown targeted inside the component
    pub fn handle_key(&mut self, doc: &mut Document, a11y: &mut A11yContext, ev: KeyEvent) {
        if !self.is_connected() || self.control_blocked(doc) {
            return;
        }
        // A tab-armed dismiss affordance is focusable for exactly one press;
        // the next keydown of any kind reverts it.
        let was_armed = self.armed_dismiss.is_some();
        if was_armed {
            self.revert_armed_dismiss(doc);
        }

        match ev.key {
            Key::Enter => self.commit_text(doc, a11y),
            Key::Backspace | Key::Delete => {
                if ev.repeat {
                    // One removal per physical press.
                    return;
                }
                self.remove_at_focus(doc, a11y, ev.caret);
            }
            Key::ArrowLeft => self.navigate(doc, a11y, -1, ev.caret),
            Key::ArrowRight => self.navigate(doc, a11y, 1, ev.caret),
            Key::Tab => {
                if !was_armed {
                    self.arm_dismiss(doc, a11y);
                }
            }
        }
    }

    /// Handle a pointer click on a node inside the component or its listbox
    pub fn handle_click(&mut self, doc: &mut Document, a11y: &mut A11yContext, target: NodeId) {
        if !self.is_connected() || self.control_blocked(doc) {
            return;
        }
        let parts = self.parts(doc);

        if doc.has_attr(target, "data-dismiss") {
            if let Some(item) = self.item_of(doc, &parts, target) {
                self.remove_item(doc, a11y, item);
            }
            return;
        }
        if parts.options.contains(&target) {
            let value = reconcile::option_value(doc, target);
            let label = reconcile::option_label(doc, target);
            self.add_item(doc, a11y, &value, &label);
            return;
        }
        if parts.items.contains(&target) {
            self.set_focus(doc, a11y, target);
        }
    }

    /// The control's text was edited: filter suggestions and announce the
    /// result count.
    pub fn handle_input(&mut self, doc: &mut Document, a11y: &mut A11yContext) {
        if !self.is_connected() || self.control_blocked(doc) {
            return;
        }
        let parts = self.parts(doc);
        let Some(control) = parts.control else { return };
        if parts.listbox.is_none() {
            return;
        }
        let query = doc
            .attr(control, "value")
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        let mut visible = 0usize;
        for &option in &parts.options {
            let label = reconcile::option_label(doc, option).to_ascii_lowercase();
            let matches = query.is_empty() || label.contains(&query);
            if matches {
                doc.remove_attr(option, "hidden");
                visible += 1;
            } else {
                doc.set_attr(option, "hidden", "");
            }
        }
        let announcement = self.config().messages.results(visible);
        a11y.channel.speak(doc, &announcement);
        self.reconcile_and_settle(doc);
    }

    // --- commit ----------------------------------------------------------

    fn commit_text(&mut self, doc: &mut Document, a11y: &mut A11yContext) {
        let parts = self.parts(doc);
        let Some(control) = parts.control else { return };
        let text = doc.attr(control, "value").unwrap_or("").trim().to_string();

        let mut signal = MatchSignal::new(&text);
        self.listeners_mut().fire_before_match(&mut signal);

        if signal.is_handled() {
            // The application already flagged the matched options; trust
            // those instead of recomputing the match.
            let current = self.values(doc);
            let chosen: Vec<(String, String)> = parts
                .options
                .iter()
                .filter(|&&o| {
                    doc.has_attr(o, "selected") || doc.attr(o, "aria-selected") == Some("true")
                })
                .map(|&o| (reconcile::option_value(doc, o), reconcile::option_label(doc, o)))
                .filter(|(value, _)| !current.contains(value))
                .collect();
            for (value, label) in chosen {
                self.add_item(doc, a11y, &value, &label);
            }
            return;
        }
        if signal.is_default_prevented() {
            return;
        }

        let matched = parts.options.iter().find(|&&o| {
            reconcile::option_label(doc, o).eq_ignore_ascii_case(&text) && !text.is_empty()
        });
        if let Some(&option) = matched {
            if doc.has_attr(option, "disabled") {
                let invalid = self.config().messages.invalid.clone();
                a11y.channel.speak(doc, &invalid);
                return;
            }
            let value = reconcile::option_value(doc, option);
            let label = reconcile::option_label(doc, option);
            self.add_item(doc, a11y, &value, &label);
        } else if self.config().creatable && !text.is_empty() {
            self.add_item(doc, a11y, &text, &text);
        } else if !self.config().multiple {
            if let Some(&item) = parts.items.first() {
                // Single-selection: a failed commit clears the selection.
                self.remove_item(doc, a11y, item);
            }
        } else if !text.is_empty() {
            let invalid = self.config().messages.invalid.clone();
            a11y.channel.speak(doc, &invalid);
        }
    }

    /// Add an item for `value`. Returns false when vetoed.
    pub fn add_item(
        &mut self,
        doc: &mut Document,
        a11y: &mut A11yContext,
        value: &str,
        label: &str,
    ) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let mut signal = SelectSignal::before(SelectOp::Add, value, label);
        self.listeners_mut().fire_before_select(&mut signal);
        if signal.is_default_prevented() {
            return false;
        }

        let parts = self.parts(doc);
        // Single-selection mode: committing replaces the existing item.
        if !self.config().multiple {
            for &item in &parts.items {
                let _ = doc.remove(item);
            }
        } else {
            // Value-keyed identity: a duplicate commit replaces the
            // existing logical entry.
            for &item in &parts.items {
                if reconcile::item_value(doc, item).as_deref() == Some(value) {
                    let _ = doc.remove(item);
                }
            }
        }

        let item = doc.create_element(ITEM_TAG);
        doc.set_attr(item, "data-value", value);
        let text = doc.create_text(label);
        if let Err(err) = doc.append_child(item, text) {
            tracing::warn!("failed to label new item: {}", err);
        }
        // New items land after the last existing item, before the control.
        let inserted = match parts.control.filter(|&c| doc.parent(c) == Some(self.host())) {
            Some(control) => doc.insert_before(self.host(), item, Some(control)),
            None => doc.append_child(self.host(), item),
        };
        if let Err(err) = inserted {
            tracing::warn!("failed to insert item: {}", err);
            return false;
        }

        if let Some(control) = parts.control {
            doc.set_attr(control, "value", "");
        }

        let mut after = SelectSignal::after(SelectOp::Add, value, label);
        self.listeners_mut().fire_after_select(&mut after);

        if a11y.focus.is_within(doc, self.host()) {
            let restore = parts.control.unwrap_or(item);
            let messages = self.config().messages.clone();
            self.announce_change(
                doc,
                a11y,
                &messages,
                StructuralChange {
                    added: true,
                    label: label.to_string(),
                    divert: item,
                    restore,
                },
            );
        }
        self.reconcile_and_settle(doc);
        true
    }

    /// Remove an item. Returns false when vetoed.
    pub fn remove_item(&mut self, doc: &mut Document, a11y: &mut A11yContext, item: NodeId) -> bool {
        let value = reconcile::item_value(doc, item).unwrap_or_default();
        let label = reconcile::item_display(doc, item);

        let mut signal = SelectSignal::before(SelectOp::Remove, &value, &label);
        self.listeners_mut().fire_before_select(&mut signal);
        if signal.is_default_prevented() {
            return false;
        }

        let parts = self.parts(doc);
        // Containment must be answered before the node is detached: the
        // removed item may itself hold focus.
        let focus_inside = a11y.focus.is_within(doc, self.host());
        // Focus lands on the previous item, the next one, or the control.
        let index = parts.items.iter().position(|&i| i == item);
        let neighbor = index.and_then(|i| {
            if i > 0 {
                parts.items.get(i - 1).copied()
            } else {
                parts.items.get(1).copied()
            }
        });
        let target = neighbor.or(parts.control);

        if let Err(err) = doc.remove(item) {
            tracing::warn!("failed to remove item: {}", err);
            return false;
        }

        let mut after = SelectSignal::after(SelectOp::Remove, &value, &label);
        self.listeners_mut().fire_after_select(&mut after);

        if let Some(divert) = target {
            if focus_inside {
                let messages = self.config().messages.clone();
                self.announce_change(
                    doc,
                    a11y,
                    &messages,
                    StructuralChange { added: false, label, divert, restore: divert },
                );
            }
        }
        self.reconcile_and_settle(doc);
        true
    }

    fn announce_change(
        &mut self,
        doc: &mut Document,
        a11y: &mut A11yContext,
        messages: &crate::config::Messages,
        change: StructuralChange,
    ) {
        let control = self.parts(doc).control;
        let (announce, scheduler) = self.announce_and_scheduler();
        announce.on_structural_change(doc, a11y, scheduler, control, messages, change);
    }

    // --- removal/navigation helpers --------------------------------------

    fn remove_at_focus(&mut self, doc: &mut Document, a11y: &mut A11yContext, caret: Option<usize>) {
        let parts = self.parts(doc);
        let Some(focused) = a11y.focus.focused() else { return };

        if parts.items.contains(&focused) {
            self.remove_item(doc, a11y, focused);
        } else if Some(focused) == parts.control && caret == Some(0) {
            if let Some(&last) = parts.items.last() {
                self.remove_item(doc, a11y, last);
            }
        }
    }

    /// Roving focus across `[0..item_count]`, the control sitting at
    /// index `item_count`. Neither end cycles.
    fn navigate(&mut self, doc: &mut Document, a11y: &mut A11yContext, dir: i32, caret: Option<usize>) {
        let parts = self.parts(doc);
        let Some(focused) = a11y.focus.focused() else { return };

        let index = if Some(focused) == parts.control {
            parts.items.len()
        } else {
            match parts.items.iter().position(|&i| i == focused) {
                Some(i) => i,
                None => return,
            }
        };

        if dir < 0 {
            if index == parts.items.len() {
                // Only leave the control when the caret sits at its start.
                if caret != Some(0) {
                    return;
                }
                if let Some(&last) = parts.items.last() {
                    self.set_focus(doc, a11y, last);
                }
            } else if index > 0 {
                self.set_focus(doc, a11y, parts.items[index - 1]);
            }
            // index 0: stay put, no cycling
        } else if index < parts.items.len() {
            if index + 1 == parts.items.len() {
                if let Some(control) = parts.control {
                    self.set_focus(doc, a11y, control);
                }
            } else {
                self.set_focus(doc, a11y, parts.items[index + 1]);
            }
        }
        // At the control: ArrowRight is a no-op
    }

    /// Make the focused item's dismiss affordance reachable for one Tab
    /// press.
    fn arm_dismiss(&mut self, doc: &mut Document, a11y: &mut A11yContext) {
        let parts = self.parts(doc);
        let Some(focused) = a11y.focus.focused() else { return };
        if !parts.items.contains(&focused) {
            return;
        }
        let Some(dismiss) = reconcile::dismiss_of(doc, focused) else { return };
        if doc.has_attr(dismiss, "hidden") || doc.attr(dismiss, "tabindex") == Some("0") {
            return;
        }
        doc.set_attr(dismiss, "tabindex", "0");
        a11y.focus.focus(dismiss);
        self.armed_dismiss = Some(dismiss);
        self.scheduler_mut().schedule_in(TimerKey::TabRevert, TAB_REVERT_MS);
    }

    /// Move roving focus, keeping a single shared tab stop among items
    pub(crate) fn set_focus(&mut self, doc: &mut Document, a11y: &mut A11yContext, target: NodeId) {
        let parts = self.parts(doc);
        for &item in &parts.items {
            let tabindex = if item == target { "0" } else { "-1" };
            doc.set_attr(item, "tabindex", tabindex);
        }
        a11y.focus.focus(target);
    }

    fn control_blocked(&self, doc: &Document) -> bool {
        self.parts(doc)
            .control
            .map(|c| doc.has_attr(c, "disabled") || doc.has_attr(c, "readonly"))
            .unwrap_or(false)
    }

    fn item_of(&self, doc: &Document, parts: &ComboParts, node: NodeId) -> Option<NodeId> {
        let mut cur = node;
        loop {
            if parts.items.contains(&cur) {
                return Some(cur);
            }
            cur = doc.parent(cur)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combobox::HOST_TAG;

    fn fixture() -> (Document, A11yContext, TagCombobox, NodeId) {
        let mut doc = Document::new();
        let host = doc.create_element(HOST_TAG);
        doc.set_attr(host, "multiple", "");
        doc.set_attr(host, "creatable", "");
        doc.append_child(doc.root(), host).unwrap();
        let control = doc.create_element("input");
        doc.append_child(host, control).unwrap();
        doc.take_records();

        let mut a11y = A11yContext::default();
        a11y.focus.focus(control);
        let mut combo = TagCombobox::new(&doc, host).unwrap();
        combo.connected(&mut doc, &mut a11y);
        (doc, a11y, combo, control)
    }

    #[test]
    fn test_key_event_builders() {
        let ev = KeyEvent::new(Key::ArrowLeft).with_caret(0);
        assert!(!ev.repeat);
        assert_eq!(ev.caret, Some(0));
        assert!(KeyEvent::repeated(Key::Backspace).repeat);
    }

    #[test]
    fn test_add_item_clears_control_and_orders_before_it() {
        let (mut doc, mut a11y, mut combo, control) = fixture();
        doc.set_attr(control, "value", "leftover");

        assert!(combo.add_item(&mut doc, &mut a11y, "x", "X"));
        assert_eq!(doc.attr(control, "value"), Some(""));

        let children = doc.child_elements(combo.host());
        assert!(doc.has_tag(children[0], ITEM_TAG));
        assert_eq!(doc.tag(children[1]), Some("input"));
    }

    #[test]
    fn test_add_item_rejects_blank_value() {
        let (mut doc, mut a11y, mut combo, _) = fixture();
        assert!(!combo.add_item(&mut doc, &mut a11y, "  ", "blank"));
        assert!(combo.values(&doc).is_empty());
    }

    #[test]
    fn test_remove_missing_item_is_an_error_not_a_panic() {
        let (mut doc, mut a11y, mut combo, _) = fixture();
        let detached = doc.create_element(ITEM_TAG);
        assert!(!combo.remove_item(&mut doc, &mut a11y, detached));
    }
}
