//! Item/option reconciliation
//!
//! Recomputes every derived surface from current state: item values and
//! accessible labels, the hidden multi-select mirror, and the suggestion
//! list's derived selection flags. All writes go through the document's
//! guarded setters, so running the reconciler twice with no intervening
//! state change performs zero additional DOM writes.
//!
//! Item identity is keyed by value: when two items carry the same value the
//! later one in document order wins and earlier ones are removed.

use auxel_dom::{Document, NodeId};

use crate::combobox::ITEM_TAG;
use crate::config::Messages;

/// Resolved structural children of one component instance.
///
/// Resolved fresh at every use; the listbox reference in particular is never
/// cached across disconnect.
#[derive(Debug)]
pub struct ComboParts {
    pub host: NodeId,
    /// The text entry the user types into (may be absent while streaming in)
    pub control: Option<NodeId>,
    /// Hidden native multi-select mirror
    pub mirror: Option<NodeId>,
    /// Selected item chips, in document order
    pub items: Vec<NodeId>,
    /// Externally referenced suggestion listbox
    pub listbox: Option<NodeId>,
    /// Candidate options inside the listbox
    pub options: Vec<NodeId>,
}

impl ComboParts {
    pub fn resolve(doc: &Document, host: NodeId, list_id: Option<&str>) -> Self {
        let mut control = None;
        let mut mirror = None;
        let mut items = Vec::new();
        for child in doc.child_elements(host) {
            match doc.tag(child) {
                Some("input") if control.is_none() => control = Some(child),
                Some("select") if mirror.is_none() => mirror = Some(child),
                Some(tag) if tag == ITEM_TAG => items.push(child),
                _ => {}
            }
        }
        let listbox = list_id
            .and_then(|id| doc.element_by_id(id))
            .filter(|&lb| doc.is_connected(lb));
        let options = listbox
            .map(|lb| {
                doc.child_elements(lb)
                    .into_iter()
                    .filter(|&o| doc.has_tag(o, "option"))
                    .collect()
            })
            .unwrap_or_default();
        Self { host, control, mirror, items, listbox, options }
    }
}

/// Inputs to one reconciliation pass
#[derive(Debug)]
pub struct ReconcileInput<'a> {
    pub list_id: Option<&'a str>,
    pub messages: &'a Messages,
    /// Pending-announcement prefix composed into item labels; empty unless
    /// an announcement is in flight
    pub prefix: &'a str,
    /// Skip `aria-expanded` writes while the state machine has suppressed it
    pub suppress_expanded: bool,
}

/// Result of one reconciliation pass
#[derive(Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Item values after deduplication, in document order
    pub values: Vec<String>,
    /// Earlier-in-order items dropped because a later one had their value
    pub duplicates_removed: usize,
}

/// Explicit value if set, otherwise derived from trimmed text content
pub(crate) fn item_value(doc: &Document, item: NodeId) -> Option<String> {
    if let Some(v) = doc.attr(item, "data-value") {
        return Some(v.to_string());
    }
    let derived = doc.text_content(item).trim().to_string();
    if derived.is_empty() { None } else { Some(derived) }
}

/// Display label: explicit label, else trimmed text, else the value
pub(crate) fn item_display(doc: &Document, item: NodeId) -> String {
    if let Some(l) = doc.attr(item, "data-label") {
        return l.to_string();
    }
    let text = doc.text_content(item).trim().to_string();
    if !text.is_empty() {
        return text;
    }
    item_value(doc, item).unwrap_or_default()
}

/// Value an option contributes when committed
pub(crate) fn option_value(doc: &Document, option: NodeId) -> String {
    doc.attr(option, "value")
        .map(str::to_string)
        .unwrap_or_else(|| doc.text_content(option).trim().to_string())
}

/// Label an option is matched against
pub(crate) fn option_label(doc: &Document, option: NodeId) -> String {
    let text = doc.text_content(option).trim().to_string();
    if text.is_empty() { option_value(doc, option) } else { text }
}

pub(crate) fn dismiss_of(doc: &Document, item: NodeId) -> Option<NodeId> {
    doc.child_elements(item)
        .into_iter()
        .find(|&c| doc.has_attr(c, "data-dismiss"))
}

/// Run one reconciliation pass over the component's subtree.
///
/// Degrades gracefully: a missing control skips the control-dependent steps
/// but item/option attributes are still normalized.
pub fn reconcile(doc: &mut Document, host: NodeId, input: &ReconcileInput) -> ReconcileOutcome {
    let mut parts = ComboParts::resolve(doc, host, input.list_id);

    // Derive missing values from text; never overwrite an explicit value.
    for &item in &parts.items {
        if !doc.has_attr(item, "data-value") {
            let derived = doc.text_content(item).trim().to_string();
            if !derived.is_empty() {
                doc.set_attr(item, "data-value", &derived);
            }
        }
    }

    // Value-keyed identity, last committed wins.
    let mut seen = std::collections::HashSet::new();
    let mut stale = Vec::new();
    for &item in parts.items.iter().rev() {
        if let Some(value) = item_value(doc, item) {
            if !seen.insert(value) {
                stale.push(item);
            }
        }
    }
    let duplicates_removed = stale.len();
    for item in stale {
        if let Err(err) = doc.remove(item) {
            tracing::warn!("failed to drop duplicate item: {}", err);
        }
    }
    if duplicates_removed > 0 {
        parts = ComboParts::resolve(doc, host, input.list_id);
    }

    let control_disabled = parts
        .control
        .map(|c| doc.has_attr(c, "disabled") || doc.has_attr(c, "readonly"))
        .unwrap_or(false);

    // Per-item aria wiring.
    let count = parts.items.len();
    for (index, &item) in parts.items.iter().enumerate() {
        let label = item_display(doc, item);
        doc.ensure_id(item);
        doc.set_attr(item, "role", "option");
        if !doc.has_attr(item, "tabindex") {
            doc.set_attr(item, "tabindex", "-1");
        }
        doc.set_attr(
            item,
            "aria-label",
            &input.messages.item_label(input.prefix, &label, index + 1, count),
        );

        let dismiss = match dismiss_of(doc, item) {
            Some(d) => d,
            None => {
                let d = doc.create_element("button");
                doc.set_attr(d, "data-dismiss", "");
                doc.set_attr(d, "tabindex", "-1");
                if let Err(err) = doc.append_child(item, d) {
                    tracing::warn!("failed to attach dismiss affordance: {}", err);
                }
                d
            }
        };
        doc.set_attr(
            dismiss,
            "aria-label",
            &format!("{}, {}", label, input.messages.remove),
        );
        if control_disabled {
            doc.set_attr(dismiss, "hidden", "");
        } else {
            doc.remove_attr(dismiss, "hidden");
        }
    }

    // Group label for the item list; respect an author-provided one.
    if !doc.has_attr(host, "aria-label") {
        doc.set_attr(host, "aria-label", &input.messages.items);
    }

    // Value/label pairs drive the mirror and option sync.
    let pairs: Vec<(String, String)> = parts
        .items
        .iter()
        .filter_map(|&item| item_value(doc, item).map(|v| (v, item_display(doc, item))))
        .collect();
    let values: Vec<String> = pairs.iter().map(|(v, _)| v.clone()).collect();

    // Hidden mirror: same count, order, values. Entries are updated in
    // place so unchanged positions keep their identity.
    if let Some(mirror) = parts.mirror {
        doc.set_attr(mirror, "multiple", "");
        doc.set_attr(mirror, "hidden", "");
        doc.set_attr(mirror, "aria-hidden", "true");
        doc.set_attr(mirror, "tabindex", "-1");

        let existing: Vec<NodeId> = doc
            .child_elements(mirror)
            .into_iter()
            .filter(|&o| doc.has_tag(o, "option"))
            .collect();
        for (index, (value, label)) in pairs.iter().enumerate() {
            match existing.get(index) {
                Some(&entry) => {
                    doc.set_attr(entry, "value", value);
                    doc.set_attr(entry, "selected", "");
                    doc.set_text_content(entry, label);
                }
                None => {
                    let entry = doc.create_element("option");
                    doc.set_attr(entry, "value", value);
                    doc.set_attr(entry, "selected", "");
                    doc.set_text_content(entry, label);
                    if let Err(err) = doc.append_child(mirror, entry) {
                        tracing::warn!("failed to grow mirror: {}", err);
                    }
                }
            }
        }
        for &extra in existing.iter().skip(pairs.len()) {
            if let Err(err) = doc.remove(extra) {
                tracing::warn!("failed to trim mirror: {}", err);
            }
        }
    }

    // Option sync is read-only derivation: selected ⟺ value is an item value.
    for &option in &parts.options {
        let selected = values.contains(&option_value(doc, option));
        doc.set_attr(option, "aria-selected", if selected { "true" } else { "false" });
    }

    // Control wiring; skipped entirely when the control is absent.
    if let Some(control) = parts.control {
        doc.set_attr(control, "role", "combobox");
        if let Some(listbox) = parts.listbox {
            let listbox_id = doc.ensure_id(listbox);
            doc.set_attr(control, "aria-controls", &listbox_id);
        }
        if !input.suppress_expanded {
            let expanded = parts
                .listbox
                .map(|lb| !doc.has_attr(lb, "hidden"))
                .unwrap_or(false);
            doc.set_attr(control, "aria-expanded", if expanded { "true" } else { "false" });
        }
    }

    ReconcileOutcome { values, duplicates_removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(item_labels: &[&str], option_specs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let host = doc.create_element("auxel-combobox");
        doc.set_attr(host, "multiple", "");
        doc.set_attr(host, "list", "suggestions");
        doc.append_child(doc.root(), host).unwrap();

        for label in item_labels {
            let item = doc.create_element(ITEM_TAG);
            let text = doc.create_text(label);
            doc.append_child(item, text).unwrap();
            doc.append_child(host, item).unwrap();
        }

        let control = doc.create_element("input");
        doc.append_child(host, control).unwrap();
        let mirror = doc.create_element("select");
        doc.append_child(host, mirror).unwrap();

        let listbox = doc.create_element("ul");
        doc.set_attr(listbox, "id", "suggestions");
        doc.append_child(doc.root(), listbox).unwrap();
        for (value, label) in option_specs {
            let option = doc.create_element("option");
            doc.set_attr(option, "value", value);
            let text = doc.create_text(label);
            doc.append_child(option, text).unwrap();
            doc.append_child(listbox, option).unwrap();
        }
        (doc, host)
    }

    fn run(doc: &mut Document, host: NodeId) -> ReconcileOutcome {
        let messages = Messages::default();
        let input = ReconcileInput {
            list_id: Some("suggestions"),
            messages: &messages,
            prefix: "",
            suppress_expanded: false,
        };
        reconcile(doc, host, &input)
    }

    #[test]
    fn test_values_derived_from_text() {
        let (mut doc, host) = fixture(&["Tag 1", "Tag 2"], &[]);
        let outcome = run(&mut doc, host);
        assert_eq!(outcome.values, vec!["Tag 1", "Tag 2"]);

        let parts = ComboParts::resolve(&doc, host, Some("suggestions"));
        for item in parts.items {
            assert!(doc.has_attr(item, "data-value"));
            assert_eq!(doc.attr(item, "role"), Some("option"));
            assert!(doc.attr(item, "id").is_some());
        }
    }

    #[test]
    fn test_explicit_value_never_overwritten() {
        let (mut doc, host) = fixture(&["Tag 1"], &[]);
        let parts = ComboParts::resolve(&doc, host, None);
        doc.set_attr(parts.items[0], "data-value", "custom");
        let outcome = run(&mut doc, host);
        assert_eq!(outcome.values, vec!["custom"]);
    }

    #[test]
    fn test_mirror_lockstep() {
        let (mut doc, host) = fixture(&["Tag 1", "Tag 2", "tag-3"], &[]);
        run(&mut doc, host);

        let parts = ComboParts::resolve(&doc, host, None);
        let mirror = parts.mirror.unwrap();
        let entries = doc.child_elements(mirror);
        assert_eq!(entries.len(), 3);
        assert_eq!(doc.attr(entries[2], "value"), Some("tag-3"));

        // Removing an item trims the mirror, reusing leading entries
        doc.remove(parts.items[2]).unwrap();
        run(&mut doc, host);
        let after = doc.child_elements(mirror);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], entries[0], "leading entry identity is reused");
    }

    #[test]
    fn test_option_selected_derivation() {
        let (mut doc, host) = fixture(
            &["Tag 1", "Tag 2", "tag-3"],
            &[
                ("Tag 1", "Tag 1"),
                ("Tag 2", "Tag 2"),
                ("tag-3", "Tag 3"),
                ("Tag 4", "Tag 4"),
                ("Tag 5", "Tag 5"),
            ],
        );
        run(&mut doc, host);

        let parts = ComboParts::resolve(&doc, host, Some("suggestions"));
        let selected: Vec<bool> = parts
            .options
            .iter()
            .map(|&o| doc.attr(o, "aria-selected") == Some("true"))
            .collect();
        assert_eq!(selected, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_idempotence_zero_writes() {
        let (mut doc, host) = fixture(&["Tag 1", "Tag 2"], &[("Tag 1", "Tag 1")]);
        run(&mut doc, host);
        let writes = doc.write_count();
        let outcome = run(&mut doc, host);
        assert_eq!(doc.write_count(), writes, "second pass writes nothing");
        assert_eq!(outcome.duplicates_removed, 0);
    }

    #[test]
    fn test_duplicate_value_last_wins() {
        let (mut doc, host) = fixture(&["Tag 1", "Tag 2"], &[]);
        let dup = doc.create_element(ITEM_TAG);
        let text = doc.create_text("Tag 1");
        doc.append_child(dup, text).unwrap();
        doc.append_child(host, dup).unwrap();

        let outcome = run(&mut doc, host);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.values, vec!["Tag 2", "Tag 1"]);

        let parts = ComboParts::resolve(&doc, host, None);
        assert_eq!(parts.items.len(), 2);
        assert_eq!(parts.items[1], dup, "later duplicate survives");
    }

    #[test]
    fn test_duplicate_groups_deduped_independently() {
        let (mut doc, host) = fixture(&["Tag 1", "Tag 2", "Tag 1", "Tag 2"], &[]);
        let outcome = run(&mut doc, host);
        assert_eq!(outcome.duplicates_removed, 2);
        assert_eq!(outcome.values, vec!["Tag 1", "Tag 2"]);
    }

    #[test]
    fn test_degrades_without_control() {
        let mut doc = Document::new();
        let host = doc.create_element("auxel-combobox");
        doc.append_child(doc.root(), host).unwrap();
        let item = doc.create_element(ITEM_TAG);
        let text = doc.create_text("Tag 1");
        doc.append_child(item, text).unwrap();
        doc.append_child(host, item).unwrap();

        let outcome = run(&mut doc, host);
        assert_eq!(outcome.values, vec!["Tag 1"]);
        assert_eq!(doc.attr(item, "role"), Some("option"));
    }

    #[test]
    fn test_disabled_control_hides_dismiss() {
        let (mut doc, host) = fixture(&["Tag 1"], &[]);
        run(&mut doc, host);
        let parts = ComboParts::resolve(&doc, host, None);
        let dismiss = doc
            .child_elements(parts.items[0])
            .into_iter()
            .find(|&c| doc.has_attr(c, "data-dismiss"))
            .unwrap();
        assert!(!doc.has_attr(dismiss, "hidden"));

        doc.set_attr(parts.control.unwrap(), "disabled", "");
        run(&mut doc, host);
        assert!(doc.has_attr(dismiss, "hidden"));
    }

    #[test]
    fn test_prefix_flows_into_labels() {
        let (mut doc, host) = fixture(&["Tag 1"], &[]);
        let messages = Messages::default();
        let input = ReconcileInput {
            list_id: None,
            messages: &messages,
            prefix: "Added Tag 1, ",
            suppress_expanded: false,
        };
        reconcile(&mut doc, host, &input);
        let parts = ComboParts::resolve(&doc, host, None);
        let label = doc.attr(parts.items[0], "aria-label").unwrap();
        assert!(label.starts_with("Added Tag 1, Tag 1,"), "got: {}", label);
    }
}
