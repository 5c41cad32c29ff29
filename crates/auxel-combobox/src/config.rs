//! Component configuration
//!
//! Everything is attribute-driven: `multiple`/`creatable` toggles, the
//! `list` reference to the suggestion listbox, and localizable announcement
//! text overrides (`data-added`, `data-removed`, ...). An override set to
//! the empty string reverts to the built-in English default rather than
//! producing a blank announcement.

use auxel_dom::{Document, NodeId};

/// Parsed host configuration
#[derive(Debug, Clone, Default)]
pub struct ComboConfig {
    /// Allow more than one selected item
    pub multiple: bool,
    /// Allow committing free text not present in the suggestion list
    pub creatable: bool,
    /// id of the associated suggestion listbox (resolved at use-time)
    pub list_id: Option<String>,
    /// Announcement texts
    pub messages: Messages,
}

impl ComboConfig {
    /// Read configuration off the host element's attributes
    pub fn from_host(doc: &Document, host: NodeId) -> Self {
        Self {
            multiple: doc.has_attr(host, "multiple"),
            creatable: doc.has_attr(host, "creatable"),
            list_id: doc.attr(host, "list").map(str::to_string),
            messages: Messages::from_host(doc, host),
        }
    }
}

/// Localizable announcement texts, keyed by purpose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Prefix for "item added" announcements
    pub added: String,
    /// Prefix for "item removed" announcements
    pub removed: String,
    /// Spoken when filtering leaves no suggestions
    pub empty: String,
    /// Tail of the "{n} results available." announcement
    pub found: String,
    /// Spoken when typed text matches nothing and creation is off
    pub invalid: String,
    /// Joins position and count in item labels ("2 of 5")
    pub of: String,
    /// Removal hint composed into every item label
    pub remove: String,
    /// Group label for the selected-items list
    pub items: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            added: "Added".to_string(),
            removed: "Removed".to_string(),
            empty: "No results.".to_string(),
            found: "results available.".to_string(),
            invalid: "Invalid value.".to_string(),
            of: "of".to_string(),
            remove: "press delete or backspace to remove".to_string(),
            items: "Selected items".to_string(),
        }
    }
}

impl Messages {
    /// Read overrides from `data-*` attributes on the host.
    ///
    /// Unset keys and empty-string values fall back to the defaults.
    pub fn from_host(doc: &Document, host: NodeId) -> Self {
        let mut messages = Self::default();
        let overridable: [(&str, &mut String); 8] = [
            ("data-added", &mut messages.added),
            ("data-removed", &mut messages.removed),
            ("data-empty", &mut messages.empty),
            ("data-found", &mut messages.found),
            ("data-invalid", &mut messages.invalid),
            ("data-of", &mut messages.of),
            ("data-remove", &mut messages.remove),
            ("data-items", &mut messages.items),
        ];
        for (attr, slot) in overridable {
            if let Some(value) = doc.attr(host, attr) {
                if !value.is_empty() {
                    *slot = value.to_string();
                }
            }
        }
        messages
    }

    /// Announcement for a newly added item: "Added X,"
    pub fn announce_added(&self, label: &str) -> String {
        format!("{} {},", self.added, label)
    }

    /// Announcement for a removed item: "Removed X,"
    pub fn announce_removed(&self, label: &str) -> String {
        format!("{} {},", self.removed, label)
    }

    /// Composed accessible label for an item chip.
    ///
    /// `prefix` is empty unless an announcement is in flight.
    pub fn item_label(&self, prefix: &str, label: &str, position: usize, count: usize) -> String {
        format!(
            "{}{}, {}, {} {} {}",
            prefix, label, self.remove, position, self.of, count
        )
    }

    /// Suggestion-count announcement
    pub fn results(&self, count: usize) -> String {
        if count == 0 {
            self.empty.clone()
        } else {
            format!("{} {}", count, self.found)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with(attrs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let host = doc.create_element("auxel-combobox");
        doc.append_child(doc.root(), host).unwrap();
        for (name, value) in attrs {
            doc.set_attr(host, name, value);
        }
        (doc, host)
    }

    #[test]
    fn test_flags_from_attributes() {
        let (doc, host) = host_with(&[("multiple", ""), ("list", "tags")]);
        let config = ComboConfig::from_host(&doc, host);
        assert!(config.multiple);
        assert!(!config.creatable);
        assert_eq!(config.list_id.as_deref(), Some("tags"));
    }

    #[test]
    fn test_message_overrides() {
        let (doc, host) = host_with(&[("data-added", "Hinzugefügt"), ("data-removed", "")]);
        let messages = Messages::from_host(&doc, host);
        assert_eq!(messages.added, "Hinzugefügt");
        // Empty override reverts to the default rather than blanking
        assert_eq!(messages.removed, Messages::default().removed);
    }

    #[test]
    fn test_composed_item_label() {
        let messages = Messages::default();
        assert_eq!(
            messages.item_label("", "Tag 2", 2, 3),
            "Tag 2, press delete or backspace to remove, 2 of 3"
        );
        assert_eq!(
            messages.item_label("Added Tag 2, ", "Tag 2", 2, 3),
            "Added Tag 2, Tag 2, press delete or backspace to remove, 2 of 3"
        );
    }

    #[test]
    fn test_results_announcement() {
        let messages = Messages::default();
        assert_eq!(messages.results(0), "No results.");
        assert_eq!(messages.results(4), "4 results available.");
    }
}
