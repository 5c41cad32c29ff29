//! Focus tracking
//!
//! Records which node currently owns document focus and answers subtree
//! containment queries for components deciding whether a change happened
//! "while focus is inside" them.

use auxel_dom::{Document, NodeId};

/// Document focus tracker
#[derive(Debug, Default)]
pub struct FocusTracker {
    focused: Option<NodeId>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move focus to a node, returning the previously focused one
    pub fn focus(&mut self, node: NodeId) -> Option<NodeId> {
        self.focused.replace(node)
    }

    /// Clear focus entirely
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Currently focused node
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Check whether focus currently sits inside `ancestor`'s subtree
    pub fn is_within(&self, doc: &Document, ancestor: NodeId) -> bool {
        self.focused
            .map(|f| doc.contains(ancestor, f))
            .unwrap_or(false)
    }

    /// Drop focus if it points into a subtree being torn down
    pub fn clear_if_within(&mut self, doc: &Document, ancestor: NodeId) {
        if self.is_within(doc, ancestor) {
            self.focused = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_transitions() {
        let mut doc = Document::new();
        let a = doc.create_element("input");
        let b = doc.create_element("input");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(doc.root(), b).unwrap();

        let mut tracker = FocusTracker::new();
        assert_eq!(tracker.focus(a), None);
        assert_eq!(tracker.focus(b), Some(a));
        assert_eq!(tracker.focused(), Some(b));

        tracker.blur();
        assert_eq!(tracker.focused(), None);
    }

    #[test]
    fn test_is_within() {
        let mut doc = Document::new();
        let host = doc.create_element("auxel-combobox");
        let input = doc.create_element("input");
        let outside = doc.create_element("button");
        doc.append_child(doc.root(), host).unwrap();
        doc.append_child(host, input).unwrap();
        doc.append_child(doc.root(), outside).unwrap();

        let mut tracker = FocusTracker::new();
        tracker.focus(input);
        assert!(tracker.is_within(&doc, host));

        tracker.focus(outside);
        assert!(!tracker.is_within(&doc, host));

        tracker.focus(input);
        tracker.clear_if_within(&doc, host);
        assert_eq!(tracker.focused(), None);
    }
}
