//! Screen-reader announcement channel
//!
//! A single off-screen live region per document. Text written to it is read
//! aloud by assistive technology without moving focus. The element is
//! created lazily on first use and re-created if the host tore it out of
//! the tree; writes are last-write-wins, there is no announcement queue.

use auxel_dom::{Document, NodeId};

/// Off-screen styling; keeps the region renderable to AT but invisible.
const OFFSCREEN_STYLE: &str =
    "position:absolute;width:1px;height:1px;overflow:hidden;clip:rect(0,0,0,0)";

/// Shared announcement channel
#[derive(Debug, Default)]
pub struct AnnouncementChannel {
    region: Option<NodeId>,
}

impl AnnouncementChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live region element, if it has been created
    pub fn region(&self) -> Option<NodeId> {
        self.region
    }

    fn ensure(&mut self, doc: &mut Document) -> NodeId {
        if let Some(region) = self.region {
            if doc.is_connected(region) {
                return region;
            }
        }
        let region = doc.create_element("div");
        doc.set_attr(region, "role", "status");
        doc.set_attr(region, "aria-live", "polite");
        doc.set_attr(region, "aria-atomic", "true");
        doc.set_attr(region, "style", OFFSCREEN_STYLE);
        if let Err(err) = doc.append_child(doc.root(), region) {
            tracing::warn!("failed to attach live region: {}", err);
        }
        self.region = Some(region);
        region
    }

    /// Have assistive technology read `text` aloud.
    ///
    /// Replaces any pending announcement: only the most recent state is
    /// meaningful to a listener.
    pub fn speak(&mut self, doc: &mut Document, text: &str) {
        let region = self.ensure(doc);
        // Clear first so repeating the same text is still re-announced
        doc.set_text_content(region, "");
        doc.set_text_content(region, text);
        tracing::debug!("announce: {}", text);
    }

    /// Currently displayed announcement text, if any
    pub fn current_text(&self, doc: &Document) -> Option<String> {
        self.region.map(|r| doc.text_content(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation() {
        let mut doc = Document::new();
        let mut channel = AnnouncementChannel::new();
        assert_eq!(channel.region(), None);

        channel.speak(&mut doc, "Added Tag 1,");
        let region = channel.region().expect("region created on first speak");
        assert!(doc.is_connected(region));
        assert_eq!(doc.attr(region, "aria-live"), Some("polite"));
        assert_eq!(channel.current_text(&doc), Some("Added Tag 1,".to_string()));
    }

    #[test]
    fn test_last_write_wins() {
        let mut doc = Document::new();
        let mut channel = AnnouncementChannel::new();

        channel.speak(&mut doc, "first");
        channel.speak(&mut doc, "second");
        assert_eq!(channel.current_text(&doc), Some("second".to_string()));
    }

    #[test]
    fn test_recreated_when_disconnected() {
        let mut doc = Document::new();
        let mut channel = AnnouncementChannel::new();
        channel.speak(&mut doc, "one");
        let first = channel.region().unwrap();

        doc.remove(first).unwrap();
        channel.speak(&mut doc, "two");
        let second = channel.region().unwrap();
        assert_ne!(first, second, "torn-out region is replaced");
        assert!(doc.is_connected(second));
    }

    #[test]
    fn test_shared_across_instances() {
        let mut doc = Document::new();
        let mut channel = AnnouncementChannel::new();
        channel.speak(&mut doc, "a");
        channel.speak(&mut doc, "b");
        // One region, not one per announcement
        let regions = doc
            .child_elements(doc.root())
            .into_iter()
            .filter(|&e| doc.attr(e, "aria-live").is_some())
            .count();
        assert_eq!(regions, 1);
    }
}
