//! Mutation watching
//!
//! Observes the document's mutation record log for one component instance.
//! Each watcher keeps its own cursor into the log, so several components
//! sharing a document never consume each other's records. Records are
//! classified into a single batched view per event-loop turn: item
//! insertions/removals, attribute changes, everything else. After the
//! engine writes to the tree itself it calls `drain_self_writes` to advance
//! its cursor past its own writes so they never re-enter its change handler.

use auxel_dom::{Document, MutationRecord, NodeId};

use crate::combobox::ITEM_TAG;

/// One turn's worth of observed changes inside the component subtree
#[derive(Debug, Default)]
pub struct MutationBatch {
    /// Item elements inserted under the host
    pub items_added: Vec<NodeId>,
    /// Item elements removed from under the host
    pub items_removed: Vec<NodeId>,
    /// Attribute mutations inside the subtree (host config changes included)
    pub attr_changes: Vec<(NodeId, String)>,
    /// Remaining in-subtree records (text, non-item children)
    pub other: usize,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.items_added.is_empty()
            && self.items_removed.is_empty()
            && self.attr_changes.is_empty()
            && self.other == 0
    }

    /// Count of item-level structural changes in this batch
    pub fn structural_count(&self) -> usize {
        self.items_added.len() + self.items_removed.len()
    }
}

/// Per-component mutation watcher
#[derive(Debug)]
pub struct MutationWatcher {
    root: NodeId,
    /// Position in the document's record log up to which this watcher has read
    cursor: u64,
}

impl MutationWatcher {
    /// Start observing `root`'s subtree from the document's current state
    pub fn new(doc: &Document, root: NodeId) -> Self {
        Self { root, cursor: doc.record_count() }
    }

    /// Read the log from this watcher's cursor and classify records touching
    /// this component's subtree. The batch is treated atomically by callers:
    /// one consistent end state is computed from the whole batch.
    pub fn take_batch(&mut self, doc: &Document) -> MutationBatch {
        let mut batch = MutationBatch::default();
        for record in doc.records_since(self.cursor) {
            match record {
                MutationRecord::ChildList { target, added, removed } => {
                    if !doc.contains(self.root, *target) {
                        continue;
                    }
                    let mut relevant = false;
                    for &node in added {
                        if doc.has_tag(node, ITEM_TAG) {
                            batch.items_added.push(node);
                            relevant = true;
                        }
                    }
                    for &node in removed {
                        // Removed nodes are detached but their arena data
                        // (tag, text) is still readable.
                        if doc.has_tag(node, ITEM_TAG) {
                            batch.items_removed.push(node);
                            relevant = true;
                        }
                    }
                    if !relevant {
                        batch.other += 1;
                    }
                }
                MutationRecord::Attribute { target, name, .. } => {
                    if doc.contains(self.root, *target) {
                        batch.attr_changes.push((*target, name.clone()));
                    }
                }
                MutationRecord::CharacterData { target } => {
                    if doc.contains(self.root, *target) {
                        batch.other += 1;
                    }
                }
            }
        }
        self.cursor = doc.record_count();
        batch
    }

    /// Advance the cursor past records produced by the engine's own writes.
    ///
    /// Called after every reconciliation pass, before yielding back to the
    /// host, so self-writes never re-trigger the change handler. Other
    /// watchers on the same document are unaffected.
    pub fn drain_self_writes(&mut self, doc: &Document) {
        let skipped = doc.record_count() - self.cursor;
        if skipped > 0 {
            tracing::trace!("skipped {} self-write records", skipped);
        }
        self.cursor = doc.record_count();
    }
}
