//! Document arena
//!
//! Owns the node arena and all tree/attribute mutation. Every observable
//! write goes through here so two guarantees hold in one place:
//!
//! - writes are guarded: setting an attribute or text to the value it
//!   already holds performs no mutation, queues no record and does not
//!   advance the write counter (idempotent reconciliation relies on this)
//! - every real write queues a `MutationRecord` and bumps `write_count`,
//!   which tests use as a mutation probe

use crate::{MutationRecord, Node, NodeId};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("node not found")]
    NotFound,
    /// Node is not a child of the given parent
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("hierarchy request error")]
    HierarchyRequest,
    /// Operation not valid for this node type
    #[error("operation not valid for this node type")]
    InvalidNodeType,
}

/// Arena-based document
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    records: Vec<MutationRecord>,
    /// Records already removed from the front of the log by `take_records`
    records_discarded: u64,
    write_count: u64,
    next_generated_id: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new document with an empty root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            records: Vec::new(),
            records_discarded: 0,
            write_count: 0,
            next_generated_id: 0,
        }
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes ever allocated (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    // --- node creation ---------------------------------------------------

    /// Allocate a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::element(tag));
        id
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::text(content.to_string()));
        id
    }

    // --- structure -------------------------------------------------------

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let p = self.node(id)?.parent;
        if p.is_none() { None } else { Some(p) }
    }

    /// Next sibling, if any
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let s = self.node(id)?.next_sibling;
        if s.is_none() { None } else { Some(s) }
    }

    /// Previous sibling, if any
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let s = self.node(id)?.prev_sibling;
        if s.is_none() { None } else { Some(s) }
    }

    /// Iterate the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let first = self
            .node(id)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Children { doc: self, next: first }
    }

    /// Element children of a node, in document order
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).filter(|&c| self.is_element(c)).collect()
    }

    /// Append a child at the end of a parent's child list
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.node(parent).map(|n| n.is_text()).unwrap_or(true) {
            return Err(DomError::InvalidNodeType);
        }
        // Cannot insert a node into its own subtree
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(r) = reference {
            if self.node(r).map(|n| n.parent) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }

        // Detaching from a previous parent is an observable removal there
        if let Some(old_parent) = self.parent(child) {
            self.unlink(child);
            self.records.push(MutationRecord::ChildList {
                target: old_parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }

        self.link_before(parent, child, reference);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        self.write_count += 1;
        Ok(())
    }

    /// Remove a child node from its parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return Err(DomError::NotFound);
        }
        if self.node(child).map(|n| n.parent) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.unlink(child);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
        self.write_count += 1;
        Ok(())
    }

    /// Remove a node from wherever it is attached
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        let parent = self.parent(node).ok_or(DomError::NotAChild)?;
        self.remove_child(parent, node)
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let n = match self.node(child) {
                Some(n) => n,
                None => return,
            };
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if parent.is_none() {
            return;
        }
        if prev.is_none() {
            if let Some(p) = self.node_mut(parent) {
                p.first_child = next;
            }
        } else if let Some(p) = self.node_mut(prev) {
            p.next_sibling = next;
        }
        if next.is_none() {
            if let Some(p) = self.node_mut(parent) {
                p.last_child = prev;
            }
        } else if let Some(n) = self.node_mut(next) {
            n.prev_sibling = prev;
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = NodeId::NONE;
            c.prev_sibling = NodeId::NONE;
            c.next_sibling = NodeId::NONE;
        }
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        match reference {
            None => {
                let old_last = self.node(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);
                if old_last.is_none() {
                    if let Some(p) = self.node_mut(parent) {
                        p.first_child = child;
                        p.last_child = child;
                    }
                } else {
                    if let Some(l) = self.node_mut(old_last) {
                        l.next_sibling = child;
                    }
                    if let Some(p) = self.node_mut(parent) {
                        p.last_child = child;
                    }
                    if let Some(c) = self.node_mut(child) {
                        c.prev_sibling = old_last;
                    }
                }
            }
            Some(r) => {
                let prev = self.node(r).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE);
                if prev.is_none() {
                    if let Some(p) = self.node_mut(parent) {
                        p.first_child = child;
                    }
                } else {
                    if let Some(pn) = self.node_mut(prev) {
                        pn.next_sibling = child;
                    }
                    if let Some(c) = self.node_mut(child) {
                        c.prev_sibling = prev;
                    }
                }
                if let Some(rn) = self.node_mut(r) {
                    rn.prev_sibling = child;
                }
                if let Some(c) = self.node_mut(child) {
                    c.next_sibling = r;
                }
            }
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = parent;
        }
    }

    /// Check whether `node` is `ancestor` or lives inside its subtree
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Check whether a node is reachable from the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(NodeId::ROOT, node)
    }

    // --- elements and attributes -----------------------------------------

    /// Check if a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.is_element()).unwrap_or(false)
    }

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Check an element's tag name
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).map(|t| t == tag).unwrap_or(false)
    }

    /// Get an attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.as_element()?.get_attr(name)
    }

    /// Check attribute presence
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute. Returns true when the DOM actually changed.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(el) = self.node_mut(id).and_then(|n| n.as_element_mut()) else {
            tracing::warn!("set_attr {:?} on non-element node {:?}", name, id);
            return false;
        };
        match el.set_attr(name, value) {
            None => false,
            Some(old_value) => {
                self.records.push(MutationRecord::Attribute {
                    target: id,
                    name: name.to_string(),
                    old_value,
                });
                self.write_count += 1;
                true
            }
        }
    }

    /// Remove an attribute. Returns true when it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let Some(el) = self.node_mut(id).and_then(|n| n.as_element_mut()) else {
            return false;
        };
        match el.remove_attr(name) {
            None => false,
            Some(old) => {
                self.records.push(MutationRecord::Attribute {
                    target: id,
                    name: name.to_string(),
                    old_value: Some(old),
                });
                self.write_count += 1;
                true
            }
        }
    }

    /// Concatenated text of a node's subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(text) = self.node(cur).and_then(|n| n.as_text()) {
                out.push_str(text);
            }
            // Push children in reverse so the walk stays in document order
            let children: Vec<NodeId> = self.children(cur).collect();
            for c in children.into_iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Replace a node's children with a single text node.
    /// Returns true when the content actually changed.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        if self.text_content(id) == text {
            return false;
        }
        loop {
            let first = self.node(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
            if first.is_none() {
                break;
            }
            self.unlink(first);
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.link_before(id, t, None);
        }
        self.records.push(MutationRecord::CharacterData { target: id });
        self.write_count += 1;
        true
    }

    /// Find a connected element by its `id` attribute
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        let mut stack = vec![NodeId::ROOT];
        while let Some(cur) = stack.pop() {
            if self.attr(cur, "id") == Some(value) {
                return Some(cur);
            }
            let children: Vec<NodeId> = self.children(cur).collect();
            for c in children.into_iter().rev() {
                stack.push(c);
            }
        }
        None
    }

    /// Return the element's id attribute, generating a stable one if absent
    pub fn ensure_id(&mut self, id: NodeId) -> String {
        if let Some(existing) = self.attr(id, "id") {
            return existing.to_string();
        }
        let generated = loop {
            let candidate = format!("auxel-{}", self.next_generated_id);
            self.next_generated_id += 1;
            if self.element_by_id(&candidate).is_none() {
                break candidate;
            }
        };
        self.set_attr(id, "id", &generated);
        generated
    }

    // --- observation ------------------------------------------------------

    /// Drain all queued mutation records.
    ///
    /// A global drain: cursors held by observers stay valid (drained entries
    /// are simply gone for everyone).
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.records_discarded += self.records.len() as u64;
        std::mem::take(&mut self.records)
    }

    /// Total count of records ever queued, drained ones included.
    ///
    /// Observers use this as a cursor so several of them can read the same
    /// log without consuming each other's view.
    pub fn record_count(&self) -> u64 {
        self.records_discarded + self.records.len() as u64
    }

    /// Records queued at or after `cursor`; entries already drained by
    /// `take_records` are skipped.
    pub fn records_since(&self, cursor: u64) -> &[MutationRecord] {
        let start = cursor.saturating_sub(self.records_discarded) as usize;
        &self.records[start.min(self.records.len())..]
    }

    /// Total count of actual DOM writes performed so far
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    doc: &'a Document,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next.is_none() {
            return None;
        }
        let cur = self.next;
        self.next = self
            .doc
            .node(cur)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(cur)
    }
}
