//! Mutation records
//!
//! Every structural or attribute write on a `Document` queues one record.
//! Observers drain the queue in batches with `Document::take_records`; an
//! engine that just wrote to the tree drains and discards the queue so its
//! own writes never re-enter its change handler.

use crate::NodeId;

/// A single observed mutation
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// Children added to or removed from a node
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// Attribute changed or removed on an element
    Attribute {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
    /// Text content replaced under a node
    CharacterData { target: NodeId },
}

impl MutationRecord {
    /// Node the mutation happened on
    pub fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. } => *target,
            Self::Attribute { target, .. } => *target,
            Self::CharacterData { target } => *target,
        }
    }

    /// Check if this record describes a child-list change
    pub fn is_child_list(&self) -> bool {
        matches!(self, Self::ChildList { .. })
    }
}
