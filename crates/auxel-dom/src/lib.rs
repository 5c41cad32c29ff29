//! auxel DOM - retained element tree
//!
//! Arena-based DOM substrate for the auxel accessible elements. Holds the
//! node tree, attribute storage with guarded (write-if-changed) mutation,
//! a mutation record queue, and synthetic cancellable events.

mod document;
mod events;
mod mutation;
mod node;

pub use document::{Children, Document, DomError, DomResult};
pub use events::{Event, EventKind};
pub use mutation::MutationRecord;
pub use node::{Attribute, ElementData, Node, NodeData, TextData};

/// Node identifier (index into the document arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Check against the sentinel
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}
