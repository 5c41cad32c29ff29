//! Synthetic DOM events
//!
//! Change/input/focus events emitted by components into an outbox the host
//! drains. Cancelable events support `prevent_default`.

use crate::NodeId;

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Committed value change (fired through a form control)
    Change,
    /// Text input edited
    Input,
    /// Element gained focus
    Focus,
    /// Element lost focus
    Blur,
}

/// Synthetic event
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
}

impl Event {
    /// Create a change event
    pub fn change(target: NodeId) -> Self {
        Self {
            kind: EventKind::Change,
            target,
            bubbles: true,
            cancelable: false,
            default_prevented: false,
        }
    }

    /// Create an input event
    pub fn input(target: NodeId) -> Self {
        Self {
            kind: EventKind::Input,
            target,
            bubbles: true,
            cancelable: false,
            default_prevented: false,
        }
    }

    /// Create a focus event
    pub fn focus(target: NodeId) -> Self {
        Self {
            kind: EventKind::Focus,
            target,
            bubbles: false,
            cancelable: false,
            default_prevented: false,
        }
    }

    /// Create a blur event
    pub fn blur(target: NodeId) -> Self {
        Self {
            kind: EventKind::Blur,
            target,
            bubbles: false,
            cancelable: false,
            default_prevented: false,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}
