//! Cancellable component signals
//!
//! The surrounding application can veto or reshape engine behavior through
//! three signals: "before select" (cancel to veto an item add/remove),
//! "after select" (informational), and "before match" (cancel or mark
//! handled to substitute custom text matching). Listeners run synchronously
//! before the corresponding internal mutation.

/// Direction of a selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOp {
    Add,
    Remove,
}

/// Fired around item addition/removal
#[derive(Debug, Clone)]
pub struct SelectSignal {
    pub op: SelectOp,
    pub value: String,
    pub label: String,
    cancelable: bool,
    default_prevented: bool,
}

impl SelectSignal {
    /// Cancellable pre-mutation signal
    pub fn before(op: SelectOp, value: &str, label: &str) -> Self {
        Self {
            op,
            value: value.to_string(),
            label: label.to_string(),
            cancelable: true,
            default_prevented: false,
        }
    }

    /// Post-commit signal (not cancellable)
    pub fn after(op: SelectOp, value: &str, label: &str) -> Self {
        Self {
            cancelable: false,
            ..Self::before(op, value, label)
        }
    }

    /// Veto the pending mutation
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Fired before automatic text-matching on commit
#[derive(Debug, Clone)]
pub struct MatchSignal {
    /// Trimmed text the user committed
    pub query: String,
    /// Set by a listener that performed its own match
    handled: bool,
    default_prevented: bool,
}

impl MatchSignal {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            handled: false,
            default_prevented: false,
        }
    }

    /// Tell the controller the application already flagged the matched
    /// options as selected; it will trust those instead of recomputing.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Veto the commit entirely
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type SelectListener = Box<dyn FnMut(&mut SelectSignal)>;
type MatchListener = Box<dyn FnMut(&mut MatchSignal)>;

/// Registered signal listeners
#[derive(Default)]
pub struct SignalListeners {
    before_select: Vec<SelectListener>,
    after_select: Vec<SelectListener>,
    before_match: Vec<MatchListener>,
}

impl SignalListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_select(&mut self, listener: impl FnMut(&mut SelectSignal) + 'static) {
        self.before_select.push(Box::new(listener));
    }

    pub fn on_after_select(&mut self, listener: impl FnMut(&mut SelectSignal) + 'static) {
        self.after_select.push(Box::new(listener));
    }

    pub fn on_before_match(&mut self, listener: impl FnMut(&mut MatchSignal) + 'static) {
        self.before_match.push(Box::new(listener));
    }

    pub(crate) fn fire_before_select(&mut self, signal: &mut SelectSignal) {
        for listener in &mut self.before_select {
            listener(signal);
        }
    }

    pub(crate) fn fire_after_select(&mut self, signal: &mut SelectSignal) {
        for listener in &mut self.after_select {
            listener(signal);
        }
    }

    pub(crate) fn fire_before_match(&mut self, signal: &mut MatchSignal) {
        for listener in &mut self.before_match {
            listener(signal);
        }
    }
}

impl std::fmt::Debug for SignalListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalListeners")
            .field("before_select", &self.before_select.len())
            .field("after_select", &self.after_select.len())
            .field("before_match", &self.before_match.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_select_veto() {
        let mut signal = SelectSignal::before(SelectOp::Add, "a", "A");
        signal.prevent_default();
        assert!(signal.is_default_prevented());
    }

    #[test]
    fn test_after_select_not_cancelable() {
        let mut signal = SelectSignal::after(SelectOp::Remove, "a", "A");
        signal.prevent_default();
        assert!(!signal.is_default_prevented());
    }

    #[test]
    fn test_listener_dispatch_order() {
        let mut listeners = SignalListeners::new();
        listeners.on_before_match(|sig| {
            if sig.query == "special" {
                sig.mark_handled();
            }
        });

        let mut signal = MatchSignal::new("special");
        listeners.fire_before_match(&mut signal);
        assert!(signal.is_handled());

        let mut other = MatchSignal::new("plain");
        listeners.fire_before_match(&mut other);
        assert!(!other.is_handled());
    }
}
