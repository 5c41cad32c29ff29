//! auxel combobox - accessible tag-input engine
//!
//! A multi-value combobox built from loosely-coupled DOM surfaces that must
//! stay consistent under arbitrary asynchronous mutation:
//!
//! - the visible item ("chip") list inside the host element
//! - a hidden native multi-select mirror, the canonical change-event source
//! - an associated suggestion listbox, referenced by id
//! - the live accessibility tree (labels, roles, selection flags)
//!
//! The reconciler recomputes derived attributes and the mirror from current
//! state; the focus/announcement machine choreographs what screen readers
//! hear when items come and go; the input controller translates keys and
//! clicks into those operations. Platform differences are injected as
//! capability flags, never probed inline.

mod announce;
mod combobox;
mod config;
mod input;
mod reconcile;
mod schedule;
mod signals;
mod watch;

pub use announce::{AnnounceMachine, AnnouncePhase, StructuralChange};
pub use combobox::{ComboboxError, TagCombobox, HOST_TAG, ITEM_TAG};
pub use config::{ComboConfig, Messages};
pub use input::{Key, KeyEvent};
pub use reconcile::{reconcile, ComboParts, ReconcileInput, ReconcileOutcome};
pub use schedule::{Scheduler, TimerKey, BLUR_DEBOUNCE_MS, RESTORE_DELAY_MS, TAB_REVERT_MS};
pub use signals::{MatchSignal, SelectOp, SelectSignal, SignalListeners};
pub use watch::{MutationBatch, MutationWatcher};
