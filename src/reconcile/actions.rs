//! Actions decided by the reconciler and the outcome of one pass

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{EntryWrite, ObservedEntry};

/// What happened (or would happen) to the registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    None,
    Created,
    Updated,
    Removed,
    Disabled,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => write!(f, "None"),
            Action::Created => write!(f, "Created"),
            Action::Updated => write!(f, "Updated"),
            Action::Removed => write!(f, "Removed"),
            Action::Disabled => write!(f, "Disabled"),
        }
    }
}

/// The single write (if any) needed to bring the entry to the desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Already in the desired state
    Keep,
    Set { write: EntryWrite, action: Action },
    Remove,
}

impl EntryAction {
    pub fn action(&self) -> Action {
        match self {
            EntryAction::Keep => Action::None,
            EntryAction::Set { action, .. } => *action,
            EntryAction::Remove => Action::Removed,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, EntryAction::Keep)
    }

    /// Entry state once this action has been applied to `before`
    pub fn expected_after(&self, before: Option<&ObservedEntry>) -> Option<ObservedEntry> {
        match self {
            EntryAction::Keep => before.cloned(),
            EntryAction::Set { write, .. } => Some(write.to_observed()),
            EntryAction::Remove => None,
        }
    }
}

/// Outcome of one reconciliation pass. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationResult {
    /// True iff a write was issued (or would be, in check mode)
    pub changed: bool,
    pub action: Action,
    pub gpo_created: bool,
    pub check_mode: bool,
    pub before: Option<ObservedEntry>,
    pub after: Option<ObservedEntry>,
}
