//! Reconciliation of one GPO registry value
//!
//! [`plan_entry_action`] is a pure function deciding the entry write from the
//! desired and observed state. [`reconcile`] drives a [`PolicyStore`] through
//! one pass: make sure the GPO exists, read the entry fresh, apply at most one
//! entry write.

mod actions;

pub use actions::{Action, EntryAction, ReconciliationResult};

use crate::domain::{DesiredEntry, DesiredState, EntryWrite, ObservedEntry};
use crate::error::{AppError, AppResult};
use crate::infrastructure::PolicyStore;

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Report what would change without writing to the store
    pub check_mode: bool,
}

/// Decide the entry write needed to move `observed` to `desired`.
pub fn plan_entry_action(desired: &DesiredEntry, observed: Option<&ObservedEntry>) -> EntryAction {
    match desired {
        DesiredEntry::Present { value, value_type } => match observed {
            None => EntryAction::Set {
                write: EntryWrite::enabled(value, *value_type),
                action: Action::Created,
            },
            Some(entry) if !entry.matches(value, *value_type) => EntryAction::Set {
                write: EntryWrite::enabled(value, *value_type),
                action: Action::Updated,
            },
            Some(_) => EntryAction::Keep,
        },
        DesiredEntry::Disabled => match observed {
            Some(entry) if entry.is_disabled() => EntryAction::Keep,
            _ => EntryAction::Set {
                write: EntryWrite::disabled_from(observed),
                action: Action::Disabled,
            },
        },
        DesiredEntry::Absent => match observed {
            Some(_) => EntryAction::Remove,
            None => EntryAction::Keep,
        },
    }
}

/// Reconcile `desired` against the store, writing as needed.
pub fn reconcile(desired: &DesiredState, store: &dyn PolicyStore) -> AppResult<ReconciliationResult> {
    reconcile_with_options(desired, store, ReconcileOptions::default())
}

pub fn reconcile_with_options(
    desired: &DesiredState,
    store: &dyn PolicyStore,
    options: ReconcileOptions,
) -> AppResult<ReconciliationResult> {
    let gpo = desired.gpo_name.as_str();
    let key = &desired.key_path;
    let value_name = desired.value_name.as_str();

    let gpo_missing = !store.gpo_exists(gpo)?;
    let mut gpo_created = false;
    if gpo_missing && !options.check_mode {
        store.create_gpo(gpo)?;
        gpo_created = true;
    }

    // From here on a failure leaves the GPO behind; the caller needs to know
    let partial = |err: AppError| {
        if gpo_created {
            AppError::PartialApplication {
                gpo_created,
                source: Box::new(err),
            }
        } else {
            err
        }
    };

    // A GPO that does not exist yet has no entries
    let before = if gpo_missing && options.check_mode {
        None
    } else {
        store.get_entry(gpo, key, value_name).map_err(partial)?
    };

    let entry_action = plan_entry_action(&desired.entry, before.as_ref());

    if !options.check_mode {
        match &entry_action {
            EntryAction::Keep => {}
            EntryAction::Set { write, .. } => {
                store.set_entry(gpo, key, value_name, write).map_err(partial)?
            }
            EntryAction::Remove => store.remove_entry(gpo, key, value_name).map_err(partial)?,
        }
    }

    let result = ReconciliationResult {
        changed: gpo_missing || entry_action.is_write(),
        action: entry_action.action(),
        gpo_created: gpo_missing,
        check_mode: options.check_mode,
        after: entry_action.expected_after(before.as_ref()),
        before,
    };

    if result.changed {
        tracing::info!(
            gpo,
            key = %key,
            value_name,
            action = %result.action,
            gpo_created = result.gpo_created,
            check_mode = result.check_mode,
            "Reconciled GPO registry value"
        );
    } else {
        tracing::debug!(gpo, key = %key, value_name, "GPO registry value already in desired state");
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueType;

    fn entry(value: &str, value_type: ValueType, enabled: bool) -> ObservedEntry {
        ObservedEntry {
            value: Some(value.to_string()),
            value_type: Some(value_type),
            enabled: Some(enabled),
        }
    }

    fn present(value: &str, value_type: ValueType) -> DesiredEntry {
        DesiredEntry::Present {
            value: value.to_string(),
            value_type,
        }
    }

    #[test]
    fn test_present_creates_missing_entry() {
        let action = plan_entry_action(&present("1", ValueType::DWord), None);
        assert_eq!(action.action(), Action::Created);
        assert_eq!(
            action,
            EntryAction::Set {
                write: EntryWrite::enabled("1", ValueType::DWord),
                action: Action::Created
            }
        );
    }

    #[test]
    fn test_present_updates_on_any_difference() {
        let desired = present("1", ValueType::DWord);
        for observed in [
            entry("0", ValueType::DWord, true),
            entry("1", ValueType::QWord, true),
            entry("1", ValueType::DWord, false),
            ObservedEntry {
                enabled: None,
                ..entry("1", ValueType::DWord, true)
            },
        ] {
            assert_eq!(plan_entry_action(&desired, Some(&observed)).action(), Action::Updated);
        }
    }

    #[test]
    fn test_present_keeps_matching_entry() {
        let observed = entry("1", ValueType::DWord, true);
        assert_eq!(
            plan_entry_action(&present("1", ValueType::DWord), Some(&observed)),
            EntryAction::Keep
        );
    }

    #[test]
    fn test_no_numeric_coercion() {
        let observed = entry("1", ValueType::DWord, true);
        assert!(plan_entry_action(&present("0x1", ValueType::DWord), Some(&observed)).is_write());
    }

    #[test]
    fn test_disabled_keeps_last_value() {
        let observed = entry("1", ValueType::DWord, true);
        let action = plan_entry_action(&DesiredEntry::Disabled, Some(&observed));
        assert_eq!(
            action,
            EntryAction::Set {
                write: EntryWrite {
                    value: "1".to_string(),
                    value_type: ValueType::DWord,
                    enabled: false
                },
                action: Action::Disabled
            }
        );

        let disabled = entry("1", ValueType::DWord, false);
        assert_eq!(plan_entry_action(&DesiredEntry::Disabled, Some(&disabled)), EntryAction::Keep);
    }

    #[test]
    fn test_disabled_without_entry_uses_defaults() {
        let action = plan_entry_action(&DesiredEntry::Disabled, None);
        assert_eq!(action.expected_after(None), Some(entry("", ValueType::String, false)));
    }

    #[test]
    fn test_absent() {
        let observed = entry("1", ValueType::DWord, true);
        assert_eq!(plan_entry_action(&DesiredEntry::Absent, Some(&observed)), EntryAction::Remove);
        assert_eq!(plan_entry_action(&DesiredEntry::Absent, None), EntryAction::Keep);
    }
}
