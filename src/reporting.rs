//! Caller-visible report of a reconciliation pass

use serde::Serialize;

use crate::domain::{DesiredEntry, DesiredState, ObservedEntry};
use crate::reconcile::{Action, ReconciliationResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingReport {
    pub changed: bool,
    pub action: Action,
    pub gpo_created: bool,
    pub check_mode: bool,
    pub msg: String,
    pub before: Option<ObservedEntry>,
    pub after: Option<ObservedEntry>,
}

/// Build the report for a finished pass
pub fn report(desired: &DesiredState, result: &ReconciliationResult) -> SettingReport {
    SettingReport {
        changed: result.changed,
        action: result.action,
        gpo_created: result.gpo_created,
        check_mode: result.check_mode,
        msg: summarize(desired, result),
        before: result.before.clone(),
        after: result.after.clone(),
    }
}

/// One-line human-readable summary of what the pass did
pub fn summarize(desired: &DesiredState, result: &ReconciliationResult) -> String {
    let gpo = &desired.gpo_name;
    let name = &desired.value_name;

    let entry = match (result.action, &desired.entry) {
        (Action::Created, DesiredEntry::Present { value, value_type }) => format!(
            "Created value '{}' in GPO '{}' ({} = {})",
            name, gpo, value_type, value
        ),
        (Action::Updated, DesiredEntry::Present { value, value_type }) => format!(
            "Updated value '{}' in GPO '{}' ({} = {})",
            name, gpo, value_type, value
        ),
        (Action::Disabled, _) => format!("Disabled value '{}' in GPO '{}'", name, gpo),
        (Action::Removed, _) => format!("Removed value '{}' from GPO '{}'", name, gpo),
        _ => format!(
            "Value '{}' in GPO '{}' is already {}",
            name,
            gpo,
            desired.intent()
        ),
    };

    let mut msg = if result.gpo_created {
        format!("Created GPO '{}'. {}", gpo, entry)
    } else {
        entry
    };
    if result.check_mode && result.changed {
        msg.push_str(" (check mode, nothing written)");
    }
    msg
}
