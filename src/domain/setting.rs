use serde::{Deserialize, Serialize};
use std::fmt;

use super::registry::{KeyPath, ValueType};

/// Declared state for a policy registry value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Present,
    Absent,
    Disabled,
}

impl Intent {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" => Some(Intent::Present),
            "absent" => Some(Intent::Absent),
            "disabled" => Some(Intent::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Present => write!(f, "present"),
            Intent::Absent => write!(f, "absent"),
            Intent::Disabled => write!(f, "disabled"),
        }
    }
}

/// Desired entry state, carrying the value only where it matters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredEntry {
    Present { value: String, value_type: ValueType },
    Absent,
    Disabled,
}

impl DesiredEntry {
    pub fn intent(&self) -> Intent {
        match self {
            DesiredEntry::Present { .. } => Intent::Present,
            DesiredEntry::Absent => Intent::Absent,
            DesiredEntry::Disabled => Intent::Disabled,
        }
    }
}

/// A validated reconciliation request for one GPO/key/value triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub gpo_name: String,
    pub key_path: KeyPath,
    pub value_name: String,
    pub entry: DesiredEntry,
}

impl DesiredState {
    pub fn intent(&self) -> Intent {
        self.entry.intent()
    }
}

/// A registry entry as read back from the policy store.
///
/// Values are in the store's canonical textual form, so comparison is plain
/// string equality.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedEntry {
    pub value: Option<String>,
    pub value_type: Option<ValueType>,
    pub enabled: Option<bool>,
}

impl ObservedEntry {
    pub fn matches(&self, value: &str, value_type: ValueType) -> bool {
        self.value.as_deref() == Some(value)
            && self.value_type == Some(value_type)
            && self.enabled == Some(true)
    }

    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }
}

/// Full content of a registry entry write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWrite {
    pub value: String,
    pub value_type: ValueType,
    pub enabled: bool,
}

impl EntryWrite {
    pub fn enabled(value: &str, value_type: ValueType) -> Self {
        EntryWrite {
            value: value.to_string(),
            value_type,
            enabled: true,
        }
    }

    /// Carries whatever value and type the entry last had.
    ///
    /// Whether a store keeps them is up to the store: `MemoryPolicyStore`
    /// does, the PowerShell store writes a deletion marker that holds no data.
    pub fn disabled_from(previous: Option<&ObservedEntry>) -> Self {
        EntryWrite {
            value: previous.and_then(|e| e.value.clone()).unwrap_or_default(),
            value_type: previous
                .and_then(|e| e.value_type)
                .unwrap_or(ValueType::String),
            enabled: false,
        }
    }

    pub fn to_observed(&self) -> ObservedEntry {
        ObservedEntry {
            value: Some(self.value.clone()),
            value_type: Some(self.value_type),
            enabled: Some(self.enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_requires_enabled() {
        let mut entry = ObservedEntry {
            value: Some("1".to_string()),
            value_type: Some(ValueType::DWord),
            enabled: Some(true),
        };
        assert!(entry.matches("1", ValueType::DWord));
        assert!(!entry.matches("1", ValueType::QWord));
        assert!(!entry.matches("01", ValueType::DWord));

        entry.enabled = None;
        assert!(!entry.matches("1", ValueType::DWord));
    }

    #[test]
    fn test_disabled_write_keeps_previous_value() {
        let previous = ObservedEntry {
            value: Some("wsus.contoso.com:8530".to_string()),
            value_type: Some(ValueType::String),
            enabled: Some(true),
        };
        let write = EntryWrite::disabled_from(Some(&previous));
        assert_eq!(write.value, "wsus.contoso.com:8530");
        assert_eq!(write.value_type, ValueType::String);
        assert!(!write.enabled);

        let fresh = EntryWrite::disabled_from(None);
        assert_eq!(fresh.value, "");
        assert_eq!(fresh.value_type, ValueType::String);
    }
}
