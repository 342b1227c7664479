use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry hives a Group Policy registry setting can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hive {
    #[serde(rename = "HKEY_CURRENT_USER")]
    CurrentUser,
    #[serde(rename = "HKEY_LOCAL_MACHINE")]
    LocalMachine,
}

impl Hive {
    /// Parse a hive from its root token, ignoring case
    pub fn from_root(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HKEY_CURRENT_USER" => Some(Hive::CurrentUser),
            "HKEY_LOCAL_MACHINE" => Some(Hive::LocalMachine),
            _ => None,
        }
    }

    /// Canonical root token
    pub fn root(&self) -> &'static str {
        match self {
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())
    }
}

/// Registry value kinds supported by Group Policy registry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    ExpandString,
    Binary,
    DWord,
    MultiString,
    QWord,
}

impl ValueType {
    /// Parse a value type from its name, ignoring case
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" => Some(ValueType::String),
            "expandstring" => Some(ValueType::ExpandString),
            "binary" => Some(ValueType::Binary),
            "dword" => Some(ValueType::DWord),
            "multistring" => Some(ValueType::MultiString),
            "qword" => Some(ValueType::QWord),
            _ => None,
        }
    }

    /// Name as used by the GroupPolicy cmdlets (`RegistryValueKind`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "String",
            ValueType::ExpandString => "ExpandString",
            ValueType::Binary => "Binary",
            ValueType::DWord => "DWord",
            ValueType::MultiString => "MultiString",
            ValueType::QWord => "QWord",
        }
    }

    pub fn all() -> &'static [ValueType] {
        &[
            ValueType::String,
            ValueType::ExpandString,
            ValueType::Binary,
            ValueType::DWord,
            ValueType::MultiString,
            ValueType::QWord,
        ]
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registry key path split into hive and subkey.
///
/// Only constructed through [`KeyPath::parse`], so a `KeyPath` always has a
/// supported hive and a non-empty subkey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyPath {
    hive: Hive,
    subkey: String,
}

impl KeyPath {
    /// Parse `HIVE\sub\key`. The root token is matched case-insensitively,
    /// the subkey is kept verbatim without trailing separators.
    pub fn parse(path: &str) -> Option<Self> {
        let (root, rest) = path.trim().split_once('\\')?;
        let hive = Hive::from_root(root)?;
        let subkey = rest.trim_end_matches('\\');
        if subkey.is_empty() {
            return None;
        }
        Some(KeyPath {
            hive,
            subkey: subkey.to_string(),
        })
    }

    pub fn hive(&self) -> Hive {
        self.hive
    }

    pub fn subkey(&self) -> &str {
        &self.subkey
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\\{}", self.hive, self.subkey)
    }
}
