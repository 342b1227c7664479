//! Validation of raw invocation parameters into a [`DesiredState`]

use serde::{Deserialize, Serialize};

use super::registry::{KeyPath, ValueType};
use super::setting::{DesiredEntry, DesiredState, Intent};
use crate::error::{AppError, AppResult};

/// Parameters as handed over by the calling front end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpoSettingParams {
    pub gpo_name: String,
    pub key_path: String,
    pub gpo_value_name: String,
    #[serde(default)]
    pub gpo_value: Option<String>,
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub check_mode: bool,
}

/// Validate raw parameters. Pure; never touches the policy store.
pub fn validate(raw: &GpoSettingParams) -> AppResult<DesiredState> {
    let gpo_name = required("gpo_name", &raw.gpo_name)?;
    let value_name = required("gpo_value_name", &raw.gpo_value_name)?;

    let key_path = KeyPath::parse(&raw.key_path).ok_or_else(|| {
        AppError::InvalidConfiguration(format!(
            "key_path '{}' must begin with HKEY_CURRENT_USER\\ or HKEY_LOCAL_MACHINE\\ followed by a subkey",
            raw.key_path
        ))
    })?;

    let intent = match raw.state.as_deref() {
        None => Intent::Present,
        Some(s) => Intent::from_str(s).ok_or_else(|| {
            AppError::InvalidConfiguration(format!(
                "state '{}' is not one of present, absent, disabled",
                s
            ))
        })?,
    };

    let value_type = raw
        .key_type
        .as_deref()
        .map(|t| {
            ValueType::from_str(t).ok_or_else(|| {
                AppError::InvalidConfiguration(format!(
                    "key_type '{}' is not one of String, ExpandString, Binary, DWord, MultiString, QWord",
                    t
                ))
            })
        })
        .transpose()?;

    let entry = match intent {
        Intent::Present => {
            let value = raw.gpo_value.clone().ok_or_else(|| {
                AppError::InvalidConfiguration("gpo_value is required when state is present".to_string())
            })?;
            let value_type = value_type.ok_or_else(|| {
                AppError::InvalidConfiguration("key_type is required when state is present".to_string())
            })?;
            let value = canonical_value(&value, value_type)?;
            DesiredEntry::Present { value, value_type }
        }
        Intent::Absent => DesiredEntry::Absent,
        Intent::Disabled => DesiredEntry::Disabled,
    };

    Ok(DesiredState {
        gpo_name,
        key_path,
        value_name,
        entry,
    })
}

/// Bring a declared value into the textual form the policy store reads back:
/// binary as lowercase hex pairs, multi-strings separated by `\n`.
pub fn canonical_value(value: &str, value_type: ValueType) -> AppResult<String> {
    match value_type {
        ValueType::Binary => {
            let hex: String = value
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && *c != '-')
                .collect::<String>()
                .to_lowercase();
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) || hex.len() % 2 != 0 {
                return Err(AppError::InvalidConfiguration(format!(
                    "gpo_value '{}' is not a sequence of hex byte pairs",
                    value
                )));
            }
            Ok(hex)
        }
        ValueType::MultiString => Ok(value.replace("\r\n", "\n").replace('\r', "\n")),
        _ => Ok(value.to_string()),
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidConfiguration(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Hive;

    fn params(state: Option<&str>) -> GpoSettingParams {
        GpoSettingParams {
            gpo_name: "Custom_WindowsUpdate".to_string(),
            key_path: "HKEY_LOCAL_MACHINE\\Software\\Policies\\Microsoft\\Windows\\WindowsUpdate\\AU"
                .to_string(),
            gpo_value_name: "UseWUServer".to_string(),
            gpo_value: Some("1".to_string()),
            key_type: Some("DWord".to_string()),
            state: state.map(|s| s.to_string()),
            check_mode: false,
        }
    }

    #[test]
    fn test_state_defaults_to_present() {
        let desired = validate(&params(None)).unwrap();
        assert_eq!(desired.intent(), Intent::Present);
        assert_eq!(
            desired.entry,
            DesiredEntry::Present {
                value: "1".to_string(),
                value_type: ValueType::DWord
            }
        );
        assert_eq!(desired.key_path.hive(), Hive::LocalMachine);
    }

    #[test]
    fn test_rejects_unrooted_key_path() {
        let mut raw = params(None);
        raw.key_path = "C:\\invalid".to_string();
        let err = validate(&raw).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_root_token_is_case_insensitive() {
        let mut raw = params(None);
        raw.key_path = "hkey_current_user\\Software\\Policies\\Contoso".to_string();
        let desired = validate(&raw).unwrap();
        assert_eq!(desired.key_path.hive(), Hive::CurrentUser);
    }

    #[test]
    fn test_present_requires_value_and_type() {
        let mut raw = params(Some("present"));
        raw.gpo_value = None;
        assert!(matches!(validate(&raw), Err(AppError::InvalidConfiguration(_))));

        let mut raw = params(Some("present"));
        raw.key_type = None;
        assert!(matches!(validate(&raw), Err(AppError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_absent_and_disabled_ignore_value() {
        let mut raw = params(Some("absent"));
        raw.gpo_value = None;
        raw.key_type = None;
        assert_eq!(validate(&raw).unwrap().entry, DesiredEntry::Absent);

        let mut raw = params(Some("Disabled"));
        raw.gpo_value = None;
        assert_eq!(validate(&raw).unwrap().entry, DesiredEntry::Disabled);
    }

    #[test]
    fn test_rejects_unknown_enums() {
        let mut raw = params(None);
        raw.key_type = Some("REG_SZ".to_string());
        assert!(matches!(validate(&raw), Err(AppError::InvalidConfiguration(_))));

        let raw = params(Some("enabled"));
        assert!(matches!(validate(&raw), Err(AppError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_blank_names() {
        let mut raw = params(None);
        raw.gpo_name = "  ".to_string();
        assert!(validate(&raw).is_err());

        let mut raw = params(None);
        raw.gpo_value_name = String::new();
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn test_binary_values_are_canonicalized() {
        for input in ["0AFF", "0a ff", "0A-FF", "0a,ff"] {
            let mut raw = params(None);
            raw.gpo_value = Some(input.to_string());
            raw.key_type = Some("Binary".to_string());
            assert_eq!(
                validate(&raw).unwrap().entry,
                DesiredEntry::Present {
                    value: "0aff".to_string(),
                    value_type: ValueType::Binary
                }
            );
        }
    }

    #[test]
    fn test_rejects_malformed_binary() {
        for input in ["0af", "zz", "0x0a"] {
            let mut raw = params(None);
            raw.gpo_value = Some(input.to_string());
            raw.key_type = Some("Binary".to_string());
            assert!(matches!(validate(&raw), Err(AppError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_multistring_line_endings_normalized() {
        assert_eq!(
            canonical_value("a\r\nb\rc", ValueType::MultiString).unwrap(),
            "a\nb\nc"
        );
        assert_eq!(canonical_value(" 1 ", ValueType::DWord).unwrap(), " 1 ");
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let raw: GpoSettingParams = serde_json::from_str(
            r#"{"gpo_name":"Custom_WindowsUpdate","key_path":"HKEY_LOCAL_MACHINE\\Software\\Policies\\Microsoft\\Windows\\WindowsUpdate","gpo_value_name":"WUServer","state":"absent"}"#,
        )
        .unwrap();
        assert!(raw.gpo_value.is_none());
        assert!(!raw.check_mode);
        assert_eq!(validate(&raw).unwrap().entry, DesiredEntry::Absent);
    }
}
