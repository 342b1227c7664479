//! GPO registry settings through the Windows GroupPolicy PowerShell module
//!
//! Every store operation is one short PowerShell script. Scripts are built by
//! pure functions so they can be inspected on any platform; only running them
//! requires Windows with the GroupPolicy module installed.

use serde::{Deserialize, Serialize};

use super::policy_store::PolicyStore;
use crate::domain::{EntryWrite, Hive, KeyPath, ObservedEntry, ValueType};
use crate::error::{AppError, AppResult};

/// Where and how to run the GroupPolicy cmdlets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerShellStoreConfig {
    pub executable: String,
    /// Forwarded as `-Domain`
    pub domain: Option<String>,
    /// Domain controller, forwarded as `-Server`
    pub server: Option<String>,
}

impl Default for PowerShellStoreConfig {
    fn default() -> Self {
        Self {
            executable: "powershell".to_string(),
            domain: None,
            server: None,
        }
    }
}

/// Quote a string as a single-quoted PowerShell literal
pub fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl PowerShellStoreConfig {
    fn target_args(&self) -> String {
        let mut args = String::new();
        if let Some(domain) = &self.domain {
            args.push_str(&format!(" -Domain {}", ps_quote(domain)));
        }
        if let Some(server) = &self.server {
            args.push_str(&format!(" -Server {}", ps_quote(server)));
        }
        args
    }

    pub fn gpo_exists_script(&self, gpo_name: &str) -> String {
        format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            $gpo = $null
            try {{
                $gpo = Get-GPO -Name {gpo}{target} -ErrorAction Stop
            }} catch [System.ArgumentException] {{
                $gpo = $null
            }}
            @{{ exists = ($null -ne $gpo) }} | ConvertTo-Json -Compress
            "#,
            gpo = ps_quote(gpo_name),
            target = self.target_args(),
        )
    }

    pub fn create_gpo_script(&self, gpo_name: &str) -> String {
        format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            New-GPO -Name {gpo}{target} -ErrorAction Stop | Out-Null
            "#,
            gpo = ps_quote(gpo_name),
            target = self.target_args(),
        )
    }

    /// Reads one entry and prints it as JSON in canonical textual form:
    /// binary as lowercase hex, multi-strings joined by newlines, numbers in decimal.
    pub fn get_entry_script(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> String {
        format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            $entry = $null
            try {{
                $entry = Get-GPRegistryValue -Name {gpo} -Key {key} -ValueName {value_name}{target} -ErrorAction Stop | Select-Object -First 1
            }} catch {{
                if ($_.FullyQualifiedErrorId -notlike 'UnableToRetrievePolicyRegistryItem*' -and $_.Exception.Message -notmatch 'was not found') {{
                    throw
                }}
            }}
            $result = @{{ exists = $false }}
            if ($entry) {{
                $value = $entry.Value
                if ($value -is [byte[]]) {{
                    $value = ($value | ForEach-Object {{ $_.ToString('x2') }}) -join ''
                }} elseif ($value -is [array]) {{
                    $value = $value -join "`n"
                }} elseif ($null -ne $value) {{
                    $value = [string]$value
                }}
                $result.exists = $true
                $result.value = $value
                $result.type = if ($null -ne $entry.Type) {{ $entry.Type.ToString() }} else {{ $null }}
                $result.enabled = ($entry.PolicyState.ToString() -eq 'Set')
            }}
            $result | ConvertTo-Json -Compress
            "#,
            gpo = ps_quote(gpo_name),
            key = ps_quote(&key_path.to_string()),
            value_name = ps_quote(value_name),
            target = self.target_args(),
        )
    }

    pub fn set_entry_script(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
        write: &EntryWrite,
    ) -> String {
        // A disabled value is written as a GroupPolicy deletion marker, which
        // drops `write.value`/`write.value_type`; later reads report no data.
        let value_args = if write.enabled {
            format!(
                " -Type {} -Value ({})",
                write.value_type,
                value_expression(&write.value, write.value_type)
            )
        } else {
            " -Disable".to_string()
        };

        format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            Set-GPRegistryValue -Name {gpo} -Key {key} -ValueName {value_name}{value_args}{target} -ErrorAction Stop | Out-Null
            "#,
            gpo = ps_quote(gpo_name),
            key = ps_quote(&key_path.to_string()),
            value_name = ps_quote(value_name),
            value_args = value_args,
            target = self.target_args(),
        )
    }

    pub fn remove_entry_script(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> String {
        format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            Remove-GPRegistryValue -Name {gpo} -Key {key} -ValueName {value_name}{target} -ErrorAction Stop | Out-Null
            "#,
            gpo = ps_quote(gpo_name),
            key = ps_quote(&key_path.to_string()),
            value_name = ps_quote(value_name),
            target = self.target_args(),
        )
    }
}

/// PowerShell expression converting a canonical textual value to the object
/// Set-GPRegistryValue expects for `value_type`
fn value_expression(value: &str, value_type: ValueType) -> String {
    let literal = ps_quote(value);
    match value_type {
        ValueType::String | ValueType::ExpandString => literal,
        ValueType::DWord => format!("[uint32]{}", literal),
        ValueType::QWord => format!("[uint64]{}", literal),
        ValueType::MultiString => format!("[string[]]({} -split \"`n\")", literal),
        ValueType::Binary => format!(
            "[byte[]]({} -split '(..)' -ne '' | ForEach-Object {{ [Convert]::ToByte($_, 16) }})",
            literal
        ),
    }
}

#[derive(Debug, Deserialize)]
struct GpoExistsOutput {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct EntryOutput {
    exists: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default, rename = "type")]
    value_type: Option<String>,
    #[serde(default)]
    enabled: Option<bool>,
}

pub fn parse_gpo_exists_output(stdout: &str) -> AppResult<bool> {
    let output: GpoExistsOutput = serde_json::from_str(stdout.trim())?;
    Ok(output.exists)
}

pub fn parse_entry_output(stdout: &str) -> AppResult<Option<ObservedEntry>> {
    let output: EntryOutput = serde_json::from_str(stdout.trim())?;
    if !output.exists {
        return Ok(None);
    }
    Ok(Some(ObservedEntry {
        value: output.value,
        value_type: output.value_type.as_deref().and_then(ValueType::from_str),
        enabled: output.enabled,
    }))
}

/// Map PowerShell error output to the error taxonomy.
///
/// `write` is the type and hive of an attempted entry write, if any.
pub fn classify_failure(stderr: &str, write: Option<(ValueType, Hive)>) -> AppError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    const UNAVAILABLE: &[&str] = &[
        "access is denied",
        "logon failure",
        "rpc server is unavailable",
        "server is not operational",
        "could not be contacted",
        "no valid module file was found",
        "was not loaded because",
    ];
    const TYPE_REJECTED: &[&str] = &[
        "cannot convert",
        "invalid type",
        "is not supported",
        "cannot bind parameter 'type'",
    ];

    if UNAVAILABLE.iter().any(|m| lower.contains(m)) {
        return AppError::StoreUnavailable(message);
    }
    if let Some((value_type, hive)) = write {
        if TYPE_REJECTED.iter().any(|m| lower.contains(m)) {
            return AppError::UnsupportedValueType {
                value_type: value_type.to_string(),
                hive: hive.to_string(),
                message,
            };
        }
    }
    AppError::GpoError(message)
}

/// Policy store backed by `powershell.exe` and the GroupPolicy module
#[derive(Debug, Clone, Default)]
pub struct PowerShellPolicyStore {
    config: PowerShellStoreConfig,
}

impl PowerShellPolicyStore {
    pub fn new(config: PowerShellStoreConfig) -> Self {
        Self { config }
    }

    #[cfg(windows)]
    fn run_script(&self, script: &str, write: Option<(ValueType, Hive)>) -> AppResult<String> {
        use std::process::Command;

        let output = Command::new(&self.config.executable)
            .args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command", script])
            .output()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to execute PowerShell");
                AppError::StoreUnavailable(format!("Failed to execute PowerShell: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::debug!(stdout = %stdout, "PowerShell output");

        if !output.status.success() {
            tracing::warn!(stderr = %stderr, "PowerShell stderr");
            return Err(classify_failure(&stderr, write));
        }

        Ok(stdout)
    }

    #[cfg(not(windows))]
    fn run_script(&self, _script: &str, _write: Option<(ValueType, Hive)>) -> AppResult<String> {
        Err(AppError::StoreUnavailable(
            "The GroupPolicy PowerShell module is only available on Windows".to_string(),
        ))
    }
}

impl PolicyStore for PowerShellPolicyStore {
    fn gpo_exists(&self, gpo_name: &str) -> AppResult<bool> {
        let stdout = self.run_script(&self.config.gpo_exists_script(gpo_name), None)?;
        parse_gpo_exists_output(&stdout)
    }

    fn create_gpo(&self, gpo_name: &str) -> AppResult<()> {
        tracing::info!(gpo = gpo_name, "Creating GPO");
        self.run_script(&self.config.create_gpo_script(gpo_name), None)?;
        Ok(())
    }

    fn get_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
    ) -> AppResult<Option<ObservedEntry>> {
        let script = self.config.get_entry_script(gpo_name, key_path, value_name);
        let stdout = self.run_script(&script, None)?;
        parse_entry_output(&stdout)
    }

    fn set_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
        write: &EntryWrite,
    ) -> AppResult<()> {
        let script = self.config.set_entry_script(gpo_name, key_path, value_name, write);
        self.run_script(&script, Some((write.value_type, key_path.hive())))?;
        Ok(())
    }

    fn remove_entry(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> AppResult<()> {
        let script = self.config.remove_entry_script(gpo_name, key_path, value_name);
        self.run_script(&script, None)?;
        Ok(())
    }
}
