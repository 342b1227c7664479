//! In-process policy store
//!
//! Keeps GPOs and their registry entries in memory and records every call,
//! so reconciliation can be exercised (and dry-run) without a domain controller.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::policy_store::PolicyStore;
use crate::domain::{EntryWrite, KeyPath, ObservedEntry};
use crate::error::{AppError, AppResult};

/// A store operation, used for call recording and failure injection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreCall {
    GpoExists(String),
    CreateGpo(String),
    GetEntry(String),
    SetEntry(String),
    RemoveEntry(String),
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreCall::CreateGpo(_) | StoreCall::SetEntry(_) | StoreCall::RemoveEntry(_)
        )
    }

    fn kind(&self) -> StoreOp {
        match self {
            StoreCall::GpoExists(_) => StoreOp::GpoExists,
            StoreCall::CreateGpo(_) => StoreOp::CreateGpo,
            StoreCall::GetEntry(_) => StoreOp::GetEntry,
            StoreCall::SetEntry(_) => StoreOp::SetEntry,
            StoreCall::RemoveEntry(_) => StoreOp::RemoveEntry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GpoExists,
    CreateGpo,
    GetEntry,
    SetEntry,
    RemoveEntry,
}

type FailureFn = Box<dyn Fn() -> AppError + Send>;

/// GPO names and registry paths are case-insensitive in the policy store
fn fold(s: &str) -> String {
    s.to_lowercase()
}

fn entry_key(key_path: &KeyPath, value_name: &str) -> (String, String) {
    (fold(&key_path.to_string()), fold(value_name))
}

#[derive(Default)]
pub struct MemoryPolicyStore {
    gpos: Mutex<HashMap<String, HashMap<(String, String), ObservedEntry>>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<StoreOp, FailureFn>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Memory store mutex was poisoned, recovering");
        e.into_inner()
    })
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an empty GPO
    pub fn add_gpo(&self, gpo_name: &str) {
        lock(&self.gpos).entry(fold(gpo_name)).or_default();
    }

    /// Seed an entry, creating the GPO if needed
    pub fn add_entry(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str, entry: ObservedEntry) {
        lock(&self.gpos)
            .entry(fold(gpo_name))
            .or_default()
            .insert(entry_key(key_path, value_name), entry);
    }

    /// Make every later call of `op` fail with the error built by `failure`
    pub fn fail_on<F>(&self, op: StoreOp, failure: F)
    where
        F: Fn() -> AppError + Send + 'static,
    {
        lock(&self.failures).insert(op, Box::new(failure));
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Current entry, read without recording a call
    pub fn entry(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> Option<ObservedEntry> {
        lock(&self.gpos)
            .get(&fold(gpo_name))
            .and_then(|entries| entries.get(&entry_key(key_path, value_name)).cloned())
    }

    pub fn has_gpo(&self, gpo_name: &str) -> bool {
        lock(&self.gpos).contains_key(&fold(gpo_name))
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: StoreCall) -> AppResult<()> {
        let op = call.kind();
        lock(&self.calls).push(call);
        match lock(&self.failures).get(&op) {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn gpo_exists(&self, gpo_name: &str) -> AppResult<bool> {
        self.record(StoreCall::GpoExists(gpo_name.to_string()))?;
        Ok(self.has_gpo(gpo_name))
    }

    fn create_gpo(&self, gpo_name: &str) -> AppResult<()> {
        self.record(StoreCall::CreateGpo(gpo_name.to_string()))?;
        let mut gpos = lock(&self.gpos);
        if gpos.contains_key(&fold(gpo_name)) {
            return Err(AppError::GpoError(format!("GPO '{}' already exists", gpo_name)));
        }
        gpos.insert(fold(gpo_name), HashMap::new());
        Ok(())
    }

    fn get_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
    ) -> AppResult<Option<ObservedEntry>> {
        self.record(StoreCall::GetEntry(format!("{}\\{}", key_path, value_name)))?;
        Ok(self.entry(gpo_name, key_path, value_name))
    }

    fn set_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
        write: &EntryWrite,
    ) -> AppResult<()> {
        self.record(StoreCall::SetEntry(format!("{}\\{}", key_path, value_name)))?;
        let mut gpos = lock(&self.gpos);
        let entries = gpos
            .get_mut(&fold(gpo_name))
            .ok_or_else(|| AppError::GpoError(format!("GPO '{}' does not exist", gpo_name)))?;
        entries.insert(entry_key(key_path, value_name), write.to_observed());
        Ok(())
    }

    fn remove_entry(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> AppResult<()> {
        self.record(StoreCall::RemoveEntry(format!("{}\\{}", key_path, value_name)))?;
        if let Some(entries) = lock(&self.gpos).get_mut(&fold(gpo_name)) {
            entries.remove(&entry_key(key_path, value_name));
        }
        Ok(())
    }
}
