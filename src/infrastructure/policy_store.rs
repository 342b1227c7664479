//! The seam between the reconciler and whatever backs the GPO store

use crate::domain::{EntryWrite, KeyPath, ObservedEntry};
use crate::error::AppResult;

/// Operations the reconciler needs from a Group Policy store.
///
/// Implementations own transport, credentials and timeouts. Values returned
/// by [`PolicyStore::get_entry`] must already be in canonical textual form.
pub trait PolicyStore {
    fn gpo_exists(&self, gpo_name: &str) -> AppResult<bool>;

    fn create_gpo(&self, gpo_name: &str) -> AppResult<()>;

    /// `Ok(None)` when the GPO has no entry for this key/value name
    fn get_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
    ) -> AppResult<Option<ObservedEntry>>;

    fn set_entry(
        &self,
        gpo_name: &str,
        key_path: &KeyPath,
        value_name: &str,
        write: &EntryWrite,
    ) -> AppResult<()>;

    fn remove_entry(&self, gpo_name: &str, key_path: &KeyPath, value_name: &str) -> AppResult<()>;
}
