pub mod commands;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod reconcile;
pub mod reporting;

pub use commands::apply_gpo_setting;
pub use domain::{
    validate, DesiredEntry, DesiredState, EntryWrite, GpoSettingParams, Hive, Intent, KeyPath,
    ObservedEntry, ValueType,
};
pub use error::{AppError, AppResult, CommandError};
pub use infrastructure::{
    MemoryPolicyStore, PolicyStore, PowerShellPolicyStore, PowerShellStoreConfig, StoreCall, StoreOp,
};
pub use reconcile::{
    plan_entry_action, reconcile, reconcile_with_options, Action, EntryAction, ReconcileOptions,
    ReconciliationResult,
};
pub use reporting::{report, summarize, SettingReport};
