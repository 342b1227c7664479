//! Entry point for reconciling one GPO registry setting

use crate::domain::{validate, GpoSettingParams};
use crate::error::CommandError;
use crate::infrastructure::PolicyStore;
use crate::reconcile::{reconcile_with_options, ReconcileOptions};
use crate::reporting::{report, SettingReport};

/// Validate `params`, reconcile against `store` and report the outcome.
///
/// Invalid parameters fail before the store is touched.
pub fn apply_gpo_setting(
    params: &GpoSettingParams,
    store: &dyn PolicyStore,
) -> Result<SettingReport, CommandError> {
    let desired = validate(params).map_err(|e| {
        tracing::warn!(error = %e, "Rejected GPO setting parameters");
        CommandError::from(e)
    })?;

    let options = ReconcileOptions {
        check_mode: params.check_mode,
    };

    let result = reconcile_with_options(&desired, store, options).map_err(|e| {
        tracing::error!(
            gpo = desired.gpo_name.as_str(),
            key = %desired.key_path,
            value_name = desired.value_name.as_str(),
            error = %e,
            "GPO registry setting reconciliation failed"
        );
        CommandError::from(e)
    })?;

    Ok(report(&desired, &result))
}
