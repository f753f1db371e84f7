//! Post-action hooks for confirmation changes.
//!
//! Hooks run after a confirm/unconfirm has been persisted and broadcast,
//! in registration order. Each call sits in its own failure boundary: an
//! erroring hook is logged and the remaining hooks still run, and the
//! caller's request succeeds either way. There is no retry, so
//! notification or export state may lag behind the store after a failure.
//!
//! The hook list is built at startup and handed to the
//! `ConfirmationEngine` constructor, so tests can substitute fakes.

use chrono::NaiveDate;

use crate::user::UserId;

/// A side effect to run after a confirmation state change.
pub trait PostActionHook: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Called after a date was confirmed.
    fn on_confirm(
        &self,
        date: NaiveDate,
        description: &str,
        confirmed_by: Option<&UserId>,
    ) -> anyhow::Result<()>;

    /// Called after a date was unconfirmed.
    fn on_unconfirm(&self, date: NaiveDate) -> anyhow::Result<()>;
}

/// Run every hook's `on_confirm`, isolating failures per hook.
pub fn run_confirm_hooks(
    hooks: &[Box<dyn PostActionHook>],
    date: NaiveDate,
    description: &str,
    confirmed_by: Option<&UserId>,
) {
    for hook in hooks {
        if let Err(err) = hook.on_confirm(date, description, confirmed_by) {
            tracing::error!(hook = hook.name(), %date, error = %err, "confirm hook failed");
        }
    }
}

/// Run every hook's `on_unconfirm`, isolating failures per hook.
pub fn run_unconfirm_hooks(hooks: &[Box<dyn PostActionHook>], date: NaiveDate) {
    for hook in hooks {
        if let Err(err) = hook.on_unconfirm(date) {
            tracing::error!(hook = hook.name(), %date, error = %err, "unconfirm hook failed");
        }
    }
}

/// Audit-trail hook that logs every confirmation change.
pub struct LoggingHook;

impl PostActionHook for LoggingHook {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn on_confirm(
        &self,
        date: NaiveDate,
        description: &str,
        confirmed_by: Option<&UserId>,
    ) -> anyhow::Result<()> {
        let by = confirmed_by.map(UserId::as_str).unwrap_or("unknown");
        tracing::info!(%date, description, confirmed_by = by, "date confirmed");
        Ok(())
    }

    fn on_unconfirm(&self, date: NaiveDate) -> anyhow::Result<()> {
        tracing::info!(%date, "date unconfirmed");
        Ok(())
    }
}
