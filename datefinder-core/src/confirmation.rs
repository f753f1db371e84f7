//! Confirmed dates and the engine that manages them.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::broadcast::{CalendarEvent, ConfirmationAction, EventBus};
use crate::error::{DateFinderError, DateFinderResult};
use crate::hooks::{self, PostActionHook};
use crate::store::ConfirmationStore;
use crate::user::UserId;

/// An administrative decision that a date is the chosen date.
///
/// At most one per date. The availability aggregate that justified it is
/// checked only at creation time; responses dropping off afterwards does
/// not retract the confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedDate {
    pub date: NaiveDate,
    pub description: String,
    pub confirmed_by: Option<UserId>,
    pub confirmed_at: DateTime<Utc>,
}

/// Creates and removes confirmations, broadcasting each change and then
/// running the registered post-action hooks.
pub struct ConfirmationEngine {
    store: Arc<ConfirmationStore>,
    bus: EventBus,
    hooks: Vec<Box<dyn PostActionHook>>,
}

impl ConfirmationEngine {
    pub fn new(
        store: Arc<ConfirmationStore>,
        bus: EventBus,
        hooks: Vec<Box<dyn PostActionHook>>,
    ) -> Self {
        ConfirmationEngine { store, bus, hooks }
    }

    /// Confirm a date.
    ///
    /// Rejects dates before today to prevent backdating via direct
    /// requests. The candidate threshold is deliberately not re-checked:
    /// an operator may confirm a date with fewer responses. Double
    /// confirmation fails with `AlreadyConfirmed` and preserves the
    /// original entry's provenance.
    pub fn confirm(
        &self,
        date: NaiveDate,
        description: &str,
        confirmed_by: Option<&UserId>,
    ) -> DateFinderResult<ConfirmedDate> {
        if date < Local::now().date_naive() {
            return Err(DateFinderError::NotEligible(date));
        }

        let entry = ConfirmedDate {
            date,
            description: description.to_string(),
            confirmed_by: confirmed_by.cloned(),
            confirmed_at: Utc::now(),
        };

        self.store.insert(entry.clone())?;

        self.bus.publish(CalendarEvent::ConfirmationUpdate {
            date,
            action: ConfirmationAction::Confirmed,
            description: Some(entry.description.clone()),
            confirmed_by: entry.confirmed_by.clone(),
        });

        hooks::run_confirm_hooks(&self.hooks, date, description, confirmed_by);

        Ok(entry)
    }

    /// Remove a date's confirmation. Fails with `NotConfirmed` if there
    /// is none.
    pub fn unconfirm(&self, date: NaiveDate) -> DateFinderResult<()> {
        self.store.remove(date)?;

        self.bus.publish(CalendarEvent::ConfirmationUpdate {
            date,
            action: ConfirmationAction::Unconfirmed,
            description: None,
            confirmed_by: None,
        });

        hooks::run_unconfirm_hooks(&self.hooks, date);

        Ok(())
    }

    /// All confirmations, date ascending.
    pub fn list_confirmed(&self) -> Vec<ConfirmedDate> {
        self.store.all()
    }

    pub fn get(&self, date: NaiveDate) -> Option<ConfirmedDate> {
        self.store.get(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{AvailabilityEngine, AvailabilityState};
    use crate::store::AvailabilityStore;
    use crate::user::Roster;
    use chrono::Days;
    use std::sync::Mutex;

    fn future(days: u64) -> NaiveDate {
        Local::now().date_naive() + Days::new(days)
    }

    fn engine_with_hooks(hooks: Vec<Box<dyn PostActionHook>>) -> ConfirmationEngine {
        ConfirmationEngine::new(
            Arc::new(ConfirmationStore::in_memory()),
            EventBus::default(),
            hooks,
        )
    }

    fn engine() -> ConfirmationEngine {
        engine_with_hooks(Vec::new())
    }

    #[test]
    fn test_confirm_then_list() {
        let engine = engine();
        let date = future(7);

        let entry = engine
            .confirm(date, "Episode 42", Some(&UserId::new("alice")))
            .unwrap();
        assert_eq!(entry.date, date);

        let confirmed = engine.list_confirmed();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].description, "Episode 42");
        assert_eq!(confirmed[0].confirmed_by, Some(UserId::new("alice")));
    }

    #[test]
    fn test_double_confirm_rejected_and_description_kept() {
        let engine = engine();
        let date = future(7);

        engine.confirm(date, "Episode 42", None).unwrap();
        let err = engine.confirm(date, "Episode 43", None).unwrap_err();

        assert!(matches!(err, DateFinderError::AlreadyConfirmed(d) if d == date));
        assert_eq!(engine.get(date).unwrap().description, "Episode 42");
    }

    #[test]
    fn test_confirm_rejects_past_date() {
        let engine = engine();
        let yesterday = Local::now().date_naive() - Days::new(1);

        let err = engine.confirm(yesterday, "Backdated", None).unwrap_err();
        assert!(matches!(err, DateFinderError::NotEligible(d) if d == yesterday));
        assert!(engine.list_confirmed().is_empty());
    }

    #[test]
    fn test_unconfirm_unknown_date() {
        let engine = engine();
        let err = engine.unconfirm(future(7)).unwrap_err();
        assert!(matches!(err, DateFinderError::NotConfirmed(_)));
    }

    #[test]
    fn test_unconfirm_then_reconfirm() {
        let engine = engine();
        let date = future(7);

        engine.confirm(date, "First run", None).unwrap();
        engine.unconfirm(date).unwrap();
        assert!(engine.list_confirmed().is_empty());

        engine.confirm(date, "Second run", None).unwrap();
        assert_eq!(engine.get(date).unwrap().description, "Second run");
    }

    #[test]
    fn test_confirm_publishes_update() {
        let bus = EventBus::default();
        let engine = ConfirmationEngine::new(
            Arc::new(ConfirmationStore::in_memory()),
            bus.clone(),
            Vec::new(),
        );
        let mut rx = bus.subscribe();
        let date = future(7);

        engine
            .confirm(date, "Episode 42", Some(&UserId::new("alice")))
            .unwrap();
        engine.unconfirm(date).unwrap();

        match rx.try_recv().unwrap() {
            CalendarEvent::ConfirmationUpdate {
                date: got,
                action,
                description,
                confirmed_by,
            } => {
                assert_eq!(got, date);
                assert_eq!(action, ConfirmationAction::Confirmed);
                assert_eq!(description.as_deref(), Some("Episode 42"));
                assert_eq!(confirmed_by, Some(UserId::new("alice")));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        match rx.try_recv().unwrap() {
            CalendarEvent::ConfirmationUpdate { action, .. } => {
                assert_eq!(action, ConfirmationAction::Unconfirmed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    /// Hook that fails every call but records that it ran.
    struct BrokenHook {
        calls: Arc<Mutex<Vec<NaiveDate>>>,
    }

    impl PostActionHook for BrokenHook {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn on_confirm(
            &self,
            date: NaiveDate,
            _description: &str,
            _confirmed_by: Option<&UserId>,
        ) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(date);
            anyhow::bail!("delivery exploded")
        }

        fn on_unconfirm(&self, date: NaiveDate) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(date);
            anyhow::bail!("delivery exploded")
        }
    }

    #[test]
    fn test_failing_hook_does_not_fail_confirm() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = engine_with_hooks(vec![Box::new(BrokenHook {
            calls: calls.clone(),
        })]);
        let date = future(7);

        engine.confirm(date, "Episode 42", None).unwrap();

        // The hook ran and failed, and the confirmation still stands
        assert_eq!(*calls.lock().unwrap(), vec![date]);
        assert_eq!(engine.list_confirmed().len(), 1);
    }

    #[test]
    fn test_two_users_scenario() {
        let roster: Roster = [
            ("alice".to_string(), "Alice".to_string()),
            ("bob".to_string(), "Bob".to_string()),
        ]
        .into_iter()
        .collect();
        let bus = EventBus::default();
        let availability = AvailabilityEngine::new(
            Arc::new(AvailabilityStore::in_memory()),
            Arc::new(roster),
            bus.clone(),
        );
        let confirmations = ConfirmationEngine::new(
            Arc::new(ConfirmationStore::in_memory()),
            bus,
            Vec::new(),
        );

        let date = future(30);
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        assert_eq!(
            availability.toggle(&alice, date).unwrap(),
            Some(AvailabilityState::Available)
        );
        assert_eq!(
            availability.toggle(&bob, date).unwrap(),
            Some(AvailabilityState::Available)
        );

        let agg = availability.aggregate(date);
        assert_eq!(agg.available_count, 2);
        assert_eq!(agg.tentative_count, 0);
        assert!(!agg.starred);

        // Two responses puts the date on the candidate list
        assert!(availability.candidate_dates().iter().any(|a| a.date == date));

        confirmations
            .confirm(date, "Episode 42", Some(&alice))
            .unwrap();

        let confirmed = confirmations.list_confirmed();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].date, date);
        assert_eq!(confirmed[0].description, "Episode 42");
        assert_eq!(confirmed[0].confirmed_by, Some(alice));
    }
}
