//! Tri-state availability and per-date aggregates.
//!
//! Each user's marker for a date cycles through
//! none -> Available -> Tentative -> none. The cycle is a fixed rotation,
//! so it lives as a plain function on the state enum rather than a
//! general state machine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::broadcast::{CalendarEvent, EventBus};
use crate::error::{DateFinderError, DateFinderResult};
use crate::store::AvailabilityStore;
use crate::user::{Roster, UserId};

/// Number of firm availabilities that earns a date its star.
pub const STAR_THRESHOLD: usize = 3;

/// Minimum combined responses for a date to show up as a confirmation
/// candidate. Advisory: `ConfirmationEngine::confirm` does not re-check it.
pub const CANDIDATE_MIN_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    Available,
    Tentative,
}

impl AvailabilityState {
    /// Advance the toggle cycle. `None` means no record.
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(AvailabilityState::Available),
            Some(AvailabilityState::Available) => Some(AvailabilityState::Tentative),
            Some(AvailabilityState::Tentative) => None,
        }
    }
}

/// One user's response within an aggregate breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEntry {
    pub user_id: UserId,
    pub display_name: String,
    pub state: AvailabilityState,
}

/// Derived per-date summary. Never persisted; recomputed on every read so
/// it cannot go stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateAggregate {
    pub date: NaiveDate,
    pub available_count: usize,
    pub tentative_count: usize,
    pub starred: bool,
    pub entries: Vec<AggregateEntry>,
}

impl DateAggregate {
    fn compute(
        date: NaiveDate,
        records: Vec<(UserId, AvailabilityState)>,
        roster: &Roster,
    ) -> Self {
        let mut entries: Vec<AggregateEntry> = records
            .into_iter()
            .map(|(user_id, state)| AggregateEntry {
                display_name: roster.display_name(&user_id),
                user_id,
                state,
            })
            .collect();

        // Deterministic breakdown order
        entries.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let available_count = entries
            .iter()
            .filter(|e| e.state == AvailabilityState::Available)
            .count();
        let tentative_count = entries.len() - available_count;

        DateAggregate {
            date,
            available_count,
            tentative_count,
            starred: available_count >= STAR_THRESHOLD,
            entries,
        }
    }

    /// Total responses, firm and tentative.
    pub fn response_count(&self) -> usize {
        self.available_count + self.tentative_count
    }
}

/// Applies the toggle rule, derives aggregates and publishes
/// `availability_update` events.
pub struct AvailabilityEngine {
    store: Arc<AvailabilityStore>,
    roster: Arc<Roster>,
    bus: EventBus,
}

impl AvailabilityEngine {
    pub fn new(store: Arc<AvailabilityStore>, roster: Arc<Roster>, bus: EventBus) -> Self {
        AvailabilityEngine { store, roster, bus }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Cycle the user's marker for a date and broadcast the fresh aggregate.
    ///
    /// Past dates are rejected before any mutation. Returns the user's new
    /// state, `None` when the record was removed.
    pub fn toggle(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> DateFinderResult<Option<AvailabilityState>> {
        if date < Self::today() {
            return Err(DateFinderError::PastDate(date));
        }

        let new_state = self.store.toggle(user, date)?;
        let aggregate = self.aggregate(date);

        tracing::debug!(%user, %date, ?new_state, "availability toggled");

        self.bus.publish(CalendarEvent::AvailabilityUpdate {
            date,
            user_id: user.clone(),
            new_state,
            aggregate,
        });

        Ok(new_state)
    }

    /// Recompute the aggregate for a date from current records.
    pub fn aggregate(&self, date: NaiveDate) -> DateAggregate {
        DateAggregate::compute(date, self.store.entries_for(date), &self.roster)
    }

    /// Future dates with enough responses to be worth confirming, date
    /// ascending. Recomputed on every call.
    pub fn candidate_dates(&self) -> Vec<DateAggregate> {
        self.store
            .dates_from(Self::today())
            .into_iter()
            .map(|date| self.aggregate(date))
            .filter(|agg| agg.response_count() >= CANDIDATE_MIN_COUNT)
            .collect()
    }

    /// Aggregates for all dates with records within the next `days` days,
    /// for the full-state fetch a viewer performs on connect.
    pub fn upcoming(&self, days: u64) -> BTreeMap<NaiveDate, DateAggregate> {
        let today = Self::today();
        let end = today
            .checked_add_days(chrono::Days::new(days))
            .unwrap_or(NaiveDate::MAX);

        self.store
            .dates_between(today, end)
            .into_iter()
            .map(|date| (date, self.aggregate(date)))
            .collect()
    }
}
