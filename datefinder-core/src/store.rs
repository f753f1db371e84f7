//! Persistent stores for availability records and confirmed dates.
//!
//! Both stores keep their data in memory behind a mutex and mirror every
//! mutation to a JSON snapshot on disk, written to a `.tmp` file and
//! renamed into place. A store opened without a path is memory-only,
//! which the tests use.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::availability::AvailabilityState;
use crate::confirmation::ConfirmedDate;
use crate::error::{DateFinderError, DateFinderResult};
use crate::user::UserId;

type AvailabilityMap = BTreeMap<NaiveDate, BTreeMap<UserId, AvailabilityState>>;
type ConfirmationMap = BTreeMap<NaiveDate, ConfirmedDate>;

/// Write content to `path` atomically via a temp file and rename.
pub(crate) fn write_atomic(path: &Path, content: &str) -> DateFinderResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = path.with_extension("tmp");
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}

fn load_snapshot<T: serde::de::DeserializeOwned + Default>(path: &Path) -> DateFinderResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| DateFinderError::Serialization(e.to_string()))
}

fn save_snapshot<T: serde::Serialize>(path: Option<&PathBuf>, data: &T) -> DateFinderResult<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let content = serde_json::to_string_pretty(data)
        .map_err(|e| DateFinderError::Serialization(e.to_string()))?;
    write_atomic(path, &content)
}

/// Persisted mapping of (user, date) to availability state.
///
/// At most one record per (user, date); absence means "none". The toggle
/// rotation is applied under the store lock so concurrent toggles for the
/// same user and date serialize into a deterministic cycle.
pub struct AvailabilityStore {
    path: Option<PathBuf>,
    records: Mutex<AvailabilityMap>,
}

impl AvailabilityStore {
    /// Open a store backed by the given snapshot file, loading it if present.
    pub fn open(path: PathBuf) -> DateFinderResult<Self> {
        let records = load_snapshot(&path)?;
        Ok(AvailabilityStore {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// Memory-only store, used in tests.
    pub fn in_memory() -> Self {
        AvailabilityStore {
            path: None,
            records: Mutex::new(AvailabilityMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AvailabilityMap> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the user's state for a date through the toggle cycle and
    /// persist the result. Returns the new state, `None` when the record
    /// was removed.
    pub fn toggle(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> DateFinderResult<Option<AvailabilityState>> {
        let mut records = self.lock();

        let current = records.get(&date).and_then(|users| users.get(user)).copied();
        let next = AvailabilityState::cycle(current);

        match next {
            Some(state) => {
                records.entry(date).or_default().insert(user.clone(), state);
            }
            None => {
                if let Entry::Occupied(mut users) = records.entry(date) {
                    users.get_mut().remove(user);
                    if users.get().is_empty() {
                        users.remove();
                    }
                }
            }
        }

        save_snapshot(self.path.as_ref(), &*records)?;
        Ok(next)
    }

    /// All records for a date, keyed by user.
    pub fn entries_for(&self, date: NaiveDate) -> Vec<(UserId, AvailabilityState)> {
        self.lock()
            .get(&date)
            .map(|users| {
                users
                    .iter()
                    .map(|(user, state)| (user.clone(), *state))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Dates with at least one record, from `from` onwards, ascending.
    pub fn dates_from(&self, from: NaiveDate) -> Vec<NaiveDate> {
        self.lock().range(from..).map(|(date, _)| *date).collect()
    }

    /// Dates with at least one record within `[from, to]`, ascending.
    pub fn dates_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        self.lock().range(from..=to).map(|(date, _)| *date).collect()
    }
}

/// Persisted mapping of date to confirmation, at most one per date.
pub struct ConfirmationStore {
    path: Option<PathBuf>,
    entries: Mutex<ConfirmationMap>,
}

impl ConfirmationStore {
    /// Open a store backed by the given snapshot file, loading it if present.
    pub fn open(path: PathBuf) -> DateFinderResult<Self> {
        let entries = load_snapshot(&path)?;
        Ok(ConfirmationStore {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// Memory-only store, used in tests.
    pub fn in_memory() -> Self {
        ConfirmationStore {
            path: None,
            entries: Mutex::new(ConfirmationMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConfirmationMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a confirmation, failing if the date is already confirmed.
    ///
    /// The occupancy check and the write happen under the same lock, so
    /// concurrent confirm attempts for one date cannot both succeed.
    pub fn insert(&self, entry: ConfirmedDate) -> DateFinderResult<()> {
        let mut entries = self.lock();

        match entries.entry(entry.date) {
            Entry::Occupied(_) => return Err(DateFinderError::AlreadyConfirmed(entry.date)),
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }

        save_snapshot(self.path.as_ref(), &*entries)
    }

    /// Remove and return the confirmation for a date.
    pub fn remove(&self, date: NaiveDate) -> DateFinderResult<ConfirmedDate> {
        let mut entries = self.lock();

        let removed = entries
            .remove(&date)
            .ok_or(DateFinderError::NotConfirmed(date))?;

        save_snapshot(self.path.as_ref(), &*entries)?;
        Ok(removed)
    }

    pub fn get(&self, date: NaiveDate) -> Option<ConfirmedDate> {
        self.lock().get(&date).cloned()
    }

    /// All confirmations, date ascending.
    pub fn all(&self) -> Vec<ConfirmedDate> {
        self.lock().values().cloned().collect()
    }
}
