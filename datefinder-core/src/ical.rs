//! Public .ics export of confirmed dates.
//!
//! The exported calendar is regenerated in full after every confirmation
//! change (and once at startup), so subscribers of the published file
//! always see the current confirmed schedule.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use icalendar::{Calendar, Component, EventLike};

use crate::confirmation::ConfirmedDate;
use crate::error::DateFinderResult;
use crate::hooks::PostActionHook;
use crate::store::{ConfirmationStore, write_atomic};
use crate::user::{Roster, UserId};

/// Summary used when a confirmation has no description.
const DEFAULT_SUMMARY: &str = "Podcast Recording";

/// Fixed recording window, floating local time.
const RECORDING_START: &str = "T200000";
const RECORDING_END: &str = "T230000";

/// Generate VCALENDAR content for a set of confirmed dates.
pub fn generate_ics(confirmed: &[ConfirmedDate], roster: &Roster, calendar_name: &str) -> String {
    let mut cal = Calendar::new();
    cal.name(calendar_name);

    for entry in confirmed {
        let mut event = icalendar::Event::new();

        // Stable UID so resubscribing clients keep matching events
        event.uid(&format!("{}-recording@datefinder", entry.date));

        let summary = if entry.description.is_empty() {
            DEFAULT_SUMMARY
        } else {
            &entry.description
        };
        event.summary(summary);

        let dtstamp = entry.confirmed_at.format("%Y%m%dT%H%M%SZ").to_string();
        event.add_property("DTSTAMP", &dtstamp);

        let day = entry.date.format("%Y%m%d").to_string();
        event.add_property("DTSTART", format!("{day}{RECORDING_START}"));
        event.add_property("DTEND", format!("{day}{RECORDING_END}"));

        if let Some(ref by) = entry.confirmed_by {
            event.description(&format!("Confirmed by: {}", roster.display_name(by)));
        }

        cal.push(event.done());
    }

    cal.done().to_string()
}

/// Hook that rewrites the exported .ics file after every confirmation
/// change.
pub struct IcalExportHook {
    store: Arc<ConfirmationStore>,
    roster: Arc<Roster>,
    path: PathBuf,
    calendar_name: String,
}

impl IcalExportHook {
    pub fn new(
        store: Arc<ConfirmationStore>,
        roster: Arc<Roster>,
        path: PathBuf,
        calendar_name: String,
    ) -> Self {
        IcalExportHook {
            store,
            roster,
            path,
            calendar_name,
        }
    }

    /// Regenerate the export from the store's current state. Also called
    /// once at startup so the file exists before the first confirmation.
    pub fn export(&self) -> DateFinderResult<()> {
        let content = generate_ics(&self.store.all(), &self.roster, &self.calendar_name);
        write_atomic(&self.path, &content)?;
        tracing::debug!(path = %self.path.display(), "ical export written");
        Ok(())
    }
}

impl PostActionHook for IcalExportHook {
    fn name(&self) -> &'static str {
        "ical-export"
    }

    fn on_confirm(
        &self,
        _date: NaiveDate,
        _description: &str,
        _confirmed_by: Option<&UserId>,
    ) -> anyhow::Result<()> {
        Ok(self.export()?)
    }

    fn on_unconfirm(&self, _date: NaiveDate) -> anyhow::Result<()> {
        Ok(self.export()?)
    }
}
