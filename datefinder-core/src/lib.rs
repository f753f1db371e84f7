//! Core types for the datefinder ecosystem.
//!
//! This crate implements the scheduling model behind the datefinder
//! server:
//! - tri-state availability per (user, date) with derived aggregates
//! - confirmed dates with at-most-one-per-date semantics
//! - real-time broadcast of state changes to connected viewers
//! - post-action hooks (logging, .ics export) with per-hook failure
//!   isolation
//!
//! Authentication, routing and rendering live in `datefinder-server`.

pub mod availability;
pub mod broadcast;
pub mod confirmation;
pub mod error;
pub mod hooks;
pub mod ical;
pub mod store;
pub mod user;

pub use availability::{
    AggregateEntry, AvailabilityEngine, AvailabilityState, CANDIDATE_MIN_COUNT, DateAggregate,
    STAR_THRESHOLD,
};
pub use broadcast::{CalendarEvent, ConfirmationAction, EventBus};
pub use confirmation::{ConfirmationEngine, ConfirmedDate};
pub use error::{DateFinderError, DateFinderResult};
pub use hooks::{LoggingHook, PostActionHook};
pub use ical::IcalExportHook;
pub use store::{AvailabilityStore, ConfirmationStore};
pub use user::{Roster, UserId};
