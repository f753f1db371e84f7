//! Fan-out of calendar state changes to connected viewers.
//!
//! Built on `tokio::sync::broadcast`: every subscriber gets an independent
//! receiver, publish never blocks on slow consumers, and there is no
//! replay. A viewer that connects after an event was published performs a
//! full-state fetch instead; events are invalidation signals whose payload
//! fields serve as an optimistic hint at best.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::availability::{AvailabilityState, DateAggregate};
use crate::user::UserId;

/// Buffered events per subscriber before a slow receiver starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// What happened to a date's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationAction {
    Confirmed,
    Unconfirmed,
}

/// A state change pushed to every connected calendar viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarEvent {
    AvailabilityUpdate {
        date: NaiveDate,
        user_id: UserId,
        new_state: Option<AvailabilityState>,
        aggregate: DateAggregate,
    },
    ConfirmationUpdate {
        date: NaiveDate,
        action: ConfirmationAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confirmed_by: Option<UserId>,
    },
}

/// Handle for publishing and subscribing to calendar events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CalendarEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    /// Deliver an event to all current subscribers, best-effort.
    ///
    /// Having no subscribers is not an error, and a receiver that was
    /// dropped mid-publish is skipped silently.
    pub fn publish(&self, event: CalendarEvent) {
        let _ = self.tx.send(event);
    }

    /// Register a new viewer channel.
    pub fn subscribe(&self) -> broadcast::Receiver<CalendarEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn confirmation_event(d: &str) -> CalendarEvent {
        CalendarEvent::ConfirmationUpdate {
            date: date(d),
            action: ConfirmationAction::Confirmed,
            description: Some("Recording".to_string()),
            confirmed_by: Some(UserId::new("alice")),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = confirmation_event("2030-06-01");
        bus.publish(event.clone());

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::default();
        // Must not error or panic
        bus.publish(confirmation_event("2030-06-01"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_affect_others() {
        let bus = EventBus::default();
        let rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        drop(rx1);

        let event = confirmation_event("2030-06-01");
        bus.publish(event.clone());
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_same_date_events_arrive_in_emission_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(confirmation_event("2030-06-01"));
        bus.publish(CalendarEvent::ConfirmationUpdate {
            date: date("2030-06-01"),
            action: ConfirmationAction::Unconfirmed,
            description: None,
            confirmed_by: None,
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            CalendarEvent::ConfirmationUpdate { action: ConfirmationAction::Confirmed, .. }
        ));
        assert!(matches!(
            second,
            CalendarEvent::ConfirmationUpdate { action: ConfirmationAction::Unconfirmed, .. }
        ));
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_oldest_and_catches_up() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();

        // Publishing past capacity never errors; the slow receiver pays
        bus.publish(confirmation_event("2030-06-01"));
        bus.publish(confirmation_event("2030-06-08"));

        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(missed)) => assert_eq!(missed, 1),
            other => panic!("expected lag, got {other:?}"),
        }

        // The newest event is still delivered after the lag signal
        match rx.recv().await.unwrap() {
            CalendarEvent::ConfirmationUpdate { date, .. } => {
                assert_eq!(date, "2030-06-08".parse::<NaiveDate>().unwrap());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(confirmation_event("2030-06-01")).unwrap();
        assert_eq!(json["type"], "confirmation_update");
        assert_eq!(json["date"], "2030-06-01");
        assert_eq!(json["action"], "confirmed");
        assert_eq!(json["confirmed_by"], "alice");
    }
}
