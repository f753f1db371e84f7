//! Shared application state.

use std::sync::Arc;

use anyhow::Result;

use datefinder_core::{
    AvailabilityEngine, AvailabilityStore, ConfirmationEngine, ConfirmationStore, EventBus,
    IcalExportHook, LoggingHook, PostActionHook, Roster,
};

use crate::config::ServerConfig;
use crate::notify::WebhookHook;

#[derive(Clone)]
pub struct AppState {
    pub availability: Arc<AvailabilityEngine>,
    pub confirmations: Arc<ConfirmationEngine>,
    pub roster: Arc<Roster>,
    pub bus: EventBus,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let data_dir = config.data_dir()?;

        let availability_store = Arc::new(AvailabilityStore::open(
            data_dir.join("availability.json"),
        )?);
        let confirmation_store =
            Arc::new(ConfirmationStore::open(data_dir.join("confirmed.json"))?);

        let roster = Arc::new(config.roster());
        let bus = EventBus::default();

        // Hook order: audit log first, then export, then notifications
        let mut hooks: Vec<Box<dyn PostActionHook>> = vec![Box::new(LoggingHook)];

        if let Some(ical_path) = &config.export.ical_path {
            let export = IcalExportHook::new(
                confirmation_store.clone(),
                roster.clone(),
                ical_path.clone(),
                config.export.calendar_name.clone(),
            );
            // Regenerate at startup so the published file matches the store
            export.export()?;
            hooks.push(Box::new(export));
        }

        if !config.notify.webhook_urls.is_empty() {
            hooks.push(Box::new(WebhookHook::new(&config.notify, roster.clone())));
        }

        let availability = Arc::new(AvailabilityEngine::new(
            availability_store,
            roster.clone(),
            bus.clone(),
        ));
        let confirmations = Arc::new(ConfirmationEngine::new(
            confirmation_store,
            bus.clone(),
            hooks,
        ));

        Ok(AppState {
            availability,
            confirmations,
            roster,
            bus,
        })
    }
}
