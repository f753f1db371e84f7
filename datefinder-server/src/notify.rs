//! Webhook notifications for confirmation changes.
//!
//! Stands in for a full notification gateway: each configured URL gets a
//! JSON `{"message": ...}` POST. Delivery is spawned onto the runtime so
//! hook dispatch returns immediately; failures are logged per URL and
//! never retried.

use std::sync::Arc;

use chrono::NaiveDate;
use datefinder_core::{PostActionHook, Roster, UserId};

use crate::config::NotifyConfig;

pub struct WebhookHook {
    client: reqwest::Client,
    urls: Vec<String>,
    confirm_template: String,
    unconfirm_template: String,
    roster: Arc<Roster>,
}

impl WebhookHook {
    pub fn new(config: &NotifyConfig, roster: Arc<Roster>) -> Self {
        WebhookHook {
            client: reqwest::Client::new(),
            urls: config.webhook_urls.clone(),
            confirm_template: config.confirm_template.clone(),
            unconfirm_template: config.unconfirm_template.clone(),
            roster,
        }
    }

    /// Substitute the supported placeholders into a message template.
    fn render(
        template: &str,
        date: NaiveDate,
        description: &str,
        confirmed_by: &str,
    ) -> String {
        template
            .replace("{date}", &date.to_string())
            .replace("{date_formatted}", &date.format("%A, %B %d, %Y").to_string())
            .replace("{description}", description)
            .replace("{confirmed_by}", confirmed_by)
    }

    fn deliver(&self, message: String) {
        for url in &self.urls {
            let client = self.client.clone();
            let url = url.clone();
            let message = message.clone();

            tokio::spawn(async move {
                let result = client
                    .post(&url)
                    .json(&serde_json::json!({ "message": message }))
                    .send()
                    .await;

                match result {
                    Ok(response) if response.status().is_success() => {
                        tracing::debug!(%url, "webhook delivered");
                    }
                    Ok(response) => {
                        tracing::warn!(%url, status = %response.status(), "webhook rejected");
                    }
                    Err(err) => {
                        tracing::error!(%url, error = %err, "webhook delivery failed");
                    }
                }
            });
        }
    }
}

impl PostActionHook for WebhookHook {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn on_confirm(
        &self,
        date: NaiveDate,
        description: &str,
        confirmed_by: Option<&UserId>,
    ) -> anyhow::Result<()> {
        let by = confirmed_by
            .map(|id| self.roster.display_name(id))
            .unwrap_or_else(|| "Unknown".to_string());

        let message = Self::render(&self.confirm_template, date, description, &by);
        self.deliver(message);
        Ok(())
    }

    fn on_unconfirm(&self, date: NaiveDate) -> anyhow::Result<()> {
        let message = Self::render(&self.unconfirm_template, date, "", "");
        self.deliver(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let date: NaiveDate = "2030-06-01".parse().unwrap();
        let message = WebhookHook::render(
            "{description} on {date} ({date_formatted}) by {confirmed_by}",
            date,
            "Episode 42",
            "Alice",
        );

        assert_eq!(
            message,
            "Episode 42 on 2030-06-01 (Saturday, June 01, 2030) by Alice"
        );
    }

    #[test]
    fn test_render_leaves_plain_text_alone() {
        let date: NaiveDate = "2030-06-01".parse().unwrap();
        let message = WebhookHook::render("No placeholders here.", date, "x", "y");
        assert_eq!(message, "No placeholders here.");
    }
}
