use anyhow::Result;
use chrono::{DateTime, Utc};
use mailcast_common::types::{Campaign, DispatchLog};
use mailcast_mailer::{MailTransport, OutgoingMail};
use mailcast_storage::EntityStore;
use std::sync::Arc;

use crate::window::DispatchWindow;

/// What one tick did to one campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// The campaign was due and unsent; the transport accepted the mail.
    Dispatched { recipients: usize },
    /// The campaign was due and unsent; the transport failed. The `sent`
    /// flag stays false so the next tick retries inside the same window.
    Failed { kind: String },
    /// Due and unsent, but the message reference is unset or dangling.
    /// No audit log row is written for this case.
    SkippedNoMessage,
    /// Due but already dispatched for this window occurrence.
    AlreadySent,
    /// Window exited with the flag still set; the flag was reset.
    Reset,
    /// Not due, nothing armed.
    Idle,
}

/// Applies the (due?, sent?) transition table to one campaign per tick.
pub struct DispatchEngine {
    store: Arc<dyn EntityStore>,
    transport: Arc<dyn MailTransport>,
    mail_from: String,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        transport: Arc<dyn MailTransport>,
        mail_from: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            mail_from: mail_from.into(),
        }
    }

    /// Evaluates one campaign against `now` and performs the resulting
    /// transition. Store errors abort only this campaign's evaluation.
    pub async fn evaluate(&self, campaign: &Campaign, now: DateTime<Utc>) -> Result<TickAction> {
        let due = DispatchWindow::for_campaign(campaign).is_due(now);
        match (due, campaign.sent) {
            // Window passed since the last successful send: re-arm.
            (false, true) => {
                self.store.clear_sent(&campaign.id)?;
                tracing::debug!(campaign = %campaign.name, "Window exited, sent flag reset");
                Ok(TickAction::Reset)
            }
            (false, false) => Ok(TickAction::Idle),
            (true, true) => Ok(TickAction::AlreadySent),
            (true, false) => self.dispatch(campaign, now).await,
        }
    }

    async fn dispatch(&self, campaign: &Campaign, now: DateTime<Utc>) -> Result<TickAction> {
        // The campaign may come from a cached snapshot; the sent check must
        // run against the live row.
        let campaign = match self.store.get_campaign(&campaign.id)? {
            Some(live) => live,
            None => {
                tracing::debug!(campaign = %campaign.name, "Campaign deleted since listing");
                return Ok(TickAction::Idle);
            }
        };
        if campaign.sent {
            return Ok(TickAction::AlreadySent);
        }
        let campaign = &campaign;

        let Some(message_id) = campaign.message_id.as_deref() else {
            tracing::warn!(
                campaign = %campaign.name,
                "Campaign has no message template, skipping dispatch"
            );
            return Ok(TickAction::SkippedNoMessage);
        };
        let Some(template) = self.store.get_message(message_id)? else {
            tracing::warn!(
                campaign = %campaign.name,
                message_id,
                "Campaign references a deleted message template, skipping dispatch"
            );
            return Ok(TickAction::SkippedNoMessage);
        };

        let recipients = self.store.get_recipients(&campaign.id)?;
        let recipient_count = recipients.len();
        let mail = OutgoingMail {
            subject: template.subject.unwrap_or_default(),
            body: template.body,
            from: self.mail_from.clone(),
            recipients,
        };

        match self.transport.send(&mail).await {
            Ok(()) => {
                self.append_log(DispatchLog::success(campaign, now));
                if !self.store.mark_sent(&campaign.id)? {
                    tracing::debug!(
                        campaign = %campaign.name,
                        "Sent flag was already set by a concurrent pass"
                    );
                }
                tracing::info!(
                    campaign = %campaign.name,
                    recipients = recipient_count,
                    transport = self.transport.transport_name(),
                    "Campaign dispatched"
                );
                Ok(TickAction::Dispatched {
                    recipients: recipient_count,
                })
            }
            Err(e) => {
                tracing::error!(
                    campaign = %campaign.name,
                    error = %e,
                    "Campaign dispatch failed"
                );
                self.append_log(DispatchLog::failure(campaign, now, e.kind(), &e.to_string()));
                Ok(TickAction::Failed {
                    kind: e.kind().to_string(),
                })
            }
        }
    }

    // A failed log write is surfaced to the operator but never aborts the
    // tick; the flag transition still has to happen.
    fn append_log(&self, entry: DispatchLog) {
        if let Err(e) = self.store.append_log(&entry) {
            tracing::error!(
                campaign = ?entry.campaign_id,
                error = %e,
                "Failed to append dispatch log"
            );
        }
    }
}
