use anyhow::Result;
use chrono::{DateTime, Utc};
use mailcast_mailer::MailTransport;
use mailcast_storage::EntityStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::CampaignCache;
use crate::engine::{DispatchEngine, TickAction};

/// Aggregate outcome of one scheduler pass, logged as the heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub evaluated: u32,
    pub dispatched: u32,
    pub failed: u32,
    pub skipped: u32,
    pub reset: u32,
    pub errors: u32,
}

/// One evaluation pass over all campaigns, driven by an external periodic
/// trigger. Carries no timer of its own.
///
/// `run_once` is not re-entrant: the caller must serialize invocations
/// (the daemon's interval loop does so by construction).
pub struct MailingScheduler {
    store: Arc<dyn EntityStore>,
    engine: DispatchEngine,
    cache: CampaignCache,
}

impl MailingScheduler {
    pub fn new(
        store: Arc<dyn EntityStore>,
        transport: Arc<dyn MailTransport>,
        cache: CampaignCache,
        mail_from: impl Into<String>,
    ) -> Self {
        let engine = DispatchEngine::new(store.clone(), transport, mail_from);
        Self {
            store,
            engine,
            cache,
        }
    }

    /// Evaluates every active campaign once against `now`.
    ///
    /// Per-campaign failures are isolated: a store or dispatch error on one
    /// campaign is counted and logged, and the pass continues. Only the
    /// initial campaign listing propagates an error to the trigger.
    ///
    /// Cancellation stops starting new campaign evaluations; an in-flight
    /// send completes or fails cleanly first.
    pub async fn run_once(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<TickSummary> {
        let campaigns = self
            .cache
            .get_or_refresh(now, || self.store.list_campaigns(false))?;

        let mut summary = TickSummary::default();
        for campaign in campaigns.iter().filter(|c| c.is_active) {
            if cancel.is_cancelled() {
                tracing::info!(
                    evaluated = summary.evaluated,
                    "Mailing pass cancelled, leaving remaining campaigns to the next tick"
                );
                break;
            }

            summary.evaluated += 1;
            match self.engine.evaluate(campaign, now).await {
                Ok(TickAction::Dispatched { .. }) => summary.dispatched += 1,
                Ok(TickAction::Failed { .. }) => summary.failed += 1,
                Ok(TickAction::SkippedNoMessage) => summary.skipped += 1,
                Ok(TickAction::Reset) => summary.reset += 1,
                Ok(TickAction::AlreadySent | TickAction::Idle) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(
                        campaign = %campaign.name,
                        error = %e,
                        "Campaign evaluation failed"
                    );
                }
            }
        }

        // Heartbeat for external liveness monitoring
        tracing::info!(
            evaluated = summary.evaluated,
            dispatched = summary.dispatched,
            failed = summary.failed,
            skipped = summary.skipped,
            reset = summary.reset,
            errors = summary.errors,
            "Mailing pass complete"
        );
        Ok(summary)
    }

    /// Drops the campaign snapshot; the next pass loads fresh.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
