//! Entity store for campaigns, clients, message templates, memberships and
//! dispatch logs.
//!
//! The default implementation ([`sqlite::SqliteStore`]) keeps everything in
//! a single SQLite database with WAL mode. The dispatch engine only consumes
//! the [`EntityStore`] trait, so tests substitute an in-memory mock.

pub mod sqlite;

#[cfg(test)]
mod tests;

use anyhow::Result;
use mailcast_common::types::{Campaign, Client, DispatchLog, Membership, MessageTemplate};

/// Persistence backend for the mailing dispatcher.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the store is consumed from the scheduler loop and from seeding
/// subcommands concurrently.
pub trait EntityStore: Send + Sync {
    /// Lists campaigns, optionally restricted to `is_active = true`.
    fn list_campaigns(&self, active_only: bool) -> Result<Vec<Campaign>>;

    /// Gets a single campaign by ID.
    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>>;

    /// Inserts a campaign row.
    fn insert_campaign(&self, campaign: &Campaign) -> Result<()>;

    /// Deletes a campaign. Memberships cascade; log rows keep their data
    /// with the campaign reference set NULL. Returns true if a row existed.
    fn delete_campaign(&self, id: &str) -> Result<bool>;

    /// Sets `sent = true` only if it is currently false, as a single
    /// conditional UPDATE, so concurrent callers cannot both claim the
    /// window. Returns whether this call performed the transition.
    fn mark_sent(&self, campaign_id: &str) -> Result<bool>;

    /// Resets `sent = false`. Idempotent single-field update.
    fn clear_sent(&self, campaign_id: &str) -> Result<()>;

    /// Inserts a client row.
    fn insert_client(&self, client: &Client) -> Result<()>;

    /// Lists all clients in name order.
    fn list_clients(&self) -> Result<Vec<Client>>;

    /// Deletes a client; its memberships cascade. Returns true if a row existed.
    fn delete_client(&self, id: &str) -> Result<bool>;

    /// Inserts a message template row.
    fn insert_message(&self, message: &MessageTemplate) -> Result<()>;

    /// Gets a message template by ID.
    fn get_message(&self, id: &str) -> Result<Option<MessageTemplate>>;

    /// Lists all message templates in name order.
    fn list_messages(&self) -> Result<Vec<MessageTemplate>>;

    /// Deletes a message template. Campaigns referencing it get their
    /// `message_id` cleared. Returns true if a row existed.
    fn delete_message(&self, id: &str) -> Result<bool>;

    /// Adds a campaign-client membership. Fails on a duplicate pair.
    fn add_membership(&self, membership: &Membership) -> Result<()>;

    /// Email addresses of all clients joined to the campaign, in client
    /// name order. Client activity is not consulted here.
    fn get_recipients(&self, campaign_id: &str) -> Result<Vec<String>>;

    /// Appends one audit row. Log rows are never mutated afterwards.
    fn append_log(&self, entry: &DispatchLog) -> Result<()>;

    /// Lists audit rows newest-first, optionally for one campaign.
    fn list_logs(&self, campaign_id: Option<&str>, limit: usize) -> Result<Vec<DispatchLog>>;
}
