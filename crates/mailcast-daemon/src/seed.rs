//! JSON seed import for the `init-data` subcommand.
//!
//! Record management (forms, list pages, per-user screens) lives outside
//! this system; seeding is how campaigns, clients and templates get into
//! the store. Rows are deduplicated by name so re-running a seed file is
//! harmless.

use anyhow::{anyhow, Result};
use chrono::{NaiveTime, Utc};
use mailcast_common::types::{Campaign, Client, Membership, MessageTemplate, WeekDay};
use mailcast_storage::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub clients: Vec<SeedClient>,
    #[serde(default)]
    pub messages: Vec<SeedMessage>,
    #[serde(default)]
    pub campaigns: Vec<SeedCampaign>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedClient {
    pub name: String,
    pub email: String,
    #[serde(default = "default_seed_active")]
    pub is_active: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedMessage {
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCampaign {
    pub name: String,
    /// "HH:MM" or "HH:MM:SS".
    pub time_from: String,
    pub time_to: String,
    /// Weekday name or ISO number; unset means every day.
    #[serde(default)]
    pub week_day: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Message template, referenced by seed name.
    #[serde(default)]
    pub message: Option<String>,
    /// Client names to join to this campaign.
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default = "default_seed_active")]
    pub is_active: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

fn default_seed_active() -> bool {
    true
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub clients_created: u32,
    pub clients_skipped: u32,
    pub messages_created: u32,
    pub messages_skipped: u32,
    pub campaigns_created: u32,
    pub campaigns_skipped: u32,
    pub memberships_created: u32,
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| anyhow!("invalid time '{s}': {e}"))
}

/// Imports the seed into the store, skipping rows whose name already exists.
pub fn apply(store: &dyn EntityStore, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let now = Utc::now();

    let mut client_ids: HashMap<String, String> = store
        .list_clients()?
        .into_iter()
        .map(|c| (c.name.clone(), c.id))
        .collect();
    let mut message_ids: HashMap<String, String> = store
        .list_messages()?
        .into_iter()
        .map(|m| (m.name.clone(), m.id))
        .collect();
    let existing_campaigns: HashMap<String, String> = store
        .list_campaigns(false)?
        .into_iter()
        .map(|c| (c.name.clone(), c.id))
        .collect();

    for seed_client in &seed.clients {
        if client_ids.contains_key(&seed_client.name) {
            tracing::warn!(name = %seed_client.name, "Client already exists, skipping");
            report.clients_skipped += 1;
            continue;
        }
        let client = Client {
            id: mailcast_common::id::next_id(),
            name: seed_client.name.clone(),
            email: seed_client.email.clone(),
            is_active: seed_client.is_active,
            owner: seed_client.owner.clone(),
            created_at: now,
            updated_at: now,
        };
        store.insert_client(&client)?;
        tracing::info!(name = %client.name, id = %client.id, "Client created");
        client_ids.insert(client.name, client.id);
        report.clients_created += 1;
    }

    for seed_message in &seed.messages {
        if message_ids.contains_key(&seed_message.name) {
            tracing::warn!(name = %seed_message.name, "Message template already exists, skipping");
            report.messages_skipped += 1;
            continue;
        }
        let message = MessageTemplate {
            id: mailcast_common::id::next_id(),
            name: seed_message.name.clone(),
            subject: seed_message.subject.clone(),
            body: seed_message.body.clone(),
            owner: seed_message.owner.clone(),
            created_at: now,
            updated_at: now,
        };
        store.insert_message(&message)?;
        tracing::info!(name = %message.name, id = %message.id, "Message template created");
        message_ids.insert(message.name, message.id);
        report.messages_created += 1;
    }

    for seed_campaign in &seed.campaigns {
        if existing_campaigns.contains_key(&seed_campaign.name) {
            tracing::warn!(name = %seed_campaign.name, "Campaign already exists, skipping");
            report.campaigns_skipped += 1;
            continue;
        }

        let week_day = match &seed_campaign.week_day {
            Some(s) => Some(
                s.parse::<WeekDay>()
                    .map_err(|e| anyhow!("campaign '{}': {e}", seed_campaign.name))?,
            ),
            None => None,
        };
        let message_id = match &seed_campaign.message {
            Some(name) => Some(
                message_ids
                    .get(name)
                    .cloned()
                    .ok_or_else(|| {
                        anyhow!(
                            "campaign '{}' references unknown message '{name}'",
                            seed_campaign.name
                        )
                    })?,
            ),
            None => None,
        };

        let campaign = Campaign {
            id: mailcast_common::id::next_id(),
            name: seed_campaign.name.clone(),
            time_from: parse_time(&seed_campaign.time_from)?,
            time_to: parse_time(&seed_campaign.time_to)?,
            week_day,
            description: seed_campaign.description.clone(),
            message_id,
            sent: false,
            is_active: seed_campaign.is_active,
            owner: seed_campaign.owner.clone(),
            created_at: now,
            updated_at: now,
        };
        store.insert_campaign(&campaign)?;
        tracing::info!(name = %campaign.name, id = %campaign.id, "Campaign created");
        report.campaigns_created += 1;

        for client_name in &seed_campaign.clients {
            let client_id = client_ids.get(client_name).cloned().ok_or_else(|| {
                anyhow!(
                    "campaign '{}' references unknown client '{client_name}'",
                    seed_campaign.name
                )
            })?;
            store.add_membership(&Membership {
                id: mailcast_common::id::next_id(),
                campaign_id: campaign.id.clone(),
                client_id,
                owner: campaign.owner.clone(),
                created_at: now,
            })?;
            report.memberships_created += 1;
        }
    }

    Ok(report)
}
