use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};
use mailcast_common::types::{Campaign, Client, DispatchLog, Membership, MessageTemplate, WeekDay};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::EntityStore;

const TIME_FORMAT: &str = "%H:%M:%S";

const CAMPAIGNS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS campaigns (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    time_from TEXT NOT NULL,
    time_to TEXT NOT NULL,
    week_day INTEGER,
    description TEXT,
    message_id TEXT REFERENCES messages(id) ON DELETE SET NULL,
    sent INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    owner TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_campaigns_is_active ON campaigns(is_active);
";

const CLIENTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    owner TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";

const MESSAGES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    subject TEXT,
    body TEXT NOT NULL,
    owner TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";

const MEMBERSHIPS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS memberships (
    id TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    owner TEXT,
    created_at INTEGER NOT NULL,
    UNIQUE(campaign_id, client_id)
);
CREATE INDEX IF NOT EXISTS idx_memberships_campaign ON memberships(campaign_id);
";

const DISPATCH_LOGS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dispatch_logs (
    id TEXT PRIMARY KEY,
    campaign_id TEXT REFERENCES campaigns(id) ON DELETE SET NULL,
    timestamp INTEGER NOT NULL,
    error_type TEXT NOT NULL,
    error_message TEXT NOT NULL,
    owner TEXT
);
CREATE INDEX IF NOT EXISTS idx_dispatch_logs_campaign ON dispatch_logs(campaign_id);
CREATE INDEX IF NOT EXISTS idx_dispatch_logs_timestamp ON dispatch_logs(timestamp);
";

/// SQLite-backed [`EntityStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
    _db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("mailcast.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(MESSAGES_SCHEMA)?;
        conn.execute_batch(CLIENTS_SCHEMA)?;
        conn.execute_batch(CAMPAIGNS_SCHEMA)?;
        conn.execute_batch(MEMBERSHIPS_SCHEMA)?;
        conn.execute_batch(DISPATCH_LOGS_SCHEMA)?;
        tracing::info!(path = %db_path.display(), "Initialized entity store");
        Ok(Self {
            conn: Mutex::new(conn),
            _db_path: db_path,
        })
    }

    fn row_to_campaign(row: &rusqlite::Row) -> Result<Campaign> {
        let time_from: String = row.get(2)?;
        let time_to: String = row.get(3)?;
        let week_day: Option<i64> = row.get(4)?;
        let sent_int: i32 = row.get(7)?;
        let active_int: i32 = row.get(8)?;
        let created: i64 = row.get(10)?;
        let updated: i64 = row.get(11)?;
        Ok(Campaign {
            id: row.get(0)?,
            name: row.get(1)?,
            time_from: NaiveTime::parse_from_str(&time_from, TIME_FORMAT)?,
            time_to: NaiveTime::parse_from_str(&time_to, TIME_FORMAT)?,
            week_day: week_day.and_then(|n| WeekDay::from_iso_number(n as u8)),
            description: row.get(5)?,
            message_id: row.get(6)?,
            sent: sent_int != 0,
            is_active: active_int != 0,
            owner: row.get(9)?,
            created_at: DateTime::from_timestamp_millis(created).unwrap_or_default(),
            updated_at: DateTime::from_timestamp_millis(updated).unwrap_or_default(),
        })
    }

    fn row_to_client(row: &rusqlite::Row) -> Result<Client> {
        let active_int: i32 = row.get(3)?;
        let created: i64 = row.get(5)?;
        let updated: i64 = row.get(6)?;
        Ok(Client {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            is_active: active_int != 0,
            owner: row.get(4)?,
            created_at: DateTime::from_timestamp_millis(created).unwrap_or_default(),
            updated_at: DateTime::from_timestamp_millis(updated).unwrap_or_default(),
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> Result<MessageTemplate> {
        let created: i64 = row.get(5)?;
        let updated: i64 = row.get(6)?;
        Ok(MessageTemplate {
            id: row.get(0)?,
            name: row.get(1)?,
            subject: row.get(2)?,
            body: row.get(3)?,
            owner: row.get(4)?,
            created_at: DateTime::from_timestamp_millis(created).unwrap_or_default(),
            updated_at: DateTime::from_timestamp_millis(updated).unwrap_or_default(),
        })
    }

    fn row_to_log(row: &rusqlite::Row) -> Result<DispatchLog> {
        let ts: i64 = row.get(2)?;
        Ok(DispatchLog {
            id: row.get(0)?,
            campaign_id: row.get(1)?,
            timestamp: DateTime::from_timestamp_millis(ts).unwrap_or_default(),
            error_type: row.get(3)?,
            error_message: row.get(4)?,
            owner: row.get(5)?,
        })
    }
}

const CAMPAIGN_COLUMNS: &str =
    "id, name, time_from, time_to, week_day, description, message_id, sent, is_active, owner, created_at, updated_at";

impl EntityStore for SqliteStore {
    fn list_campaigns(&self, active_only: bool) -> Result<Vec<Campaign>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns");
        if active_only {
            sql.push_str(" WHERE is_active = 1");
        }
        sql.push_str(" ORDER BY time_from ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_campaign(row)))?;

        let mut campaigns = Vec::new();
        for row in rows {
            campaigns.push(row??);
        }
        Ok(campaigns)
    }

    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"))?;
        let mut rows = stmt.query_map(rusqlite::params![id], |row| Ok(Self::row_to_campaign(row)))?;
        match rows.next() {
            Some(Ok(Ok(c))) => Ok(Some(c)),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO campaigns (id, name, time_from, time_to, week_day, description, message_id, sent, is_active, owner, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                campaign.id,
                campaign.name,
                campaign.time_from.format(TIME_FORMAT).to_string(),
                campaign.time_to.format(TIME_FORMAT).to_string(),
                campaign.week_day.map(|d| d.iso_number() as i64),
                campaign.description,
                campaign.message_id,
                campaign.sent as i32,
                campaign.is_active as i32,
                campaign.owner,
                campaign.created_at.timestamp_millis(),
                campaign.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn delete_campaign(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM campaigns WHERE id = ?1", rusqlite::params![id])?;
        Ok(deleted > 0)
    }

    fn mark_sent(&self, campaign_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE campaigns SET sent = 1, updated_at = ?1 WHERE id = ?2 AND sent = 0",
            rusqlite::params![Utc::now().timestamp_millis(), campaign_id],
        )?;
        Ok(updated > 0)
    }

    fn clear_sent(&self, campaign_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE campaigns SET sent = 0, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![Utc::now().timestamp_millis(), campaign_id],
        )?;
        Ok(())
    }

    fn insert_client(&self, client: &Client) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO clients (id, name, email, is_active, owner, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                client.id,
                client.name,
                client.email,
                client.is_active as i32,
                client.owner,
                client.created_at.timestamp_millis(),
                client.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, email, is_active, owner, created_at, updated_at FROM clients ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_client(row)))?;

        let mut clients = Vec::new();
        for row in rows {
            clients.push(row??);
        }
        Ok(clients)
    }

    fn delete_client(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM clients WHERE id = ?1", rusqlite::params![id])?;
        Ok(deleted > 0)
    }

    fn insert_message(&self, message: &MessageTemplate) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO messages (id, name, subject, body, owner, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                message.id,
                message.name,
                message.subject,
                message.body,
                message.owner,
                message.created_at.timestamp_millis(),
                message.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn get_message(&self, id: &str) -> Result<Option<MessageTemplate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, subject, body, owner, created_at, updated_at FROM messages WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(rusqlite::params![id], |row| Ok(Self::row_to_message(row)))?;
        match rows.next() {
            Some(Ok(Ok(m))) => Ok(Some(m)),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn list_messages(&self) -> Result<Vec<MessageTemplate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, subject, body, owner, created_at, updated_at FROM messages ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_message(row)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row??);
        }
        Ok(messages)
    }

    fn delete_message(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", rusqlite::params![id])?;
        Ok(deleted > 0)
    }

    fn add_membership(&self, membership: &Membership) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO memberships (id, campaign_id, client_id, owner, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                membership.id,
                membership.campaign_id,
                membership.client_id,
                membership.owner,
                membership.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn get_recipients(&self, campaign_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.email FROM clients c
             INNER JOIN memberships m ON m.client_id = c.id
             WHERE m.campaign_id = ?1
             ORDER BY c.name ASC",
        )?;
        let rows = stmt.query_map(rusqlite::params![campaign_id], |row| row.get::<_, String>(0))?;

        let mut emails = Vec::new();
        for row in rows {
            emails.push(row?);
        }
        Ok(emails)
    }

    fn append_log(&self, entry: &DispatchLog) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO dispatch_logs (id, campaign_id, timestamp, error_type, error_message, owner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.id,
                entry.campaign_id,
                entry.timestamp.timestamp_millis(),
                entry.error_type,
                entry.error_message,
                entry.owner,
            ],
        )?;
        Ok(())
    }

    fn list_logs(&self, campaign_id: Option<&str>, limit: usize) -> Result<Vec<DispatchLog>> {
        let conn = self.conn.lock().unwrap();
        let mut sql = String::from(
            "SELECT id, campaign_id, timestamp, error_type, error_message, owner FROM dispatch_logs",
        );
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(cid) = campaign_id {
            sql.push_str(" WHERE campaign_id = ?1");
            params.push(Box::new(cid.to_string()));
        }
        sql.push_str(" ORDER BY timestamp DESC, id DESC");
        let idx = params.len() + 1;
        sql.push_str(&format!(" LIMIT ?{idx}"));
        params.push(Box::new(limit as i64));

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| Ok(Self::row_to_log(row)))?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row??);
        }
        Ok(logs)
    }
}
