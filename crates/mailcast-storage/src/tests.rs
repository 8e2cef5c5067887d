use crate::sqlite::SqliteStore;
use crate::EntityStore;
use chrono::{Duration, NaiveTime, Utc};
use mailcast_common::types::{
    Campaign, Client, DispatchLog, Membership, MessageTemplate, WeekDay, SUCCESS_MARKER,
};
use tempfile::TempDir;

fn setup() -> (TempDir, SqliteStore) {
    mailcast_common::id::init(1, 1);
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::new(dir.path()).unwrap();
    (dir, store)
}

fn make_campaign(name: &str, message_id: Option<&str>) -> Campaign {
    let now = Utc::now();
    Campaign {
        id: mailcast_common::id::next_id(),
        name: name.to_string(),
        time_from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        time_to: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        week_day: Some(WeekDay::Wednesday),
        description: None,
        message_id: message_id.map(str::to_string),
        sent: false,
        is_active: true,
        owner: Some("user-1".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn make_client(name: &str, email: &str) -> Client {
    let now = Utc::now();
    Client {
        id: mailcast_common::id::next_id(),
        name: name.to_string(),
        email: email.to_string(),
        is_active: true,
        owner: Some("user-1".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn make_message(name: &str) -> MessageTemplate {
    let now = Utc::now();
    MessageTemplate {
        id: mailcast_common::id::next_id(),
        name: name.to_string(),
        subject: Some("Weekly digest".to_string()),
        body: "Hello there".to_string(),
        owner: Some("user-1".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn join(store: &SqliteStore, campaign: &Campaign, client: &Client) {
    store
        .add_membership(&Membership {
            id: mailcast_common::id::next_id(),
            campaign_id: campaign.id.clone(),
            client_id: client.id.clone(),
            owner: campaign.owner.clone(),
            created_at: Utc::now(),
        })
        .unwrap();
}

#[test]
fn insert_and_list_campaigns() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();

    let all = store.list_campaigns(false).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "weekly");
    assert_eq!(all[0].week_day, Some(WeekDay::Wednesday));
    assert_eq!(all[0].time_from, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert!(!all[0].sent);
}

#[test]
fn list_campaigns_active_filter() {
    let (_dir, store) = setup();

    let mut inactive = make_campaign("paused", None);
    inactive.is_active = false;
    store.insert_campaign(&inactive).unwrap();
    store.insert_campaign(&make_campaign("running", None)).unwrap();

    assert_eq!(store.list_campaigns(false).unwrap().len(), 2);
    let active = store.list_campaigns(true).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "running");
}

#[test]
fn mark_sent_is_conditional() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();

    // First claim transitions the flag, second finds it already set
    assert!(store.mark_sent(&campaign.id).unwrap());
    assert!(!store.mark_sent(&campaign.id).unwrap());
    assert!(store.get_campaign(&campaign.id).unwrap().unwrap().sent);

    store.clear_sent(&campaign.id).unwrap();
    assert!(!store.get_campaign(&campaign.id).unwrap().unwrap().sent);
    assert!(store.mark_sent(&campaign.id).unwrap());
}

#[test]
fn clear_sent_is_idempotent() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();

    store.clear_sent(&campaign.id).unwrap();
    store.clear_sent(&campaign.id).unwrap();
    assert!(!store.get_campaign(&campaign.id).unwrap().unwrap().sent);
}

#[test]
fn recipients_follow_memberships_in_name_order() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    let other = make_campaign("daily", None);
    store.insert_campaign(&campaign).unwrap();
    store.insert_campaign(&other).unwrap();

    let bob = make_client("bob", "bob@example.com");
    let alice = make_client("alice", "alice@example.com");
    let carol = make_client("carol", "carol@example.com");
    store.insert_client(&bob).unwrap();
    store.insert_client(&alice).unwrap();
    store.insert_client(&carol).unwrap();

    join(&store, &campaign, &bob);
    join(&store, &campaign, &alice);
    join(&store, &other, &carol);

    let emails = store.get_recipients(&campaign.id).unwrap();
    assert_eq!(emails, vec!["alice@example.com", "bob@example.com"]);
}

#[test]
fn inactive_clients_still_resolve_as_recipients() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();

    let mut client = make_client("dora", "dora@example.com");
    client.is_active = false;
    store.insert_client(&client).unwrap();
    join(&store, &campaign, &client);

    assert_eq!(
        store.get_recipients(&campaign.id).unwrap(),
        vec!["dora@example.com"]
    );
}

#[test]
fn duplicate_membership_is_rejected() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();
    let client = make_client("alice", "alice@example.com");
    store.insert_client(&client).unwrap();

    join(&store, &campaign, &client);
    let dup = Membership {
        id: mailcast_common::id::next_id(),
        campaign_id: campaign.id.clone(),
        client_id: client.id.clone(),
        owner: None,
        created_at: Utc::now(),
    };
    assert!(store.add_membership(&dup).is_err());
}

#[test]
fn deleting_message_clears_campaign_reference() {
    let (_dir, store) = setup();

    let message = make_message("digest");
    store.insert_message(&message).unwrap();
    let campaign = make_campaign("weekly", Some(&message.id));
    store.insert_campaign(&campaign).unwrap();

    assert!(store.delete_message(&message.id).unwrap());
    assert!(store.get_message(&message.id).unwrap().is_none());

    let reloaded = store.get_campaign(&campaign.id).unwrap().unwrap();
    assert!(reloaded.message_id.is_none());
}

#[test]
fn deleting_campaign_cascades_memberships_and_keeps_logs() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();
    let client = make_client("alice", "alice@example.com");
    store.insert_client(&client).unwrap();
    join(&store, &campaign, &client);

    store
        .append_log(&DispatchLog::success(&campaign, Utc::now()))
        .unwrap();

    assert!(store.delete_campaign(&campaign.id).unwrap());
    assert!(store.get_recipients(&campaign.id).unwrap().is_empty());

    // Audit trail survives with the campaign reference nulled
    let logs = store.list_logs(None, 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].campaign_id.is_none());
    assert_eq!(logs[0].error_type, SUCCESS_MARKER);
}

#[test]
fn deleting_client_cascades_memberships() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();
    let client = make_client("alice", "alice@example.com");
    store.insert_client(&client).unwrap();
    join(&store, &campaign, &client);

    assert!(store.delete_client(&client.id).unwrap());
    assert!(store.get_recipients(&campaign.id).unwrap().is_empty());
}

#[test]
fn logs_are_listed_newest_first() {
    let (_dir, store) = setup();

    let campaign = make_campaign("weekly", None);
    store.insert_campaign(&campaign).unwrap();

    let now = Utc::now();
    let old = DispatchLog::failure(&campaign, now - Duration::minutes(5), "smtp", "relay refused");
    let new = DispatchLog::success(&campaign, now);
    store.append_log(&old).unwrap();
    store.append_log(&new).unwrap();

    let logs = store.list_logs(Some(&campaign.id), 10).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].error_type, SUCCESS_MARKER);
    assert_eq!(logs[1].error_type, "smtp");
    assert_eq!(logs[1].error_message, "relay refused");

    let limited = store.list_logs(Some(&campaign.id), 1).unwrap();
    assert_eq!(limited.len(), 1);
    assert!(limited[0].is_success());
}

#[test]
fn clients_and_messages_list_in_name_order() {
    let (_dir, store) = setup();

    store.insert_client(&make_client("bob", "bob@example.com")).unwrap();
    store.insert_client(&make_client("alice", "alice@example.com")).unwrap();
    store.insert_message(&make_message("weekly")).unwrap();
    store.insert_message(&make_message("daily")).unwrap();

    let clients = store.list_clients().unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].name, "alice");
    assert_eq!(clients[1].name, "bob");

    let messages = store.list_messages().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].name, "daily");
    assert_eq!(messages[1].name, "weekly");
}

#[test]
fn get_campaign_missing_returns_none() {
    let (_dir, store) = setup();
    assert!(store.get_campaign("no-such-id").unwrap().is_none());
}
