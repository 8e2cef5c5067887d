//! Shared domain types for the mailing dispatcher.
//!
//! Campaigns, clients, message templates and dispatch logs are plain data
//! carried between the storage layer, the dispatch engine and the daemon.

pub mod id;
pub mod types;
