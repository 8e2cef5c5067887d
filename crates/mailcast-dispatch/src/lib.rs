//! The mailing scheduler core: due-window evaluation, the per-window
//! `sent` state machine, and the per-tick dispatch pass.
//!
//! A campaign cycles between two states across scheduler ticks:
//! `idle` (`sent = false`) and `armed` (`sent = true`). A due campaign in
//! `idle` is dispatched once and armed; an armed campaign stays quiet for
//! the rest of its window; leaving the window resets it to `idle` for the
//! next occurrence. Every dispatch attempt, success or failure, appends
//! exactly one audit log row.

pub mod cache;
pub mod engine;
pub mod scheduler;
pub mod window;


pub use cache::CampaignCache;
pub use engine::{DispatchEngine, TickAction};
pub use scheduler::{MailingScheduler, TickSummary};
pub use window::DispatchWindow;
