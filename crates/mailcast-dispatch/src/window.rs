use chrono::{DateTime, Datelike, NaiveTime, Utc};
use mailcast_common::types::{Campaign, WeekDay};

/// The recurring due window of a campaign: a daily time-of-day span,
/// optionally restricted to one ISO weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchWindow {
    pub time_from: NaiveTime,
    pub time_to: NaiveTime,
    pub week_day: Option<WeekDay>,
}

impl DispatchWindow {
    pub fn for_campaign(campaign: &Campaign) -> Self {
        Self {
            time_from: campaign.time_from,
            time_to: campaign.time_to,
            week_day: campaign.week_day,
        }
    }

    /// Whether `now` falls inside the window. Both boundaries are inclusive.
    ///
    /// An inverted span (`time_from > time_to`) never matches: wraparound
    /// across midnight is not supported, so e.g. 23:00-01:00 is permanently
    /// not due rather than an overnight window.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let time = now.time();
        if time < self.time_from || time > self.time_to {
            return false;
        }
        match self.week_day {
            None => true,
            Some(day) => day == WeekDay::from(now.weekday()),
        }
    }
}
