use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Day-of-week restriction for a campaign, ISO numbered (1 = Monday .. 7 = Sunday).
///
/// # Examples
///
/// ```
/// use mailcast_common::types::WeekDay;
///
/// let day: WeekDay = "wednesday".parse().unwrap();
/// assert_eq!(day, WeekDay::Wednesday);
/// assert_eq!(day.iso_number(), 3);
/// assert_eq!(day.to_string(), "wednesday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    /// ISO weekday number, 1 = Monday .. 7 = Sunday.
    pub fn iso_number(self) -> u8 {
        match self {
            WeekDay::Monday => 1,
            WeekDay::Tuesday => 2,
            WeekDay::Wednesday => 3,
            WeekDay::Thursday => 4,
            WeekDay::Friday => 5,
            WeekDay::Saturday => 6,
            WeekDay::Sunday => 7,
        }
    }

    pub fn from_iso_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WeekDay::Monday),
            2 => Some(WeekDay::Tuesday),
            3 => Some(WeekDay::Wednesday),
            4 => Some(WeekDay::Thursday),
            5 => Some(WeekDay::Friday),
            6 => Some(WeekDay::Saturday),
            7 => Some(WeekDay::Sunday),
            _ => None,
        }
    }
}

impl From<chrono::Weekday> for WeekDay {
    fn from(day: chrono::Weekday) -> Self {
        // number_from_monday is 1..=7, always valid
        WeekDay::from_iso_number(day.number_from_monday() as u8).unwrap()
    }
}

impl std::fmt::Display for WeekDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WeekDay::Monday => "monday",
            WeekDay::Tuesday => "tuesday",
            WeekDay::Wednesday => "wednesday",
            WeekDay::Thursday => "thursday",
            WeekDay::Friday => "friday",
            WeekDay::Saturday => "saturday",
            WeekDay::Sunday => "sunday",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for WeekDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monday" | "1" => Ok(WeekDay::Monday),
            "tuesday" | "2" => Ok(WeekDay::Tuesday),
            "wednesday" | "3" => Ok(WeekDay::Wednesday),
            "thursday" | "4" => Ok(WeekDay::Thursday),
            "friday" | "5" => Ok(WeekDay::Friday),
            "saturday" | "6" => Ok(WeekDay::Saturday),
            "sunday" | "7" => Ok(WeekDay::Sunday),
            _ => Err(format!("unknown week day: {s}")),
        }
    }
}

/// A mailing campaign: a recurring time-of-day window, an optional
/// day-of-week restriction, and a reference to the message to deliver.
///
/// `sent` is the per-window idempotency flag managed by the dispatch
/// engine; everything else is owned by the record-management layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub time_from: NaiveTime,
    pub time_to: NaiveTime,
    /// Unset means the campaign may fire every day.
    pub week_day: Option<WeekDay>,
    pub description: Option<String>,
    /// Cleared when the referenced message template is deleted.
    pub message_id: Option<String>,
    pub sent: bool,
    pub is_active: bool,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A mail recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Stored for the record-management layer; recipient resolution does
    /// not consult it.
    pub is_active: bool,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An email template referenced by campaigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    /// Used as the email subject; empty subject when unset.
    pub subject: Option<String>,
    pub body: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join row between a campaign and a client. Unique per (campaign, client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub campaign_id: String,
    pub client_id: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Marker written to both log fields for a successful dispatch.
pub const SUCCESS_MARKER: &str = "success";

/// One append-only audit row per dispatch attempt.
///
/// `error_type` holds [`SUCCESS_MARKER`] or the transport error kind;
/// `error_message` holds the marker or the error's display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLog {
    pub id: String,
    /// NULL once the originating campaign has been deleted.
    pub campaign_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub error_type: String,
    pub error_message: String,
    pub owner: Option<String>,
}

impl DispatchLog {
    /// Log row for a successful dispatch.
    pub fn success(campaign: &Campaign, now: DateTime<Utc>) -> Self {
        Self {
            id: crate::id::next_id(),
            campaign_id: Some(campaign.id.clone()),
            timestamp: now,
            error_type: SUCCESS_MARKER.to_string(),
            error_message: SUCCESS_MARKER.to_string(),
            owner: campaign.owner.clone(),
        }
    }

    /// Log row for a failed dispatch attempt.
    pub fn failure(campaign: &Campaign, now: DateTime<Utc>, kind: &str, message: &str) -> Self {
        Self {
            id: crate::id::next_id(),
            campaign_id: Some(campaign.id.clone()),
            timestamp: now,
            error_type: kind.to_string(),
            error_message: message.to_string(),
            owner: campaign.owner.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_type == SUCCESS_MARKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_day_parses_names_and_numbers() {
        assert_eq!("monday".parse::<WeekDay>().unwrap(), WeekDay::Monday);
        assert_eq!("Sunday".parse::<WeekDay>().unwrap(), WeekDay::Sunday);
        assert_eq!("3".parse::<WeekDay>().unwrap(), WeekDay::Wednesday);
        assert!("someday".parse::<WeekDay>().is_err());
    }

    #[test]
    fn week_day_iso_round_trip() {
        for n in 1..=7 {
            let day = WeekDay::from_iso_number(n).unwrap();
            assert_eq!(day.iso_number(), n);
        }
        assert!(WeekDay::from_iso_number(0).is_none());
        assert!(WeekDay::from_iso_number(8).is_none());
    }

    #[test]
    fn week_day_from_chrono() {
        assert_eq!(WeekDay::from(chrono::Weekday::Mon), WeekDay::Monday);
        assert_eq!(WeekDay::from(chrono::Weekday::Sun), WeekDay::Sunday);
    }

    #[test]
    fn success_log_carries_marker_in_both_fields() {
        let campaign = Campaign {
            id: "c1".into(),
            name: "weekly".into(),
            time_from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            time_to: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            week_day: None,
            description: None,
            message_id: None,
            sent: false,
            is_active: true,
            owner: Some("user-1".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let log = DispatchLog::success(&campaign, Utc::now());
        assert!(log.is_success());
        assert_eq!(log.error_type, SUCCESS_MARKER);
        assert_eq!(log.error_message, SUCCESS_MARKER);
        assert_eq!(log.campaign_id.as_deref(), Some("c1"));
        assert_eq!(log.owner.as_deref(), Some("user-1"));
    }
}
