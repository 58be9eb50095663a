mod due_outages;
mod mark_notified;
mod save_outage_batch;

use chrono::NaiveDateTime;

/// A parsed outage row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutage {
    pub city: String,
    pub municipality: String,
    pub location: String,
    pub address: String,
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutageRecord {
    pub id: i64,
    pub city: String,
    pub municipality: String,
    pub location: String,
    pub address: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notified_24h: bool,
    pub notified_24h_at: Option<NaiveDateTime>,
    pub notified_1h: bool,
    pub notified_1h_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

/// Which notification window an operation refers to. Each lead time has its
/// own flag and timestamp pair on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadTime {
    TwentyFourHours,
    OneHour,
}

impl LeadTime {
    pub fn hours(self) -> i64 {
        match self {
            LeadTime::TwentyFourHours => 24,
            LeadTime::OneHour => 1,
        }
    }

    pub(crate) fn flag_column(self) -> &'static str {
        match self {
            LeadTime::TwentyFourHours => "notified_24h",
            LeadTime::OneHour => "notified_1h",
        }
    }

    pub(crate) fn stamp_column(self) -> &'static str {
        match self {
            LeadTime::TwentyFourHours => "notified_24h_at",
            LeadTime::OneHour => "notified_1h_at",
        }
    }
}
