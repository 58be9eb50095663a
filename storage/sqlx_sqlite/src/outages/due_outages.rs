use crate::outages::{LeadTime, OutageRecord};
use crate::repository::Repository;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use itertools::Itertools;
use shared_kernel::date_time::local_offset::local_wall_clock;

impl Repository {
    /// Stored outages whose local start datetime lies in
    /// `(now + min_hours, now + lead_time.hours()]` and whose lead-time flag
    /// is still unset, optionally restricted to an address allowlist
    /// (matched case-insensitively). Ordered by date, then start time.
    ///
    /// Database errors degrade to an empty list; "nothing due right now" is
    /// the contract either way.
    pub async fn outages_within_timeframe(
        &self,
        lead_time: LeadTime,
        min_hours: i64,
        timezone: Tz,
        target_locations: &[String],
    ) -> Vec<OutageRecord> {
        self.outages_within_timeframe_at(Utc::now(), lead_time, min_hours, timezone, target_locations)
            .await
    }

    pub async fn outages_within_timeframe_at(
        &self,
        now: DateTime<Utc>,
        lead_time: LeadTime,
        min_hours: i64,
        timezone: Tz,
        target_locations: &[String],
    ) -> Vec<OutageRecord> {
        match self
            .try_outages_within_timeframe(now, lead_time, min_hours, timezone, target_locations)
            .await
        {
            Ok(outages) => {
                tracing::debug!(
                    hours = lead_time.hours(),
                    count = outages.len(),
                    filtered = !target_locations.is_empty(),
                    "Queried outages within timeframe"
                );
                outages
            }
            Err(error) => {
                tracing::error!(hours = lead_time.hours(), ?error, "Error getting outages within timeframe");
                Vec::new()
            }
        }
    }

    async fn try_outages_within_timeframe(
        &self,
        now: DateTime<Utc>,
        lead_time: LeadTime,
        min_hours: i64,
        timezone: Tz,
        target_locations: &[String],
    ) -> anyhow::Result<Vec<OutageRecord>> {
        // The table stores wall-clock text, so both window bounds are moved
        // into the timezone's current offset before comparing.
        let local_now = local_wall_clock(timezone, now);
        let upper_bound = local_now + Duration::hours(lead_time.hours());
        let lower_bound = local_now + Duration::hours(min_hours);

        let mut sql = format!(
            "SELECT * FROM outages
            WHERE {flag} = 0
            AND datetime(date || ' ' || start_time) <= datetime(?)
            AND datetime(date || ' ' || start_time) > datetime(?)",
            flag = lead_time.flag_column()
        );
        if !target_locations.is_empty() {
            let placeholders = target_locations.iter().map(|_| "?").join(", ");
            sql.push_str(&format!(" AND LOWER(address) IN ({placeholders})"));
        }
        sql.push_str(" ORDER BY date, start_time");

        let format = "%Y-%m-%d %H:%M:%S";
        let mut query = sqlx::query_as::<_, OutageRecord>(&sql)
            .bind(upper_bound.format(format).to_string())
            .bind(lower_bound.format(format).to_string());
        for location in target_locations {
            query = query.bind(location.to_lowercase());
        }

        query
            .fetch_all(self.pool())
            .await
            .context("Failed to query outages within timeframe")
    }
}
