use crate::outages::LeadTime;
use crate::repository::Repository;
use anyhow::Context;

impl Repository {
    /// Flips the lead-time flag for one outage and stamps when it happened.
    /// The update is guarded on the flag still being unset, so a repeat call
    /// changes no row and leaves the original timestamp in place. Returns
    /// whether a row was actually changed; errors degrade to `false`.
    pub async fn mark_notified(&self, id: i64, lead_time: LeadTime) -> bool {
        match self.try_mark_notified(id, lead_time).await {
            Ok(changed) => {
                tracing::info!(id, hours = lead_time.hours(), changed, "Outage marked as notified");
                changed
            }
            Err(error) => {
                tracing::error!(id, hours = lead_time.hours(), ?error, "Error marking outage as notified");
                false
            }
        }
    }

    async fn try_mark_notified(&self, id: i64, lead_time: LeadTime) -> anyhow::Result<bool> {
        let sql = format!(
            "UPDATE outages
            SET {flag} = 1, {stamp} = datetime('now', 'localtime')
            WHERE id = ? AND {flag} = 0",
            flag = lead_time.flag_column(),
            stamp = lead_time.stamp_column()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.pool())
            .await
            .context("Failed to update notification flag")?;

        Ok(result.rows_affected() > 0)
    }
}
