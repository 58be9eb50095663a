use crate::outages::NewOutage;
use crate::repository::Repository;
use anyhow::Context;

impl Repository {
    /// Inserts every outage in the batch that is not already present, in a
    /// single transaction. Duplicates (same city, municipality, address,
    /// date and start time) are ignored per row. Returns the number of rows
    /// actually inserted; a failed transaction is logged and reported as 0.
    pub async fn save_outage_batch(&self, outages: &[NewOutage]) -> u64 {
        match self.try_save_outage_batch(outages).await {
            Ok(inserted) => {
                tracing::info!(
                    total = outages.len(),
                    inserted,
                    "Outages saved to database"
                );
                inserted
            }
            Err(error) => {
                tracing::error!(?error, "Error saving outages in transaction");
                0
            }
        }
    }

    async fn try_save_outage_batch(&self, outages: &[NewOutage]) -> anyhow::Result<u64> {
        let mut transaction = self
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut inserted = 0;
        for outage in outages {
            let result = sqlx::query(
                "
                INSERT INTO outages (city, municipality, location, address, date, start_time, end_time)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(city, municipality, address, date, start_time) DO NOTHING
                ",
            )
            .bind(&outage.city)
            .bind(&outage.municipality)
            .bind(&outage.location)
            .bind(&outage.address)
            .bind(&outage.date)
            .bind(&outage.start_time)
            .bind(&outage.end_time)
            .execute(&mut *transaction)
            .await
            .context("Failed to insert outage")?;

            inserted += result.rows_affected();
        }

        transaction
            .commit()
            .await
            .context("Failed to commit transaction")?;

        Ok(inserted)
    }
}
