use scheduled_outages::configuration::Settings;
use scheduled_outages::web_page_reader::{HttpPageFetcher, OutageImporter};
use sqlx_sqlite::repository::Repository;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared_kernel::tracing::config_telemetry();

    // Missing configuration is the only fatal condition.
    let settings = Settings::parse()?;
    let repository = Repository::new().await?;

    let importer = OutageImporter::new(repository, Arc::new(HttpPageFetcher), settings.outages);
    match importer.run().await {
        Ok(matches) => {
            tracing::info!(matches = matches.len(), "Import cycle finished");
        }
        Err(error) => {
            tracing::error!(?error, "Failed to fetch outage data from remote");
        }
    }

    Ok(())
}
