use async_trait::async_trait;
use notifications::delivery::DeliveryStrategy;
use notifications::notify::Notifier;
use scheduled_outages::configuration::Settings;
use sqlx_sqlite::repository::Repository;
use sqlx_sqlite::LeadTime;
use std::sync::Arc;

struct ConsoleDelivery;

#[async_trait]
impl DeliveryStrategy for ConsoleDelivery {
    async fn deliver(&self, text: &str) -> anyhow::Result<()> {
        println!("{text}\n---");
        Ok(())
    }
}

/// Renders what the notifier would send right now without marking anything
/// notified or touching the channel.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared_kernel::tracing::config_telemetry();

    let outage_settings = Settings::parse()?.outages;
    let repository = Repository::new().await?;
    let notifier = Notifier::dry_run(repository.clone(), Arc::new(ConsoleDelivery));

    let timezone = outage_settings.timezone;
    let targets = &outage_settings.locations_of_interest;

    let due_24h = repository
        .outages_within_timeframe(LeadTime::TwentyFourHours, 1, timezone, targets)
        .await;
    let due_1h = repository
        .outages_within_timeframe(LeadTime::OneHour, 0, timezone, targets)
        .await;

    let messages_24h = notifier.notify(due_24h, LeadTime::TwentyFourHours).await;
    let messages_1h = notifier.notify(due_1h, LeadTime::OneHour).await;
    println!(
        "{} message(s) for the 24h window, {} for the 1h window",
        messages_24h.len(),
        messages_1h.len()
    );

    Ok(())
}
