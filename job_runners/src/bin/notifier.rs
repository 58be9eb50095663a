use notifications::configuration::Settings as NotificationSettings;
use notifications::notify::Notifier;
use notifications::viber::ViberChannelStrategy;
use scheduled_outages::configuration::Settings;
use sqlx_sqlite::repository::Repository;
use sqlx_sqlite::LeadTime;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shared_kernel::tracing::config_telemetry();

    let outage_settings = Settings::parse()?.outages;
    let viber_settings = NotificationSettings::parse()?.viber;
    let repository = Repository::new().await?;

    let delivery = Arc::new(ViberChannelStrategy::new(viber_settings));
    let notifier = Notifier::new(repository.clone(), delivery);

    let timezone = outage_settings.timezone;
    let targets = &outage_settings.locations_of_interest;

    let due_24h = repository
        .outages_within_timeframe(LeadTime::TwentyFourHours, 1, timezone, targets)
        .await;
    let due_1h = repository
        .outages_within_timeframe(LeadTime::OneHour, 0, timezone, targets)
        .await;

    notifier.notify(due_24h, LeadTime::TwentyFourHours).await;
    notifier.notify(due_1h, LeadTime::OneHour).await;

    Ok(())
}
