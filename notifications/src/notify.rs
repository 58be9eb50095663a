use crate::delivery::DeliveryStrategy;
use itertools::Itertools;
use sqlx_sqlite::repository::Repository;
use sqlx_sqlite::{LeadTime, OutageRecord};
use std::collections::BTreeMap;
use std::sync::Arc;

struct GroupMember {
    address: String,
    start_time: String,
    end_time: String,
}

/// Outages of one date, partitioned into insertion-ordered subgroups keyed
/// by `start_time_end_time`.
///
/// Known limitation: when a date carries several distinct time ranges, the
/// rendered header shows only the first range encountered even though every
/// address is listed. Kept on purpose, the channel's readers rely on the
/// established message shape.
#[derive(Default)]
struct DateGroup {
    subgroups: Vec<(String, Vec<GroupMember>)>,
}

impl DateGroup {
    fn push(&mut self, time_range_key: String, member: GroupMember) {
        match self
            .subgroups
            .iter_mut()
            .find(|(key, _)| *key == time_range_key)
        {
            Some((_, members)) => members.push(member),
            None => self.subgroups.push((time_range_key, vec![member])),
        }
    }

    fn flattened(&self) -> impl Iterator<Item = &GroupMember> {
        self.subgroups.iter().flat_map(|(_, members)| members)
    }
}

pub struct Notifier {
    repository: Repository,
    delivery: Arc<dyn DeliveryStrategy>,
    dry_run: bool,
}

impl Notifier {
    pub fn new(repository: Repository, delivery: Arc<dyn DeliveryStrategy>) -> Self {
        Self {
            repository,
            delivery,
            dry_run: false,
        }
    }

    /// Generates messages without marking anything notified, for inspection.
    pub fn dry_run(repository: Repository, delivery: Arc<dyn DeliveryStrategy>) -> Self {
        Self {
            repository,
            delivery,
            dry_run: true,
        }
    }

    /// Groups the due outages by date and time range, marks each one
    /// notified (unless dry-run), renders one message per date and posts
    /// them in order, one at a time. A failed post is logged and the rest
    /// still go out. Returns the rendered messages.
    pub async fn notify(&self, outages: Vec<OutageRecord>, lead_time: LeadTime) -> Vec<String> {
        let mut grouping: BTreeMap<String, DateGroup> = BTreeMap::new();

        for outage in outages {
            let time_range_key = format!("{}_{}", outage.start_time, outage.end_time);
            grouping.entry(outage.date.clone()).or_default().push(
                time_range_key,
                GroupMember {
                    address: outage.address,
                    start_time: outage.start_time,
                    end_time: outage.end_time,
                },
            );

            if !self.dry_run {
                self.repository.mark_notified(outage.id, lead_time).await;
            }
        }

        let messages = grouping
            .iter()
            .filter_map(|(date, group)| format_message(date, group, lead_time))
            .collect_vec();

        for message in &messages {
            if let Err(error) = self.delivery.deliver(message).await {
                tracing::error!(?error, "Failed to post notification to channel");
            }
        }

        messages
    }
}

fn format_message(date: &str, group: &DateGroup, lead_time: LeadTime) -> Option<String> {
    let mut locations = Vec::new();
    let mut start_time: Option<&str> = None;
    let mut end_time: Option<&str> = None;

    for member in group.flattened() {
        // An extra blank line after every 5th address keeps long lists
        // readable.
        let newline = if (locations.len() + 1) % 5 == 0 { "\n" } else { "" };
        locations.push(format!(" 📍  {}{}", member.address, newline));

        start_time.get_or_insert(member.start_time.as_str());
        end_time.get_or_insert(member.end_time.as_str());
    }

    let start_time = start_time?;
    let end_time = end_time?;
    if locations.is_empty() {
        return None;
    }

    let date = date.split('-').rev().join(".");
    let label = match lead_time {
        LeadTime::TwentyFourHours => "⚡ Planirana isključenja struje u sljedeća 24h\n\n",
        LeadTime::OneHour => "🛑 Isključenja struje u sljedećih sat vremena!\n\n",
    };

    Some(format!(
        "{label}🗓️ Datum: {date}\n\n⏱️ Početak: {start_time}h\n🕡️ Kraj: {end_time}h\n\n🏠 Mjesta i naselja ({count}):\n\n{list}\n",
        count = locations.len(),
        list = locations.join("\n"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlx_sqlite::NewOutage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDelivery {
        posted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliveryStrategy for RecordingDelivery {
        async fn deliver(&self, text: &str) -> anyhow::Result<()> {
            self.posted.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct FailingDelivery;

    #[async_trait]
    impl DeliveryStrategy for FailingDelivery {
        async fn deliver(&self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("channel unavailable")
        }
    }

    fn record(id: i64, date: &str, address: &str, start_time: &str, end_time: &str) -> OutageRecord {
        OutageRecord {
            id,
            city: "edtz".to_string(),
            municipality: "srebrenik".to_string(),
            location: "Srebrenik".to_string(),
            address: address.to_string(),
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            notified_24h: false,
            notified_24h_at: None,
            notified_1h: false,
            notified_1h_at: None,
            created_at: None,
        }
    }

    async fn seed(repository: &Repository, outages: &[OutageRecord]) -> Vec<OutageRecord> {
        let batch = outages
            .iter()
            .map(|outage| NewOutage {
                city: outage.city.clone(),
                municipality: outage.municipality.clone(),
                location: outage.location.clone(),
                address: outage.address.clone(),
                date: outage.date.clone(),
                start_time: outage.start_time.clone(),
                end_time: outage.end_time.clone(),
            })
            .collect_vec();
        repository.save_outage_batch(&batch).await;
        sqlx::query_as("SELECT * FROM outages ORDER BY id")
            .fetch_all(repository.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn one_date_one_time_range_yields_one_message_with_every_address() {
        let repository = Repository::new_test_repo().await;
        let delivery = Arc::new(RecordingDelivery::default());
        let notifier = Notifier::new(repository.clone(), delivery.clone());
        let outages = seed(
            &repository,
            &[
                record(0, "2026-03-05", "Špionica", "08:00", "12:00"),
                record(0, "2026-03-05", "Ćehaje", "08:00", "12:00"),
            ],
        )
        .await;

        let messages = notifier.notify(outages, LeadTime::TwentyFourHours).await;

        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Špionica"));
        assert!(messages[0].contains("Ćehaje"));
        assert!(messages[0].contains("(2)"));
        assert!(messages[0].contains("🗓️ Datum: 05.03.2026"));
        assert!(messages[0].contains("⏱️ Početak: 08:00h"));
        assert!(messages[0].contains("🕡️ Kraj: 12:00h"));
        assert_eq!(delivery.posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn distinct_dates_yield_distinct_messages() {
        let repository = Repository::new_test_repo().await;
        let delivery = Arc::new(RecordingDelivery::default());
        let notifier = Notifier::new(repository.clone(), delivery.clone());
        let outages = seed(
            &repository,
            &[
                record(0, "2026-03-05", "Špionica", "08:00", "12:00"),
                record(0, "2026-03-06", "Ćehaje", "09:00", "11:00"),
            ],
        )
        .await;

        let messages = notifier.notify(outages, LeadTime::TwentyFourHours).await;

        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("05.03.2026"));
        assert!(messages[1].contains("06.03.2026"));
    }

    #[tokio::test]
    async fn header_time_comes_from_the_first_subgroup() {
        let repository = Repository::new_test_repo().await;
        let notifier = Notifier::new(
            repository.clone(),
            Arc::new(RecordingDelivery::default()),
        );
        let outages = seed(
            &repository,
            &[
                record(0, "2026-03-05", "Špionica", "08:00", "12:00"),
                record(0, "2026-03-05", "Ćehaje", "13:00", "15:00"),
            ],
        )
        .await;

        let messages = notifier.notify(outages, LeadTime::TwentyFourHours).await;

        // Both addresses are listed, but only the first time range shows.
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Špionica"));
        assert!(messages[0].contains("Ćehaje"));
        assert!(messages[0].contains("⏱️ Početak: 08:00h"));
        assert!(!messages[0].contains("13:00"));
    }

    #[tokio::test]
    async fn a_blank_line_follows_every_fifth_address() {
        let repository = Repository::new_test_repo().await;
        let notifier = Notifier::new(
            repository.clone(),
            Arc::new(RecordingDelivery::default()),
        );
        let records = (1..=6)
            .map(|n| record(0, "2026-03-05", &format!("Naselje {n}"), "08:00", "12:00"))
            .collect_vec();
        let outages = seed(&repository, &records).await;

        let messages = notifier.notify(outages, LeadTime::TwentyFourHours).await;

        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Naselje 5\n\n 📍  Naselje 6"));
    }

    #[tokio::test]
    async fn notifying_marks_each_outage_for_that_lead_time_only() {
        let repository = Repository::new_test_repo().await;
        let notifier = Notifier::new(
            repository.clone(),
            Arc::new(RecordingDelivery::default()),
        );
        let outages = seed(
            &repository,
            &[record(0, "2026-03-05", "Špionica", "08:00", "12:00")],
        )
        .await;

        notifier.notify(outages, LeadTime::TwentyFourHours).await;

        let row: OutageRecord = sqlx::query_as("SELECT * FROM outages")
            .fetch_one(repository.pool())
            .await
            .unwrap();
        assert!(row.notified_24h);
        assert!(row.notified_24h_at.is_some());
        assert!(!row.notified_1h);
    }

    #[tokio::test]
    async fn dry_run_renders_messages_but_marks_nothing() {
        let repository = Repository::new_test_repo().await;
        let notifier = Notifier::dry_run(
            repository.clone(),
            Arc::new(RecordingDelivery::default()),
        );
        let outages = seed(
            &repository,
            &[record(0, "2026-03-05", "Špionica", "08:00", "12:00")],
        )
        .await;

        let messages = notifier.notify(outages, LeadTime::OneHour).await;

        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("🛑 Isključenja struje u sljedećih sat vremena!"));

        let row: OutageRecord = sqlx::query_as("SELECT * FROM outages")
            .fetch_one(repository.pool())
            .await
            .unwrap();
        assert!(!row.notified_1h);
        assert!(row.notified_1h_at.is_none());
    }

    #[tokio::test]
    async fn a_failed_post_does_not_stop_the_cycle() {
        let repository = Repository::new_test_repo().await;
        let notifier = Notifier::new(repository.clone(), Arc::new(FailingDelivery));
        let outages = seed(
            &repository,
            &[
                record(0, "2026-03-05", "Špionica", "08:00", "12:00"),
                record(0, "2026-03-06", "Ćehaje", "09:00", "11:00"),
            ],
        )
        .await;

        let messages = notifier.notify(outages, LeadTime::TwentyFourHours).await;
        assert_eq!(messages.len(), 2);

        let row: OutageRecord = sqlx::query_as("SELECT * FROM outages WHERE address = 'Špionica'")
            .fetch_one(repository.pool())
            .await
            .unwrap();
        assert!(row.notified_24h);
    }
}
