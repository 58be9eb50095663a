pub mod extractor;

use crate::configuration::OutageSourceSettings;
use crate::location_cache::LocationCache;
use anyhow::Context;
use async_trait::async_trait;
use extractor::{extract_outages, OutageMatch};
use shared_kernel::http_client::HttpClient;
use sqlx_sqlite::repository::Repository;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<String>;
}

// The schedule page serves an error page to clients without a browser
// user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

pub struct HttpPageFetcher;

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> anyhow::Result<String> {
        tracing::info!(%url, "Fetching outage schedule page");
        let headers = HashMap::from([("User-Agent", USER_AGENT.to_string())]);
        let html = HttpClient::get_text(url.clone(), headers).await?;
        tracing::debug!(length = html.len(), "Fetched HTML");
        Ok(html)
    }
}

pub struct OutageImporter {
    repository: Repository,
    fetcher: Arc<dyn PageFetcher>,
    settings: OutageSourceSettings,
}

impl OutageImporter {
    pub fn new(
        repository: Repository,
        fetcher: Arc<dyn PageFetcher>,
        settings: OutageSourceSettings,
    ) -> Self {
        Self {
            repository,
            fetcher,
            settings,
        }
    }

    /// One ingestion cycle: fetch the page, extract the rows for the
    /// configured city and municipality, update the location cache file and
    /// persist the full batch. Returns the rows whose address matched a
    /// location of interest.
    pub async fn run(&self) -> anyhow::Result<Vec<OutageMatch>> {
        self.repository.init_database_schema().await?;

        let url = Url::parse(&self.settings.remote_url).context("Invalid remote URL")?;
        let html = self.fetcher.fetch(&url).await?;

        let table = extract_outages(
            &html,
            &self.settings.target_city,
            &self.settings.target_municipality,
            &self.settings.locations_of_interest,
        );
        if table.skipped_rows > 0 {
            tracing::debug!(skipped = table.skipped_rows, "Rows with missing cells were skipped");
        }

        let mut cache = LocationCache::load(&self.settings.cache_file).await;
        for outage in &table.outages {
            cache.append(&outage.city, &outage.municipality, &outage.address);
        }
        cache.persist(&self.settings.cache_file).await?;

        if !table.outages.is_empty() {
            self.repository.save_outage_batch(&table.outages).await;
        }

        Ok(table.matches)
    }
}
