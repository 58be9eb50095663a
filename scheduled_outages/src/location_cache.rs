use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Every (city, municipality, address) triple ever observed, persisted as a
/// nested JSON mapping. Purely an observational artifact, nothing reads it
/// back for decisions, so a missing or corrupt file simply starts empty.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCache(BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl LocationCache {
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn append(&mut self, city: &str, municipality: &str, address: &str) {
        let addresses = self
            .0
            .entry(city.to_string())
            .or_default()
            .entry(municipality.to_string())
            .or_default();
        if !addresses.iter().any(|known| known == address) {
            addresses.push(address.to_string());
        }
    }

    pub fn addresses(&self, city: &str, municipality: &str) -> Option<&[String]> {
        self.0
            .get(city)
            .and_then(|municipalities| municipalities.get(municipality))
            .map(|addresses| addresses.as_slice())
    }

    /// Rewrites the whole file.
    pub async fn persist(&self, path: &Path) -> anyhow::Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize location cache")?;
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write location cache to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_deduplicates_by_exact_string() {
        let mut cache = LocationCache::default();
        cache.append("edtz", "srebrenik", "Špionica");
        cache.append("edtz", "srebrenik", "Špionica");
        cache.append("edtz", "srebrenik", "Ćehaje");

        assert_eq!(
            cache.addresses("edtz", "srebrenik"),
            Some(&["Špionica".to_string(), "Ćehaje".to_string()][..])
        );
    }

    #[tokio::test]
    async fn cache_round_trips_through_its_file() {
        let path = std::env::temp_dir().join(format!(
            "location-cache-{}-{:?}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let mut cache = LocationCache::default();
        cache.append("edtz", "srebrenik", "Špionica");
        cache.persist(&path).await.unwrap();

        let reloaded = LocationCache::load(&path).await;
        assert_eq!(reloaded, cache);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let cache = LocationCache::load(Path::new("/nonexistent/cache.json")).await;
        assert_eq!(cache, LocationCache::default());
    }
}
