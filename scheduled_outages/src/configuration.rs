use chrono_tz::Tz;
use serde::Deserialize;
use shared_kernel::configuration::config;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub outages: OutageSourceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutageSourceSettings {
    /// Page carrying the planned-outage table.
    pub remote_url: String,
    /// `data-ed` code of the distribution area, e.g. "edtz".
    pub target_city: String,
    /// `data-opcina` code, e.g. "srebrenik".
    pub target_municipality: String,
    /// Addresses worth alerting on, matched exactly (case-insensitive).
    pub locations_of_interest: Vec<String>,
    /// Timezone the schedule's wall-clock times are published in.
    pub timezone: Tz,
    /// Side file accumulating every address ever seen per municipality.
    pub cache_file: PathBuf,
}

impl Settings {
    pub fn parse() -> anyhow::Result<Self> {
        config::<Settings>()
    }
}
