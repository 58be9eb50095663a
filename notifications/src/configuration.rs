use secrecy::Secret;
use serde::Deserialize;
use shared_kernel::configuration::config;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub viber: ViberSettings,
}

#[derive(Debug, Deserialize)]
pub struct ViberSettings {
    pub channel_token: Secret<String>,
    /// Channel superadmin the posts are sent as.
    pub superadmin_user_id: String,
}

impl Settings {
    pub fn parse() -> anyhow::Result<Self> {
        config::<Settings>()
    }
}
