use crate::domain::dashboard::DEFAULT_WINDOW;
use chrono_tz::Tz;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub firestore: FirestoreSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Firestore,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: Option<String>,
    pub database: String,
    /// Fixed bearer token; overrides the metadata server (emulator, local dev)
    pub access_token: Option<String>,
    /// Metadata server token endpoint; empty disables authentication
    pub metadata_token_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    pub timezone: Tz,
    pub window: usize,
}

const ENV_PREFIX: &str = "DASHBOARD";

pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Load `config/dashboard.*` (optional) with `DASHBOARD__SECTION__KEY` overrides
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    build_config(config::File::with_name("config/dashboard").required(false))
}

fn build_config<S>(file: S) -> anyhow::Result<DashboardConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("store.backend", "firestore")?
        .set_default("store.collection", "temperatures")?
        .set_default("firestore.base_url", "https://firestore.googleapis.com/v1")?
        .set_default("firestore.database", "(default)")?
        .set_default("firestore.metadata_token_url", DEFAULT_METADATA_TOKEN_URL)?
        .set_default("firestore.timeout_secs", 10)?
        .set_default("display.timezone", "Asia/Seoul")?
        .set_default("display.window", DEFAULT_WINDOW as i64)?
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
