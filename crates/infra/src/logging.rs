use crate::config::AppConfig;
use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

// Used when the configured filter fails to parse; keeps the service at
// info while quieting the chattier transport crates.
const FALLBACK_FILTER: &str = "info,surrealdb=warn,tungstenite=warn";

pub fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
