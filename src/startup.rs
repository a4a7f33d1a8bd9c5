use crate::components::expiry_register::{register_from_config, ProductRecord};
use crate::config::Config;
use crate::error::Error;
use crate::utils::i18n::set_locale;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config and apply its locale
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            set_locale(&config.locale);
            info!("Setting locale to {}", config.locale);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Store a record and schedule its reminder, returning the message to show
pub async fn submit_record(config: &Config, record: ProductRecord) -> miette::Result<String> {
    let register = register_from_config(config)?;
    let outcome = register.submit(&record).await?;
    Ok(outcome.message())
}

/// Render the records stored in the worksheet
pub async fn list_records(config: &Config) -> miette::Result<String> {
    let register = register_from_config(config)?;
    let records = register.list().await?;

    if records.is_empty() {
        return Ok(t!("list_empty").to_string());
    }

    let lines: Vec<String> = records.iter().map(|record| record.to_string()).collect();
    Ok(lines.join("\n"))
}
