//! Configuration loading and representation.
//!
//! Sources, lowest precedence first: an optional `invoiceme.{toml,yaml,json}`
//! file, then `INVOICEME__*` environment variables (`__` separates nesting,
//! e.g. `INVOICEME__LEDGER__INVOICE_NUMBER_PREFIX`). A `.env` file is loaded
//! into the environment first when present.

use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, File};
use serde::Deserialize;
use thiserror::Error;

use invoiceme_invoicing::invoice_number::DEFAULT_INVOICE_NUMBER_PREFIX;
use invoiceme_observability::LogConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InvoicemeConfig {
    pub ledger: LedgerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// First segment of generated invoice numbers.
    pub invoice_number_prefix: String,
    /// How many generated numbers to try before giving up with a conflict.
    pub invoice_number_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            invoice_number_prefix: DEFAULT_INVOICE_NUMBER_PREFIX.to_string(),
            invoice_number_attempts: 5,
        }
    }
}

impl InvoicemeConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("invoiceme")
    }

    /// Like [`InvoicemeConfig::load`] with a different base file name.
    pub fn load_from(file_name: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = Cfg::builder()
            .add_source(File::with_name(file_name).required(false))
            .add_source(config::Environment::with_prefix("INVOICEME").separator("__"));

        Self::from_builder(builder)
    }

    /// Load configuration and install the tracing subscriber it describes.
    pub fn load_and_init_logging() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        invoiceme_observability::init(&config.log);
        tracing::info!(
            invoice_number_prefix = %config.ledger.invoice_number_prefix,
            "configuration loaded"
        );
        Ok(config)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.invoice_number_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ledger.invoice_number_prefix cannot be empty".to_string(),
            ));
        }
        if self.ledger.invoice_number_attempts == 0 {
            return Err(ConfigError::Invalid(
                "ledger.invoice_number_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
