//! Application configuration loaded from TOML.
//!
//! Every section and key is optional; missing values take the defaults shown
//! below.
//!
//! ```toml
//! [fees]
//! base = 1290          # cents
//! share = "0.02"       # fraction of the task subtotal
//!
//! [currency]
//! decimal_separator = ","
//! suffix = "Euro"
//!
//! [[shipping_services]]
//! id = "dhl-paket-digital"
//! name = "DHL Paket (insured), digital postage: from 5,94 €"
//! min_cost = 594
//!
//! [logging]
//! level = "info"
//! file = "order-form.log"   # relative to the config file
//! console = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use order_core::calculations::{FeeSchedule, TotalsCalculator, TotalsError};
use order_core::{CurrencyFormat, ShippingCatalog};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid fee schedule: {0}")]
    Fees(#[from] TotalsError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or full filter directive. `RUST_LOG` takes precedence.
    pub level: String,
    /// Append log records to this file.
    pub file: Option<PathBuf>,
    /// Write log records to stderr.
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fees: FeeSchedule,
    pub currency: CurrencyFormat,
    pub shipping_services: ShippingCatalog,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parses and validates a configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.fees.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `path`.
    ///
    /// A relative log file path is resolved against the config file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;

        if let (Some(file), Some(dir)) = (&config.logging.file, path.parent()) {
            if file.is_relative() {
                config.logging.file = Some(dir.join(file));
            }
        }

        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given and present, the defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                info!("config {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("no config given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn calculator(&self) -> Result<TotalsCalculator, ConfigError> {
        Ok(TotalsCalculator::new(self.fees.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use order_core::{Cents, ShippingService};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.fees.base, Cents(1290));
        assert_eq!(config.fees.share, dec!(0.02));
        assert_eq!(config.shipping_services.services().len(), 4);
        assert!(config.logging.console);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [fees]
            share = "0.03"

            [currency]
            suffix = "EUR"
            "#,
        )
        .unwrap();

        assert_eq!(config.fees.share, dec!(0.03));
        assert_eq!(config.fees.base, Cents(1290));
        assert_eq!(config.currency.suffix, "EUR");
        assert_eq!(config.currency.decimal_separator, ',');
    }

    #[test]
    fn shipping_services_replace_the_catalog() {
        let config = AppConfig::from_toml_str(
            r#"
            [[shipping_services]]
            id = "courier"
            name = "Courier"
            min_cost = 1500
            "#,
        )
        .unwrap();

        assert_eq!(
            config.shipping_services.services(),
            &[ShippingService::new("courier", "Courier", Cents(1500))]
        );
    }

    #[test]
    fn invalid_fee_share_is_rejected() {
        let err = AppConfig::from_toml_str("[fees]\nshare = \"1.5\"\n").unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Fees(TotalsError::InvalidFeeShare(_))
        ));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = AppConfig::from_toml_str("[fees\nbase = ").unwrap_err();

        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            AppConfig::load_or_default(Some(Path::new("/nonexistent/order-form.toml"))).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn calculator_uses_configured_fees() {
        let config = AppConfig::from_toml_str("[fees]\nbase = 0\nshare = \"0.1\"\n").unwrap();

        let calculator = config.calculator().unwrap();

        assert_eq!(calculator.schedule().fee(Cents(1000)).unwrap(), Cents(100));
    }
}
