use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CURRENCY: &str = "USD";
const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "STOREFRONT";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string())
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_free_shipping_threshold() -> Decimal {
    dec!(50)
}

fn default_flat_shipping_rate() -> Decimal {
    dec!(4.99)
}

fn default_tax_rate_percent() -> Decimal {
    dec!(8)
}

fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Value must not be negative".into());
        Err(err)
    }
}

fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= dec!(100) {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Rate must be between 0 and 100 percent".into());
        Err(err)
    }
}

/// Store-level pricing rules, pure inputs to the cost calculator.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be a 3-letter ISO code"))]
    pub currency: String,

    /// Orders at or above this subtotal ship free (standard).
    #[serde(default = "default_free_shipping_threshold")]
    #[validate(custom = "validate_non_negative_decimal")]
    pub free_shipping_threshold: Decimal,

    /// Flat rate for standard shipping below the threshold.
    #[serde(default = "default_flat_shipping_rate")]
    #[validate(custom = "validate_non_negative_decimal")]
    pub flat_shipping_rate: Decimal,

    /// Sales tax, as a percentage of the subtotal.
    #[serde(default = "default_tax_rate_percent")]
    #[validate(custom = "validate_percent")]
    pub tax_rate_percent: Decimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            free_shipping_threshold: default_free_shipping_threshold(),
            flat_shipping_rate: default_flat_shipping_rate(),
            tax_rate_percent: default_tax_rate_percent(),
        }
    }
}

/// Backend order API connection settings.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrderApiConfig {
    #[validate(url(message = "order_api.base_url must be a valid URL"))]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token for authenticated requests. Auth itself is an external
    /// collaborator; the token is the capability it hands us.
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Payment gateway connection settings.
///
/// A missing or blank `publishable_key` means the gateway is not configured;
/// the composition root then selects the simulated gateway instead of the
/// hosted one.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[validate(url(message = "gateway.base_url must be a valid URL"))]
    pub base_url: String,

    #[serde(default)]
    pub publishable_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// The key, if one is actually usable (present and non-blank).
    pub fn usable_key(&self) -> Option<&str> {
        self.publishable_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    #[validate]
    pub store: StoreSettings,

    #[validate]
    pub order_api: OrderApiConfig,

    #[validate]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Loads configuration from layered sources: `config/default.toml`, an
/// environment-specific file, `config/local.toml`, then `STOREFRONT__*`
/// environment variables. All files are optional.
pub fn load_config() -> Result<AppConfig, ConfigLoadError> {
    let run_env = default_environment();

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(File::with_name(&format!("{}/local", CONFIG_DIR)).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    info!(
        environment = %app_config.environment,
        gateway_configured = app_config.gateway.usable_key().is_some(),
        "configuration loaded"
    );
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            store: StoreSettings::default(),
            order_api: OrderApiConfig {
                base_url: "http://localhost:8080/api/v1".to_string(),
                timeout_secs: 5,
                auth_token: None,
            },
            gateway: GatewayConfig {
                base_url: "https://gateway.example.com".to_string(),
                publishable_key: Some("pk_test_123".to_string()),
                timeout_secs: 5,
            },
        }
    }

    #[test]
    fn default_store_settings_match_storefront_pricing() {
        let store = StoreSettings::default();
        assert_eq!(store.free_shipping_threshold, dec!(50));
        assert_eq!(store.flat_shipping_rate, dec!(4.99));
        assert_eq!(store.tax_rate_percent, dec!(8));
        assert_eq!(store.currency, "USD");
    }

    #[test]
    fn blank_publishable_key_is_not_usable() {
        let mut config = base_config();
        assert!(config.gateway.usable_key().is_some());

        config.gateway.publishable_key = Some("   ".to_string());
        assert!(config.gateway.usable_key().is_none());

        config.gateway.publishable_key = None;
        assert!(config.gateway.usable_key().is_none());
    }

    #[test]
    fn negative_rates_fail_validation() {
        let mut config = base_config();
        config.store.flat_shipping_rate = dec!(-1);
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.store.tax_rate_percent = dec!(101);
        assert!(config.validate().is_err());
    }
}
