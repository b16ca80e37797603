use merx_core::pii::Masked;
use serde::Deserialize;
use std::env;

/// Currency code sent with every settlement charge. Multi-currency
/// settlement is out of scope; the shop settles in euros.
pub const SETTLEMENT_CURRENCY: &str = "eur";

/// Settlement configuration, passed explicitly to the shipping-event
/// handler's constructor rather than read from global settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SettlementConfig {
    /// Secret API key for the Stripe account charges are settled into.
    pub stripe_api_key: Masked<String>,
}

impl SettlementConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that stays out of git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of MERX)
            // Eg. `MERX__STRIPE_API_KEY=sk_live_x` would set `stripe_api_key`
            .add_source(config::Environment::with_prefix("MERX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_from_file_source() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "stripe_api_key = \"sk_test_abc\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: SettlementConfig = cfg.try_deserialize().unwrap();
        assert_eq!(settings.stripe_api_key.expose(), "sk_test_abc");
    }

    #[test]
    fn test_debug_never_prints_the_key() {
        let settings = SettlementConfig {
            stripe_api_key: Masked::new("sk_test_abc".to_string()),
        };
        assert!(!format!("{:?}", settings).contains("sk_test_abc"));
    }
}
