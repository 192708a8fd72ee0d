use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scrub: ScrubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Tunables for normalization and bulk lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Country code stripped during normalization
    pub country_code: String,
    /// National significant-number length the normalizer aligns to
    pub national_number_length: usize,
    /// Reference sets smaller than this are fetched whole instead of
    /// queried in batches
    pub full_fetch_threshold: u64,
    /// Keys per membership batch on the chunked path
    pub lookup_batch_size: usize,
    /// Service the subscription stage checks when the caller names none
    pub default_service_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./msisdn-scrub.db".to_string(),
                max_connections: Some(10),
            },
            scrub: ScrubConfig::default(),
        }
    }
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            country_code: "234".to_string(),
            national_number_length: 10,
            full_fetch_threshold: 30_000,
            lookup_batch_size: 10_000,
            default_service_id: "PROMO".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.database.url, config.database.url);
        assert_eq!(parsed.scrub.full_fetch_threshold, 30_000);
        assert_eq!(parsed.scrub.lookup_batch_size, 10_000);
        assert_eq!(parsed.scrub.country_code, "234");
        assert_eq!(parsed.scrub.default_service_id, "PROMO");
    }
}
