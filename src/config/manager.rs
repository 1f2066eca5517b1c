use super::{
    backtesting::BacktestingConfig,
    scoring::ScoringConfig,
    traits::ConfigSection,
};
use crate::error::SignalbenchError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `SIGNALBENCH__SCORING__MIN_TOTAL=60`.
const ENV_PREFIX: &str = "SIGNALBENCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtesting: BacktestingConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SignalbenchError> {
        check_section(&self.backtesting)?;
        check_section(&self.scoring)?;
        Ok(())
    }
}

fn check_section<S: ConfigSection>(section: &S) -> Result<(), SignalbenchError> {
    section.validate().map_err(|e| match e {
        SignalbenchError::Configuration(msg) => {
            SignalbenchError::Configuration(format!("[{}] {}", S::section_name(), msg))
        }
        other => other,
    })
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SignalbenchError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;

        self.replace(config)
    }

    /// Loads an optional TOML file, then applies `SIGNALBENCH__<SECTION>__<KEY>` overrides.
    pub fn load_layered<P: AsRef<Path>>(&self, path: P) -> Result<(), SignalbenchError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SignalbenchError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)?;
        std::fs::write(path, toml_str)?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, SignalbenchError> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| SignalbenchError::Configuration("Config lock poisoned".to_string()))
    }

    pub fn update<F>(&self, f: F) -> Result<(), SignalbenchError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get()?;
        f(&mut candidate);
        self.replace(candidate)
    }

    fn replace(&self, config: AppConfig) -> Result<(), SignalbenchError> {
        config.validate()?;
        let mut guard = self
            .config
            .write()
            .map_err(|_| SignalbenchError::Configuration("Config lock poisoned".to_string()))?;
        *guard = config;
        log::info!("Configuration loaded");
        Ok(())
    }
}
