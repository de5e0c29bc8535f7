use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

const BASE_FILE: &str = "config/Config.toml";
const ENV_PREFIX: &str = "TRADEDESK_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads desk configuration by layering compiled defaults, the TOML file,
    /// and `TRADEDESK_` environment variables (`__` separates sections).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Self::figment(None).extract()?;
        Ok(config)
    }

    /// Loads desk configuration with `config/Config.{profile}.toml` layered
    /// over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(Some(profile)).extract()?;
        Ok(config)
    }

    fn figment(profile: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(BASE_FILE));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(format!("config/Config.{profile}.toml")));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
