use crate::{
    request::{DEFAULT_API_ROOT, DEFAULT_SEARCH_LIMIT, Endpoint},
    session::DEFAULT_REGION,
};
use serde::Deserialize;
use std::{env, fs, path::PathBuf, sync::LazyLock};
use tracing::warn;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Developer token sent as the bearer credential.
    pub developer_token: Option<String>,
    /// Music user token, enables the personalized storefront lookup.
    pub user_token: Option<String>,

    /// Two letter region code used until a storefront is resolved.
    pub region: String,

    /// Root URL of the catalog service.
    pub api_root: String,
    /// Number of results requested per bucket.
    pub search_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            developer_token: None,
            user_token: None,
            region: DEFAULT_REGION.into(),
            api_root: DEFAULT_API_ROOT.into(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(load_config);

fn config_path() -> Option<PathBuf> {
    Some(
        dirs::config_dir()?
            .join("catalog-search")
            .join("catalog-search.toml"),
    )
}

fn load_config() -> Config {
    let config = match config_path() {
        Some(path) => match fs::read_to_string(&path) {
            Ok(contents) => Config::from_toml(&contents).unwrap_or_else(|err| {
                warn!("Falling back to default config, failed to parse {path:?}: {err}");
                Config::default()
            }),
            Err(err) => {
                warn!("Falling back to default config, unable to read {path:?}: {err}");
                Config::default()
            }
        },
        None => {
            warn!("Falling back to default config, config directory unavailable");
            Config::default()
        }
    };
    config.with_overrides(|key| env::var(key).ok())
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply `CATALOG_*` overrides, read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(token) = lookup("CATALOG_DEVELOPER_TOKEN") {
            self.developer_token = Some(token);
        }
        if let Some(token) = lookup("CATALOG_USER_TOKEN") {
            self.user_token = Some(token);
        }
        if let Some(region) = lookup("CATALOG_REGION") {
            self.region = region;
        }
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.api_root, self.search_limit)
    }
}
