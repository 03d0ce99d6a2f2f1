use crate::pageviews::{PageviewApi, DEFAULT_REST_URL};
use crate::wikidata::DEFAULT_WIKIDATA_REST_URL;
use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "wikimetrix";
pub const ENV_PREFIX: &str = "WIKIMETRIX";

/// Run settings. Loaded from an optional config file and `WIKIMETRIX_*`
/// environment variables; command line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lang: String,
    pub site: String,
    pub input_column: String,
    pub recurse_categories: bool,
    pub pageview_api: PageviewApi,
    /// Falls back to the default window of `pageview_api`
    pub pageview_days: Option<u32>,
    pub user_agent: String,
    pub pageviews_rest_url: String,
    pub wikidata_rest_url: String,
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            site: "wikipedia".to_string(),
            input_column: "article".to_string(),
            recurse_categories: false,
            pageview_api: PageviewApi::default(),
            pageview_days: None,
            user_agent: format!("wikimetrix/{}", env!("CARGO_PKG_VERSION")),
            pageviews_rest_url: DEFAULT_REST_URL.to_string(),
            wikidata_rest_url: DEFAULT_WIKIDATA_REST_URL.to_string(),
            show_progress: true,
        }
    }
}

impl Settings {
    /// Reads `path` if given (it must exist), otherwise `wikimetrix.*` in the
    /// working directory if there is one. Environment variables win over files.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = match path {
            Some(path) => Config::builder().add_source(File::from(path).required(true)),
            None => Config::builder().add_source(File::with_name(CONFIG_FILE_NAME).required(false)),
        };
        let builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn pageview_days(&self) -> u32 {
        self.pageview_days
            .unwrap_or_else(|| self.pageview_api.default_days())
    }
}
