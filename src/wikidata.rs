use crate::article::Site;
use crate::batch::progress_bar;
use crate::error::FetchError;
use anyhow::Result;
use async_trait::async_trait;
use indicatif::ProgressIterator;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_WIKIDATA_REST_URL: &str = "https://www.wikidata.org/w/rest.php/wikibase/v1";

lazy_static! {
    static ref ITEM_RE: Regex = Regex::new(r"^Q\d+$").expect("valid regex");
    static ref ENTITY_URL_RE: Regex =
        Regex::new(r"^https?://www\.wikidata\.org/entity/(Q\d+)$").expect("valid regex");
}

pub fn is_item_id(s: &str) -> bool {
    ITEM_RE.is_match(s)
}

pub fn all_item_ids<'a, I: IntoIterator<Item = &'a str>>(values: I) -> bool {
    values.into_iter().all(is_item_id)
}

pub fn all_entity_urls<'a, I: IntoIterator<Item = &'a str>>(values: I) -> bool {
    values.into_iter().all(|v| ENTITY_URL_RE.is_match(v))
}

/// `http://www.wikidata.org/entity/Q42` => `Q42`; anything else is returned unchanged
pub fn strip_entity_url(s: &str) -> String {
    match ENTITY_URL_RE.captures(s) {
        Some(caps) => caps[1].to_string(),
        None => s.to_string(),
    }
}

//________________________________________________________________________________________________________________________

#[async_trait]
pub trait SitelinkSource: Send + Sync {
    /// The page title `item` links to on `site_id` (e.g. `enwiki`), if any
    async fn sitelink_title(&self, item: &str, site_id: &str) -> Result<Option<String>>;
}

/// Looks up titles for a list of items, in order. Items without a sitelink on
/// `site` become `None` and are reported in a single warning.
pub async fn resolve_item_titles(
    source: &dyn SitelinkSource,
    items: &[String],
    site: &Site,
    show_progress: bool,
) -> Result<Vec<Option<String>>> {
    let site_id = site.wikidata_site_id();
    let bar = progress_bar(
        items.len(),
        "Getting article titles from Wikidata",
        show_progress,
    );
    let mut titles = Vec::with_capacity(items.len());
    let mut no_sitelink = vec![];
    for item in items.iter().progress_with(bar.clone()) {
        bar.set_message(item.to_owned());
        let title = source.sitelink_title(item, &site_id).await?;
        if title.is_none() {
            no_sitelink.push(item.as_str());
        }
        titles.push(title);
    }
    bar.finish_and_clear();
    if !no_sitelink.is_empty() {
        warn!(
            "No sitelink found on {site} for {}.",
            no_sitelink.join(", ")
        );
    }
    Ok(titles)
}

//________________________________________________________________________________________________________________________

/// Sitelink lookups against the Wikibase REST API
#[derive(Debug, Clone)]
pub struct WikidataSitelinks {
    client: reqwest::Client,
    base_url: String,
}

impl WikidataSitelinks {
    pub fn new(user_agent: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn sitelink_url(&self, item: &str, site_id: &str) -> String {
        format!("{}/entities/items/{item}/sitelinks/{site_id}", self.base_url)
    }

    /// Interprets a sitelink response. Only a "sitelink-not-defined" error means "no title".
    pub fn parse_response(
        status: reqwest::StatusCode,
        body: &Value,
        url: &str,
    ) -> Result<Option<String>> {
        if status.is_success() {
            return Ok(body["title"].as_str().map(|s| s.to_string()));
        }
        if body["code"].as_str() == Some("sitelink-not-defined") {
            return Ok(None);
        }
        Err(FetchError::from_status(status, url).into())
    }
}

#[async_trait]
impl SitelinkSource for WikidataSitelinks {
    async fn sitelink_title(&self, item: &str, site_id: &str) -> Result<Option<String>> {
        let url = self.sitelink_url(item, site_id);
        debug!("Sitelink: {url}");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Self::parse_response(status, &body, &url)
    }
}
