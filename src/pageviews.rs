use crate::article::ArticleRef;
use crate::error::FetchError;
use crate::wiki_client::WikiClient;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const REST_PAGEVIEW_DAYS: u32 = 365;
pub const LEGACY_PAGEVIEW_DAYS: u32 = 60;
/// The statistics pipeline lags behind; the most recent days are incomplete.
pub const PIPELINE_LAG_DAYS: u64 = 2;
pub const DEFAULT_REST_URL: &str = "https://wikimedia.org/api/rest_v1";

/// Unreserved characters stay as they are, everything else gets encoded.
const TITLE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageviewApi {
    /// Wikimedia REST API, monthly sums
    #[default]
    Rest,
    /// Pageviews extension of the wiki itself, daily values
    Legacy,
}

impl PageviewApi {
    pub const fn default_days(&self) -> u32 {
        match self {
            Self::Rest => REST_PAGEVIEW_DAYS,
            Self::Legacy => LEGACY_PAGEVIEW_DAYS,
        }
    }
}

#[async_trait]
pub trait PageviewSource: Send + Sync {
    /// Length of the trailing window
    fn days(&self) -> u32;

    async fn pageviews(&self, article: &ArticleRef) -> Result<u64>;

    fn column_name(&self) -> String {
        column_name(self.days())
    }
}

pub fn column_name(days: u32) -> String {
    format!("pageviews_{days}d")
}

/// Sums view counts; missing values count as zero.
pub fn sum_views<I: IntoIterator<Item = Option<u64>>>(views: I) -> u64 {
    views.into_iter().flatten().sum()
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageviewWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl PageviewWindow {
    /// Fails if the window reaches past the earliest representable date.
    pub fn ending_before(today: NaiveDate, days: u32) -> Result<Self> {
        let out_of_range = || anyhow!("A pageview window of {days} days is out of range");
        let end = today
            .checked_sub_days(Days::new(PIPELINE_LAG_DAYS))
            .ok_or_else(out_of_range)?;
        let start = end
            .checked_sub_days(Days::new(days.into()))
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    pub fn trailing(days: u32) -> Result<Self> {
        Self::ending_before(Utc::now().date_naive(), days)
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

//________________________________________________________________________________________________________________________

/// Monthly per-article pageviews from the Wikimedia REST API
#[derive(Debug, Clone)]
pub struct RestPageviews {
    client: reqwest::Client,
    base_url: String,
    days: u32,
}

impl RestPageviews {
    pub fn new(user_agent: &str, base_url: &str, days: u32) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            days,
        })
    }

    pub fn per_article_url(&self, article: &ArticleRef, window: &PageviewWindow) -> String {
        let title = article.title_without_section().replace(' ', "_");
        let title = utf8_percent_encode(&title, TITLE_ENCODE_SET);
        format!(
            "{}/metrics/pageviews/per-article/{}/all-access/user/{title}/monthly/{}/{}",
            self.base_url,
            article.site().rest_project(),
            window.start().format("%Y%m%d"),
            window.end().format("%Y%m%d"),
        )
    }

    pub fn sum_items(result: &Value) -> u64 {
        match result["items"].as_array() {
            Some(items) => sum_views(items.iter().map(|item| item["views"].as_u64())),
            None => 0,
        }
    }
}

#[async_trait]
impl PageviewSource for RestPageviews {
    fn days(&self) -> u32 {
        self.days
    }

    async fn pageviews(&self, article: &ArticleRef) -> Result<u64> {
        let window = PageviewWindow::trailing(self.days)?;
        let url = self.per_article_url(article, &window);
        debug!("Pageviews: {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::from_status(response.status(), &url).into());
        }
        let result: Value = response.json().await?;
        Ok(Self::sum_items(&result))
    }
}

//________________________________________________________________________________________________________________________

/// Daily pageviews as reported by the wiki's own API
pub struct LegacyPageviews {
    wiki: Arc<dyn WikiClient>,
    days: u32,
}

impl LegacyPageviews {
    pub fn new(wiki: Arc<dyn WikiClient>, days: u32) -> Self {
        Self { wiki, days }
    }
}

#[async_trait]
impl PageviewSource for LegacyPageviews {
    fn days(&self) -> u32 {
        self.days
    }

    async fn pageviews(&self, article: &ArticleRef) -> Result<u64> {
        let per_day = self.wiki.daily_pageviews(article, self.days).await?;
        Ok(sum_views(per_day))
    }
}
