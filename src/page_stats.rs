use crate::article::ArticleRef;
use crate::pageviews::{self, PageviewSource};
use crate::redirect::resolve_redirect;
use crate::report::Cell;
use crate::wiki_client::WikiClient;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::warn;

/// The page size of list queries in the MediaWiki API. A count of exactly this
/// value often means a truncated result upstream.
pub const MW_API_LIMIT: u64 = 500;

/// Statistics for one (redirect-resolved) article
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRecord {
    pub title: String,
    pub url: String,
    /// In bytes, UTF-8
    pub length: usize,
    pub n_contributors: usize,
    pub n_revisions: usize,
    pub n_extlinks: usize,
    pub n_langlinks: usize,
    pub n_links: usize,
    pub n_linkshere: usize,
    pub n_categories: usize,
    pub pageviews: u64,
    pub pageview_days: u32,
    pub first_revision: DateTime<Utc>,
}

impl StatsRecord {
    pub fn column_names(pageview_days: u32) -> Vec<String> {
        vec![
            "title".to_string(),
            "url".to_string(),
            "length".to_string(),
            "n_contributors".to_string(),
            "n_revisions".to_string(),
            "n_extlinks".to_string(),
            "n_langlinks".to_string(),
            "n_links".to_string(),
            "n_linkshere".to_string(),
            "n_categories".to_string(),
            pageviews::column_name(pageview_days),
            "first_revision".to_string(),
        ]
    }

    /// Cells in the order of [`StatsRecord::column_names`]
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.title.to_owned()),
            Cell::Text(self.url.to_owned()),
            Cell::Integer(self.length as u64),
            Cell::Integer(self.n_contributors as u64),
            Cell::Integer(self.n_revisions as u64),
            Cell::Integer(self.n_extlinks as u64),
            Cell::Integer(self.n_langlinks as u64),
            Cell::Integer(self.n_links as u64),
            Cell::Integer(self.n_linkshere as u64),
            Cell::Integer(self.n_categories as u64),
            Cell::Integer(self.pageviews),
            Cell::Timestamp(self.first_revision),
        ]
    }

    /// Names of all fields whose value equals [`MW_API_LIMIT`]
    pub fn limit_warnings(&self) -> Vec<String> {
        Self::column_names(self.pageview_days)
            .into_iter()
            .zip(self.cells())
            .filter(|(_, cell)| *cell == Cell::Integer(MW_API_LIMIT))
            .map(|(name, _)| name)
            .collect()
    }
}

//________________________________________________________________________________________________________________________

pub struct PageStatsCollector<'a> {
    wiki: &'a dyn WikiClient,
    pageviews: &'a dyn PageviewSource,
}

impl<'a> PageStatsCollector<'a> {
    pub fn new(wiki: &'a dyn WikiClient, pageviews: &'a dyn PageviewSource) -> Self {
        Self { wiki, pageviews }
    }

    pub fn pageview_days(&self) -> u32 {
        self.pageviews.days()
    }

    pub async fn collect(&self, article: &ArticleRef) -> Result<StatsRecord> {
        let page = resolve_redirect(self.wiki, article).await?;

        let content = self.wiki.content(&page).await?;
        let revisions = self.wiki.revisions(&page).await?;
        let first_revision = revisions
            .first()
            .map(|rev| rev.timestamp)
            .ok_or_else(|| anyhow!("No revisions for {page}"))?;
        let contributors: HashSet<&str> = revisions
            .iter()
            .filter_map(|rev| rev.user.as_deref())
            .collect();

        let record = StatsRecord {
            title: page.title().to_string(),
            url: self.wiki.full_url(&page).await?,
            length: content.len(),
            n_contributors: contributors.len(),
            n_revisions: revisions.len(),
            n_extlinks: self.wiki.extlink_count(&page).await?,
            n_langlinks: self.wiki.langlinks(&page).await?.len(),
            n_links: self.wiki.link_count(&page).await?,
            n_linkshere: self.wiki.linkshere_count(&page).await?,
            n_categories: self.wiki.category_count(&page).await?,
            pageviews: self.pageviews.pageviews(&page).await?,
            pageview_days: self.pageviews.days(),
            first_revision,
        };

        for key in record.limit_warnings() {
            warn!("{key} at limit {MW_API_LIMIT}.");
        }
        Ok(record)
    }
}
