//! In-memory stand-ins for the upstream services, used by unit tests.

use crate::article::{ArticleRef, Revision, Site};
use crate::error::FetchError;
use crate::pageviews::PageviewSource;
use crate::wiki_client::{walk_category_tree, CategoryMember, WikiClient};
use crate::wikidata::SitelinkSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::future::ready;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct MockPage {
    pub content: String,
    pub url: Option<String>,
    pub revisions: Vec<Revision>,
    pub extlinks: usize,
    pub links: usize,
    pub linkshere: usize,
    pub categories: usize,
    pub langlinks: Vec<(String, String)>,
    pub daily_views: Vec<Option<u64>>,
}

impl Default for MockPage {
    fn default() -> Self {
        let first = Utc.with_ymd_and_hms(2001, 1, 15, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2010, 6, 1, 8, 30, 0).unwrap();
        Self {
            content: "Some text".to_string(),
            url: None,
            revisions: vec![
                Revision::new(first, Some("Alice")),
                Revision::new(second, Some("Bob")),
            ],
            extlinks: 3,
            links: 10,
            linkshere: 7,
            categories: 2,
            langlinks: vec![],
            daily_views: vec![Some(1), None, Some(2)],
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MockCategory {
    articles: Vec<String>,
    subcats: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MockWiki {
    pages: HashMap<ArticleRef, MockPage>,
    redirects: HashMap<ArticleRef, ArticleRef>,
    categories: HashMap<(Site, String), MockCategory>,
    requests: AtomicUsize,
}

impl MockWiki {
    pub fn add_page(&mut self, site: &Site, title: &str, page: MockPage) {
        self.pages
            .insert(ArticleRef::new(site.to_owned(), title), page);
    }

    pub fn add_redirect(&mut self, site: &Site, from: &str, to: &str) {
        self.redirects.insert(
            ArticleRef::new(site.to_owned(), from),
            ArticleRef::new(site.to_owned(), to),
        );
    }

    pub fn add_category(&mut self, site: &Site, name: &str, articles: &[&str], subcats: &[&str]) {
        self.categories.insert(
            (site.to_owned(), name.to_string()),
            MockCategory {
                articles: articles.iter().map(|s| s.to_string()).collect(),
                subcats: subcats.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn page(&self, article: &ArticleRef) -> Result<&MockPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(article)
            .ok_or_else(|| anyhow!("Page {article} does not exist"))
    }
}

#[async_trait]
impl WikiClient for MockWiki {
    async fn redirect_target(&self, article: &ArticleRef) -> Result<Option<ArticleRef>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.redirects.get(article).cloned())
    }

    async fn full_url(&self, article: &ArticleRef) -> Result<String> {
        let page = self.page(article)?;
        Ok(page.url.clone().unwrap_or_else(|| {
            format!(
                "https://{}/wiki/{}",
                article.site().host(),
                article.with_underscores()
            )
        }))
    }

    async fn content(&self, article: &ArticleRef) -> Result<String> {
        Ok(self.page(article)?.content.to_owned())
    }

    async fn revisions(&self, article: &ArticleRef) -> Result<Vec<Revision>> {
        Ok(self.page(article)?.revisions.to_owned())
    }

    async fn extlink_count(&self, article: &ArticleRef) -> Result<usize> {
        Ok(self.page(article)?.extlinks)
    }

    async fn langlinks(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>> {
        let family = article.site().family().to_string();
        Ok(self
            .page(article)?
            .langlinks
            .iter()
            .map(|(lang, title)| ArticleRef::new(Site::new(lang, &family), title))
            .collect())
    }

    async fn link_count(&self, article: &ArticleRef) -> Result<usize> {
        Ok(self.page(article)?.links)
    }

    async fn linkshere_count(&self, article: &ArticleRef) -> Result<usize> {
        Ok(self.page(article)?.linkshere)
    }

    async fn category_count(&self, article: &ArticleRef) -> Result<usize> {
        Ok(self.page(article)?.categories)
    }

    async fn category_articles(
        &self,
        site: &Site,
        category: &str,
        recurse: bool,
    ) -> Result<Vec<ArticleRef>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let titles = walk_category_tree(category, recurse, |name| {
            let members = match self.categories.get(&(site.to_owned(), name)) {
                Some(cat) => cat
                    .articles
                    .iter()
                    .cloned()
                    .map(CategoryMember::Article)
                    .chain(cat.subcats.iter().cloned().map(CategoryMember::Subcategory))
                    .collect(),
                None => vec![],
            };
            ready(Ok(members))
        })
        .await?;
        Ok(titles
            .iter()
            .map(|title| ArticleRef::new(site.to_owned(), title))
            .collect())
    }

    async fn daily_pageviews(&self, article: &ArticleRef, _days: u32) -> Result<Vec<Option<u64>>> {
        Ok(self.page(article)?.daily_views.to_owned())
    }
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Default)]
pub struct MockPageviews {
    pub views: u64,
    pub days: u32,
    /// Titles for which the statistics service answers with an error status
    pub failing: Vec<String>,
}

#[async_trait]
impl PageviewSource for MockPageviews {
    fn days(&self) -> u32 {
        self.days
    }

    async fn pageviews(&self, article: &ArticleRef) -> Result<u64> {
        if self.failing.iter().any(|t| t == article.title()) {
            return Err(FetchError::Status {
                status: 404,
                reason: "Not Found".to_string(),
                url: article.to_string(),
            }
            .into());
        }
        Ok(self.views)
    }
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Default)]
pub struct MockSitelinks {
    /// (item, site id) => title
    pub titles: HashMap<(String, String), String>,
    requests: AtomicUsize,
}

impl MockSitelinks {
    pub fn with_sitelink(mut self, item: &str, site_id: &str, title: &str) -> Self {
        self.titles
            .insert((item.to_string(), site_id.to_string()), title.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SitelinkSource for MockSitelinks {
    async fn sitelink_title(&self, item: &str, site_id: &str) -> Result<Option<String>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .titles
            .get(&(item.to_string(), site_id.to_string()))
            .cloned())
    }
}
