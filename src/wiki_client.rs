use crate::article::{ArticleRef, Revision, Site};
use crate::error::FetchError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;
use wikimisc::mediawiki::api::{Api, NamespaceID};
use wikimisc::mediawiki::reqwest::ClientBuilder;
use wikimisc::mediawiki::title::Title;

pub const CATEGORY_NAMESPACE: NamespaceID = 14;

/// Everything the pipeline needs to know about pages on a wiki.
#[async_trait]
pub trait WikiClient: Send + Sync {
    /// The target of `article` if it is a redirect. Resolves a single hop.
    async fn redirect_target(&self, article: &ArticleRef) -> Result<Option<ArticleRef>>;
    async fn full_url(&self, article: &ArticleRef) -> Result<String>;
    /// Current wikitext of the main slot
    async fn content(&self, article: &ArticleRef) -> Result<String>;
    /// Complete revision history, oldest first
    async fn revisions(&self, article: &ArticleRef) -> Result<Vec<Revision>>;
    async fn extlink_count(&self, article: &ArticleRef) -> Result<usize>;
    async fn langlinks(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>>;
    async fn link_count(&self, article: &ArticleRef) -> Result<usize>;
    /// Incoming links from the article namespace, redirects not followed
    async fn linkshere_count(&self, article: &ArticleRef) -> Result<usize>;
    async fn category_count(&self, article: &ArticleRef) -> Result<usize>;
    /// All members of `category` that are not subcategories, files included.
    /// With `recurse`, members of subcategories too; see [`walk_category_tree`].
    async fn category_articles(
        &self,
        site: &Site,
        category: &str,
        recurse: bool,
    ) -> Result<Vec<ArticleRef>>;
    /// Per-day views from the in-wiki pageviews extension, most recent `days`
    async fn daily_pageviews(&self, article: &ArticleRef, days: u32) -> Result<Vec<Option<u64>>>;
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMember {
    Article(String),
    Subcategory(String),
}

/// Depth-first walk from `root`. `list_members` is called once per category.
/// Each category is visited once, so cycles terminate; an article reachable
/// through several categories is listed where it is first seen.
pub async fn walk_category_tree<F, Fut>(
    root: &str,
    recurse: bool,
    mut list_members: F,
) -> Result<Vec<String>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<CategoryMember>>>,
{
    let mut seen_categories: HashSet<String> = HashSet::new();
    let mut seen_articles: HashSet<String> = HashSet::new();
    let mut ret = vec![];
    let mut stack = vec![root.to_string()];
    while let Some(category) = stack.pop() {
        if !seen_categories.insert(category.to_owned()) {
            continue;
        }
        let mut subcats = vec![];
        for member in list_members(category).await? {
            match member {
                CategoryMember::Article(title) => {
                    if seen_articles.insert(title.to_owned()) {
                        ret.push(title);
                    }
                }
                CategoryMember::Subcategory(name) => {
                    if recurse {
                        subcats.push(name);
                    }
                }
            }
        }
        subcats.reverse();
        stack.append(&mut subcats);
    }
    Ok(ret)
}

/// Runs a single-page `prop=` query, following `continue` until exhausted, and
/// collects `pages[0][prop]` of every batch.
pub async fn query_prop_continued<F, Fut>(
    mut params: HashMap<String, String>,
    prop: &str,
    mut fetch: F,
) -> Result<Vec<Value>>
where
    F: FnMut(HashMap<String, String>) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut ret = vec![];
    loop {
        let result = fetch(params.clone()).await?;
        if let Some(items) = first_page(&result).and_then(|page| page[prop].as_array()) {
            ret.extend(items.iter().cloned());
        }
        if !apply_continue(&mut params, &result) {
            break;
        }
    }
    Ok(ret)
}

/// Copies the `continue` block of `result` into `params`; false if there is none.
pub fn apply_continue(params: &mut HashMap<String, String>, result: &Value) -> bool {
    let cont = match result["continue"].as_object() {
        Some(cont) => cont,
        None => return false,
    };
    for (k, v) in cont {
        let v = match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        };
        params.insert(k.to_owned(), v);
    }
    true
}

pub fn api_error(site: &Site, result: &Value) -> Option<FetchError> {
    let error = result.get("error")?;
    Some(FetchError::Api {
        site: site.to_string(),
        code: error["code"].as_str().unwrap_or_default().to_string(),
        info: error["info"].as_str().unwrap_or_default().to_string(),
    })
}

/// `query.pages[0]` of a `formatversion=2` result
pub fn first_page(result: &Value) -> Option<&Value> {
    result["query"]["pages"].as_array()?.first()
}

pub fn parse_redirect_target(article: &ArticleRef, result: &Value) -> Option<ArticleRef> {
    result["query"]["redirects"]
        .as_array()?
        .iter()
        .find_map(|redirect| redirect["to"].as_str())
        .map(|to| ArticleRef::new(article.site().to_owned(), to))
}

pub fn parse_full_url(article: &ArticleRef, page: &Value) -> Result<String> {
    page["fullurl"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("No URL for {article}"))
}

pub fn parse_content(article: &ArticleRef, page: &Value) -> Result<String> {
    if page["missing"].as_bool().unwrap_or(false) || page["invalid"].as_bool().unwrap_or(false) {
        return Err(anyhow!("Page {article} does not exist"));
    }
    page["revisions"][0]["slots"]["main"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("No content for {article}"))
}

pub fn parse_revisions(article: &ArticleRef, revisions: &[Value]) -> Result<Vec<Revision>> {
    revisions
        .iter()
        .map(|rev| {
            let timestamp = rev["timestamp"]
                .as_str()
                .ok_or_else(|| anyhow!("Revision without timestamp on {article}"))?;
            let timestamp = DateTime::parse_from_rfc3339(timestamp)?.with_timezone(&Utc);
            Ok(Revision::new(timestamp, rev["user"].as_str()))
        })
        .collect()
}

/// Language links keep the project family of `article`
pub fn parse_langlinks(article: &ArticleRef, langlinks: &[Value]) -> Vec<ArticleRef> {
    let family = article.site().family();
    langlinks
        .iter()
        .filter_map(|ll| Some((ll["lang"].as_str()?, ll["title"].as_str()?)))
        .map(|(lang, title)| ArticleRef::new(Site::new(lang, family), title))
        .collect()
}

pub fn parse_daily_pageviews(page: &Value) -> Vec<Option<u64>> {
    match page["pageviews"].as_object() {
        Some(per_day) => per_day.values().map(|v| v.as_u64()).collect(),
        None => vec![],
    }
}

//________________________________________________________________________________________________________________________

/// [`WikiClient`] talking to the MediaWiki action API of each site.
pub struct MediaWikiClient {
    user_agent: String,
    apis: Mutex<HashMap<Site, Api>>,
}

impl MediaWikiClient {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            apis: Mutex::new(HashMap::new()),
        }
    }

    /// One API object per site; creating it loads the site info once.
    async fn get_api_for_site(&self, site: &Site) -> Result<Api> {
        let mut apis = self.apis.lock().await;
        if let Some(api) = apis.get(site) {
            return Ok(api.clone());
        }
        let builder = ClientBuilder::new().user_agent(self.user_agent.as_str());
        let mut api = Api::new_from_builder(&site.api_url(), builder)
            .await
            .map_err(|e| anyhow!("Can't talk to the API of {site}: {e}"))?;
        api.set_user_agent(self.user_agent.as_str());
        apis.insert(site.to_owned(), api.clone());
        Ok(api)
    }

    fn page_params(article: &ArticleRef, pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.insert("action".to_string(), "query".to_string());
        params.insert("format".to_string(), "json".to_string());
        params.insert("formatversion".to_string(), "2".to_string());
        params.insert("titles".to_string(), article.title().to_string());
        params
    }

    async fn query(&self, site: &Site, params: &HashMap<String, String>) -> Result<Value> {
        let api = self.get_api_for_site(site).await?;
        debug!("{site} API query {params:?}");
        let result = api
            .get_query_api_json(params)
            .await
            .map_err(|e| anyhow!("{e}"))?;
        match api_error(site, &result) {
            Some(error) => Err(error.into()),
            None => Ok(result),
        }
    }

    /// A `list=` query with all continuations merged by the API object
    async fn query_list(&self, site: &Site, pairs: &[(&str, &str)]) -> Result<(Api, Value)> {
        let api = self.get_api_for_site(site).await?;
        let params = api.params_into(pairs);
        debug!("{site} API list query {params:?}");
        let result = api
            .get_query_api_json_limit(&params, None)
            .await
            .map_err(|e| anyhow!("{e}"))?;
        match api_error(site, &result) {
            Some(error) => Err(error.into()),
            None => Ok((api, result)),
        }
    }

    /// All entries of `prop` for a single page. The continuation is followed
    /// here because the API object's merge would split `pages[0]`.
    async fn page_prop_all(
        &self,
        article: &ArticleRef,
        prop: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        let mut params = Self::page_params(article, extra);
        params.insert("prop".to_string(), prop.to_string());
        let site = article.site();
        query_prop_continued(params, prop, move |params| async move {
            self.query(site, &params).await
        })
        .await
    }

    async fn page(&self, article: &ArticleRef, extra: &[(&str, &str)]) -> Result<Value> {
        let params = Self::page_params(article, extra);
        let result = self.query(article.site(), &params).await?;
        first_page(&result)
            .cloned()
            .ok_or_else(|| anyhow!("No page information for {article}"))
    }

    async fn category_title(&self, site: &Site, category: &str) -> Result<String> {
        let api = self.get_api_for_site(site).await?;
        let title = Title::new_from_full(category, &api);
        let title = if title.namespace_id() == CATEGORY_NAMESPACE {
            title
        } else {
            Title::new(category, CATEGORY_NAMESPACE)
        };
        title
            .full_pretty(&api)
            .ok_or_else(|| anyhow!("Can't build a category title from '{category}' on {site}"))
    }

    async fn category_members(
        &self,
        site: &Site,
        category: String,
        recurse: bool,
    ) -> Result<Vec<CategoryMember>> {
        let cmtype = if recurse { "page|file|subcat" } else { "page|file" };
        let (api, result) = self
            .query_list(
                site,
                &[
                    ("action", "query"),
                    ("list", "categorymembers"),
                    ("cmtitle", category.as_str()),
                    ("cmtype", cmtype),
                    ("cmlimit", "max"),
                ],
            )
            .await?;
        Ok(Api::result_array_to_titles(&result)
            .iter()
            .filter_map(|title| {
                let full = title.full_pretty(&api)?;
                Some(match title.namespace_id() {
                    CATEGORY_NAMESPACE => CategoryMember::Subcategory(full),
                    _ => CategoryMember::Article(full),
                })
            })
            .collect())
    }
}

#[async_trait]
impl WikiClient for MediaWikiClient {
    async fn redirect_target(&self, article: &ArticleRef) -> Result<Option<ArticleRef>> {
        let params = Self::page_params(article, &[("redirects", "1")]);
        let result = self.query(article.site(), &params).await?;
        Ok(parse_redirect_target(article, &result))
    }

    async fn full_url(&self, article: &ArticleRef) -> Result<String> {
        let page = self
            .page(article, &[("prop", "info"), ("inprop", "url")])
            .await?;
        parse_full_url(article, &page)
    }

    async fn content(&self, article: &ArticleRef) -> Result<String> {
        let page = self
            .page(
                article,
                &[
                    ("prop", "revisions"),
                    ("rvprop", "content"),
                    ("rvslots", "main"),
                ],
            )
            .await?;
        parse_content(article, &page)
    }

    async fn revisions(&self, article: &ArticleRef) -> Result<Vec<Revision>> {
        let revisions = self
            .page_prop_all(
                article,
                "revisions",
                &[
                    ("rvprop", "timestamp|user"),
                    ("rvdir", "newer"),
                    ("rvlimit", "max"),
                ],
            )
            .await?;
        parse_revisions(article, &revisions)
    }

    async fn extlink_count(&self, article: &ArticleRef) -> Result<usize> {
        let links = self
            .page_prop_all(article, "extlinks", &[("ellimit", "max")])
            .await?;
        Ok(links.len())
    }

    async fn langlinks(&self, article: &ArticleRef) -> Result<Vec<ArticleRef>> {
        let links = self
            .page_prop_all(article, "langlinks", &[("lllimit", "max")])
            .await?;
        Ok(parse_langlinks(article, &links))
    }

    async fn link_count(&self, article: &ArticleRef) -> Result<usize> {
        let links = self
            .page_prop_all(article, "links", &[("pllimit", "max")])
            .await?;
        Ok(links.len())
    }

    async fn linkshere_count(&self, article: &ArticleRef) -> Result<usize> {
        let (_, result) = self
            .query_list(
                article.site(),
                &[
                    ("action", "query"),
                    ("list", "backlinks"),
                    ("bltitle", article.title()),
                    ("blnamespace", "0"),
                    ("bllimit", "max"),
                ],
            )
            .await?;
        Ok(Api::result_array_to_titles(&result).len())
    }

    async fn category_count(&self, article: &ArticleRef) -> Result<usize> {
        let categories = self
            .page_prop_all(article, "categories", &[("cllimit", "max")])
            .await?;
        Ok(categories.len())
    }

    async fn category_articles(
        &self,
        site: &Site,
        category: &str,
        recurse: bool,
    ) -> Result<Vec<ArticleRef>> {
        let root = self.category_title(site, category).await?;
        let titles = walk_category_tree(&root, recurse, move |name| {
            self.category_members(site, name, recurse)
        })
        .await?;
        Ok(titles
            .iter()
            .map(|title| ArticleRef::new(site.to_owned(), title))
            .collect())
    }

    async fn daily_pageviews(&self, article: &ArticleRef, days: u32) -> Result<Vec<Option<u64>>> {
        let days = days.to_string();
        let page = self
            .page(article, &[("prop", "pageviews"), ("pvipdays", days.as_str())])
            .await?;
        Ok(parse_daily_pageviews(&page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::future::ready;

    fn article() -> ArticleRef {
        ArticleRef::new(Site::new("en", "wikipedia"), "Douglas Adams")
    }

    fn tree() -> HashMap<String, Vec<CategoryMember>> {
        use CategoryMember::{Article, Subcategory};
        let mut tree = HashMap::new();
        tree.insert(
            "Category:Writers".to_string(),
            vec![
                Article("Douglas Adams".to_string()),
                Subcategory("Category:Poets".to_string()),
                Article("File:Typewriter.jpg".to_string()),
                Subcategory("Category:Novelists".to_string()),
            ],
        );
        tree.insert(
            "Category:Poets".to_string(),
            vec![
                Article("Goethe".to_string()),
                Subcategory("Category:Writers".to_string()),
            ],
        );
        tree.insert(
            "Category:Novelists".to_string(),
            vec![
                Article("Douglas Adams".to_string()),
                Article("Terry Pratchett".to_string()),
            ],
        );
        tree
    }

    async fn walk(recurse: bool) -> (Vec<String>, Vec<String>) {
        let tree = tree();
        let mut visited = vec![];
        let titles = walk_category_tree("Category:Writers", recurse, |name| {
            visited.push(name.to_owned());
            ready(Ok(tree.get(&name).cloned().unwrap_or_default()))
        })
        .await
        .unwrap();
        (titles, visited)
    }

    #[tokio::test]
    async fn walk_direct_members() {
        let (titles, visited) = walk(false).await;
        assert_eq!(titles, vec!["Douglas Adams", "File:Typewriter.jpg"]);
        assert_eq!(visited, vec!["Category:Writers"]);
    }

    #[tokio::test]
    async fn walk_recursive_with_cycle() {
        let (titles, visited) = walk(true).await;
        assert_eq!(
            titles,
            vec![
                "Douglas Adams",
                "File:Typewriter.jpg",
                "Goethe",
                "Terry Pratchett"
            ]
        );
        // Writers is reached again through Poets but listed only once
        assert_eq!(
            visited,
            vec!["Category:Writers", "Category:Poets", "Category:Novelists"]
        );
    }

    #[tokio::test]
    async fn walk_propagates_errors() {
        let err = walk_category_tree("Category:Broken", true, |_| {
            ready(Err::<Vec<CategoryMember>, _>(anyhow!("API down")))
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "API down");
    }

    #[tokio::test]
    async fn prop_query_follows_continuation() {
        let mut batches = vec![
            json!({
                "continue": {"rvcontinue": "20100601083000|42", "continue": "||"},
                "query": {"pages": [{"title": "Douglas Adams", "revisions": [
                    {"timestamp": "2001-01-15T12:00:00Z", "user": "Alice"},
                    {"timestamp": "2005-03-01T10:00:00Z", "user": "Bob"}
                ]}]}
            }),
            json!({
                "batchcomplete": true,
                "query": {"pages": [{"title": "Douglas Adams", "revisions": [
                    {"timestamp": "2010-06-01T08:30:00Z", "user": "Alice"}
                ]}]}
            }),
        ]
        .into_iter();
        let mut seen_params = vec![];
        let mut params = HashMap::new();
        params.insert("prop".to_string(), "revisions".to_string());
        let revisions = query_prop_continued(params, "revisions", |params| {
            seen_params.push(params);
            ready(batches.next().ok_or_else(|| anyhow!("no more batches")))
        })
        .await
        .unwrap();

        assert_eq!(revisions.len(), 3);
        assert_eq!(seen_params.len(), 2);
        assert!(!seen_params[0].contains_key("rvcontinue"));
        assert_eq!(seen_params[1]["rvcontinue"], "20100601083000|42");
        assert_eq!(seen_params[1]["continue"], "||");

        let revisions = parse_revisions(&article(), &revisions).unwrap();
        assert_eq!(revisions[0].user.as_deref(), Some("Alice"));
        assert_eq!(revisions[2].timestamp.to_rfc3339(), "2010-06-01T08:30:00+00:00");
    }

    #[test]
    fn continue_with_non_string_values() {
        let mut params = HashMap::new();
        assert!(!apply_continue(&mut params, &json!({"query": {}})));
        assert!(params.is_empty());
        assert!(apply_continue(&mut params, &json!({"continue": {"offset": 500}})));
        assert_eq!(params["offset"], "500");
    }

    #[test]
    fn api_errors() {
        let site = Site::new("en", "wikipedia");
        let result = json!({"error": {"code": "badvalue", "info": "Unrecognized value"}});
        assert_eq!(
            api_error(&site, &result),
            Some(FetchError::Api {
                site: "en.wikipedia".to_string(),
                code: "badvalue".to_string(),
                info: "Unrecognized value".to_string()
            })
        );
        assert_eq!(api_error(&site, &json!({"query": {}})), None);
    }

    #[test]
    fn redirect_targets() {
        let result = json!({"query": {
            "redirects": [{"from": "Adams", "to": "Douglas Adams"}],
            "pages": [{"title": "Douglas Adams"}]
        }});
        let target = parse_redirect_target(&article(), &result).unwrap();
        assert_eq!(target, article());
        let result = json!({"query": {"pages": [{"title": "Douglas Adams"}]}});
        assert_eq!(parse_redirect_target(&article(), &result), None);
    }

    #[test]
    fn page_content_and_url() {
        let result = json!({"query": {"pages": [{
            "title": "Douglas Adams",
            "fullurl": "https://en.wikipedia.org/wiki/Douglas_Adams",
            "revisions": [{"slots": {"main": {"content": "'''Douglas Adams''' was"}}}]
        }]}});
        let page = first_page(&result).unwrap();
        assert_eq!(
            parse_full_url(&article(), page).unwrap(),
            "https://en.wikipedia.org/wiki/Douglas_Adams"
        );
        assert_eq!(
            parse_content(&article(), page).unwrap(),
            "'''Douglas Adams''' was"
        );
        assert!(parse_full_url(&article(), &json!({})).is_err());
    }

    #[test]
    fn missing_and_invalid_pages() {
        let missing = json!({"title": "Douglas Adams", "missing": true});
        let err = parse_content(&article(), &missing).unwrap_err();
        assert_eq!(err.to_string(), "Page en.wikipedia:Douglas Adams does not exist");
        let invalid = json!({"title": "<>", "invalid": true});
        assert!(parse_content(&article(), &invalid).is_err());
        assert!(first_page(&json!({"query": {"pages": []}})).is_none());
    }

    #[test]
    fn revisions_need_timestamps() {
        let revisions = vec![json!({"user": "Alice"})];
        assert!(parse_revisions(&article(), &revisions).is_err());
        let revisions = vec![json!({"timestamp": "2001-01-15T12:00:00Z", "userhidden": true})];
        let revisions = parse_revisions(&article(), &revisions).unwrap();
        assert_eq!(revisions[0].user, None);
    }

    #[test]
    fn langlinks_keep_family() {
        let article = ArticleRef::new(Site::new("en", "wikisource"), "Faust");
        let links = vec![
            json!({"lang": "de", "title": "Faust. Eine Tragödie"}),
            json!({"lang": "fr"}),
        ];
        let links = parse_langlinks(&article, &links);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].site(), &Site::new("de", "wikisource"));
        assert_eq!(links[0].title(), "Faust. Eine Tragödie");
    }

    #[test]
    fn daily_pageviews() {
        let page = json!({"pageviews": {"2024-01-01": 10, "2024-01-02": null, "2024-01-03": 5}});
        assert_eq!(parse_daily_pageviews(&page), vec![Some(10), None, Some(5)]);
        assert!(parse_daily_pageviews(&json!({"title": "X"})).is_empty());
    }
}
