use crate::case_list::CaseList;
use crate::case_source::{CaseContext, CaseSelection, CaseSource};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// All articles in a category, optionally including its subcategories
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceCategory {
    category: String,
    recurse: bool,
}

#[async_trait]
impl CaseSource for SourceCategory {
    fn name(&self) -> String {
        "category".to_string()
    }

    async fn run(&self, context: &CaseContext<'_>) -> Result<CaseSelection> {
        let articles = context
            .wiki
            .category_articles(context.site, &self.category, self.recurse)
            .await?;
        info!(
            "{} articles in category {} on {}",
            articles.len(),
            self.category,
            context.site
        );
        let mut cases = CaseList::new();
        for article in articles {
            let label = article.title().to_string();
            cases.insert(&label, Some(article));
        }
        Ok(CaseSelection::new(cases))
    }
}

impl SourceCategory {
    pub fn new(category: &str, recurse: bool) -> Self {
        Self {
            category: category.to_string(),
            recurse,
        }
    }
}
