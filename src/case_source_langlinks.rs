use crate::article::ArticleRef;
use crate::case_list::CaseList;
use crate::case_source::{CaseContext, CaseSelection, CaseSource};
use crate::redirect::resolve_redirect;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// One article and all its language versions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLanglinks {
    article: String,
}

#[async_trait]
impl CaseSource for SourceLanglinks {
    fn name(&self) -> String {
        "langlinks".to_string()
    }

    async fn run(&self, context: &CaseContext<'_>) -> Result<CaseSelection> {
        let article = ArticleRef::new(context.site.to_owned(), &self.article);
        // Language links live on the redirect target
        let article = resolve_redirect(context.wiki, &article).await?;

        let mut langlinks = context.wiki.langlinks(&article).await?;
        langlinks.sort_by(|a, b| a.site().lang().cmp(b.site().lang()));
        info!("{} language links for {article}", langlinks.len());

        let mut cases = CaseList::new();
        for langlink in langlinks {
            let label = langlink.lang_label();
            cases.insert(&label, Some(langlink));
        }
        cases.insert(&article.lang_label(), Some(article.to_owned()));
        Ok(CaseSelection::new(cases))
    }
}

impl SourceLanglinks {
    pub fn new(article: &str) -> Self {
        Self {
            article: article.to_string(),
        }
    }
}
