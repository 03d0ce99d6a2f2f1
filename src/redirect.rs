use crate::article::ArticleRef;
use crate::wiki_client::WikiClient;
use anyhow::Result;
use tracing::warn;

/// Returns the redirect target of `article`, or `article` itself if it is not a redirect.
/// Only one hop is followed; double redirects are left as the wiki resolves them.
pub async fn resolve_redirect(wiki: &dyn WikiClient, article: &ArticleRef) -> Result<ArticleRef> {
    match wiki.redirect_target(article).await? {
        Some(target) if target != *article => {
            warn!(
                "Page {} is a redirect to {}.",
                article.with_underscores(),
                target.with_underscores()
            );
            Ok(target)
        }
        _ => Ok(article.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Site;
    use crate::mock::{MockPage, MockWiki};

    fn site() -> Site {
        Site::new("en", "wikipedia")
    }

    #[tokio::test]
    async fn follows_one_hop() {
        let mut wiki = MockWiki::default();
        wiki.add_redirect(&site(), "Adams", "Douglas Adams Redirect");
        wiki.add_redirect(&site(), "Douglas Adams Redirect", "Douglas Adams");
        let article = ArticleRef::new(site(), "Adams");
        let resolved = resolve_redirect(&wiki, &article).await.unwrap();
        assert_eq!(resolved.title(), "Douglas Adams Redirect");
    }

    #[tokio::test]
    async fn canonical_article_is_unchanged() {
        let mut wiki = MockWiki::default();
        wiki.add_page(&site(), "Douglas Adams", MockPage::default());
        let article = ArticleRef::new(site(), "Douglas Adams");
        let once = resolve_redirect(&wiki, &article).await.unwrap();
        assert_eq!(once, article);
        let twice = resolve_redirect(&wiki, &once).await.unwrap();
        assert_eq!(twice, once);
    }
}
