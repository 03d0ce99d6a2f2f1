use crate::article::Site;
use crate::batch::BatchRunner;
use crate::case_list::SelectionMethod;
use crate::case_source::{CaseContext, CaseSource};
use crate::case_source_category::SourceCategory;
use crate::case_source_file::SourceFile;
use crate::case_source_langlinks::SourceLanglinks;
use crate::error::ValidationError;
use crate::page_stats::PageStatsCollector;
use crate::pageviews::{LegacyPageviews, PageviewApi, PageviewSource, RestPageviews};
use crate::report::{assemble, join_input, ReportTable};
use crate::settings::Settings;
use crate::wiki_client::{MediaWikiClient, WikiClient};
use crate::wikidata::{SitelinkSource, WikidataSitelinks};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runs one selection end to end: cases, page stats, report table.
pub struct WikiMetrix {
    settings: Settings,
    wiki: Arc<dyn WikiClient>,
    pageviews: Arc<dyn PageviewSource>,
    sitelinks: Arc<dyn SitelinkSource>,
}

impl WikiMetrix {
    pub fn new(
        settings: Settings,
        wiki: Arc<dyn WikiClient>,
        pageviews: Arc<dyn PageviewSource>,
        sitelinks: Arc<dyn SitelinkSource>,
    ) -> Self {
        Self {
            settings,
            wiki,
            pageviews,
            sitelinks,
        }
    }

    /// Live clients for all upstream services, as configured
    pub fn new_from_settings(settings: Settings) -> Result<Self> {
        let user_agent = settings.user_agent.to_owned();
        let days = settings.pageview_days();
        let wiki: Arc<dyn WikiClient> = Arc::new(MediaWikiClient::new(&user_agent));
        let pageviews: Arc<dyn PageviewSource> = match settings.pageview_api {
            PageviewApi::Rest => Arc::new(RestPageviews::new(
                &user_agent,
                &settings.pageviews_rest_url,
                days,
            )?),
            PageviewApi::Legacy => Arc::new(LegacyPageviews::new(wiki.clone(), days)),
        };
        let sitelinks = Arc::new(WikidataSitelinks::new(
            &user_agent,
            &settings.wikidata_rest_url,
        )?);
        Ok(Self::new(settings, wiki, pageviews, sitelinks))
    }

    pub fn site(&self) -> Site {
        Site::new(&self.settings.lang, &self.settings.site)
    }

    fn case_source(&self, method: SelectionMethod, selection: &str) -> Box<dyn CaseSource> {
        match method {
            SelectionMethod::Category => Box::new(SourceCategory::new(
                selection,
                self.settings.recurse_categories,
            )),
            SelectionMethod::Langlinks => Box::new(SourceLanglinks::new(selection)),
            SelectionMethod::File => Box::new(SourceFile::new(
                PathBuf::from(selection),
                &self.settings.input_column,
            )),
        }
    }

    /// Validates the selection, builds the cases, collects stats for each case
    /// and assembles the report. File selections are joined back onto the input.
    pub async fn run(&self, method: &str, selection: &str) -> Result<ReportTable> {
        let method: SelectionMethod = method.parse()?;
        if selection.trim().is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        let site = self.site();

        let source = self.case_source(method, selection);
        let context = CaseContext {
            site: &site,
            wiki: self.wiki.as_ref(),
            sitelinks: self.sitelinks.as_ref(),
            show_progress: self.settings.show_progress,
        };
        let case_selection = source.run(&context).await?;
        if case_selection.cases.is_empty() {
            return Err(ValidationError::NoCases.into());
        }
        info!(
            "{} cases from {} selection {selection}",
            case_selection.cases.len(),
            source.name()
        );

        let collector = PageStatsCollector::new(self.wiki.as_ref(), self.pageviews.as_ref());
        let runner = BatchRunner::new(collector, self.settings.show_progress);
        let rows = runner.run(&case_selection.cases).await?;
        let report = assemble(&rows, method, selection, runner.pageview_days())?;

        match &case_selection.input {
            Some(input) => join_input(input, &self.settings.input_column, &report),
            None => Ok(report),
        }
    }
}
