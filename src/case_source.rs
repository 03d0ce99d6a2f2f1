use crate::article::Site;
use crate::case_list::CaseList;
use crate::input_table::InputTable;
use crate::wiki_client::WikiClient;
use crate::wikidata::SitelinkSource;
use anyhow::Result;
use async_trait::async_trait;

/// What a case source needs to do its lookups
pub struct CaseContext<'a> {
    pub site: &'a Site,
    pub wiki: &'a dyn WikiClient,
    pub sitelinks: &'a dyn SitelinkSource,
    pub show_progress: bool,
}

/// The cases of a selection, plus the input table for file selections.
#[derive(Debug, Clone, Default)]
pub struct CaseSelection {
    pub cases: CaseList,
    pub input: Option<InputTable>,
}

impl CaseSelection {
    pub const fn new(cases: CaseList) -> Self {
        Self { cases, input: None }
    }

    pub fn with_input(cases: CaseList, input: InputTable) -> Self {
        Self {
            cases,
            input: Some(input),
        }
    }
}

#[async_trait]
pub trait CaseSource: Send + Sync {
    fn name(&self) -> String;
    async fn run(&self, context: &CaseContext<'_>) -> Result<CaseSelection>;
}
