use crate::article::ArticleRef;
use crate::case_list::CaseList;
use crate::case_source::{CaseContext, CaseSelection, CaseSource};
use crate::error::ValidationError;
use crate::input_table::InputTable;
use crate::wikidata::{all_entity_urls, all_item_ids, resolve_item_titles, strip_entity_url};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Cases from one column of a tab-separated file. The column holds either page
/// titles or Wikidata items (`Q42` or entity URLs).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    path: PathBuf,
    input_column: String,
}

#[async_trait]
impl CaseSource for SourceFile {
    fn name(&self) -> String {
        "file".to_string()
    }

    async fn run(&self, context: &CaseContext<'_>) -> Result<CaseSelection> {
        let table = InputTable::from_path(&self.path)?;
        self.cases_from_table(table, context).await
    }
}

impl SourceFile {
    pub fn new(path: PathBuf, input_column: &str) -> Self {
        Self {
            path,
            input_column: input_column.to_string(),
        }
    }

    pub async fn cases_from_table(
        &self,
        mut table: InputTable,
        context: &CaseContext<'_>,
    ) -> Result<CaseSelection> {
        if all_entity_urls(table.column(&self.input_column)?) {
            table.map_column(&self.input_column, strip_entity_url)?;
        }
        if table.is_empty() {
            return Err(ValidationError::NoCases.into());
        }
        let values: Vec<String> = table
            .column(&self.input_column)?
            .into_iter()
            .map(|v| v.to_string())
            .collect();
        info!(
            "{} values in column {} of {}",
            table.len(),
            self.input_column,
            table.name()
        );

        let mut cases = CaseList::new();
        if all_item_ids(values.iter().map(|v| v.as_str())) {
            let titles =
                resolve_item_titles(context.sitelinks, &values, context.site, context.show_progress)
                    .await?;
            for (item, title) in values.iter().zip(titles) {
                let article = title.map(|t| ArticleRef::new(context.site.to_owned(), &t));
                cases.insert(item, article);
            }
        } else {
            for title in &values {
                let article = ArticleRef::new(context.site.to_owned(), title);
                cases.insert(title, Some(article));
            }
        }
        Ok(CaseSelection::with_input(cases, table))
    }
}
