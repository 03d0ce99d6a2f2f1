use crate::case_list::CaseList;
use crate::page_stats::{PageStatsCollector, StatsRecord};
use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use tracing::info;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A progress bar on stderr, or a hidden one if `visible` is false.
pub fn progress_bar(len: usize, description: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style =
        ProgressStyle::with_template("{prefix}: {wide_bar} {pos}/{len} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len as u64)
        .with_style(style)
        .with_prefix(description.to_string())
}

/// Result for one case; `stats` is `None` for cases without an article.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRow {
    pub selection_case: String,
    pub timestamp: DateTime<Utc>,
    pub stats: Option<StatsRecord>,
}

impl CaseRow {
    pub fn new(label: &str, stats: Option<StatsRecord>) -> Self {
        Self {
            selection_case: label.to_string(),
            timestamp: Utc::now().trunc_subsecs(0),
            stats,
        }
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

//________________________________________________________________________________________________________________________

pub struct BatchRunner<'a> {
    collector: PageStatsCollector<'a>,
    show_progress: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(collector: PageStatsCollector<'a>, show_progress: bool) -> Self {
        Self {
            collector,
            show_progress,
        }
    }

    pub fn pageview_days(&self) -> u32 {
        self.collector.pageview_days()
    }

    /// One row per case, in case order. The first failure aborts the whole batch.
    pub async fn run(&self, cases: &CaseList) -> Result<Vec<CaseRow>> {
        let bar = progress_bar(cases.len(), "Getting page stats", self.show_progress);
        let mut rows = Vec::with_capacity(cases.len());
        for case in cases.iter().progress_with(bar.clone()) {
            let stats = match &case.article {
                Some(article) => {
                    bar.set_message(article.title().to_string());
                    Some(self.collector.collect(article).await?)
                }
                None => None,
            };
            rows.push(CaseRow::new(&case.label, stats));
        }
        bar.finish_and_clear();
        info!("Collected stats for {} cases", rows.len());
        Ok(rows)
    }
}
