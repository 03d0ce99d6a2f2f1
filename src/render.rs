use crate::render_json::RenderJSON;
use crate::render_tsv::RenderTSV;
use crate::report::ReportTable;
use anyhow::Result;

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn renderer(&self) -> Box<dyn Render> {
        match self {
            Self::Tsv => RenderTSV::new("\t"),
            Self::Csv => RenderTSV::new(","),
            Self::Json => RenderJSON::new(),
        }
    }
}

pub trait Render {
    fn render(&self, table: &ReportTable) -> Result<String>;
}
