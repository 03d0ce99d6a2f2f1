use crate::render::Render;
use crate::report::ReportTable;
use anyhow::{anyhow, Result};
use csv::{QuoteStyle, WriterBuilder};

/// Renders CSV and TSV
#[derive(Debug, Clone)]
pub struct RenderTSV {
    separator: String,
}

impl Render for RenderTSV {
    fn render(&self, table: &ReportTable) -> Result<String> {
        let delimiter = self.separator.bytes().next().unwrap_or(b'\t');
        let quote_style = match delimiter {
            b'\t' => QuoteStyle::Never,
            _ => QuoteStyle::Necessary,
        };
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(quote_style)
            .from_writer(vec![]);

        writer.write_record(table.columns().iter().map(|c| self.escape_cell(c)))?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| self.escape_cell(&cell.render())))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Writing {} failed: {e}", self.format_name()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl RenderTSV {
    pub fn new(separator: &str) -> Box<Self> {
        Box::new(Self {
            separator: separator.to_string(),
        })
    }

    fn format_name(&self) -> &str {
        match self.separator.as_str() {
            "," => "CSV",
            _ => "TSV",
        }
    }

    /// TSV has no quoting, so separators and line breaks inside a cell become spaces
    fn escape_cell(&self, s: &str) -> String {
        if self.separator == "," {
            s.to_string()
        } else {
            s.replace(['\t', '\n', '\r'], " ")
        }
    }
}
