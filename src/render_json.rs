use crate::render::Render;
use crate::report::ReportTable;
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

/// Renders JSON, one object per row with keys in column order
#[derive(Clone, Copy, Debug)]
pub struct RenderJSON;

impl Render for RenderJSON {
    fn render(&self, table: &ReportTable) -> Result<String> {
        let value = Self::generate_json(table);
        match ::serde_json::to_string(&value) {
            Ok(o) => Ok(o + "\n"),
            Err(e) => Err(anyhow!("JSON encoding failed: {e}")),
        }
    }
}

impl RenderJSON {
    pub fn new() -> Box<Self> {
        Box::new(Self {})
    }

    pub fn generate_json(table: &ReportTable) -> Value {
        let records = table
            .rows()
            .iter()
            .map(|row| {
                let record: Map<String, Value> = table
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.to_owned(), cell.to_json()))
                    .collect();
                Value::Object(record)
            })
            .collect();
        Value::Array(records)
    }
}
