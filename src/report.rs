use crate::batch::{CaseRow, TIMESTAMP_FORMAT};
use crate::case_list::SelectionMethod;
use crate::input_table::InputTable;
use crate::page_stats::StatsRecord;
use crate::wikidata::is_item_id;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata columns, always the last columns of a report, in this order
pub const META_COLUMNS: [&str; 5] = [
    "label",
    "timestamp",
    "selection_method",
    "selection",
    "selection_case",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Integer(u64),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Plain-text rendering; null is the empty string.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.to_owned(),
            Self::Integer(i) => i.to_string(),
            Self::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(i) => Value::from(*i),
            other => Value::String(other.render()),
        }
    }
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: vec![],
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(anyhow!(
                "Row has {} cells but the table has {} columns",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

//________________________________________________________________________________________________________________________

/// `Q42/Douglas Adams` for Wikidata items, the case label otherwise
pub fn display_label(selection_case: &str, title: Option<&str>) -> Cell {
    if is_item_id(selection_case) {
        match title {
            Some(title) => Cell::Text(format!("{selection_case}/{title}")),
            None => Cell::Null,
        }
    } else {
        Cell::text(selection_case)
    }
}

/// Builds the report from the batch rows: stats columns first (if any case had
/// stats), then [`META_COLUMNS`].
pub fn assemble(
    rows: &[CaseRow],
    method: SelectionMethod,
    selection: &str,
    pageview_days: u32,
) -> Result<ReportTable> {
    let with_stats = rows.iter().any(|row| row.stats.is_some());
    let stats_columns = if with_stats {
        StatsRecord::column_names(pageview_days)
    } else {
        vec![]
    };
    let mut columns = stats_columns.to_owned();
    columns.extend(META_COLUMNS.iter().map(|c| c.to_string()));
    let mut table = ReportTable::new(columns);

    for row in rows {
        let mut cells = match (&row.stats, with_stats) {
            (Some(stats), _) => stats.cells(),
            (None, true) => vec![Cell::Null; stats_columns.len()],
            (None, false) => vec![],
        };
        let title = row.stats.as_ref().map(|s| s.title.as_str());
        cells.push(display_label(&row.selection_case, title));
        cells.push(Cell::Text(row.timestamp_string()));
        cells.push(Cell::text(method.as_str()));
        cells.push(Cell::text(selection));
        cells.push(Cell::text(&row.selection_case));
        table.push_row(cells)?;
    }
    Ok(table)
}

/// Left join of `input` with the assembled `stats` on
/// `input[input_column] == stats.selection_case`. Input rows keep their order;
/// unmatched rows get null stats and metadata.
pub fn join_input(
    input: &InputTable,
    input_column: &str,
    stats: &ReportTable,
) -> Result<ReportTable> {
    let key_idx = input.column_index(input_column)?;
    let case_idx = stats
        .column_index("selection_case")
        .ok_or_else(|| anyhow!("Stats table has no selection_case column"))?;

    let stats_columns: Vec<(usize, &String)> = stats
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !META_COLUMNS.contains(&c.as_str()))
        .collect();
    let meta_columns: Vec<usize> = META_COLUMNS
        .iter()
        .filter_map(|c| stats.column_index(c))
        .collect();

    let mut columns: Vec<String> = input
        .headers()
        .iter()
        .map(|h| match META_COLUMNS.contains(&h.as_str()) {
            true => format!("{h}_input"),
            false => h.to_owned(),
        })
        .collect();
    for (_, name) in &stats_columns {
        if input.headers().contains(*name) {
            columns.push(format!("{name}_right"));
        } else {
            columns.push(name.to_string());
        }
    }
    columns.extend(META_COLUMNS.iter().map(|c| c.to_string()));

    let mut by_case: HashMap<&str, &Vec<Cell>> = HashMap::new();
    for row in stats.rows() {
        if let Some(case) = row[case_idx].as_str() {
            by_case.entry(case).or_insert(row);
        }
    }

    let mut table = ReportTable::new(columns);
    for input_row in input.rows() {
        let key = input_row[key_idx].as_str();
        let matched = by_case.get(key);
        let mut cells: Vec<Cell> = input_row.iter().map(|v| Cell::text(v)).collect();
        for (idx, _) in &stats_columns {
            cells.push(matched.map_or(Cell::Null, |row| row[*idx].to_owned()));
        }
        for idx in &meta_columns {
            if *idx == case_idx {
                cells.push(Cell::text(key));
            } else {
                cells.push(matched.map_or(Cell::Null, |row| row[*idx].to_owned()));
            }
        }
        table.push_row(cells)?;
    }
    Ok(table)
}
