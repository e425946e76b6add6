//! Side-by-side comparison of selected results

use crate::data::ResultItem;
use serde::Serialize;
use serde_json::Value;

/// One selected result with a value per compared field
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonRow {
    pub id: String,
    /// Values in field order; `None` when the result lacks the field
    pub values: Vec<Option<Value>>,
}

/// Summary of a numeric column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldSummary {
    pub field: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Selected results compared on a set of fields
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonTable {
    pub fields: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Resolve every field against every result
    pub fn build<'a>(results: impl IntoIterator<Item = &'a ResultItem>, fields: &[String]) -> Self {
        let rows = results
            .into_iter()
            .map(|result| {
                let document = result.document();
                ComparisonRow {
                    id: result.id.clone(),
                    values: fields
                        .iter()
                        .map(|field| crate::data::lookup_path(&document, field).cloned())
                        .collect(),
                }
            })
            .collect();

        Self {
            fields: fields.to_vec(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.fields.is_empty()
    }

    /// Min/max/mean of each field whose present values are all numeric
    pub fn summaries(&self) -> Vec<FieldSummary> {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(column, field)| {
                let present: Vec<&Value> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.values.get(column).and_then(Option::as_ref))
                    .collect();
                let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
                if numbers.is_empty() || numbers.len() != present.len() {
                    return None;
                }

                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                Some(FieldSummary {
                    field: field.clone(),
                    count: numbers.len(),
                    min,
                    max,
                    mean,
                })
            })
            .collect()
    }

    /// Markdown table of the comparison
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No results selected for comparison.".to_string();
        }

        let mut lines = Vec::new();
        lines.push(format!("| Result | {} |", self.fields.join(" | ")));
        lines.push(format!("|--------|{}", "---------|".repeat(self.fields.len())));

        for row in &self.rows {
            let cells: Vec<String> = row.values.iter().map(|v| format_cell(v.as_ref())).collect();
            lines.push(format!("| {} | {} |", row.id, cells.join(" | ")));
        }

        let summaries = self.summaries();
        if !summaries.is_empty() {
            lines.push(String::new());
            for s in summaries {
                lines.push(format!(
                    "- **{}**: min {:.2}, max {:.2}, mean {:.2} ({} results)",
                    s.field, s.min, s.max, s.mean, s.count
                ));
            }
        }

        lines.join("\n")
    }
}

/// Render a JSON value for a table cell
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
