//! Pure functions over a list-table column tree: header geometry for
//! rendering clients and row-shape validation for persisted answers.

use serde_json::Value;

use super::types::{LeafKind, TableColumn};

impl TableColumn {
    /// Number of leaf descendants; the column-span of this header cell.
    pub fn leaf_count(&self) -> usize {
        match self {
            TableColumn::Leaf { .. } => 1,
            TableColumn::Nested { columns, .. } => columns.iter().map(|c| c.leaf_count()).sum(),
        }
    }

    /// Depth of this column's subtree (a leaf is depth 1).
    pub fn depth(&self) -> usize {
        match self {
            TableColumn::Leaf { .. } => 1,
            TableColumn::Nested { columns, .. } => 1 + max_depth(columns),
        }
    }
}

/// Maximum nesting depth across a column list; the header row count.
pub fn max_depth(columns: &[TableColumn]) -> usize {
    columns.iter().map(|c| c.depth()).max().unwrap_or(0)
}

/// One rendered header cell.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HeaderCell {
    pub name: String,
    pub colspan: usize,
    pub rowspan: usize,
}

/// Header grid for a column tree, one Vec per header row. A leaf at the top
/// level spans all header rows; a nested column spans its leaf count and
/// pushes its children onto the next row. Stable under column reordering:
/// geometry depends only on each column's own subtree.
pub fn header_rows(columns: &[TableColumn]) -> Vec<Vec<HeaderCell>> {
    let depth = max_depth(columns);
    let mut rows: Vec<Vec<HeaderCell>> = vec![Vec::new(); depth];
    fill_header_rows(columns, depth, 0, &mut rows);
    rows
}

fn fill_header_rows(
    columns: &[TableColumn],
    total_depth: usize,
    level: usize,
    rows: &mut Vec<Vec<HeaderCell>>,
) {
    for col in columns {
        match col {
            TableColumn::Leaf { name, .. } => {
                rows[level].push(HeaderCell {
                    name: name.clone(),
                    colspan: 1,
                    rowspan: total_depth - level,
                });
            }
            TableColumn::Nested { name, columns } => {
                rows[level].push(HeaderCell {
                    name: name.clone(),
                    colspan: col.leaf_count(),
                    rowspan: 1,
                });
                fill_header_rows(columns, total_depth, level + 1, rows);
            }
        }
    }
}

/// A fresh row object for a column tree: every leaf keyed by name with its
/// neutral value, nested columns as sub-objects built the same way.
pub fn empty_row(columns: &[TableColumn]) -> Value {
    let mut row = serde_json::Map::new();
    for col in columns {
        let cell = match col {
            TableColumn::Leaf { kind, .. } => match kind {
                LeafKind::Text => Value::String(String::new()),
                LeafKind::Number => Value::Null,
                LeafKind::Boolean => Value::Bool(false),
                LeafKind::Select(_) => Value::Null,
            },
            TableColumn::Nested { columns, .. } => empty_row(columns),
        };
        row.insert(col.name().to_string(), cell);
    }
    Value::Object(row)
}

/// Check one row object against the column tree: every column present,
/// no unknown keys, each cell of its column's type.
pub fn validate_row(columns: &[TableColumn], row: &Value) -> Result<(), String> {
    let Some(obj) = row.as_object() else {
        return Err("Row must be a JSON object keyed by column name".to_string());
    };

    for key in obj.keys() {
        if !columns.iter().any(|c| c.name() == key) {
            return Err(format!("Row contains unknown column '{key}'"));
        }
    }

    for col in columns {
        let Some(cell) = obj.get(col.name()) else {
            return Err(format!("Row is missing column '{}'", col.name()));
        };
        match col {
            TableColumn::Leaf { name, kind } => validate_cell(name, kind, cell)?,
            TableColumn::Nested { columns, .. } => validate_row(columns, cell)?,
        }
    }
    Ok(())
}

fn validate_cell(name: &str, kind: &LeafKind, cell: &Value) -> Result<(), String> {
    // Null cells are allowed everywhere: an untouched input.
    if cell.is_null() {
        return Ok(());
    }
    match kind {
        LeafKind::Text => {
            if !cell.is_string() {
                return Err(format!("Column '{name}' expects a string"));
            }
        }
        LeafKind::Number => {
            if !cell.is_number() {
                return Err(format!("Column '{name}' expects a number"));
            }
        }
        LeafKind::Boolean => {
            if !cell.is_boolean() {
                return Err(format!("Column '{name}' expects a boolean"));
            }
        }
        LeafKind::Select(options) => {
            let Some(s) = cell.as_str() else {
                return Err(format!("Column '{name}' expects one of its options"));
            };
            if !options.iter().any(|o| o == s) {
                return Err(format!("'{s}' is not an option of column '{name}'"));
            }
        }
    }
    Ok(())
}

/// Validate a full list_table answer: an array of row objects.
pub fn validate_rows(columns: &[TableColumn], answer: &Value) -> Result<(), String> {
    let Some(rows) = answer.as_array() else {
        return Err("list_table answer must be an array of rows".to_string());
    };
    for (i, row) in rows.iter().enumerate() {
        validate_row(columns, row).map_err(|e| format!("Row {}: {e}", i + 1))?;
    }
    Ok(())
}
