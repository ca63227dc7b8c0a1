use std::collections::HashMap;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("selected output has no header line")]
    MissingHeader,
    #[error("selected output has no data rows; check the SELECTED_OUTPUT block")]
    NoRows,
    #[error("selected output row {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// One cell of the selected output table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    fn parse(cell: &str) -> Self {
        match cell.parse::<f64>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(cell.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Number(_) => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(number) if number.is_finite() => serializer.serialize_f64(*number),
            Value::Number(_) => serializer.serialize_none(),
            Value::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// One row of the table, addressable by column heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: HashMap<String, Value>,
}

impl Row {
    pub fn get(&self, heading: &str) -> Option<&Value> {
        self.cells.get(heading)
    }

    pub fn number(&self, heading: &str) -> Option<f64> {
        self.get(heading).and_then(Value::as_number)
    }

    pub fn text(&self, heading: &str) -> Option<&str> {
        self.get(heading).and_then(Value::as_text)
    }
}

/// Parsed PHREEQC selected output.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedOutput {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl SelectedOutput {
    /// Parses the tab separated table PHREEQC writes. Cells are padded with
    /// spaces and lines may carry a trailing tab.
    pub fn parse(text: &str) -> Result<Self, OutputError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header_line) = lines.next().ok_or(OutputError::MissingHeader)?;
        let headers: Vec<String> = split_cells(header_line).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (index, line) in lines {
            let row: Vec<Value> = split_cells(line).map(Value::parse).collect();
            if row.len() != headers.len() {
                return Err(OutputError::RaggedRow {
                    line: index + 1,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(OutputError::NoRows);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|cells| Row {
            cells: self
                .headers
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        })
    }

    /// Raw cell grid in header order.
    pub fn cells(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.split('\t').map(str::trim).filter(|cell| !cell.is_empty())
}
