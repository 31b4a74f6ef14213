//! Query result models.

use serde::{Deserialize, Serialize};

/// A single result cell, decoded from the wire into a display-ready value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// SQL NULL
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Check if this cell is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A tabular query result: ordered column names plus row data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableResult {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Row data; each row has one cell per column.
    pub rows: Vec<Vec<Cell>>,
}

impl TableResult {
    /// Get the number of rows returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the values of a single column, by name.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Outcome of executing a single statement.
///
/// The two variants are mutually exclusive: statements that report a result
/// descriptor yield `Table`, everything else yields `Mutation` with only the
/// affected-row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryOutcome {
    /// The statement produced a result set.
    Table(TableResult),
    /// The statement mutated data; only the affected-row count is known.
    Mutation {
        /// Rows inserted, updated, or deleted.
        rows_affected: u64,
    },
}

impl QueryOutcome {
    /// Get the tabular result, if this outcome has one.
    pub fn as_table(&self) -> Option<&TableResult> {
        match self {
            Self::Table(table) => Some(table),
            Self::Mutation { .. } => None,
        }
    }

    /// Get the affected-row count, if this outcome is a mutation.
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Table(_) => None,
            Self::Mutation { rows_affected } => Some(*rows_affected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Null.to_string(), "NULL");
        assert_eq!(Cell::Bool(true).to_string(), "true");
        assert_eq!(Cell::Int(-7).to_string(), "-7");
        assert_eq!(Cell::Text("abc".into()).to_string(), "abc");
    }

    #[test]
    fn outcome_variants_are_exclusive() {
        let table = QueryOutcome::Table(TableResult {
            columns: vec!["id".into()],
            rows: vec![vec![Cell::Int(1)]],
        });
        assert!(table.as_table().is_some());
        assert_eq!(table.rows_affected(), None);

        let mutation = QueryOutcome::Mutation { rows_affected: 3 };
        assert!(mutation.as_table().is_none());
        assert_eq!(mutation.rows_affected(), Some(3));
    }

    #[test]
    fn column_values_by_name() {
        let table = TableResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![Cell::Int(1), Cell::Text("a".into())],
                vec![Cell::Int(2), Cell::Text("b".into())],
            ],
        };
        let names = table.column_values("name").unwrap();
        assert_eq!(names, vec![&Cell::Text("a".into()), &Cell::Text("b".into())]);
        assert!(table.column_values("missing").is_none());
    }
}
