//! Statement execution against the active server session.
//!
//! A single statement per call. The statement is prepared first; the
//! prepared metadata decides the outcome shape. Statements that report
//! columns are fetched eagerly into a [`TableResult`], everything else
//! runs through `execute` and yields only an affected-row count. The two
//! outcomes are mutually exclusive.

use crate::error::DorsalError;
use crate::models::{Cell, QueryOutcome, TableResult};

use std::time::Instant;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row};

/// Service for executing single SQL statements.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute one statement with no parameters.
    pub async fn execute(client: &Client, sql: &str) -> Result<QueryOutcome, DorsalError> {
        Self::execute_with_params(client, sql, &[]).await
    }

    /// Execute one parameterized statement ($1, $2, ... placeholders).
    ///
    /// Engine errors pass through verbatim with their SQLSTATE preserved.
    pub async fn execute_with_params(
        client: &Client,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<QueryOutcome, DorsalError> {
        let start = Instant::now();
        let stmt = client.prepare(sql).await?;

        // No result descriptor: this is a mutation or DDL.
        if stmt.columns().is_empty() {
            let rows_affected = client.execute(&stmt, params).await?;
            tracing::debug!(
                rows_affected,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Statement executed"
            );
            return Ok(QueryOutcome::Mutation { rows_affected });
        }

        let columns: Vec<String> =
            stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let rows = client.query(&stmt, params).await?;
        let decoded: Vec<Vec<Cell>> = rows.iter().map(decode_row).collect();

        tracing::debug!(
            row_count = decoded.len(),
            column_count = columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query returned rows"
        );

        Ok(QueryOutcome::Table(TableResult { columns, rows: decoded }))
    }
}

fn decode_row(row: &Row) -> Vec<Cell> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

/// Decode one cell by the column's type name, with a textual fallback.
///
/// Types outside the dispatch table are read as text; a value that cannot
/// be read at all renders as a `<type>` placeholder rather than failing
/// the whole result.
fn decode_cell(row: &Row, idx: usize) -> Cell {
    let type_name = row.columns()[idx].type_().name();

    let decoded: Result<Option<Cell>, tokio_postgres::Error> = match type_name {
        "bool" => row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Cell::Bool)),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|n| Cell::Int(n as i64))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|n| Cell::Int(n as i64))),
        "int8" => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Cell::Int)),
        "oid" => row
            .try_get::<_, Option<u32>>(idx)
            .map(|v| v.map(|n| Cell::Int(n as i64))),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|n| Cell::Float(n as f64))),
        "float8" => row.try_get::<_, Option<f64>>(idx).map(|v| v.map(Cell::Float)),
        "text" | "varchar" | "bpchar" | "name" | "unknown" => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(Cell::Text)),
        "timestamptz" => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(|v| v.map(|t| Cell::Text(t.to_rfc3339()))),
        "timestamp" => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map(|v| v.map(|t| Cell::Text(t.to_string()))),
        "date" => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map(|v| v.map(|d| Cell::Text(d.to_string()))),
        "time" => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .map(|v| v.map(|t| Cell::Text(t.to_string()))),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map(|v| v.map(|j| Cell::Text(j.to_string()))),
        _ => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(Cell::Text)),
    };

    match decoded {
        Ok(Some(cell)) => cell,
        Ok(None) => Cell::Null,
        Err(_) => Cell::Text(format!("<{type_name}>")),
    }
}
