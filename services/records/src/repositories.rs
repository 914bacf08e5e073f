//! Repositories for the record tables
//!
//! Each repository owns one table. Field updates go through
//! [`update_column`], which only ever interpolates column names taken from a
//! [`RecordField`] enum.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;

use crate::{
    error::{RecordsError, RecordsResult},
    models::{FieldValue, GroupCount, RecordField},
};

pub mod dataset;
pub mod incident;
pub mod ticket;

pub use dataset::DatasetRepository;
pub use incident::IncidentRepository;
pub use ticket::TicketRepository;

/// Set one column of one row, returning the number of rows updated
pub(crate) async fn update_column<F: RecordField>(
    pool: &SqlitePool,
    table: &'static str,
    id: i64,
    field: F,
    value: &FieldValue,
) -> RecordsResult<u64> {
    value.check(field).map_err(RecordsError::BadRequest)?;
    info!("Updating {}.{} for id {}", table, field.column(), id);

    let sql = format!("UPDATE {} SET {} = ? WHERE id = ?", table, field.column());
    let query = sqlx::query(&sql);
    let query = match value {
        FieldValue::Text(text) => query.bind(text.as_str()),
        FieldValue::Integer(number) => query.bind(*number),
        FieldValue::Real(number) => query.bind(*number),
        FieldValue::Null => query.bind(None::<String>),
    };

    let result = query
        .bind(id)
        .execute(pool)
        .await
        .map_err(DatabaseError::from_query)?;

    Ok(result.rows_affected())
}

/// Delete one row by id, returning the number of rows deleted
pub(crate) async fn delete_row(pool: &SqlitePool, table: &'static str, id: i64) -> DatabaseResult<u64> {
    info!("Deleting id {} from {}", id, table);

    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(result.rows_affected())
}

/// Read `label, count` rows of a grouped query
pub(crate) fn group_counts(rows: &[SqliteRow]) -> DatabaseResult<Vec<GroupCount>> {
    rows.iter()
        .map(|row| {
            Ok(GroupCount {
                label: row.try_get("label").map_err(DatabaseError::Query)?,
                count: row.try_get("count").map_err(DatabaseError::Query)?,
            })
        })
        .collect()
}
