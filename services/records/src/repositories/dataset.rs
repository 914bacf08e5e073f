//! Dataset metadata repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;

use super::{delete_row, group_counts, update_column};
use crate::{
    error::RecordsResult,
    models::{
        FieldValue, GroupCount,
        dataset::{Dataset, DatasetField, NewDataset},
    },
};

const TABLE: &str = "datasets_metadata";

/// Dataset metadata repository
#[derive(Clone)]
pub struct DatasetRepository {
    pool: SqlitePool,
}

fn dataset_from_row(row: &SqliteRow) -> DatabaseResult<Dataset> {
    Ok(Dataset {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        dataset_name: row.try_get("dataset_name").map_err(DatabaseError::Query)?,
        category: row.try_get("category").map_err(DatabaseError::Query)?,
        source: row.try_get("source").map_err(DatabaseError::Query)?,
        last_updated: row.try_get("last_updated").map_err(DatabaseError::Query)?,
        record_count: row.try_get("record_count").map_err(DatabaseError::Query)?,
        file_size_mb: row.try_get("file_size_mb").map_err(DatabaseError::Query)?,
    })
}

impl DatasetRepository {
    /// Create a new dataset repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a dataset and return its id
    pub async fn insert(&self, dataset: &NewDataset) -> DatabaseResult<i64> {
        info!("Inserting dataset: {}", dataset.dataset_name);

        let result = sqlx::query(
            r#"
            INSERT INTO datasets_metadata
                (dataset_name, category, source, last_updated, record_count, file_size_mb)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&dataset.dataset_name)
        .bind(&dataset.category)
        .bind(&dataset.source)
        .bind(&dataset.last_updated)
        .bind(dataset.record_count)
        .bind(dataset.file_size_mb)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_all(&self) -> DatabaseResult<Vec<Dataset>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dataset_name, category, source, last_updated, record_count, file_size_mb
            FROM datasets_metadata
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(dataset_from_row).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> DatabaseResult<Option<Dataset>> {
        let row = sqlx::query(
            r#"
            SELECT id, dataset_name, category, source, last_updated, record_count, file_size_mb
            FROM datasets_metadata
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(dataset_from_row).transpose()
    }

    pub async fn update_field(
        &self,
        id: i64,
        field: DatasetField,
        value: &FieldValue,
    ) -> RecordsResult<u64> {
        update_column(&self.pool, TABLE, id, field, value).await
    }

    /// Set the record count of a dataset
    pub async fn update_record_count(&self, id: i64, record_count: i64) -> RecordsResult<u64> {
        self.update_field(id, DatasetField::RecordCount, &FieldValue::Integer(record_count))
            .await
    }

    pub async fn delete_by_id(&self, id: i64) -> DatabaseResult<u64> {
        delete_row(&self.pool, TABLE, id).await
    }

    /// Number of datasets per category
    pub async fn count_by_category(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT category AS label, COUNT(*) AS count
            FROM datasets_metadata
            GROUP BY category
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }

    /// Categories shared by more than one dataset
    pub async fn repeating_categories(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT category AS label, COUNT(*) AS count
            FROM datasets_metadata
            WHERE category IS NOT NULL
            GROUP BY category
            HAVING COUNT(*) > 1
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }
}
