//! Incident repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;

use super::{delete_row, group_counts, update_column};
use crate::{
    error::RecordsResult,
    models::{
        FieldValue, GroupCount,
        incident::{IncidentField, NewIncident, SecurityIncident},
    },
};

const TABLE: &str = "cyber_incidents";

/// Incident repository for database operations
#[derive(Clone)]
pub struct IncidentRepository {
    pool: SqlitePool,
}

fn incident_from_row(row: &SqliteRow) -> DatabaseResult<SecurityIncident> {
    Ok(SecurityIncident {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        date: row.try_get("date").map_err(DatabaseError::Query)?,
        incident_type: row.try_get("incident_type").map_err(DatabaseError::Query)?,
        severity: row.try_get("severity").map_err(DatabaseError::Query)?,
        status: row.try_get("status").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        reported_by: row.try_get("reported_by").map_err(DatabaseError::Query)?,
    })
}

impl IncidentRepository {
    /// Create a new incident repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an incident and return its id
    pub async fn insert(&self, incident: &NewIncident) -> DatabaseResult<i64> {
        info!("Inserting incident of type {:?}", incident.incident_type);

        let result = sqlx::query(
            r#"
            INSERT INTO cyber_incidents (date, incident_type, severity, status, description, reported_by)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&incident.date)
        .bind(&incident.incident_type)
        .bind(&incident.severity)
        .bind(&incident.status)
        .bind(&incident.description)
        .bind(&incident.reported_by)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.last_insert_rowid())
    }

    /// Get all incidents, newest first
    pub async fn get_all(&self) -> DatabaseResult<Vec<SecurityIncident>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, incident_type, severity, status, description, reported_by
            FROM cyber_incidents
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(incident_from_row).collect()
    }

    /// Get an incident by ID
    pub async fn get_by_id(&self, id: i64) -> DatabaseResult<Option<SecurityIncident>> {
        let row = sqlx::query(
            r#"
            SELECT id, date, incident_type, severity, status, description, reported_by
            FROM cyber_incidents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(incident_from_row).transpose()
    }

    pub async fn update_field(
        &self,
        id: i64,
        field: IncidentField,
        value: &FieldValue,
    ) -> RecordsResult<u64> {
        update_column(&self.pool, TABLE, id, field, value).await
    }

    pub async fn delete_by_id(&self, id: i64) -> DatabaseResult<u64> {
        delete_row(&self.pool, TABLE, id).await
    }

    /// Number of incidents per incident type
    pub async fn count_by_type(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT incident_type AS label, COUNT(*) AS count
            FROM cyber_incidents
            GROUP BY incident_type
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }

    /// Number of high and critical incidents per status
    pub async fn high_severity_by_status(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT status AS label, COUNT(*) AS count
            FROM cyber_incidents
            WHERE LOWER(severity) IN ('high', 'critical')
            GROUP BY status
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }

    /// Incident types with strictly more than `min_count` incidents
    pub async fn types_with_many_cases(&self, min_count: i64) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT incident_type AS label, COUNT(*) AS count
            FROM cyber_incidents
            GROUP BY incident_type
            HAVING COUNT(*) > ?
            ORDER BY count DESC, label
            "#,
        )
        .bind(min_count)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }
}
