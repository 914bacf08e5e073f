//! IT ticket repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;

use super::{delete_row, group_counts, update_column};
use crate::{
    error::RecordsResult,
    models::{
        FieldValue, GroupCount,
        ticket::{ItTicket, NewTicket, TicketField},
    },
};

const TABLE: &str = "it_tickets";

/// IT ticket repository
#[derive(Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

fn ticket_from_row(row: &SqliteRow) -> DatabaseResult<ItTicket> {
    Ok(ItTicket {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        ticket_id: row.try_get("ticket_id").map_err(DatabaseError::Query)?,
        priority: row.try_get("priority").map_err(DatabaseError::Query)?,
        status: row.try_get("status").map_err(DatabaseError::Query)?,
        category: row.try_get("category").map_err(DatabaseError::Query)?,
        subject: row.try_get("subject").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        created_date: row.try_get("created_date").map_err(DatabaseError::Query)?,
        resolved_date: row.try_get("resolved_date").map_err(DatabaseError::Query)?,
        assigned_to: row.try_get("assigned_to").map_err(DatabaseError::Query)?,
    })
}

impl TicketRepository {
    /// Create a new ticket repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a ticket and return its row id
    ///
    /// A reused `ticket_id` surfaces as [`DatabaseError::UniqueViolation`].
    pub async fn insert(&self, ticket: &NewTicket) -> DatabaseResult<i64> {
        info!("Inserting ticket: {}", ticket.ticket_id);

        let result = sqlx::query(
            r#"
            INSERT INTO it_tickets
                (ticket_id, priority, status, category, subject, description,
                 created_date, resolved_date, assigned_to)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ticket.ticket_id)
        .bind(&ticket.priority)
        .bind(&ticket.status)
        .bind(&ticket.category)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(&ticket.created_date)
        .bind(&ticket.resolved_date)
        .bind(&ticket.assigned_to)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_all(&self) -> DatabaseResult<Vec<ItTicket>> {
        let rows = sqlx::query(
            r#"
            SELECT id, ticket_id, priority, status, category, subject, description,
                   created_date, resolved_date, assigned_to
            FROM it_tickets
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(ticket_from_row).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> DatabaseResult<Option<ItTicket>> {
        let row = sqlx::query(
            r#"
            SELECT id, ticket_id, priority, status, category, subject, description,
                   created_date, resolved_date, assigned_to
            FROM it_tickets
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    /// Tickets with exactly this status
    pub async fn filter_by_status(&self, status: &str) -> DatabaseResult<Vec<ItTicket>> {
        info!("Filtering tickets by status: {}", status);

        let rows = sqlx::query(
            r#"
            SELECT id, ticket_id, priority, status, category, subject, description,
                   created_date, resolved_date, assigned_to
            FROM it_tickets
            WHERE status = ?
            ORDER BY id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(ticket_from_row).collect()
    }

    pub async fn update_field(
        &self,
        id: i64,
        field: TicketField,
        value: &FieldValue,
    ) -> RecordsResult<u64> {
        update_column(&self.pool, TABLE, id, field, value).await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> RecordsResult<u64> {
        self.update_field(id, TicketField::Status, &FieldValue::Text(status.to_string()))
            .await
    }

    pub async fn delete_by_id(&self, id: i64) -> DatabaseResult<u64> {
        delete_row(&self.pool, TABLE, id).await
    }

    /// Number of tickets per category
    pub async fn count_by_category(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT category AS label, COUNT(*) AS count
            FROM it_tickets
            GROUP BY category
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }

    /// Number of tickets per status
    pub async fn count_by_status(&self) -> DatabaseResult<Vec<GroupCount>> {
        let rows = sqlx::query(
            r#"
            SELECT status AS label, COUNT(*) AS count
            FROM it_tickets
            GROUP BY status
            ORDER BY count DESC, label
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        group_counts(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordsError;
    use common::database::memory_pool;

    fn ticket(ticket_id: &str, status: &str, category: &str) -> NewTicket {
        NewTicket {
            ticket_id: ticket_id.to_string(),
            priority: Some("Medium".to_string()),
            status: Some(status.to_string()),
            category: Some(category.to_string()),
            subject: format!("Issue {}", ticket_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ticket_id_is_unique() {
        let repo = TicketRepository::new(memory_pool().await.unwrap());
        repo.insert(&ticket("T-1", "Open", "Network")).await.unwrap();

        let err = repo
            .insert(&ticket("T-1", "Open", "Network"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_status_filter_and_update() {
        let repo = TicketRepository::new(memory_pool().await.unwrap());
        let first = repo.insert(&ticket("T-1", "Open", "Network")).await.unwrap();
        repo.insert(&ticket("T-2", "Closed", "Hardware")).await.unwrap();
        repo.insert(&ticket("T-3", "Open", "Network")).await.unwrap();

        assert_eq!(repo.filter_by_status("Open").await.unwrap().len(), 2);
        assert_eq!(repo.update_status(first, "Closed").await.unwrap(), 1);
        assert_eq!(repo.filter_by_status("Open").await.unwrap().len(), 1);

        assert_eq!(
            repo.count_by_status().await.unwrap(),
            vec![
                GroupCount {
                    label: Some("Closed".to_string()),
                    count: 2
                },
                GroupCount {
                    label: Some("Open".to_string()),
                    count: 1
                },
            ]
        );
        assert_eq!(repo.count_by_category().await.unwrap()[0].count, 2);
    }

    #[tokio::test]
    async fn test_subject_cannot_be_nulled() {
        let repo = TicketRepository::new(memory_pool().await.unwrap());
        let id = repo.insert(&ticket("T-1", "Open", "Network")).await.unwrap();

        let err = repo
            .update_field(id, TicketField::Subject, &FieldValue::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordsError::BadRequest(_)));

        assert_eq!(
            repo.update_field(id, TicketField::AssignedTo, &FieldValue::Text("Dana".into()))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.get_by_id(id).await.unwrap().unwrap().assigned_to.as_deref(),
            Some("Dana")
        );
        assert_eq!(repo.delete_by_id(id).await.unwrap(), 1);
    }
}
