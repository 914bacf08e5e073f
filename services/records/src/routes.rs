//! Records service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use common::{authz::Action, database, session::SessionContext};
use serde_json::json;

use crate::{
    error::{RecordsError, RecordsResult},
    middleware::session_middleware,
    models::{
        MinCountQuery, RecordCountRequest, StatusUpdateRequest, TicketQuery, UpdateFieldRequest,
        dataset::{DatasetField, NewDataset},
        incident::{IncidentDetail, IncidentField, NewIncident},
        ticket::{NewTicket, TicketField},
    },
    state::AppState,
};

pub mod chat;

/// Create the router for the records service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/incidents", get(list_incidents).post(create_incident))
        .route(
            "/incidents/:id",
            get(get_incident)
                .patch(update_incident)
                .delete(delete_incident),
        )
        .route("/incidents/stats/by-type", get(incidents_by_type))
        .route("/incidents/stats/high-severity", get(high_severity_incidents))
        .route("/incidents/stats/many-cases", get(incident_types_with_many_cases))
        .route("/datasets", get(list_datasets).post(create_dataset))
        .route(
            "/datasets/:id",
            get(get_dataset).patch(update_dataset).delete(delete_dataset),
        )
        .route("/datasets/:id/record-count", put(update_record_count))
        .route("/datasets/stats/by-category", get(datasets_by_category))
        .route(
            "/datasets/stats/repeating-categories",
            get(repeating_dataset_categories),
        )
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/tickets/:id",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
        .route("/tickets/:id/status", put(update_ticket_status))
        .route("/tickets/stats/by-category", get(tickets_by_category))
        .route("/tickets/stats/by-status", get(tickets_by_status))
        .route("/assistant/:domain/messages", post(chat::send_message))
        .route(
            "/assistant/:domain/history",
            get(chat::get_history).delete(chat::clear_history),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = database::health_check(&state.db_pool).await.unwrap_or(false);

    Json(json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "service": "records-service",
        "database": database_ok,
        "assistant": state.assistant.is_some(),
        "conversations": state.chats.len().await,
    }))
}

fn require_text(value: &str, name: &str) -> RecordsResult<()> {
    if value.trim().is_empty() {
        return Err(RecordsError::BadRequest(format!("{} is required", name)));
    }
    Ok(())
}

fn found(updated: u64, what: &str, id: i64) -> RecordsResult<u64> {
    if updated == 0 {
        Err(RecordsError::NotFound(format!("{} {}", what, id)))
    } else {
        Ok(updated)
    }
}

// Incidents

pub async fn list_incidents(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.incidents.get_all().await?))
}

pub async fn create_incident(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<NewIncident>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let id = state.incidents.insert(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

pub async fn get_incident(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    let incident = state
        .incidents
        .get_by_id(id)
        .await?
        .ok_or_else(|| RecordsError::NotFound(format!("Incident {}", id)))?;
    Ok(Json(IncidentDetail::from(incident)))
}

pub async fn update_incident(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFieldRequest<IncidentField>>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let updated = state
        .incidents
        .update_field(id, payload.field, &payload.value)
        .await?;
    Ok(Json(json!({"updated": found(updated, "Incident", id)?})))
}

pub async fn delete_incident(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let deleted = state.incidents.delete_by_id(id).await?;
    Ok(Json(json!({"deleted": found(deleted, "Incident", id)?})))
}

pub async fn incidents_by_type(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.incidents.count_by_type().await?))
}

pub async fn high_severity_incidents(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.incidents.high_severity_by_status().await?))
}

pub async fn incident_types_with_many_cases(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<MinCountQuery>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(
        state.incidents.types_with_many_cases(query.min_count).await?,
    ))
}

// Datasets

pub async fn list_datasets(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.datasets.get_all().await?))
}

pub async fn create_dataset(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<NewDataset>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    require_text(&payload.dataset_name, "dataset_name")?;
    let id = state.datasets.insert(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    let dataset = state
        .datasets
        .get_by_id(id)
        .await?
        .ok_or_else(|| RecordsError::NotFound(format!("Dataset {}", id)))?;
    Ok(Json(dataset))
}

pub async fn update_dataset(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFieldRequest<DatasetField>>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let updated = state
        .datasets
        .update_field(id, payload.field, &payload.value)
        .await?;
    Ok(Json(json!({"updated": found(updated, "Dataset", id)?})))
}

pub async fn update_record_count(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordCountRequest>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let updated = state
        .datasets
        .update_record_count(id, payload.record_count)
        .await?;
    Ok(Json(json!({"updated": found(updated, "Dataset", id)?})))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let deleted = state.datasets.delete_by_id(id).await?;
    Ok(Json(json!({"deleted": found(deleted, "Dataset", id)?})))
}

pub async fn datasets_by_category(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.datasets.count_by_category().await?))
}

pub async fn repeating_dataset_categories(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.datasets.repeating_categories().await?))
}

// Tickets

/// All tickets, or those with the given `status`
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<TicketQuery>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    let tickets = match query.status.as_deref() {
        Some(status) => state.tickets.filter_by_status(status).await?,
        None => state.tickets.get_all().await?,
    };
    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(payload): Json<NewTicket>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    require_text(&payload.ticket_id, "ticket_id")?;
    require_text(&payload.subject, "subject")?;
    let id = state.tickets.insert(&payload).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    let ticket = state
        .tickets
        .get_by_id(id)
        .await?
        .ok_or_else(|| RecordsError::NotFound(format!("Ticket {}", id)))?;
    Ok(Json(ticket))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFieldRequest<TicketField>>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let updated = state
        .tickets
        .update_field(id, payload.field, &payload.value)
        .await?;
    Ok(Json(json!({"updated": found(updated, "Ticket", id)?})))
}

pub async fn update_ticket_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    require_text(&payload.status, "status")?;
    let updated = state.tickets.update_status(id, &payload.status).await?;
    Ok(Json(json!({"updated": found(updated, "Ticket", id)?})))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<i64>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::EditRecords)?;
    let deleted = state.tickets.delete_by_id(id).await?;
    Ok(Json(json!({"deleted": found(deleted, "Ticket", id)?})))
}

pub async fn tickets_by_category(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.tickets.count_by_category().await?))
}

pub async fn tickets_by_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::ViewRecords)?;
    Ok(Json(state.tickets.count_by_status().await?))
}
