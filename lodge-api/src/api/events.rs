//! Event management and attendance endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::extract::{AdminContext, Caller};
use crate::db::events::NewEvent;
use crate::error::{ApiError, ApiResult};
use crate::workflow;
use crate::AppState;
use lodge_common::db::models::{Attendee, Event};
use lodge_common::types::{EventStatus, Zone};
use lodge_common::Tier;

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/upcoming", get(list_upcoming_events))
        .route("/events/status/:status", get(list_events_by_status))
        .route("/events/:id/status", put(update_event_status))
        .route("/events/:id/attendance", post(mark_attendance))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub location: String,
    /// Zone names the event covers, e.g. ["North", "Central"]
    pub zones: Vec<String>,
    /// Tier names admitted to the event
    pub tiers_allowed: Vec<String>,
    /// Entry fee; 0 makes the event free
    pub fee: i64,
    /// Optional initial status, defaults to "upcoming"
    pub status: Option<String>,
}

/// POST /events (admin)
async fn create_event(
    _admin: AdminContext,
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    if req.fee < 0 {
        return Err(ApiError::BadRequest(format!(
            "Fee must not be negative: {}",
            req.fee
        )));
    }
    let zones: Vec<Zone> = parse_name_set(&req.zones, "zones")?;
    let tiers_allowed: Vec<Tier> = parse_name_set(&req.tiers_allowed, "tiers_allowed")?;
    let status: EventStatus = match &req.status {
        Some(text) => text
            .parse()
            .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?,
        None => EventStatus::Upcoming,
    };

    if crate::db::events::upcoming_title_exists(&state.db, title).await? {
        return Err(ApiError::Conflict(format!(
            "An upcoming event titled '{title}' already exists"
        )));
    }

    let new = NewEvent {
        title: title.to_string(),
        location: req.location,
        zones,
        tiers_allowed,
        fee: req.fee,
        status,
    };
    let guid = crate::db::events::insert_event(&state.db, &new).await?;

    info!(event_id = %guid, title, fee = new.fee, "Event created");

    let event = load_event(&state, guid).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events/upcoming (any authenticated caller)
async fn list_upcoming_events(
    _caller: Caller,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = crate::db::events::list_events_by_status(&state.db, EventStatus::Upcoming).await?;
    Ok(Json(events))
}

/// GET /events/status/:status (any authenticated caller)
async fn list_events_by_status(
    _caller: Caller,
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> ApiResult<Json<Vec<Event>>> {
    let status: EventStatus = status
        .parse()
        .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?;
    let events = crate::db::events::list_events_by_status(&state.db, status).await?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventStatusRequest {
    /// "upcoming", "completed" or "cancelled"
    pub status: String,
}

/// PUT /events/:id/status (admin)
async fn update_event_status(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventStatusRequest>,
) -> ApiResult<Json<Event>> {
    let status: EventStatus = req
        .status
        .parse()
        .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?;

    let updated = crate::db::events::set_event_status(&state.db, id, status).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Event {id}")));
    }

    info!(event_id = %id, status = %status, "Event status changed");

    let event = load_event(&state, id).await?;
    Ok(Json(event))
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub member_id: Uuid,
}

/// POST /events/:id/attendance (admin)
async fn mark_attendance(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MarkAttendanceRequest>,
) -> ApiResult<(StatusCode, Json<Attendee>)> {
    let attendee = workflow::mark_attendance(&state.db, id, req.member_id).await?;
    Ok((StatusCode::CREATED, Json(attendee)))
}

fn parse_name_set<T>(values: &[String], field: &str) -> Result<Vec<T>, ApiError>
where
    T: std::str::FromStr<Err = lodge_common::Error>,
{
    if values.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{field} must name at least one entry"
        )));
    }
    values
        .iter()
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .collect()
}

async fn load_event(state: &AppState, guid: Uuid) -> Result<Event, ApiError> {
    crate::db::events::get_event(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Event {guid} not readable after write")))
}
