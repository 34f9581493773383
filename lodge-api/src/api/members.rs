//! Member management endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::extract::{AdminContext, MemberContext};
use crate::db::members::NewMember;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use lodge_common::auth;
use lodge_common::db::models::Member;
use lodge_common::types::{MemberStatus, Zone};
use lodge_common::Tier;

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route("/members/me", get(current_member))
        .route("/members/:id/status", put(update_member_status))
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Zone name, e.g. "North"
    pub zone: String,
    /// Optional starting tier, defaults to Bronze
    pub tier: Option<String>,
}

/// POST /members (admin)
async fn create_member(
    _admin: AdminContext,
    State(state): State<AppState>,
    Json(req): Json<CreateMemberRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "Not an email address: {}",
            req.email
        )));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Password must not be empty".to_string(),
        ));
    }
    let zone: Zone = req
        .zone
        .parse()
        .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?;
    let tier: Tier = match &req.tier {
        Some(text) => text
            .parse()
            .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?,
        None => Tier::Bronze,
    };

    let salt = auth::generate_salt();
    let new = NewMember {
        name: name.to_string(),
        email: req.email.clone(),
        password_hash: auth::hash_password(&req.password, &salt),
        password_salt: salt,
        zone,
        tier,
    };

    let guid = match crate::db::members::insert_member(&state.db, &new).await {
        Ok(guid) => guid,
        Err(err) if crate::workflow::is_unique_violation(&err) => {
            return Err(ApiError::Conflict(format!(
                "A member with email {} is already registered",
                req.email
            )));
        }
        Err(err) => return Err(err.into()),
    };

    info!(member_id = %guid, zone = %zone, tier = %tier, "Member registered");

    let member = load_member(&state, guid).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /members (admin)
async fn list_members(
    _admin: AdminContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Member>>> {
    let members = crate::db::members::list_members(&state.db).await?;
    Ok(Json(members))
}

/// GET /members/me (member)
async fn current_member(
    ctx: MemberContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Member>> {
    let member = crate::db::members::get_member(&state.db, ctx.member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member {}", ctx.member_id)))?;
    Ok(Json(member))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberStatusRequest {
    /// "active" or "disabled"
    pub status: String,
}

/// PUT /members/:id/status (admin)
async fn update_member_status(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMemberStatusRequest>,
) -> ApiResult<Json<Member>> {
    let status: MemberStatus = req
        .status
        .parse()
        .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))?;

    let updated = crate::db::members::set_member_status(&state.db, id, status).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Member {id}")));
    }

    info!(member_id = %id, status = %status, "Member status changed");

    let member = load_member(&state, id).await?;
    Ok(Json(member))
}

async fn load_member(state: &AppState, guid: Uuid) -> Result<Member, ApiError> {
    crate::db::members::get_member(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Member {guid} not readable after write")))
}
