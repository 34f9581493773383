//! Login endpoints for members and admins.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use lodge_common::auth::{self, AuthError, Claims, Role};
use lodge_common::db::settings;
use lodge_common::types::MemberStatus;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/member/login", post(member_login))
        .route("/auth/admin/login", post(admin_login))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    /// Unix timestamp after which the token is refused
    pub expires_at: i64,
}

/// POST /auth/member/login
async fn member_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let row = crate::db::members::get_member_row_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %req.email, "Member login with unknown email");
            AuthError::InvalidCredentials
        })?;

    if !auth::verify_password(&req.password, &row.password_salt, &row.password_hash) {
        warn!(email = %req.email, "Member login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    // Disabled accounts fail the same way as bad credentials.
    let status: MemberStatus = row.status.parse()?;
    if status != MemberStatus::Active {
        warn!(email = %req.email, "Disabled member attempted login");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!(member_id = %row.guid, "Member logged in");
    let response = issue_token(&state, row.guid, Role::Member).await?;
    Ok(Json(response))
}

/// POST /auth/admin/login
async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let creds = settings::load_admin_credentials(&state.db).await?;

    if req.email != creds.email
        || !auth::verify_password(&req.password, &creds.password_salt, &creds.password_hash)
    {
        warn!(email = %req.email, "Admin login failed");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!("Admin logged in");
    let response = issue_token(&state, creds.email, Role::Admin).await?;
    Ok(Json(response))
}

async fn issue_token(
    state: &AppState,
    subject: String,
    role: Role,
) -> Result<LoginResponse, ApiError> {
    let lifetime = settings::get_session_lifetime(&state.db).await?;
    let expires_at = Utc::now().timestamp() + lifetime;
    let claims = Claims {
        sub: subject,
        role,
        exp: expires_at,
    };
    let token = auth::mint_token(&claims, state.shared_secret)?;
    Ok(LoginResponse {
        token,
        role,
        expires_at,
    })
}
