//! Account, group, and employee-lifecycle handlers
//!
//! Tier gating happens in middleware; the policy decisions that depend on
//! *which* manager is calling (store affiliation scoping) live here. Group
//! membership for those decisions is re-read from the identity provider
//! rather than trusted from the token, since promotions and deletions can
//! land between token issuance and use.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::http::error::AppError;
use crate::http::middleware::{is_admin, AuthenticatedUser, Group};
use crate::identity::{AdminUser, TokenResponse};
use crate::store::profiles::{NewProfile, Profile, ProfileUpdate};

// ============================================================================
// Login
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if state.login_limiter.check().is_err() {
        return Err(AppError::RateLimited);
    }

    let tokens = state.identity.login(&req.email, &req.password).await?;

    info!(email = %req.email, "login succeeded");
    Ok(Json(tokens))
}

// ============================================================================
// Heartbeat
// ============================================================================

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub username: String,
    pub email: Option<String>,
    pub groups: Vec<String>,
}

pub async fn heartbeat_handler(
    Extension(auth): Extension<AuthenticatedUser>,
) -> Json<HeartbeatResponse> {
    Json(HeartbeatResponse {
        username: auth.username,
        email: auth.claims.email,
        groups: auth.groups,
    })
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn get_account_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Profile>, AppError> {
    // Confirm the subject still exists upstream before serving the profile
    state.identity.get_user(auth.user_id).await?;

    let profile = state
        .profiles
        .get_profile(&auth.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for {}", auth.username)))?;

    Ok(Json(profile))
}

pub async fn get_account_by_username_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .profiles
        .get_profile(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for {}", username)))?;

    state.identity.get_user(profile.user_id).await?;

    Ok(Json(profile))
}

pub async fn update_account_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    // Callers may edit their own profile; only admins may edit others
    if username != auth.username && !is_admin(&auth.groups) {
        return Err(AppError::Forbidden("cannot update another account"));
    }

    let updated = state
        .profiles
        .update_profile(&username, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for {}", username)))?;

    Ok(Json(updated))
}

// ============================================================================
// Group listings
// ============================================================================

#[derive(Serialize)]
pub struct GroupListingResponse {
    pub group: &'static str,
    pub users: Vec<AdminUser>,
}

async fn list_group(state: &AppState, group: Group) -> Result<Json<GroupListingResponse>, AppError> {
    let users = state.identity.users_in_group(group.as_str()).await?;

    Ok(Json(GroupListingResponse {
        group: group.as_str(),
        users,
    }))
}

pub async fn get_group_user_handler(
    State(state): State<AppState>,
) -> Result<Json<GroupListingResponse>, AppError> {
    list_group(&state, Group::User).await
}

pub async fn get_group_employee_handler(
    State(state): State<AppState>,
) -> Result<Json<GroupListingResponse>, AppError> {
    list_group(&state, Group::Employee).await
}

pub async fn get_group_manager_handler(
    State(state): State<AppState>,
) -> Result<Json<GroupListingResponse>, AppError> {
    list_group(&state, Group::Manager).await
}

pub async fn get_group_admin_handler(
    State(state): State<AppState>,
) -> Result<Json<GroupListingResponse>, AppError> {
    list_group(&state, Group::Admin).await
}

// ============================================================================
// Employee creation
// ============================================================================

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub username: String,
    pub email: String,
    #[serde(rename = "storeid")]
    pub store_id: i32,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
}

pub async fn create_employee_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<Json<Profile>, AppError> {
    let caller_groups = state.identity.groups_for_user(auth.user_id).await?;

    // Admins hire anywhere; managers only into their own store
    let target_store = if is_admin(&caller_groups) {
        req.store_id
    } else if caller_groups.iter().any(|g| g == Group::Manager.as_str()) {
        let manager = state
            .profiles
            .get_profile(&auth.username)
            .await?
            .ok_or_else(|| AppError::Internal(format!("no profile for caller {}", auth.username)))?;

        if manager.store_id != req.store_id {
            return Err(AppError::Forbidden(
                "employee store does not match manager store",
            ));
        }
        manager.store_id
    } else {
        return Err(AppError::Forbidden("caller is not a manager or admin"));
    };

    let invited = state.identity.invite_user(&req.email).await?;
    state.identity.set_username(invited.id, &req.username).await?;
    state
        .identity
        .add_to_group(invited.id, Group::Employee.as_str())
        .await?;

    let profile = state
        .profiles
        .create_profile(NewProfile {
            username: req.username.clone(),
            user_id: invited.id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            store_id: target_store,
        })
        .await?;

    info!(
        username = %req.username,
        store_id = target_store,
        created_by = %auth.username,
        "employee created"
    );

    Ok(Json(profile))
}

// ============================================================================
// Account deletion
// ============================================================================

#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub deleted: String,
}

/// Shared by DELETE /employee, /manager and /admin: admins remove anyone,
/// managers only employees affiliated with their own store.
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<Json<DeleteAccountResponse>, AppError> {
    let caller_groups = state.identity.groups_for_user(auth.user_id).await?;

    let target = state
        .profiles
        .get_profile(&req.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for {}", req.username)))?;

    if !is_admin(&caller_groups) {
        if !caller_groups.iter().any(|g| g == Group::Manager.as_str()) {
            return Err(AppError::Forbidden("caller is not a manager or admin"));
        }

        let target_groups = state.identity.groups_for_user(target.user_id).await?;
        if !target_groups.iter().any(|g| g == Group::Employee.as_str()) {
            return Err(AppError::Forbidden("target account is not an employee"));
        }

        let manager = state
            .profiles
            .get_profile(&auth.username)
            .await?
            .ok_or_else(|| AppError::Internal(format!("no profile for caller {}", auth.username)))?;

        if manager.store_id != target.store_id {
            return Err(AppError::Forbidden(
                "employee store does not match manager store",
            ));
        }
    }

    state.identity.delete_user(target.user_id).await?;
    state.profiles.delete_profile(&req.username).await?;

    info!(
        username = %req.username,
        deleted_by = %auth.username,
        "account deleted"
    );

    Ok(Json(DeleteAccountResponse {
        deleted: req.username,
    }))
}

// ============================================================================
// Promotion
// ============================================================================

#[derive(Deserialize)]
pub struct PromoteRequest {
    pub username: String,
}

async fn promote_to(
    state: &AppState,
    username: &str,
    group: Group,
) -> Result<Json<AdminUser>, AppError> {
    let profile = state
        .profiles
        .get_profile(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for {}", username)))?;

    let updated = state
        .identity
        .add_to_group(profile.user_id, group.as_str())
        .await?;

    info!(username = %username, group = %group, "account promoted");
    Ok(Json(updated))
}

pub async fn promote_to_manager_handler(
    State(state): State<AppState>,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<AdminUser>, AppError> {
    promote_to(&state, &req.username, Group::Manager).await
}

pub async fn promote_to_admin_handler(
    State(state): State<AppState>,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<AdminUser>, AppError> {
    promote_to(&state, &req.username, Group::Admin).await
}
