//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::{
        ActivationRequest, AdminAccessRequest, CreateUser, UpdateEmail, UpdatePassword,
        UpdateUser, UpdateUsername, UserPublic,
    },
};

use super::AuthenticatedUser;

/// List all active users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of active users", body = [UserPublic]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserPublic>>> {
    let users = state.services.users.get_all_users().await?;
    Ok(Json(users))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already in use")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserPublic>)> {
    let created = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserPublic),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserPublic>> {
    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Get user details by email, regardless of active state
#[utoipa::path(
    get,
    path = "/users/by-email/{email}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User details", body = UserPublic),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_email(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(email): Path<String>,
) -> AppResult<Json<UserPublic>> {
    let user = state.services.users.get_by_email(&email).await?;
    Ok(Json(user))
}

/// Get user details by username
#[utoipa::path(
    get,
    path = "/users/by-username/{username}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User details", body = UserPublic),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_username(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<Json<UserPublic>> {
    let user = state.services.users.get_by_username(&username).await?;
    Ok(Json(user))
}

/// Update the authenticated user's profile fields
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Profile updated", body = UserPublic),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already in use")
    )
)]
pub async fn update_me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<UserPublic>> {
    let updated = state
        .services
        .users
        .update_user(claims.user_id, request)
        .await?;

    Ok(Json(updated))
}

/// Change the authenticated user's email
#[utoipa::path(
    put,
    path = "/users/me/email",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateEmail,
    responses(
        (status = 200, description = "Email updated", body = UserPublic),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Old email mismatch or email already in use")
    )
)]
pub async fn update_my_email(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateEmail>,
) -> AppResult<Json<UserPublic>> {
    let updated = state
        .services
        .users
        .update_email(claims.user_id, request)
        .await?;

    Ok(Json(updated))
}

/// Change the authenticated user's username
#[utoipa::path(
    put,
    path = "/users/me/username",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUsername,
    responses(
        (status = 200, description = "Username updated", body = UserPublic),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Old username mismatch or username already in use")
    )
)]
pub async fn update_my_username(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateUsername>,
) -> AppResult<Json<UserPublic>> {
    let updated = state
        .services
        .users
        .update_username(claims.user_id, request)
        .await?;

    Ok(Json(updated))
}

/// Change the authenticated user's password
#[utoipa::path(
    put,
    path = "/users/me/password",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdatePassword,
    responses(
        (status = 200, description = "Password updated", body = UserPublic),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Old password mismatch")
    )
)]
pub async fn update_my_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdatePassword>,
) -> AppResult<Json<UserPublic>> {
    let updated = state
        .services
        .users
        .update_password(claims.user_id, request)
        .await?;

    Ok(Json(updated))
}

/// Activate or deactivate an account. Admins may target any account;
/// other users only their own. Deactivation revokes the oldest live
/// session.
#[utoipa::path(
    put,
    path = "/users/activation",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ActivationRequest,
    responses(
        (status = 200, description = "Activation state changed", body = UserPublic),
        (status = 403, description = "Cannot target another account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_activation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ActivationRequest>,
) -> AppResult<Json<UserPublic>> {
    let user = state.services.users.set_activation(&claims, request).await?;
    Ok(Json(user))
}

/// Grant or revoke admin access on an active account (admin only)
#[utoipa::path(
    put,
    path = "/users/{email}/admin-access",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("email" = String, Path, description = "Target user email")
    ),
    request_body = AdminAccessRequest,
    responses(
        (status = 200, description = "Admin access changed", body = UserPublic),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Account is inactive")
    )
)]
pub async fn admin_access(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(email): Path<String>,
    Json(request): Json<AdminAccessRequest>,
) -> AppResult<Json<UserPublic>> {
    claims.require_admin()?;

    let user = state.services.users.admin_access(&email, request).await?;
    Ok(Json(user))
}
