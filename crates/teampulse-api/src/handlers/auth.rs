//! Email/password sign-up and login for accounts that predate the identity providers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use teampulse_core::invitation_policy::normalize_email;
use teampulse_core::models::{
    AuthProvider, LoginRequest, LoginResponse, NewUser, RegisterRequest, UserResponse, UserRole,
};
use teampulse_core::AppError;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = LoginResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = normalize_email(&request.email);
    if state.db.users.get_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()).into());
    }

    let password_hash = hash_password(&request.password)?;
    let mut user = state
        .db
        .users
        .create(NewUser {
            email,
            name: request.name,
            password_hash: Some(password_hash),
            auth_provider: AuthProvider::Password,
            auth_provider_id: None,
            role: UserRole::User,
            organization_id: Some(state.flags.default_organization_id),
        })
        .await?;

    match state.invitations.accept_pending_for(&user).await {
        Ok(accepted) => {
            if let Some(last) = accepted.last() {
                user.organization_id = Some(last.organization_id);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to accept pending invitations"),
    }

    let (token, expires_at) = state.auth.verifier.legacy().issue(&user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            expires_at,
            user: UserResponse::from(user),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    let user = state
        .db
        .users
        .get_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let Some(hash) = user.password_hash.as_deref() else {
        // account signs in through Clerk or Supabase
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
    };
    if !verify_password(&request.password, hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
    }

    let (token, expires_at) = state.auth.verifier.legacy().issue(&user)?;
    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: UserResponse::from(user),
    }))
}
