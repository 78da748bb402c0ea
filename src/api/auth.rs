use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use halaltrack_core::models::UserAccount;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, AppContext};

/// A signed-in user, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserAccount,
    pub token: String,
}

/// A signed-in user whose role may manage settings and accounts.
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserAccount);

/// The signed-in user if a valid token was sent, otherwise anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserAccount>);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> ApiResult<Self> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Sign in required".into()))?;
        let user = state
            .db
            .session_user(&token)?
            .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".into()))?;
        Ok(Self { user, token })
    }
}

impl FromRequestParts<AppContext> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> ApiResult<Self> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.role.can_manage() {
            return Err(ApiError::Forbidden("Admin role required".into()));
        }
        Ok(Self(current.user))
    }
}

impl FromRequestParts<AppContext> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> ApiResult<Self> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(state.db.session_user(&token)?)),
            None => Ok(Self(None)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserAccount,
}

pub async fn sign_in(
    State(ctx): State<AppContext>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Json<SignInResponse>> {
    let session = ctx.db.sign_in(&req.username, &req.password)?;
    Ok(Json(SignInResponse {
        token: session.token,
        user: session.user,
    }))
}

pub async fn sign_out(
    State(ctx): State<AppContext>,
    current: CurrentUser,
) -> ApiResult<StatusCode> {
    ctx.db.sign_out(&current.token)?;
    tracing::info!("User '{}' signed out", current.user.username);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(current: CurrentUser) -> Json<UserAccount> {
    Json(current.user)
}
