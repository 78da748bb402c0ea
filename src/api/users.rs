use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use halaltrack_core::models::{CreateUserInput, Role, UserAccount};
use uuid::Uuid;

use super::{AdminUser, ApiError, ApiResult, AppContext};

pub async fn list_users(
    State(ctx): State<AppContext>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<UserAccount>>> {
    Ok(Json(ctx.db.list_users()?))
}

pub async fn create_user(
    State(ctx): State<AppContext>,
    AdminUser(admin): AdminUser,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<UserAccount>)> {
    if input.role == Role::Superadmin && admin.role != Role::Superadmin {
        return Err(ApiError::Forbidden(
            "Only a superadmin can create superadmin accounts".into(),
        ));
    }
    let account = ctx.db.sign_up(input)?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn delete_user(
    State(ctx): State<AppContext>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if id == admin.id {
        return Err(ApiError::BadRequest("You cannot delete your own account".into()));
    }
    let target = ctx
        .db
        .get_user(id)?
        .ok_or_else(|| ApiError::not_found("User"))?;
    if target.role == Role::Superadmin && admin.role != Role::Superadmin {
        return Err(ApiError::Forbidden(
            "Only a superadmin can delete superadmin accounts".into(),
        ));
    }
    ctx.db.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}
