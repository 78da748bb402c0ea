use axum::{extract::State, Json};
use halaltrack_core::models::SlaConfig;

use super::{AdminUser, ApiResult, AppContext};

pub async fn get_sla(State(ctx): State<AppContext>) -> ApiResult<Json<SlaConfig>> {
    Ok(Json(ctx.db.get_sla_config()?))
}

/// Replace the SLA table. Stages left out of the body revert to defaults.
pub async fn save_sla(
    State(ctx): State<AppContext>,
    AdminUser(admin): AdminUser,
    Json(sla): Json<SlaConfig>,
) -> ApiResult<Json<SlaConfig>> {
    let saved = ctx.db.save_sla_config(&sla)?;
    tracing::info!("SLA settings updated by '{}'", admin.username);
    Ok(Json(saved))
}
