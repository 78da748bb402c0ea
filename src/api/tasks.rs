use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use halaltrack_core::models::{CreateTaskInput, SlaConfig, Task, UpdateTaskInput};
use halaltrack_core::workflow::{self, AdvanceOutcome, SlaStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppContext, CurrentUser, MaybeUser};

/// A task as served to clients, with its SLA standing precomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub sla: SlaStatus,
    pub can_advance: bool,
}

impl TaskView {
    /// Company and contact details are only shown to signed-in users.
    pub fn new(mut task: Task, sla: &SlaConfig, now: DateTime<Utc>, signed_in: bool) -> Self {
        if !signed_in {
            task.company.clear();
            task.contact_person = None;
            task.contact_phone = None;
            task.contact_email = None;
        }
        Self {
            sla: workflow::sla_status(&task, sla, now),
            can_advance: workflow::can_advance(&task),
            task,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub task: TaskView,
    pub outcome: AdvanceOutcome,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn view(ctx: &AppContext, task: Task, signed_in: bool) -> ApiResult<TaskView> {
    let sla = ctx.db.get_sla_config()?;
    Ok(TaskView::new(task, &sla, Utc::now(), signed_in))
}

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub async fn list_tasks(
    State(ctx): State<AppContext>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let sla = ctx.db.get_sla_config()?;
    let now = Utc::now();
    let signed_in = user.is_some();
    let tasks = ctx
        .db
        .get_all_tasks()?
        .into_iter()
        .filter(|task| workflow::matches_search_for(task, &query.q, signed_in))
        .map(|task| TaskView::new(task, &sla, now, signed_in))
        .collect();
    Ok(Json(tasks))
}

pub async fn get_task(
    State(ctx): State<AppContext>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = ctx.db.get_task(id)?.ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(Json(view(&ctx, task, user.is_some())?))
}

pub async fn create_task(
    State(ctx): State<AppContext>,
    current: CurrentUser,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    require_text("name", &input.name)?;
    require_text("company", &input.company)?;

    let task = ctx
        .db
        .create_task(input, &current.user.username, Utc::now())?;
    Ok((StatusCode::CREATED, Json(view(&ctx, task, true)?)))
}

pub async fn update_task(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<Json<TaskView>> {
    if let Some(name) = &input.name {
        require_text("name", name)?;
    }
    if let Some(company) = &input.company {
        require_text("company", company)?;
    }

    let task = ctx
        .db
        .update_task(id, input)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(Json(view(&ctx, task, true)?))
}

pub async fn delete_task(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if ctx.db.delete_task(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Task"))
    }
}

pub async fn advance_task(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdvanceResponse>> {
    let (task, outcome) = ctx
        .db
        .advance_task(id, Utc::now())?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(Json(AdvanceResponse {
        task: view(&ctx, task, true)?,
        outcome,
    }))
}

pub async fn toggle_hold(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = ctx
        .db
        .toggle_hold(id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(Json(view(&ctx, task, true)?))
}

pub async fn toggle_checklist_item(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TaskView>> {
    let task = ctx
        .db
        .toggle_checklist_item(id, item_id)?
        .ok_or_else(|| ApiError::not_found("Checklist item"))?;
    Ok(Json(view(&ctx, task, true)?))
}

pub async fn analyze_task(
    State(ctx): State<AppContext>,
    _current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = ctx.db.get_task(id)?.ok_or_else(|| ApiError::not_found("Task"))?;
    let analysis = ctx
        .analyzer
        .analyze(&task.name, &task.description, task.stage)
        .await;
    let task = ctx
        .db
        .set_ai_analysis(id, &analysis)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(Json(view(&ctx, task, true)?))
}
