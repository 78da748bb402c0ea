use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use halaltrack_core::models::Stage;
use halaltrack_core::workflow::{self, Stats};
use halaltrack_core::{reduce, Action, AppState};
use serde::{Deserialize, Serialize};

use super::tasks::{SearchQuery, TaskView};
use super::{ApiResult, AppContext, MaybeUser};

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardColumn {
    pub stage: Stage,
    pub label: String,
    pub sla_days: u32,
    pub tasks: Vec<TaskView>,
}

/// Kanban columns in pipeline order, filtered by `q`.
pub async fn board(
    State(ctx): State<AppContext>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<BoardColumn>>> {
    let signed_in = user.is_some();
    let mut tasks = ctx.db.get_all_tasks()?;
    let mut state = AppState::default();
    if signed_in {
        reduce(&mut state, Action::Search(query.q));
    } else {
        // Anonymous readers search product names only.
        tasks.retain(|task| workflow::matches_name(task, &query.q));
    }
    reduce(
        &mut state,
        Action::Loaded {
            tasks,
            sla: ctx.db.get_sla_config()?,
        },
    );

    let now = Utc::now();
    let columns = state
        .board()
        .into_iter()
        .map(|(stage, tasks)| BoardColumn {
            stage,
            label: stage.label().to_string(),
            sla_days: state.sla.limit_for(stage),
            tasks: tasks
                .into_iter()
                .map(|task| TaskView::new(task.clone(), &state.sla, now, signed_in))
                .collect(),
        })
        .collect();
    Ok(Json(columns))
}

pub async fn stats(State(ctx): State<AppContext>) -> ApiResult<Json<Stats>> {
    let tasks = ctx.db.get_all_tasks()?;
    let sla = ctx.db.get_sla_config()?;
    Ok(Json(workflow::stats(&tasks, &sla, Utc::now())))
}
