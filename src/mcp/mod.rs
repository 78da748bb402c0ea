use chrono::Utc;
use halaltrack_core::models::*;
use halaltrack_core::workflow::{self, AdvanceOutcome, SlaStatus};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksRequest {
    #[schemars(description = "Optional case-insensitive filter on product or company name")]
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskIdRequest {
    #[schemars(description = "The task ID")]
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleChecklistRequest {
    #[schemars(description = "The task ID")]
    pub task_id: String,
    #[schemars(description = "The checklist item ID to flip")]
    pub item_id: String,
}

#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub stage: Stage,
    pub stage_label: &'static str,
    pub status: TaskStatus,
    pub sla: SlaStatus,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResult {
    pub outcome: AdvanceOutcome,
    pub stage: Stage,
    pub stage_label: &'static str,
}

impl McpServer {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    fn internal(e: anyhow::Error) -> McpError {
        McpError::internal_error(e.to_string(), None)
    }

    fn json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    fn summaries(&self, keep: impl Fn(&Task, &SlaConfig) -> bool) -> Result<Vec<TaskSummary>, McpError> {
        let sla = self.db.get_sla_config().map_err(Self::internal)?;
        let now = Utc::now();
        let tasks = self.db.get_all_tasks().map_err(Self::internal)?;
        Ok(tasks
            .into_iter()
            .filter(|task| keep(task, &sla))
            .map(|task| TaskSummary {
                sla: workflow::sla_status(&task, &sla, now),
                id: task.id,
                name: task.name,
                company: task.company,
                stage: task.stage,
                stage_label: task.stage.label(),
                status: task.status,
            })
            .collect())
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "List certification tasks with their stage and SLA standing")]
    async fn list_tasks(
        &self,
        params: Parameters<ListTasksRequest>,
    ) -> Result<CallToolResult, McpError> {
        let query = params.0.query.unwrap_or_default();
        let tasks = self.summaries(|task, _| workflow::matches_search(task, &query))?;
        Self::json(&tasks)
    }

    #[tool(description = "List tasks that have exceeded the SLA for their current stage")]
    async fn list_overdue(&self) -> Result<CallToolResult, McpError> {
        let now = Utc::now();
        let tasks = self.summaries(|task, sla| workflow::is_overdue(task, sla, now))?;
        Self::json(&tasks)
    }

    #[tool(description = "Get a task with its full checklist and AI analysis")]
    async fn get_task(
        &self,
        params: Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let task_id = Self::parse_uuid(&params.0.task_id)?;

        let task = self.db.get_task(task_id)
            .map_err(Self::internal)?
            .ok_or_else(|| McpError::invalid_params("Task not found", None))?;

        Self::json(&task)
    }

    #[tool(description = "Advance a task to the next certification stage")]
    async fn advance_task(
        &self,
        params: Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let task_id = Self::parse_uuid(&params.0.task_id)?;

        let (task, outcome) = self.db.advance_task(task_id, Utc::now())
            .map_err(Self::internal)?
            .ok_or_else(|| McpError::invalid_params("Task not found", None))?;

        Self::json(&AdvanceResult {
            outcome,
            stage: task.stage,
            stage_label: task.stage.label(),
        })
    }

    #[tool(description = "Put a task on hold, or resume it if already on hold")]
    async fn toggle_hold(
        &self,
        params: Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let task_id = Self::parse_uuid(&params.0.task_id)?;

        let task = self.db.toggle_hold(task_id)
            .map_err(Self::internal)?
            .ok_or_else(|| McpError::invalid_params("Task not found", None))?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Task is now {}",
            task.status.label()
        ))]))
    }

    #[tool(description = "Mark a checklist item done, or undo it")]
    async fn toggle_checklist_item(
        &self,
        params: Parameters<ToggleChecklistRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let task_id = Self::parse_uuid(&req.task_id)?;
        let item_id = Self::parse_uuid(&req.item_id)?;

        let task = self.db.toggle_checklist_item(task_id, item_id)
            .map_err(Self::internal)?
            .ok_or_else(|| McpError::invalid_params("Task or checklist item not found", None))?;

        let item = task
            .checklist
            .values()
            .flatten()
            .find(|item| item.id == item_id)
            .ok_or_else(|| McpError::internal_error("Checklist item vanished", None))?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "'{}' is now {}",
            item.label,
            if item.completed { "complete" } else { "incomplete" }
        ))]))
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("HalalTrack MCP server for halal certification workflow tracking".into()),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
