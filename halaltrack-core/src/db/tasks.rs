use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_time, parse_enum, parse_time, parse_uuid, Database};
use crate::models::*;
use crate::workflow::{self, AdvanceOutcome};

const TASK_COLUMNS: &str = "id, name, company, description, contact_person, contact_phone, \
     contact_email, stage, status, created_at, stage_updated_at, assigned_to, ai_analysis";

impl Database {
    /// All tasks, newest first, with their checklists attached.
    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tasks ORDER BY created_at DESC",
                TASK_COLUMNS
            ))?;
            let mut tasks = stmt
                .query_map([], task_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut stmt = conn.prepare(
                "SELECT task_id, stage, id, label, completed, position FROM checklists
                 ORDER BY task_id, position",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    parse_uuid(0, row.get(0)?)?,
                    parse_enum(1, row.get(1)?, Stage::from_str)?,
                    checklist_item_from_row(row, 2)?,
                ))
            })?;

            let mut by_task: BTreeMap<Uuid, BTreeMap<Stage, Vec<ChecklistItem>>> = BTreeMap::new();
            for row in rows {
                let (task_id, stage, item) = row?;
                by_task
                    .entry(task_id)
                    .or_default()
                    .entry(stage)
                    .or_default()
                    .push(item);
            }
            for task in &mut tasks {
                if let Some(checklist) = by_task.remove(&task.id) {
                    task.checklist = checklist;
                }
            }
            Ok(tasks)
        })
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        self.with_conn(|conn| load_task(conn, id))
    }

    /// Insert a task together with every stage's default checklist.
    ///
    /// Both writes happen in one transaction, so a task never exists
    /// without its checklist.
    pub fn create_task(
        &self,
        input: CreateTaskInput,
        assigned_to: &str,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        self.with_conn(|conn| {
            let id = Uuid::new_v4();
            let stage = input.stage.unwrap_or(Stage::Submitted);
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tasks (id, name, company, description, contact_person, contact_phone,
                     contact_email, stage, status, created_at, stage_updated_at, assigned_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?11)",
                params![
                    id.to_string(),
                    input.name.trim(),
                    input.company.trim(),
                    input.description,
                    input.contact_person,
                    input.contact_phone,
                    input.contact_email,
                    stage.as_str(),
                    TaskStatus::Active.as_str(),
                    fmt_time(now),
                    assigned_to,
                ],
            )?;

            {
                let mut insert = tx.prepare(
                    "INSERT INTO checklists (id, task_id, stage, label, position, completed)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                )?;
                for stage in Stage::ALL {
                    for (position, label) in stage.default_checklist().iter().enumerate() {
                        insert.execute(params![
                            Uuid::new_v4().to_string(),
                            id.to_string(),
                            stage.as_str(),
                            label,
                            position as i64,
                        ])?;
                    }
                }
            }

            tx.commit()?;
            tracing::info!("Created task {} ({}) at stage {}", id, input.name.trim(), stage.as_str());

            load_task(conn, id)?.ok_or_else(|| anyhow::anyhow!("Task {} vanished after insert", id))
        })
    }

    pub fn update_task(&self, id: Uuid, input: UpdateTaskInput) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                    name = COALESCE(?2, name),
                    company = COALESCE(?3, company),
                    description = COALESCE(?4, description),
                    contact_person = CASE WHEN ?5 IS NULL THEN contact_person ELSE NULLIF(TRIM(?5), '') END,
                    contact_phone = CASE WHEN ?6 IS NULL THEN contact_phone ELSE NULLIF(TRIM(?6), '') END,
                    contact_email = CASE WHEN ?7 IS NULL THEN contact_email ELSE NULLIF(TRIM(?7), '') END,
                    assigned_to = COALESCE(?8, assigned_to)
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    input.name.as_deref().map(str::trim),
                    input.company.as_deref().map(str::trim),
                    input.description,
                    input.contact_person,
                    input.contact_phone,
                    input.contact_email,
                    input.assigned_to,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_task(conn, id)
        })
    }

    pub fn delete_task(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
            if deleted > 0 {
                tracing::info!("Deleted task {}", id);
            }
            Ok(deleted > 0)
        })
    }

    /// Advance a task one stage. Returns `None` when the task does not exist.
    pub fn advance_task(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<(Task, AdvanceOutcome)>> {
        self.with_conn(|conn| {
            let Some(mut task) = load_task(conn, id)? else {
                return Ok(None);
            };
            let outcome = workflow::advance(&mut task, now);
            match outcome {
                AdvanceOutcome::Advanced { from, to } => {
                    conn.execute(
                        "UPDATE tasks SET stage = ?2, stage_updated_at = ?3 WHERE id = ?1",
                        params![id.to_string(), to.as_str(), fmt_time(task.stage_updated_at)],
                    )?;
                    tracing::info!("Task {} advanced {} -> {}", id, from.as_str(), to.as_str());
                }
                AdvanceOutcome::AtFinalStage | AdvanceOutcome::OnHold => {
                    tracing::debug!("Task {} not advanced: {:?}", id, outcome);
                }
            }
            Ok(load_task(conn, id)?.map(|task| (task, outcome)))
        })
    }

    pub fn toggle_hold(&self, id: Uuid) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(mut task) = load_task(conn, id)? else {
                return Ok(None);
            };
            let status = workflow::toggle_hold(&mut task);
            conn.execute(
                "UPDATE tasks SET status = ?2 WHERE id = ?1",
                params![id.to_string(), status.as_str()],
            )?;
            tracing::info!("Task {} is now {}", id, status.as_str());
            load_task(conn, id)
        })
    }

    /// Flip one checklist item. `None` when the task or item is unknown.
    pub fn toggle_checklist_item(&self, task_id: Uuid, item_id: Uuid) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let Some(mut task) = load_task(conn, task_id)? else {
                return Ok(None);
            };
            let Some(stage) = workflow::checklist_stage_of(&task, item_id) else {
                return Ok(None);
            };
            let Some(completed) = workflow::toggle_checklist_item(&mut task, stage, item_id) else {
                return Ok(None);
            };
            conn.execute(
                "UPDATE checklists SET completed = ?3 WHERE id = ?1 AND task_id = ?2",
                params![item_id.to_string(), task_id.to_string(), completed],
            )?;
            tracing::debug!("Checklist item {} on task {} completed={}", item_id, task_id, completed);
            load_task(conn, task_id)
        })
    }

    pub fn set_ai_analysis(&self, id: Uuid, analysis: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET ai_analysis = ?2 WHERE id = ?1",
                params![id.to_string(), analysis],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            load_task(conn, id)
        })
    }
}

fn load_task(conn: &Connection, id: Uuid) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![id.to_string()],
            task_from_row,
        )
        .optional()?;
    let Some(mut task) = task else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT stage, id, label, completed, position FROM checklists
         WHERE task_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![id.to_string()], |row| {
        Ok((
            parse_enum(0, row.get(0)?, Stage::from_str)?,
            checklist_item_from_row(row, 1)?,
        ))
    })?;
    for row in rows {
        let (stage, item) = row?;
        task.checklist.entry(stage).or_default().push(item);
    }
    Ok(Some(task))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parse_uuid(0, row.get(0)?)?,
        name: row.get(1)?,
        company: row.get(2)?,
        description: row.get(3)?,
        contact_person: row.get(4)?,
        contact_phone: row.get(5)?,
        contact_email: row.get(6)?,
        stage: parse_enum(7, row.get(7)?, Stage::from_str)?,
        status: parse_enum(8, row.get(8)?, TaskStatus::from_str)?,
        created_at: parse_time(9, row.get(9)?)?,
        stage_updated_at: parse_time(10, row.get(10)?)?,
        assigned_to: row.get(11)?,
        ai_analysis: row.get(12)?,
        checklist: BTreeMap::new(),
    })
}

fn checklist_item_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: parse_uuid(offset, row.get(offset)?)?,
        label: row.get(offset + 1)?,
        completed: row.get(offset + 2)?,
        position: row.get(offset + 3)?,
    })
}
