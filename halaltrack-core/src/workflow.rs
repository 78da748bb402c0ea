//! Stage, SLA and checklist rules.
//!
//! Everything here is a pure function over a [`Task`] and the current time.
//! Storage applies these and persists the result; views call them to decide
//! what to flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SlaConfig, Stage, Task, TaskStatus};

const SECONDS_PER_DAY: i64 = 86_400;

/// Result of an advance attempt. Only `Advanced` changes the task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced { from: Stage, to: Stage },
    AtFinalStage,
    OnHold,
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

pub fn can_advance(task: &Task) -> bool {
    !task.is_on_hold() && task.stage.next().is_some()
}

/// Move `task` to the next stage and restart its stage clock.
///
/// A task on hold or at the terminal stage is left untouched.
pub fn advance(task: &mut Task, now: DateTime<Utc>) -> AdvanceOutcome {
    if task.is_on_hold() {
        return AdvanceOutcome::OnHold;
    }
    let Some(next) = task.stage.next() else {
        return AdvanceOutcome::AtFinalStage;
    };
    let from = task.stage;
    task.stage = next;
    task.stage_updated_at = now;
    AdvanceOutcome::Advanced { from, to: next }
}

/// Whole days since the task entered its current stage, rounded down.
pub fn elapsed_days(task: &Task, now: DateTime<Utc>) -> i64 {
    (now - task.stage_updated_at)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

pub fn is_overdue(task: &Task, sla: &SlaConfig, now: DateTime<Utc>) -> bool {
    let limit = sla.limit_for(task.stage);
    limit > 0 && !task.is_on_hold() && elapsed_days(task, now) >= i64::from(limit)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaStatus {
    pub days_in_stage: i64,
    pub limit: u32,
    pub overdue: bool,
}

pub fn sla_status(task: &Task, sla: &SlaConfig, now: DateTime<Utc>) -> SlaStatus {
    SlaStatus {
        days_in_stage: elapsed_days(task, now),
        limit: sla.limit_for(task.stage),
        overdue: is_overdue(task, sla, now),
    }
}

/// Flip between `Active` and `OnHold`, returning the new status.
pub fn toggle_hold(task: &mut Task) -> TaskStatus {
    task.status = task.status.toggled();
    task.status
}

/// Flip one checklist item. Returns the new completed flag, or `None` when
/// the stage has no item with that id.
pub fn toggle_checklist_item(task: &mut Task, stage: Stage, item_id: Uuid) -> Option<bool> {
    let item = task
        .checklist
        .get_mut(&stage)?
        .iter_mut()
        .find(|item| item.id == item_id)?;
    item.completed = !item.completed;
    Some(item.completed)
}

/// Find which stage owns a checklist item.
pub fn checklist_stage_of(task: &Task, item_id: Uuid) -> Option<Stage> {
    task.checklist
        .iter()
        .find(|(_, items)| items.iter().any(|item| item.id == item_id))
        .map(|(stage, _)| *stage)
}

/// (completed, total) for one stage's checklist.
pub fn checklist_progress(task: &Task, stage: Stage) -> (usize, usize) {
    let items = task.checklist_for(stage);
    let done = items.iter().filter(|item| item.completed).count();
    (done, items.len())
}

/// Case-insensitive match on name or company. An empty query matches all.
pub fn matches_search(task: &Task, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || task.name.to_lowercase().contains(&query)
        || task.company.to_lowercase().contains(&query)
}

/// Like [`matches_search`] but on the product name only, for readers who
/// may not see company names.
pub fn matches_name(task: &Task, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || task.name.to_lowercase().contains(&query)
}

/// Search filter for a reader; anonymous readers cannot match on company.
pub fn matches_search_for(task: &Task, query: &str, signed_in: bool) -> bool {
    if signed_in {
        matches_search(task, query)
    } else {
        matches_name(task, query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageCount {
    pub stage: Stage,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub per_stage: Vec<StageCount>,
    pub completed: usize,
    /// Percentage of tasks at the final stage, rounded.
    pub completion_rate: u32,
    pub on_hold: usize,
    pub overdue: usize,
}

pub fn stats(tasks: &[Task], sla: &SlaConfig, now: DateTime<Utc>) -> Stats {
    let per_stage = Stage::ALL
        .iter()
        .map(|stage| StageCount {
            stage: *stage,
            label: stage.label().to_string(),
            count: tasks.iter().filter(|task| task.stage == *stage).count(),
        })
        .collect();

    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.stage.is_final()).count();
    let completion_rate = if total > 0 {
        (completed as f64 / total as f64 * 100.0).round() as u32
    } else {
        0
    };

    Stats {
        total,
        per_stage,
        completed,
        completion_rate,
        on_hold: tasks.iter().filter(|task| task.is_on_hold()).count(),
        overdue: tasks
            .iter()
            .filter(|task| is_overdue(task, sla, now))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use super::*;
    use crate::models::ChecklistItem;

    fn task_at(stage: Stage, entered: DateTime<Utc>) -> Task {
        let checklist = Stage::ALL
            .iter()
            .map(|stage| {
                let items = stage
                    .default_checklist()
                    .iter()
                    .enumerate()
                    .map(|(position, label)| ChecklistItem {
                        id: Uuid::new_v4(),
                        label: label.to_string(),
                        completed: false,
                        position: position as u32,
                    })
                    .collect();
                (*stage, items)
            })
            .collect();
        Task {
            id: Uuid::new_v4(),
            name: "Kecap Manis".into(),
            company: "PT Sedap Jaya".into(),
            description: String::new(),
            contact_person: None,
            contact_phone: None,
            contact_email: None,
            stage,
            status: TaskStatus::Active,
            created_at: entered,
            stage_updated_at: entered,
            assigned_to: "siti".into(),
            ai_analysis: None,
            checklist,
        }
    }

    #[test]
    fn submitted_two_days_ago_is_overdue() {
        let now = Utc::now();
        let task = task_at(Stage::Submitted, now - Duration::days(2));
        assert!(is_overdue(&task, &SlaConfig::default(), now));
    }

    #[test]
    fn on_hold_suppresses_overdue() {
        let now = Utc::now();
        let mut task = task_at(Stage::Submitted, now - Duration::days(2));
        task.status = TaskStatus::OnHold;
        assert!(!is_overdue(&task, &SlaConfig::default(), now));
    }

    #[test]
    fn overdue_exactly_at_the_limit() {
        let now = Utc::now();
        let sla = SlaConfig::default();
        for stage in Stage::ALL {
            let limit = sla.limit_for(stage);
            if limit == 0 {
                continue;
            }
            let under = task_at(stage, now - Duration::days(i64::from(limit)) + Duration::seconds(1));
            let at = task_at(stage, now - Duration::days(i64::from(limit)));
            assert!(!is_overdue(&under, &sla, now), "{stage:?} under limit");
            assert!(is_overdue(&at, &sla, now), "{stage:?} at limit");
        }
    }

    #[test]
    fn zero_limit_is_never_overdue() {
        let now = Utc::now();
        let sla = SlaConfig::default();
        let task = task_at(Stage::Prospek, now - Duration::days(365));
        assert!(!is_overdue(&task, &sla, now));

        let mut custom = SlaConfig::new(BTreeMap::new());
        custom.set(Stage::Audit, 0);
        let task = task_at(Stage::Audit, now - Duration::days(30));
        assert!(!is_overdue(&task, &custom, now));
    }

    #[test]
    fn elapsed_days_rounds_down() {
        let now = Utc::now();
        let task = task_at(Stage::Audit, now - Duration::hours(47));
        assert_eq!(elapsed_days(&task, now), 1);
        let task = task_at(Stage::Audit, now + Duration::hours(1));
        assert_eq!(elapsed_days(&task, now), -1);
    }

    #[test]
    fn advance_moves_to_next_stage_and_resets_clock() {
        let entered = Utc::now() - Duration::days(3);
        let now = Utc::now();
        let mut task = task_at(Stage::Audit, entered);

        let outcome = advance(&mut task, now);

        assert_eq!(
            outcome,
            AdvanceOutcome::Advanced { from: Stage::Audit, to: Stage::Review }
        );
        assert_eq!(task.stage, Stage::Review);
        assert_eq!(task.stage_updated_at, now);
    }

    #[test]
    fn advance_at_final_stage_is_a_noop() {
        let entered = Utc::now() - Duration::days(3);
        let mut task = task_at(Stage::Certified, entered);
        let before = task.clone();

        assert!(!can_advance(&task));
        assert_eq!(advance(&mut task, Utc::now()), AdvanceOutcome::AtFinalStage);
        assert_eq!(task, before);
    }

    #[test]
    fn advance_while_on_hold_is_a_noop() {
        let mut task = task_at(Stage::Review, Utc::now());
        task.status = TaskStatus::OnHold;
        let before = task.clone();

        assert!(!can_advance(&task));
        assert_eq!(advance(&mut task, Utc::now()), AdvanceOutcome::OnHold);
        assert_eq!(task, before);
    }

    #[test]
    fn advance_ignores_checklist_completion() {
        let mut task = task_at(Stage::Submitted, Utc::now());
        assert_eq!(checklist_progress(&task, Stage::Submitted), (0, 3));
        assert!(advance(&mut task, Utc::now()).is_advanced());
    }

    #[test]
    fn toggling_hold_twice_restores_status() {
        let mut task = task_at(Stage::Audit, Utc::now());
        assert_eq!(toggle_hold(&mut task), TaskStatus::OnHold);
        assert_eq!(toggle_hold(&mut task), TaskStatus::Active);
    }

    #[test]
    fn toggling_checklist_item_twice_restores_flag() {
        let mut task = task_at(Stage::Audit, Utc::now());
        let item_id = task.checklist_for(Stage::Audit)[1].id;

        assert_eq!(toggle_checklist_item(&mut task, Stage::Audit, item_id), Some(true));
        assert_eq!(checklist_progress(&task, Stage::Audit), (1, 3));
        assert_eq!(toggle_checklist_item(&mut task, Stage::Audit, item_id), Some(false));
        assert_eq!(checklist_progress(&task, Stage::Audit), (0, 3));
    }

    #[test]
    fn toggling_unknown_item_returns_none() {
        let mut task = task_at(Stage::Audit, Utc::now());
        let audit_item = task.checklist_for(Stage::Audit)[0].id;
        assert_eq!(toggle_checklist_item(&mut task, Stage::Audit, Uuid::new_v4()), None);
        assert_eq!(toggle_checklist_item(&mut task, Stage::Review, audit_item), None);
    }

    #[test]
    fn finds_owning_stage_of_item() {
        let task = task_at(Stage::Audit, Utc::now());
        let item_id = task.checklist_for(Stage::FatwaSession)[0].id;
        assert_eq!(checklist_stage_of(&task, item_id), Some(Stage::FatwaSession));
        assert_eq!(checklist_stage_of(&task, Uuid::new_v4()), None);
    }

    #[test]
    fn search_matches_name_or_company() {
        let task = task_at(Stage::Audit, Utc::now());
        assert!(matches_search(&task, "kecap"));
        assert!(matches_search(&task, "SEDAP"));
        assert!(matches_search(&task, "  "));
        assert!(!matches_search(&task, "sambal"));
    }

    #[test]
    fn anonymous_search_ignores_company() {
        let task = task_at(Stage::Audit, Utc::now());

        assert!(matches_name(&task, "manis"));
        assert!(!matches_name(&task, "sedap"));
        assert!(matches_search_for(&task, "sedap", true));
        assert!(!matches_search_for(&task, "sedap", false));
        assert!(matches_search_for(&task, "", false));
    }

    #[test]
    fn stats_count_stages_and_completion() {
        let now = Utc::now();
        let mut held = task_at(Stage::Audit, now);
        held.status = TaskStatus::OnHold;
        let tasks = vec![
            task_at(Stage::Submitted, now - Duration::days(5)),
            task_at(Stage::Certified, now),
            held,
        ];

        let stats = stats(&tasks, &SlaConfig::default(), now);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.on_hold, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.per_stage.len(), Stage::ALL.len());
        assert_eq!(stats.per_stage[Stage::Audit.index()].count, 1);
    }

    #[test]
    fn stats_of_nothing_is_zero() {
        let stats = stats(&[], &SlaConfig::default(), Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }
}
