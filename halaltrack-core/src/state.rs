//! In-memory application state and the actions that mutate it.
//!
//! Front ends hold one [`AppState`] and only change it through [`reduce`].
//! After a mutation the changed entity is re-fetched and merged with
//! [`Action::TaskUpserted`] instead of reloading everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SlaConfig, Stage, Task, UserAccount};
use crate::workflow;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Dashboard,
    Tasks,
    Admin,
    Settings,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub tasks: Vec<Task>,
    pub users: Vec<UserAccount>,
    pub current_user: Option<UserAccount>,
    pub sla: SlaConfig,
    pub view: View,
    pub search: String,
}

#[derive(Debug, Clone)]
pub enum Action {
    Loaded { tasks: Vec<Task>, sla: SlaConfig },
    SignedIn(UserAccount),
    SignedOut,
    TaskUpserted(Task),
    TaskRemoved(Uuid),
    UsersLoaded(Vec<UserAccount>),
    SlaSaved(SlaConfig),
    Navigate(View),
    Search(String),
}

pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::Loaded { mut tasks, sla } => {
            sort_newest_first(&mut tasks);
            state.tasks = tasks;
            state.sla = sla;
        }
        Action::SignedIn(user) => state.current_user = Some(user),
        Action::SignedOut => {
            state.current_user = None;
            state.users.clear();
            if matches!(state.view, View::Admin) {
                state.view = View::Dashboard;
            }
        }
        Action::TaskUpserted(task) => {
            match state.tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task,
                None => {
                    state.tasks.push(task);
                    sort_newest_first(&mut state.tasks);
                }
            }
        }
        Action::TaskRemoved(id) => state.tasks.retain(|t| t.id != id),
        Action::UsersLoaded(users) => state.users = users,
        Action::SlaSaved(sla) => state.sla = sla,
        Action::Navigate(view) => state.view = view,
        Action::Search(query) => state.search = query,
    }
}

fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl AppState {
    pub fn can_edit(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.role.can_manage())
    }

    /// Tasks passing the current search filter.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| workflow::matches_search(task, &self.search))
            .collect()
    }

    /// Visible tasks grouped by stage, in pipeline order.
    pub fn board(&self) -> Vec<(Stage, Vec<&Task>)> {
        let visible = self.visible_tasks();
        Stage::ALL
            .iter()
            .map(|stage| {
                let column = visible
                    .iter()
                    .copied()
                    .filter(|task| task.stage == *stage)
                    .collect();
                (*stage, column)
            })
            .collect()
    }

    pub fn overdue_count(&self, now: DateTime<Utc>) -> usize {
        self.tasks
            .iter()
            .filter(|task| workflow::is_overdue(task, &self.sla, now))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use super::*;
    use crate::models::{Role, TaskStatus};

    fn task(name: &str, company: &str, stage: Stage, created: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            name: name.into(),
            company: company.into(),
            description: String::new(),
            contact_person: None,
            contact_phone: None,
            contact_email: None,
            stage,
            status: TaskStatus::Active,
            created_at: created,
            stage_updated_at: created,
            assigned_to: "siti".into(),
            ai_analysis: None,
            checklist: BTreeMap::new(),
        }
    }

    fn admin() -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            username: "admin".into(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn loaded_orders_newest_first() {
        let now = Utc::now();
        let older = task("Sambal", "PT A", Stage::Audit, now - Duration::days(2));
        let newer = task("Kecap", "PT B", Stage::Audit, now);
        let mut state = AppState::default();

        reduce(
            &mut state,
            Action::Loaded { tasks: vec![older.clone(), newer.clone()], sla: SlaConfig::default() },
        );

        assert_eq!(state.tasks[0].id, newer.id);
        assert_eq!(state.tasks[1].id, older.id);
    }

    #[test]
    fn upsert_replaces_only_the_affected_task() {
        let now = Utc::now();
        let a = task("Sambal", "PT A", Stage::Audit, now - Duration::days(1));
        let b = task("Kecap", "PT B", Stage::Review, now);
        let mut state = AppState::default();
        reduce(&mut state, Action::Loaded { tasks: vec![a.clone(), b.clone()], sla: SlaConfig::default() });

        let mut changed = a.clone();
        changed.stage = Stage::Review;
        reduce(&mut state, Action::TaskUpserted(changed));

        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.tasks[1].stage, Stage::Review);
        assert_eq!(state.tasks[0], b);
    }

    #[test]
    fn upsert_inserts_new_task_in_order() {
        let now = Utc::now();
        let mut state = AppState::default();
        reduce(&mut state, Action::TaskUpserted(task("Lama", "PT A", Stage::Audit, now - Duration::days(3))));
        let fresh = task("Baru", "PT B", Stage::Submitted, now);
        reduce(&mut state, Action::TaskUpserted(fresh.clone()));

        assert_eq!(state.tasks[0].id, fresh.id);
    }

    #[test]
    fn removed_task_leaves_state() {
        let t = task("Sambal", "PT A", Stage::Audit, Utc::now());
        let mut state = AppState::default();
        reduce(&mut state, Action::TaskUpserted(t.clone()));
        reduce(&mut state, Action::TaskRemoved(t.id));
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn sign_out_drops_admin_view_and_users() {
        let mut state = AppState::default();
        reduce(&mut state, Action::SignedIn(admin()));
        assert!(state.can_edit());
        assert!(state.is_admin());
        reduce(&mut state, Action::UsersLoaded(vec![admin()]));
        reduce(&mut state, Action::Navigate(View::Admin));

        reduce(&mut state, Action::SignedOut);

        assert!(!state.can_edit());
        assert!(state.users.is_empty());
        assert_eq!(state.view, View::Dashboard);
    }

    #[test]
    fn board_groups_visible_tasks_by_stage() {
        let now = Utc::now();
        let mut state = AppState::default();
        reduce(
            &mut state,
            Action::Loaded {
                tasks: vec![
                    task("Kecap", "PT Sedap", Stage::Audit, now),
                    task("Sambal", "PT Pedas", Stage::Audit, now),
                    task("Roti", "PT Sedap", Stage::Review, now),
                ],
                sla: SlaConfig::default(),
            },
        );
        reduce(&mut state, Action::Search("sedap".into()));

        let board = state.board();

        assert_eq!(board.len(), Stage::ALL.len());
        assert_eq!(board[Stage::Audit.index()].1.len(), 1);
        assert_eq!(board[Stage::Review.index()].1.len(), 1);
        assert_eq!(state.visible_tasks().len(), 2);
    }

    #[test]
    fn overdue_count_uses_saved_sla() {
        let now = Utc::now();
        let mut state = AppState::default();
        reduce(&mut state, Action::TaskUpserted(task("Kecap", "PT A", Stage::Audit, now - Duration::days(5))));
        assert_eq!(state.overdue_count(now), 0);

        let mut sla = SlaConfig::default();
        sla.set(Stage::Audit, 4);
        reduce(&mut state, Action::SlaSaved(sla));
        assert_eq!(state.overdue_count(now), 1);
    }
}
