use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Stage;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub description: String,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub stage: Stage,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub stage_updated_at: DateTime<Utc>,
    pub assigned_to: String,
    pub ai_analysis: Option<String>,
    pub checklist: BTreeMap<Stage, Vec<ChecklistItem>>,
}

impl Task {
    pub fn is_on_hold(&self) -> bool {
        self.status == TaskStatus::OnHold
    }

    /// Checklist items for one stage, in display order.
    pub fn checklist_for(&self, stage: Stage) -> &[ChecklistItem] {
        self.checklist.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    OnHold,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "on_hold" => Some(Self::OnHold),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::OnHold => "On Hold",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Active => Self::OnHold,
            Self::OnHold => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub label: String,
    pub completed: bool,
    /// Order within the stage's checklist, starting at 0.
    pub position: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub name: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    /// Starting stage; new applications default to `Submitted`.
    pub stage: Option<Stage>,
}

impl CreateTaskInput {
    pub fn new(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            description: String::new(),
            contact_person: None,
            contact_phone: None,
            contact_email: None,
            stage: None,
        }
    }
}

/// Partial edit. `None` keeps the stored value; an empty contact field
/// clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub name: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub assigned_to: Option<String>,
}
