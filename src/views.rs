//! Plain-text renderings of the board, table and stats views.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use halaltrack_core::workflow::{self, Stats};
use halaltrack_core::AppState;

pub fn render_board(state: &AppState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for (stage, tasks) in state.board() {
        let limit = state.sla.limit_for(stage);
        let sla = if limit > 0 {
            format!("SLA {}d", limit)
        } else {
            "no SLA".to_string()
        };
        let _ = writeln!(out, "== {} ({}) [{}]", stage.label(), tasks.len(), sla);
        if tasks.is_empty() {
            let _ = writeln!(out, "   (empty)");
        }
        for task in tasks {
            let status = workflow::sla_status(task, &state.sla, now);
            let (done, total) = workflow::checklist_progress(task, stage);
            let mut flags = Vec::new();
            if status.overdue {
                flags.push("OVERDUE");
            }
            if task.is_on_hold() {
                flags.push("ON HOLD");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            let _ = writeln!(
                out,
                "   - {} / {} ({}d, checklist {}/{}, {}){}",
                task.name,
                task.company,
                status.days_in_stage,
                done,
                total,
                task.assigned_to,
                flags
            );
        }
    }
    out
}

pub fn render_table(state: &AppState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<28}  {:<20}  {:<8}  {}",
        "ID", "PRODUCT / COMPANY", "STAGE", "STATUS", "SLA"
    );
    for task in state.visible_tasks() {
        let status = workflow::sla_status(task, &state.sla, now);
        let sla = if status.limit == 0 {
            format!("{}d / -", status.days_in_stage)
        } else if status.overdue {
            format!("{}d / {}d OVERDUE", status.days_in_stage, status.limit)
        } else {
            format!("{}d / {}d", status.days_in_stage, status.limit)
        };
        let _ = writeln!(
            out,
            "{:<36}  {:<28}  {:<20}  {:<8}  {}",
            task.id,
            truncate(&format!("{} / {}", task.name, task.company), 28),
            task.stage.label(),
            task.status.label(),
            sla
        );
    }
    out
}

pub fn render_stats(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total tasks:     {}", stats.total);
    let _ = writeln!(
        out,
        "Certified:       {} ({}%)",
        stats.completed, stats.completion_rate
    );
    let _ = writeln!(out, "On hold:         {}", stats.on_hold);
    let _ = writeln!(out, "Overdue:         {}", stats.overdue);
    let _ = writeln!(out);
    for entry in &stats.per_stage {
        let _ = writeln!(out, "{:<22} {:>4}", entry.label, entry.count);
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
