use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{fmt_time, Database};
use crate::models::SlaConfig;

const SLA_KEY: &str = "sla_config";

impl Database {
    /// Stored SLA limits, or the stage defaults when nothing has been saved.
    pub fn get_sla_config(&self) -> Result<SlaConfig> {
        self.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key = ?1",
                    params![SLA_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            match value {
                Some(json) => serde_json::from_str(&json).context("Malformed SLA settings row"),
                None => Ok(SlaConfig::default()),
            }
        })
    }

    /// Replace the SLA settings wholesale.
    pub fn save_sla_config(&self, sla: &SlaConfig) -> Result<SlaConfig> {
        let json = serde_json::to_string(sla)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![SLA_KEY, json, fmt_time(Utc::now())],
            )?;
            Ok(())
        })?;
        tracing::info!("Saved SLA settings");
        self.get_sla_config()
    }
}
