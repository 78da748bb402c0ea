use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Allowed days per stage. Stored wholesale as a single settings row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SlaConfig {
    limits: BTreeMap<Stage, u32>,
}

impl SlaConfig {
    pub fn new(limits: BTreeMap<Stage, u32>) -> Self {
        Self { limits }
    }

    /// Configured limit for `stage`, falling back to the stage default when
    /// the stored config has no entry.
    pub fn limit_for(&self, stage: Stage) -> u32 {
        self.limits
            .get(&stage)
            .copied()
            .unwrap_or_else(|| stage.default_sla_days())
    }

    pub fn set(&mut self, stage: Stage, days: u32) {
        self.limits.insert(stage, days);
    }

    /// Every stage with its effective limit, in pipeline order.
    pub fn entries(&self) -> Vec<(Stage, u32)> {
        Stage::ALL
            .iter()
            .map(|stage| (*stage, self.limit_for(*stage)))
            .collect()
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            limits: Stage::ALL
                .iter()
                .map(|stage| (*stage, stage.default_sla_days()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_stage_defaults() {
        let sla = SlaConfig::default();
        assert_eq!(sla.limit_for(Stage::Submitted), 1);
        assert_eq!(sla.limit_for(Stage::Audit), 7);
        assert_eq!(sla.limit_for(Stage::Prospek), 0);
    }

    #[test]
    fn missing_entries_fall_back_to_defaults() {
        let sla: SlaConfig = serde_json::from_str(r#"{"audit": 10}"#).unwrap();
        assert_eq!(sla.limit_for(Stage::Audit), 10);
        assert_eq!(sla.limit_for(Stage::Review), 3);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut sla = SlaConfig::new(BTreeMap::new());
        sla.set(Stage::Pricing, 5);
        assert_eq!(serde_json::to_string(&sla).unwrap(), r#"{"pricing":5}"#);
    }

    #[test]
    fn entries_cover_every_stage_in_order() {
        let entries = SlaConfig::default().entries();
        let stages: Vec<Stage> = entries.iter().map(|(stage, _)| *stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }
}
