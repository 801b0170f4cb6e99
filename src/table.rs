//! Risk table loader

use crate::analytics::explain::ScoreExplainer;
use crate::types::RiskRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// In-memory snapshot of the precomputed risk table
#[derive(Debug, Clone, Default)]
pub struct RiskTable {
    records: Vec<RiskRecord>,
}

impl RiskTable {
    pub fn new(records: Vec<RiskRecord>) -> Self {
        Self { records }
    }

    /// Load a table from a `.json` array or a JSON Lines file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read risk table from {:?}", path))?;

        let is_array = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let records = if is_array {
            serde_json::from_str::<Vec<RiskRecord>>(&content)
                .with_context(|| format!("Failed to parse JSON risk table {:?}", path))?
        } else {
            parse_json_lines(&content)
                .with_context(|| format!("Failed to parse JSON Lines risk table {:?}", path))?
        };

        info!(path = %path.display(), rows = records.len(), "Risk table loaded");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[RiskRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RiskRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compute `risk_explanation` for rows that lack one; returns how many
    /// rows were filled. Rows with non-finite features are left untouched.
    pub fn fill_explanations(&mut self, explainer: &ScoreExplainer) -> usize {
        let mut filled = 0;
        for record in self.records.iter_mut().filter(|r| r.risk_explanation.is_none()) {
            match record.features() {
                Ok(features) => {
                    record.risk_explanation = Some(explainer.explain(&features).to_string());
                    filled += 1;
                }
                Err(e) => {
                    warn!(user_id = %record.user_id, error = %e, "Skipping explanation");
                }
            }
        }
        filled
    }
}

fn parse_json_lines(content: &str) -> Result<Vec<RiskRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid record on line {}", idx + 1))
        })
        .collect()
}
