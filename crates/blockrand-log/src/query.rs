use std::collections::BTreeMap;

use blockrand_core::{AssignmentRecord, Group, Stratum, GROUPS};
use serde::{Deserialize, Serialize};

/// Assignment counts derived from the persisted log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total: usize,
    pub per_group: BTreeMap<Group, usize>,
    /// Per stratum key, counts per group.
    pub per_stratum: BTreeMap<String, BTreeMap<Group, usize>>,
}

impl LogSummary {
    pub fn from_records(records: &[AssignmentRecord]) -> Self {
        let mut summary = Self::default();
        for group in GROUPS {
            summary.per_group.insert(group, 0);
        }
        for stratum in Stratum::all() {
            summary.per_stratum.insert(
                stratum.key().to_string(),
                GROUPS.iter().map(|group| (*group, 0)).collect(),
            );
        }
        for record in records {
            summary.total += 1;
            *summary.per_group.entry(record.assigned_group).or_default() += 1;
            *summary
                .per_stratum
                .entry(record.stratum_key.to_string())
                .or_default()
                .entry(record.assigned_group)
                .or_default() += 1;
        }
        summary
    }

    /// Largest difference between any two group counts within one stratum.
    pub fn max_stratum_imbalance(&self) -> usize {
        self.per_stratum
            .values()
            .map(|counts| {
                let max = counts.values().copied().max().unwrap_or(0);
                let min = counts.values().copied().min().unwrap_or(0);
                max - min
            })
            .max()
            .unwrap_or(0)
    }
}
