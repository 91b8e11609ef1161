//! Duplicate handling on the composite key

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::fact::{Fact, FactKey, ImportKind, Measure};

/// How rows sharing a key are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Add units and revenue together
    Sum,
    /// Keep the last row in file order
    Last,
}

impl DuplicatePolicy {
    /// Sales lines are additive, stock snapshots are not
    pub fn default_for(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Sales => DuplicatePolicy::Sum,
            ImportKind::Inventory => DuplicatePolicy::Last,
        }
    }
}

fn merge(existing: Measure, incoming: Measure, policy: DuplicatePolicy) -> Measure {
    match (policy, existing, incoming) {
        (
            DuplicatePolicy::Sum,
            Measure::Sales { units, revenue },
            Measure::Sales {
                units: more_units,
                revenue: more_revenue,
            },
        ) => Measure::Sales {
            units: units + more_units,
            revenue: revenue + more_revenue,
        },
        (DuplicatePolicy::Sum, Measure::Stock { units }, Measure::Stock { units: more }) => {
            Measure::Stock {
                units: units + more,
            }
        }
        _ => incoming,
    }
}

/// Collapse facts sharing a key.
///
/// Keeps first-seen order of keys and returns how many rows were merged away.
pub fn dedup(facts: Vec<Fact>, policy: DuplicatePolicy) -> (Vec<Fact>, usize) {
    let mut index: HashMap<FactKey, usize> = HashMap::with_capacity(facts.len());
    let mut unique: Vec<Fact> = Vec::with_capacity(facts.len());
    let mut merged = 0;

    for fact in facts {
        match index.get(&fact.key) {
            Some(&position) => {
                let slot = &mut unique[position];
                slot.measure = merge(slot.measure, fact.measure, policy);
                merged += 1;
            }
            None => {
                index.insert(fact.key, unique.len());
                unique.push(fact);
            }
        }
    }

    (unique, merged)
}
