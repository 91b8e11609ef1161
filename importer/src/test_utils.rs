//! In-memory sink and fixtures for importer tests

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ImportError;
use crate::fact::{Fact, FactKey, Measure};
use crate::sink::FactSink;

/// Stores upserted facts; any statement touching a failing store is rejected
#[derive(Default)]
pub struct MemorySink {
    stored: Arc<RwLock<Vec<Fact>>>,
    calls: Arc<RwLock<usize>>,
    failing_stores: HashSet<Uuid>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, store_id: Uuid) -> Self {
        self.failing_stores.insert(store_id);
        self
    }

    pub fn stored(&self) -> Vec<Fact> {
        self.stored.read().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl FactSink for MemorySink {
    async fn upsert(&self, facts: &[Fact]) -> Result<(), ImportError> {
        *self.calls.write().unwrap() += 1;

        if let Some(bad) = facts
            .iter()
            .find(|f| self.failing_stores.contains(&f.key.store_id))
        {
            return Err(ImportError::Rejected(format!(
                "foreign key violation for store {}",
                bad.key.store_id
            )));
        }

        let mut stored = self.stored.write().unwrap();
        for fact in facts {
            match stored.iter_mut().find(|f| f.key == fact.key) {
                Some(existing) => existing.measure = fact.measure,
                None => stored.push(fact.clone()),
            }
        }
        Ok(())
    }
}

/// One sales fact for `store_id` on 2024-03-01
pub fn fact_for_store(store_id: Uuid) -> Fact {
    Fact {
        key: FactKey {
            store_id,
            product_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        },
        measure: Measure::Sales {
            units: 1,
            revenue: 2.5,
        },
    }
}
