//! Import row types

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Which fact table a run writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Sales,
    Inventory,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Sales => write!(f, "sales"),
            ImportKind::Inventory => write!(f, "inventory"),
        }
    }
}

/// Values carried by one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Sales { units: i64, revenue: f64 },
    Stock { units: i64 },
}

/// A parsed row that still refers to the retailer's own codes
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub line: u64,
    pub store_code: String,
    pub product_code: String,
    pub date: NaiveDate,
    pub measure: Measure,
}

/// Composite key within one tenant and retailer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactKey {
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub date: NaiveDate,
}

/// A mapped row ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub key: FactKey,
    pub measure: Measure,
}
