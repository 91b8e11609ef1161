//! Store and product ID mapping
//!
//! Retailer exports identify stores by their own store numbers and products
//! by EAN. Codes resolve through an optional TOML mapping file first and
//! the `stores` / `products` tables second.
//!
//! ```toml
//! [stores]
//! "0042" = "5f0c7c1e-8f0b-4c43-9d0e-2b7a3c1d9e10"
//!
//! [products]
//! "4006381333931" = "a1b2c3d4-0000-4000-8000-000000000001"
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ImportError;
use crate::fact::{Fact, FactKey, ParsedRow};

/// Contents of a `--mapping` file
#[derive(Debug, Default, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub stores: HashMap<String, Uuid>,
    #[serde(default)]
    pub products: HashMap<String, Uuid>,
}

impl MappingFile {
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ImportError> {
        Ok(toml::from_str(contents)?)
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Lookup from retailer codes to ids
#[derive(Debug, Default)]
pub struct IdMapper {
    stores: HashMap<String, Uuid>,
    products: HashMap<String, Uuid>,
}

impl IdMapper {
    pub fn new(
        stores: impl IntoIterator<Item = (String, Uuid)>,
        products: impl IntoIterator<Item = (String, Uuid)>,
    ) -> Self {
        Self {
            stores: stores
                .into_iter()
                .map(|(code, id)| (normalize_code(&code), id))
                .collect(),
            products: products
                .into_iter()
                .map(|(code, id)| (normalize_code(&code), id))
                .collect(),
        }
    }

    /// Layer mapping-file entries over the current lookups
    pub fn with_overrides(mut self, file: MappingFile) -> Self {
        for (code, id) in file.stores {
            self.stores.insert(normalize_code(&code), id);
        }
        for (code, id) in file.products {
            self.products.insert(normalize_code(&code), id);
        }
        self
    }

    pub fn store(&self, code: &str) -> Option<Uuid> {
        self.stores.get(&normalize_code(code)).copied()
    }

    pub fn product(&self, code: &str) -> Option<Uuid> {
        self.products.get(&normalize_code(code)).copied()
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

/// Rows with ids resolved, plus what could not be resolved
#[derive(Debug, Default)]
pub struct MapOutcome {
    pub facts: Vec<Fact>,
    pub unmapped_rows: usize,
    pub unmapped_stores: BTreeSet<String>,
    pub unmapped_products: BTreeSet<String>,
}

/// Resolve ids for every row; rows with an unknown store or product are dropped
pub fn map_rows(rows: Vec<ParsedRow>, mapper: &IdMapper) -> MapOutcome {
    let mut outcome = MapOutcome::default();

    for row in rows {
        let store_id = mapper.store(&row.store_code);
        let product_id = mapper.product(&row.product_code);

        match (store_id, product_id) {
            (Some(store_id), Some(product_id)) => outcome.facts.push(Fact {
                key: FactKey {
                    store_id,
                    product_id,
                    date: row.date,
                },
                measure: row.measure,
            }),
            _ => {
                if store_id.is_none() {
                    outcome.unmapped_stores.insert(row.store_code.trim().to_string());
                }
                if product_id.is_none() {
                    outcome
                        .unmapped_products
                        .insert(row.product_code.trim().to_string());
                }
                tracing::debug!(
                    line = row.line,
                    store = %row.store_code,
                    product = %row.product_code,
                    "Unmapped row"
                );
                outcome.unmapped_rows += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::Measure;
    use chrono::NaiveDate;

    fn row(store: &str, product: &str) -> ParsedRow {
        ParsedRow {
            line: 2,
            store_code: store.to_string(),
            product_code: product.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            measure: Measure::Sales {
                units: 1,
                revenue: 1.0,
            },
        }
    }

    #[test]
    fn mapping_file_takes_precedence() {
        let db_store = Uuid::new_v4();
        let file_store = Uuid::new_v4();
        let file = MappingFile::from_toml(&format!(
            "[stores]\n\"0042\" = \"{}\"\n",
            file_store
        ))
        .unwrap();

        let mapper =
            IdMapper::new([("0042".to_string(), db_store)], []).with_overrides(file);

        assert_eq!(mapper.store("0042"), Some(file_store));
        assert_eq!(mapper.store_count(), 1);
    }

    #[test]
    fn codes_match_ignoring_case_and_whitespace() {
        let id = Uuid::new_v4();
        let mapper = IdMapper::new([("ab-12".to_string(), id)], []);

        assert_eq!(mapper.store(" AB-12 "), Some(id));
    }

    #[test]
    fn unmapped_codes_are_reported_once() {
        let store = Uuid::new_v4();
        let product = Uuid::new_v4();
        let mapper = IdMapper::new(
            [("S1".to_string(), store)],
            [("P1".to_string(), product)],
        );

        let outcome = map_rows(
            vec![
                row("S1", "P1"),
                row("S9", "P1"),
                row("S9", "P7"),
                row("S1", "P7"),
            ],
            &mapper,
        );

        assert_eq!(outcome.facts.len(), 1);
        assert_eq!(outcome.facts[0].key.store_id, store);
        assert_eq!(outcome.unmapped_rows, 3);
        assert_eq!(
            outcome.unmapped_stores.into_iter().collect::<Vec<_>>(),
            vec!["S9"]
        );
        assert_eq!(
            outcome.unmapped_products.into_iter().collect::<Vec<_>>(),
            vec!["P7"]
        );
    }

    #[test]
    fn empty_mapping_file_is_valid() {
        let file = MappingFile::from_toml("").unwrap();
        assert!(file.stores.is_empty());
        assert!(file.products.is_empty());
    }

    #[test]
    fn invalid_mapping_file_is_rejected() {
        let err = MappingFile::from_toml("[stores]\n\"1\" = \"not-a-uuid\"\n").unwrap_err();
        assert!(matches!(err, ImportError::Mapping(_)));
    }
}
