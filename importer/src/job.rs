//! One import run: parse, map, deduplicate, write

use serde::Serialize;
use uuid::Uuid;

use crate::dedup::{dedup, DuplicatePolicy};
use crate::error::ImportError;
use crate::fact::ImportKind;
use crate::mapping::{map_rows, IdMapper};
use crate::parse::parse_csv;
use crate::sink::{write_batches, FactSink, WriteStats};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub kind: ImportKind,
    pub tenant_id: Uuid,
    pub retailer_id: Uuid,
    pub duplicates: DuplicatePolicy,
    pub batch_size: usize,
    pub dry_run: bool,
}

/// Summary printed as JSON at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub tenant_id: Uuid,
    pub retailer_id: Uuid,
    pub dry_run: bool,
    pub duplicates: DuplicatePolicy,
    pub rows_read: usize,
    pub parse_errors: usize,
    pub unmapped_rows: usize,
    pub unmapped_store_codes: Vec<String>,
    pub unmapped_product_codes: Vec<String>,
    pub duplicates_merged: usize,
    pub rows_to_write: usize,
    #[serde(flatten)]
    pub write: WriteStats,
}

/// Run the import over `input`.
///
/// Nothing is written on a dry run or when no sink is given.
pub async fn run<S>(
    input: &[u8],
    options: &ImportOptions,
    mapper: &IdMapper,
    sink: Option<&S>,
) -> Result<ImportReport, ImportError>
where
    S: FactSink + ?Sized,
{
    let parsed = parse_csv(input, options.kind)?;
    tracing::info!(
        rows = parsed.rows_read,
        errors = parsed.errors.len(),
        "Parsed input"
    );

    let parse_errors = parsed.errors.len();
    let mapped = map_rows(parsed.rows, mapper);
    if mapped.unmapped_rows > 0 {
        tracing::warn!(
            rows = mapped.unmapped_rows,
            stores = ?mapped.unmapped_stores,
            products = ?mapped.unmapped_products,
            "Rows skipped for unmapped codes"
        );
    }

    let (facts, duplicates_merged) = dedup(mapped.facts, options.duplicates);
    tracing::info!(
        facts = facts.len(),
        merged = duplicates_merged,
        policy = ?options.duplicates,
        "Deduplicated rows"
    );

    let write = match sink {
        Some(sink) if !options.dry_run => {
            write_batches(sink, &facts, options.batch_size).await
        }
        _ => {
            tracing::info!("Dry run, nothing written");
            WriteStats::default()
        }
    };

    Ok(ImportReport {
        kind: options.kind,
        tenant_id: options.tenant_id,
        retailer_id: options.retailer_id,
        dry_run: options.dry_run,
        duplicates: options.duplicates,
        rows_read: parsed.rows_read,
        parse_errors,
        unmapped_rows: mapped.unmapped_rows,
        unmapped_store_codes: mapped.unmapped_stores.into_iter().collect(),
        unmapped_product_codes: mapped.unmapped_products.into_iter().collect(),
        duplicates_merged,
        rows_to_write: facts.len(),
        write,
    })
}
