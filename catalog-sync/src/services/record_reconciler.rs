//! Record reconciliation
//!
//! Streams a line-delimited bulk result, keeps products in first-seen order
//! and attaches metafields by parent id once the stream is exhausted.

use std::collections::{HashMap, HashSet};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::{ExportRecord, Metafield, Product, RecordKind};

/// Products rebuilt from one result file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledCatalog {
    pub products: Vec<Product>,
    /// Lines that were not valid JSON or had neither id nor parent
    pub skipped_lines: usize,
    /// Later records repeating an already seen product id
    pub duplicate_products: usize,
    /// Metafields whose parent never appeared
    pub orphaned_metafields: usize,
}

/// Reconcile a line-delimited stream into product aggregates
///
/// Read errors end reconciliation; malformed lines only get counted.
pub async fn reconcile<R>(mut reader: R) -> Result<ReconciledCatalog, SyncError>
where
    R: AsyncBufRead + Unpin,
{
    let mut catalog = ReconciledCatalog::default();
    let mut seen_ids = HashSet::new();
    let mut metafields_by_parent: HashMap<String, Vec<Metafield>> = HashMap::new();

    let mut line = Vec::new();
    let mut line_number = 0usize;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        line_number += 1;

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let record: ExportRecord = match serde_json::from_slice(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed export line");
                catalog.skipped_lines += 1;
                continue;
            }
        };

        match record.classify() {
            Some(RecordKind::Product(product)) => {
                if seen_ids.insert(product.id.clone()) {
                    catalog.products.push(product);
                } else {
                    warn!(line = line_number, id = %product.id, "Duplicate product record ignored");
                    catalog.duplicate_products += 1;
                }
            }
            Some(RecordKind::Metafield {
                parent_id,
                metafield,
            }) => {
                metafields_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(metafield);
            }
            None => {
                warn!(line = line_number, "Skipping export line with neither id nor parent");
                catalog.skipped_lines += 1;
            }
        }
    }

    for product in &mut catalog.products {
        if let Some(metafields) = metafields_by_parent.remove(&product.id) {
            product.metafields = metafields;
        }
    }

    catalog.orphaned_metafields = metafields_by_parent.values().map(Vec::len).sum();
    if catalog.orphaned_metafields > 0 {
        warn!(
            count = catalog.orphaned_metafields,
            parents = metafields_by_parent.len(),
            "Metafields without a matching product"
        );
    }

    debug!(
        lines = line_number,
        products = catalog.products.len(),
        skipped = catalog.skipped_lines,
        "Reconciliation finished"
    );

    Ok(catalog)
}
