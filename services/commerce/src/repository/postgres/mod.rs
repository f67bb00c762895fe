pub(super) mod cart;
pub(super) mod cart_import;
pub(super) mod order;
pub(super) mod sku_catalog;

use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::error::AppErrorCode;

use crate::adapter::datastore::AppPgDbStore;
use crate::error::AppError;

// each repo keeps a handle to the primary database, replica routing is
// not part of this application yet
pub(super) fn pick_primary_db(
    dbs: &[Arc<AppPgDbStore>],
) -> DefaultResult<Arc<AppPgDbStore>, AppError> {
    dbs.first().cloned().ok_or(AppError {
        code: AppErrorCode::MissingDataStore,
        detail: Some("postgres".to_string()),
    })
}

// placeholders are numbered in postgres, the helper renders one tuple
// group per batch item, e.g. ($1,$2),($3,$4)
pub(super) fn placeholder_groups(num_batch: usize, group_sz: usize) -> String {
    (0..num_batch)
        .map(|b| {
            let cols = (0..group_sz)
                .map(|c| format!("${}", b * group_sz + c + 1))
                .collect::<Vec<_>>()
                .join(",");
            format!("({cols})")
        })
        .collect::<Vec<_>>()
        .join(",")
}
