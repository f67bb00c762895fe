mod in_mem;

use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use ecommerce_common::error::AppErrorCode;

// make in-memory repos visible for testing purpose
pub use in_mem::cart::CartInMemRepo;
pub use in_mem::cart_import::CartImportInMemRepo;
pub use in_mem::order::OrderInMemRepo;
pub use in_mem::sku_catalog::SkuCatalogInMemRepo;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
use postgres::cart::CartPgRepo;
#[cfg(feature = "postgres")]
use postgres::cart_import::CartImportPgRepo;
#[cfg(feature = "postgres")]
use postgres::order::OrderPgRepo;
#[cfg(feature = "postgres")]
use postgres::sku_catalog::SkuCatalogPgRepo;

use crate::error::AppError;
use crate::model::{
    CartImportJobModel, CartImportRowModel, CartModel, OrderLineModel, OrderModel, SkuModel,
    SkuPriceModelSet, SkuPriceTierModel,
};
use crate::AppDataStoreContext;

// repository instances are held across await points, futures built on top
// of them move between worker threads, hence the `Send` / `Sync` super-traits

#[async_trait]
pub trait AbsSkuCatalogRepo: Sync + Send {
    async fn fetch_by_ids(&self, ids: Vec<u64>) -> DefaultResult<Vec<SkuModel>, AppError>;
    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Vec<SkuModel>, AppError>;
    async fn fetch_by_name_spec(
        &self,
        name: &str,
        spec: &str,
    ) -> DefaultResult<Vec<SkuModel>, AppError>;
    async fn fetch_by_name(&self, name: &str) -> DefaultResult<Vec<SkuModel>, AppError>;
    /// SKU records together with all their price tiers, tier order is kept
    /// stable since price selection depends on it
    async fn fetch_pricing(&self, ids: Vec<u64>) -> DefaultResult<SkuPriceModelSet, AppError>;
    async fn save(&self, ms: SkuPriceModelSet) -> DefaultResult<(), AppError>;
}

#[async_trait]
pub trait AbsCartRepo: Sync + Send {
    /// Increment quantities of given SKUs in one shot, missing cart items
    /// are inserted, existing ones accumulate. Concurrent callers never
    /// lose an increment.
    async fn add_quantities(
        &self,
        owner: u32,
        items: Vec<(u64, u32)>,
    ) -> DefaultResult<usize, AppError>;

    async fn fetch_cart(&self, owner: u32) -> DefaultResult<CartModel, AppError>;

    /// Overwrite quantities with the given absolute values, an item with
    /// quantity zero is removed.
    async fn update(&self, obj: CartModel) -> DefaultResult<usize, AppError>;

    /// `sku_ids` set to `None` empties the whole cart.
    async fn discard(
        &self,
        owner: u32,
        sku_ids: Option<Vec<u64>>,
    ) -> DefaultResult<usize, AppError>;
}

#[async_trait]
pub trait AbsCartImportRepo: Sync + Send {
    async fn create_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError>;
    async fn update_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError>;
    async fn fetch_job(
        &self,
        owner: u32,
        job_id: &str,
    ) -> DefaultResult<Option<CartImportJobModel>, AppError>;
    /// Rows are keyed by `(job-id, row-number)`, saving an existing row
    /// overwrites it, confirmation reuses this to persist selections.
    async fn save_rows(&self, rows: &[CartImportRowModel]) -> DefaultResult<usize, AppError>;
    /// All rows of one job ordered by row number.
    async fn fetch_rows(&self, job_id: &str)
        -> DefaultResult<Vec<CartImportRowModel>, AppError>;
}

#[async_trait]
pub trait AbsOrderRepo: Sync + Send {
    /// Persist the order with its lines and drop the listed SKUs from the
    /// customer cart, all in a single atomic unit. A previously stored
    /// order with the same `(customer, idempotency-key)` pair makes the
    /// whole call fail with `DuplicateKeyExists`.
    async fn create(
        &self,
        order: &OrderModel,
        lines: &[OrderLineModel],
        discard_cart_skus: &[u64],
    ) -> DefaultResult<(), AppError>;

    async fn fetch_by_idempotency_key(
        &self,
        customer: u32,
        key: &str,
    ) -> DefaultResult<Option<OrderModel>, AppError>;

    async fn fetch_lines(&self, order_id: &str) -> DefaultResult<Vec<OrderLineModel>, AppError>;
}

pub async fn app_repo_sku_catalog(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsSkuCatalogRepo>, AppError> {
    #[cfg(feature = "postgres")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = SkuCatalogPgRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("postgres".to_string()),
        })
    }
    #[cfg(not(feature = "postgres"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = SkuCatalogInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub async fn app_repo_cart(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsCartRepo>, AppError> {
    #[cfg(feature = "postgres")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = CartPgRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("postgres".to_string()),
        })
    }
    #[cfg(not(feature = "postgres"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = CartInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub async fn app_repo_cart_import(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsCartImportRepo>, AppError> {
    #[cfg(feature = "postgres")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = CartImportPgRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("postgres".to_string()),
        })
    }
    #[cfg(not(feature = "postgres"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = CartImportInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub async fn app_repo_order(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsOrderRepo>, AppError> {
    #[cfg(feature = "postgres")]
    if let Some(dbs) = ds.sql_dbs.as_ref() {
        let obj = OrderPgRepo::new(dbs)?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::FeatureDisabled,
            detail: Some("postgres".to_string()),
        })
    }
    #[cfg(not(feature = "postgres"))]
    if let Some(m) = ds.in_mem.as_ref() {
        let obj = OrderInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub(crate) fn tiers_sorted(mut tiers: Vec<SkuPriceTierModel>) -> Vec<SkuPriceTierModel> {
    tiers.sort_by_key(|t| t.min_qty);
    tiers
}
