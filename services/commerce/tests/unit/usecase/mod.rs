mod create_order;
mod import_cart;

use std::boxed::Box;
use std::sync::Arc;

use commerce::datastore::AbstInMemoryDStore;
use commerce::model::SkuPriceModelSet;
use commerce::repository::{
    AbsCartImportRepo, AbsCartRepo, AbsOrderRepo, AbsSkuCatalogRepo, CartImportInMemRepo,
    CartInMemRepo, OrderInMemRepo, SkuCatalogInMemRepo,
};

use crate::model::{ut_sku, ut_tier};

pub(super) async fn ut_catalog_repo(
    ds: Arc<Box<dyn AbstInMemoryDStore>>,
) -> Box<dyn AbsSkuCatalogRepo> {
    Box::new(SkuCatalogInMemRepo::new(ds).await.unwrap())
}
pub(super) async fn ut_cart_repo(ds: Arc<Box<dyn AbstInMemoryDStore>>) -> Box<dyn AbsCartRepo> {
    Box::new(CartInMemRepo::new(ds).await.unwrap())
}
pub(super) async fn ut_import_repo(
    ds: Arc<Box<dyn AbstInMemoryDStore>>,
) -> Box<dyn AbsCartImportRepo> {
    Box::new(CartImportInMemRepo::new(ds).await.unwrap())
}
pub(super) async fn ut_order_repo(ds: Arc<Box<dyn AbstInMemoryDStore>>) -> Box<dyn AbsOrderRepo> {
    Box::new(OrderInMemRepo::new(ds).await.unwrap())
}

/// Catalog shared by the use-case tests :
/// - 140 / 141, two keyboards with the same name, distinct spec
/// - 152, a mouse whose pricing stops at quantity 5
/// - 160, a discontinued drive kept inactive
pub(super) async fn ut_seed_catalog(ds: Arc<Box<dyn AbstInMemoryDStore>>) {
    let repo = SkuCatalogInMemRepo::new(ds).await.unwrap();
    let ms = SkuPriceModelSet {
        skus: vec![
            ut_sku(140, "KB-0042", "wireless keyboard", "US layout", true),
            ut_sku(141, "KB-0043", "wireless keyboard", "DE layout", true),
            ut_sku(152, "MS-0007", "optical mouse", "", true),
            ut_sku(160, "HD-0001", "ssd drive", "1TB", false),
        ],
        tiers: vec![
            ut_tier(140, 1, Some(9), 1000),
            ut_tier(140, 10, Some(49), 880),
            ut_tier(140, 50, None, 790),
            ut_tier(141, 1, None, 1050),
            ut_tier(152, 1, Some(5), 450),
            ut_tier(160, 1, None, 2050),
        ],
    };
    repo.save(ms).await.unwrap();
}
