use commerce::model::SkuPriceModelSet;
use commerce::repository::{AbsSkuCatalogRepo, SkuCatalogInMemRepo};

use crate::model::{ut_sku, ut_tier};
use crate::ut_setup_datastore;

async fn ut_setup_repo() -> SkuCatalogInMemRepo {
    let ds = ut_setup_datastore(60);
    SkuCatalogInMemRepo::new(ds).await.unwrap()
}

fn ut_seed_catalog() -> SkuPriceModelSet {
    SkuPriceModelSet {
        skus: vec![
            ut_sku(152, "MS-0007", "optical mouse", "", true),
            ut_sku(140, "KB-0042", "wireless keyboard", "US layout", true),
            ut_sku(141, "KB-0043", "wireless keyboard", "DE layout", false),
        ],
        tiers: vec![
            ut_tier(140, 50, None, 790),
            ut_tier(140, 1, Some(9), 1000),
            ut_tier(140, 10, Some(49), 880),
            ut_tier(152, 1, None, 450),
        ],
    }
}

#[tokio::test]
async fn save_fetch_by_ids_ok() {
    let repo = ut_setup_repo().await;
    repo.save(ut_seed_catalog()).await.unwrap();
    let found = repo.fetch_by_ids(vec![141, 140, 999]).await.unwrap();
    // missing IDs are silently absent, result sorted by SKU id
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id_, 140);
    assert_eq!(found[0].code.as_str(), "KB-0042");
    assert!(found[0].active);
    assert_eq!(found[1].id_, 141);
    assert!(!found[1].active);
}

#[tokio::test]
async fn fetch_by_code_ok() {
    let repo = ut_setup_repo().await;
    repo.save(ut_seed_catalog()).await.unwrap();
    let found = repo.fetch_by_code("MS-0007").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id_, 152);
    let found = repo.fetch_by_code("ZZ-9999").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn fetch_by_name_narrowed_by_spec() {
    let repo = ut_setup_repo().await;
    repo.save(ut_seed_catalog()).await.unwrap();
    let found = repo.fetch_by_name("wireless keyboard").await.unwrap();
    assert_eq!(found.len(), 2);
    let found = repo
        .fetch_by_name_spec("wireless keyboard", "DE layout")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id_, 141);
    let found = repo
        .fetch_by_name_spec("wireless keyboard", "FR layout")
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn fetch_pricing_tiers_stay_ordered() {
    let repo = ut_setup_repo().await;
    // tiers were seeded out of order on purpose
    repo.save(ut_seed_catalog()).await.unwrap();
    let ms = repo.fetch_pricing(vec![140, 152]).await.unwrap();
    assert_eq!(ms.skus.len(), 2);
    let tiers = ms.tiers_of(140);
    assert_eq!(tiers.len(), 3);
    let min_qtys = tiers.iter().map(|t| t.min_qty).collect::<Vec<_>>();
    assert_eq!(min_qtys, vec![1, 10, 50]);
    assert_eq!(ms.unit_price(140, 25), Some(880));
    assert_eq!(ms.unit_price(140, 300), Some(790));
    assert_eq!(ms.unit_price(152, 2), Some(450));
}

#[tokio::test]
async fn save_overwrites_existing_sku() {
    let repo = ut_setup_repo().await;
    repo.save(ut_seed_catalog()).await.unwrap();
    let patch = SkuPriceModelSet {
        skus: vec![ut_sku(140, "KB-0042", "wireless keyboard v2", "US layout", false)],
        tiers: vec![ut_tier(140, 1, None, 950)],
    };
    repo.save(patch).await.unwrap();
    let found = repo.fetch_by_ids(vec![140]).await.unwrap();
    assert_eq!(found[0].name.as_str(), "wireless keyboard v2");
    assert!(!found[0].active);
}
