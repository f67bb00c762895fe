use std::sync::Arc;

use ecommerce_common::error::AppErrorCode;

use commerce::api::web::dto::{
    CartImportConfirmReqDto, CartImportRespDto, CartImportSelectionDto, CartImportUploadReqDto,
};
use commerce::datastore::AbstInMemoryDStore;
use commerce::repository::{AbsCartRepo, CartInMemRepo};
use commerce::usecase::{
    ConfirmCartImportUsKsResult, ConfirmCartImportUseCase, ProcessCartImportUsKsResult,
    ProcessCartImportUseCase, RetrieveImportJobUsKsResult, RetrieveImportJobUseCase,
};

use super::{ut_cart_repo, ut_catalog_repo, ut_import_repo, ut_seed_catalog};
use crate::{ut_authed_claim, ut_logctx, ut_setup_datastore};

async fn ut_process_uc(
    ds: Arc<Box<dyn AbstInMemoryDStore>>,
    owner: u32,
) -> ProcessCartImportUseCase {
    ProcessCartImportUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        cart_repo: ut_cart_repo(ds.clone()).await,
        import_repo: ut_import_repo(ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(owner),
    }
}

async fn ut_confirm_uc(
    ds: Arc<Box<dyn AbstInMemoryDStore>>,
    owner: u32,
) -> ConfirmCartImportUseCase {
    ConfirmCartImportUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        cart_repo: ut_cart_repo(ds.clone()).await,
        import_repo: ut_import_repo(ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(owner),
    }
}

fn ut_sheet(cells: &[&[&str]]) -> CartImportUploadReqDto {
    let rows = cells
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();
    CartImportUploadReqDto { rows }
}

async fn ut_fetch_cart(ds: Arc<Box<dyn AbstInMemoryDStore>>, owner: u32) -> Vec<(u64, u32)> {
    let repo = CartInMemRepo::new(ds).await.unwrap();
    let cart = repo.fetch_cart(owner).await.unwrap();
    cart.items
        .iter()
        .map(|it| (it.sku_id, it.quantity))
        .collect()
}

fn expect_process_ok(result: ProcessCartImportUsKsResult) -> CartImportRespDto {
    match result {
        ProcessCartImportUsKsResult::Success(v) => v,
        ProcessCartImportUsKsResult::InvalidSheet(e) => panic!("invalid-sheet: {:?}", e.code),
        ProcessCartImportUsKsResult::ServerError(e) => panic!("server-error: {:?}", e.code),
    }
}

fn expect_confirm_ok(result: ConfirmCartImportUsKsResult) -> CartImportRespDto {
    match result {
        ConfirmCartImportUsKsResult::Success(v) => v,
        ConfirmCartImportUsKsResult::NotFound => panic!("job-not-found"),
        ConfirmCartImportUsKsResult::ServerError(e) => panic!("server-error: {:?}", e.code),
    }
}

#[tokio::test]
async fn upload_auto_resolved_rows_reach_cart() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[
        &["sku code", "qty"],
        &["KB-0042", "3"],
        &["MS-0007", "2"],
    ]);
    let resp = expect_process_ok(uc.execute(req).await);
    assert_eq!(resp.job.status.as_str(), "SUCCEEDED");
    assert_eq!(resp.job.progress, 100);
    assert_eq!((resp.job.auto_added, resp.job.pending), (2, 0));
    assert_eq!(resp.auto_added_items.len(), 2);
    assert_eq!(resp.auto_added_items[0].sku_id, 140);
    assert_eq!(resp.auto_added_items[0].quantity, 3);
    assert!(resp.pending_items.is_empty());
    let cart = ut_fetch_cart(ds, 188).await;
    assert_eq!(cart, vec![(140u64, 3u32), (152, 2)]);
}

#[tokio::test]
async fn upload_cascade_stops_at_first_filled_column() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    // the garbage SKU-id cell wins over the perfectly valid code next to it
    let req = ut_sheet(&[
        &["sku id", "sku code", "qty"],
        &["garbage", "KB-0042", "3"],
    ]);
    let resp = expect_process_ok(uc.execute(req).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (0, 1));
    assert_eq!(resp.pending_items.len(), 1);
    assert_eq!(resp.pending_items[0].match_type.as_str(), "NOT_FOUND");
    assert!(resp.pending_items[0].candidates.is_empty());
    let cart = ut_fetch_cart(ds, 188).await;
    assert!(cart.is_empty());
}

#[tokio::test]
async fn upload_ambiguous_name_lists_candidates() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[&["name", "qty"], &["wireless keyboard", "2"]]);
    let resp = expect_process_ok(uc.execute(req).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (0, 1));
    let pending = &resp.pending_items[0];
    assert_eq!(pending.match_type.as_str(), "AMBIGUOUS");
    let cand_ids = pending.candidates.iter().map(|c| c.sku_id).collect::<Vec<_>>();
    assert_eq!(cand_ids, vec![140u64, 141]);
    // candidate records carry their pricing for the picker UI
    assert_eq!(pending.candidates[0].price_tiers.len(), 3);
    assert_eq!(pending.candidates[1].code.as_str(), "KB-0043");
}

#[tokio::test]
async fn upload_name_narrowed_by_spec_auto_resolves() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[
        &["name", "spec", "qty"],
        &["wireless keyboard", "DE layout", "4"],
    ]);
    let resp = expect_process_ok(uc.execute(req).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (1, 0));
    assert_eq!(resp.auto_added_items[0].sku_id, 141);
    let cart = ut_fetch_cart(ds, 188).await;
    assert_eq!(cart, vec![(141u64, 4u32)]);
}

#[tokio::test]
async fn upload_empty_sheet_rejected() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds, 188).await;
    let req = CartImportUploadReqDto { rows: Vec::new() };
    match uc.execute(req).await {
        ProcessCartImportUsKsResult::InvalidSheet(e) => {
            assert_eq!(e.code, AppErrorCode::EmptyInputData)
        }
        _others => panic!("expect-invalid-sheet"),
    }
}

#[tokio::test]
async fn confirm_then_replay_does_not_double_cart() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[&["name", "qty"], &["wireless keyboard", "2"]]);
    let resp = expect_process_ok(uc.execute(req).await);
    let job_id = resp.job.job_id;
    let confirm_req = || CartImportConfirmReqDto {
        selections: vec![CartImportSelectionDto {
            row_no: 1,
            sku_id: 141,
            quantity: None,
        }],
    };
    let uc = ut_confirm_uc(ds.clone(), 188).await;
    let resp = expect_confirm_ok(uc.execute(job_id.clone(), confirm_req()).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (1, 0));
    assert_eq!(resp.auto_added_items[0].sku_id, 141);
    assert_eq!(resp.auto_added_items[0].quantity, 2);
    let cart = ut_fetch_cart(ds.clone(), 188).await;
    assert_eq!(cart, vec![(141u64, 2u32)]);
    // the exact same confirmation arrives again, resolved rows are skipped
    let uc = ut_confirm_uc(ds.clone(), 188).await;
    let resp = expect_confirm_ok(uc.execute(job_id, confirm_req()).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (1, 0));
    let cart = ut_fetch_cart(ds, 188).await;
    assert_eq!(cart, vec![(141u64, 2u32)]);
}

#[tokio::test]
async fn confirm_explicit_quantity_overrides_raw_cell() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[&["name", "qty"], &["wireless keyboard", "a few"]]);
    let resp = expect_process_ok(uc.execute(req).await);
    let job_id = resp.job.job_id;
    let confirm_req = CartImportConfirmReqDto {
        selections: vec![CartImportSelectionDto {
            row_no: 1,
            sku_id: 140,
            quantity: Some(7),
        }],
    };
    let uc = ut_confirm_uc(ds.clone(), 188).await;
    let _resp = expect_confirm_ok(uc.execute(job_id, confirm_req).await);
    let cart = ut_fetch_cart(ds, 188).await;
    assert_eq!(cart, vec![(140u64, 7u32)]);
}

#[tokio::test]
async fn confirm_skips_sku_outside_candidates() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[&["name", "qty"], &["wireless keyboard", "2"]]);
    let resp = expect_process_ok(uc.execute(req).await);
    let job_id = resp.job.job_id;
    // SKU 152 exists in the catalog but was never a candidate of this row
    let confirm_req = CartImportConfirmReqDto {
        selections: vec![CartImportSelectionDto {
            row_no: 1,
            sku_id: 152,
            quantity: None,
        }],
    };
    let uc = ut_confirm_uc(ds.clone(), 188).await;
    let resp = expect_confirm_ok(uc.execute(job_id, confirm_req).await);
    assert_eq!((resp.job.auto_added, resp.job.pending), (0, 1));
    let cart = ut_fetch_cart(ds, 188).await;
    assert!(cart.is_empty());
}

#[tokio::test]
async fn confirm_unknown_job_not_found() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_confirm_uc(ds, 188).await;
    let req = CartImportConfirmReqDto {
        selections: Vec::new(),
    };
    let result = uc.execute("no-such-job".to_string(), req).await;
    assert!(matches!(result, ConfirmCartImportUsKsResult::NotFound));
}

#[tokio::test]
async fn retrieve_job_scoped_to_owner() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_process_uc(ds.clone(), 188).await;
    let req = ut_sheet(&[&["sku code", "qty"], &["KB-0042", "3"]]);
    let resp = expect_process_ok(uc.execute(req).await);
    let job_id = resp.job.job_id;
    let uc = RetrieveImportJobUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        import_repo: ut_import_repo(ds.clone()).await,
        authed_usr: ut_authed_claim(188),
    };
    match uc.execute(job_id.clone()).await {
        RetrieveImportJobUsKsResult::Success(v) => {
            assert_eq!((v.job.auto_added, v.job.pending), (1, 0));
            assert_eq!(v.auto_added_items.len(), 1);
        }
        _others => panic!("expect-success"),
    }
    // same job id requested by another user
    let uc = RetrieveImportJobUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        import_repo: ut_import_repo(ds).await,
        authed_usr: ut_authed_claim(189),
    };
    let result = uc.execute(job_id).await;
    assert!(matches!(result, RetrieveImportJobUsKsResult::NotFound));
}
