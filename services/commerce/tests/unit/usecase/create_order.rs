use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use commerce::api::web::dto::{
    OrderAddressReqDto, OrderCreateReqDto, OrderLineErrorReason, OrderLineReqDto,
};
use commerce::datastore::AbstInMemoryDStore;
use commerce::error::AppError;
use commerce::model::{OrderLineModel, OrderModel};
use commerce::repository::{AbsCartRepo, AbsOrderRepo, CartInMemRepo};
use commerce::usecase::{CreateOrderUsKsErr, CreateOrderUseCase};

use super::{ut_catalog_repo, ut_order_repo, ut_seed_catalog};
use crate::{ut_authed_claim, ut_logctx, ut_setup_datastore};

async fn ut_usecase(ds: Arc<Box<dyn AbstInMemoryDStore>>, customer: u32) -> CreateOrderUseCase {
    CreateOrderUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        order_repo: ut_order_repo(ds).await,
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(customer),
    }
}

fn ut_request(lines: &[(u64, u32)], idem_key: Option<&str>) -> OrderCreateReqDto {
    OrderCreateReqDto {
        lines: lines
            .iter()
            .map(|(sku_id, quantity)| OrderLineReqDto {
                sku_id: *sku_id,
                quantity: *quantity,
            })
            .collect(),
        address: OrderAddressReqDto {
            receiver: "Chen Wei".to_string(),
            phone: "+886-900-111-222".to_string(),
            detail: "No.7, Lane 50, Sec 3".to_string(),
        },
        remark: None,
        idempotency_key: idem_key.map(String::from),
        sales_owner: None,
    }
}

#[tokio::test]
async fn create_ok_with_tier_pricing() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    // SKU 140 appears twice, the merged quantity 15 lands in the 10-49 tier
    let req = ut_request(&[(140, 12), (152, 2), (140, 3)], Some("req-a1b2"));
    let resp = uc.execute(req).await.unwrap_or_else(|_e| panic!("expect-ok"));
    assert_eq!(resp.status.as_str(), "CREATED");
    assert_eq!(resp.order_id.len(), 34);
    assert_eq!(resp.lines.len(), 2);
    assert_eq!(resp.lines[0].sku_id, 140);
    assert_eq!(resp.lines[0].quantity, 15);
    assert_eq!(resp.lines[0].unit_price, 880);
    assert_eq!(resp.lines[0].subtotal, 13200);
    assert_eq!(resp.lines[1].sku_id, 152);
    assert_eq!(resp.lines[1].unit_price, 450);
    assert_eq!(resp.total_amount, 13200 + 900);
}

#[tokio::test]
async fn create_removes_ordered_skus_from_cart() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let cart_repo = CartInMemRepo::new(ds.clone()).await.unwrap();
    cart_repo
        .add_quantities(188, vec![(140, 12), (141, 1)])
        .await
        .unwrap();
    let uc = ut_usecase(ds.clone(), 188).await;
    let req = ut_request(&[(140, 12)], Some("req-a1b2"));
    let _resp = uc.execute(req).await.unwrap_or_else(|_e| panic!("expect-ok"));
    let cart = cart_repo.fetch_cart(188).await.unwrap();
    let remaining = cart.items.iter().map(|it| it.sku_id).collect::<Vec<_>>();
    assert_eq!(remaining, vec![141u64]);
}

#[tokio::test]
async fn replayed_key_reports_existing_order() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds.clone(), 188).await;
    let resp = uc
        .execute(ut_request(&[(140, 2)], Some("req-a1b2")))
        .await
        .unwrap_or_else(|_e| panic!("expect-ok"));
    let uc = ut_usecase(ds.clone(), 188).await;
    match uc.execute(ut_request(&[(152, 1)], Some("req-a1b2"))).await {
        Err(CreateOrderUsKsErr::IdempotencyConflict(c)) => {
            assert_eq!(c.existing_order_id, resp.order_id);
            assert_eq!(c.idempotency_key.as_str(), "req-a1b2");
        }
        _others => panic!("expect-conflict"),
    }
    // another customer reuses the key without any clash
    let uc = ut_usecase(ds, 189).await;
    let result = uc.execute(ut_request(&[(152, 1)], Some("req-a1b2"))).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn line_errors_reported_per_sku() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    // 999 never existed, 160 is inactive, 152 has no tier covering qty 9
    let req = ut_request(&[(999, 1), (160, 1), (152, 9), (140, 2)], Some("req-a1b2"));
    match uc.execute(req).await {
        Err(CreateOrderUsKsErr::ReqContent(e)) => {
            assert!(e.idempotency_key.is_none());
            assert_eq!(e.lines.len(), 3);
            let find = |sku: u64| {
                e.lines
                    .iter()
                    .find(|l| l.sku_id == sku)
                    .map(|l| &l.reason)
                    .unwrap()
            };
            assert_eq!(find(999), &OrderLineErrorReason::NotExist);
            assert_eq!(find(160), &OrderLineErrorReason::Inactive);
            assert_eq!(find(152), &OrderLineErrorReason::PriceTierNotFound);
        }
        _others => panic!("expect-req-content-error"),
    }
}

#[tokio::test]
async fn zero_quantity_rejected_before_lookup() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    let req = ut_request(&[(140, 0), (152, 1)], Some("req-a1b2"));
    match uc.execute(req).await {
        Err(CreateOrderUsKsErr::ReqContent(e)) => {
            assert_eq!(e.lines.len(), 1);
            assert_eq!(e.lines[0].sku_id, 140);
            assert_eq!(e.lines[0].reason, OrderLineErrorReason::InvalidQuantity);
        }
        _others => panic!("expect-req-content-error"),
    }
}

#[tokio::test]
async fn blank_idempotency_key_rejected() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    let req = ut_request(&[(140, 2)], Some("  "));
    match uc.execute(req).await {
        Err(CreateOrderUsKsErr::ReqContent(e)) => {
            assert_eq!(e.idempotency_key.as_deref(), Some("empty"));
            assert!(e.lines.is_empty());
        }
        _others => panic!("expect-req-content-error"),
    }
}

#[tokio::test]
async fn empty_line_list_rejected() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    let req = ut_request(&[], Some("req-a1b2"));
    match uc.execute(req).await {
        Err(CreateOrderUsKsErr::ReqContent(e)) => {
            assert_eq!(e.num_lines.as_deref(), Some("empty"));
            assert!(e.lines.is_empty());
        }
        _others => panic!("expect-req-content-error"),
    }
}

#[tokio::test]
async fn too_many_lines_rejected() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds, 188).await;
    let oversized = (0..201u64).map(|i| (1000 + i, 1u32)).collect::<Vec<_>>();
    let req = ut_request(&oversized, Some("req-a1b2"));
    match uc.execute(req).await {
        Err(CreateOrderUsKsErr::ReqContent(e)) => {
            assert_eq!(e.num_lines.as_deref(), Some("exceeding-limit"));
            assert!(e.lines.is_empty());
        }
        _others => panic!("expect-req-content-error"),
    }
}

#[test]
fn request_body_decodes_without_key() {
    let raw = r#"{
        "lines": [{"sku_id": 140, "quantity": 2}],
        "address": {"receiver": "Chen Wei", "phone": "+886-900-111-222",
                    "detail": "No.7, Lane 50, Sec 3"}
    }"#;
    let req = serde_json::from_str::<OrderCreateReqDto>(raw).unwrap();
    assert!(req.idempotency_key.is_none());
    assert!(req.sales_owner.is_none());
    assert_eq!(req.lines.len(), 1);
}

#[tokio::test]
async fn keyless_requests_always_create() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds.clone(), 188).await;
    let first = uc
        .execute(ut_request(&[(140, 2)], None))
        .await
        .unwrap_or_else(|_e| panic!("expect-ok"));
    // submitting again without a key is a brand-new order, not a replay
    let uc = ut_usecase(ds, 188).await;
    let second = uc
        .execute(ut_request(&[(140, 2)], None))
        .await
        .unwrap_or_else(|_e| panic!("expect-ok"));
    assert_ne!(first.order_id, second.order_id);
    assert_eq!(second.lines[0].quantity, 2);
}

/// Delegates everything, except the first key lookup reports a miss, the
/// same way a concurrent writer commits between the pre-check and the
/// insert.
struct UtStaleLookupRepo {
    inner: Box<dyn AbsOrderRepo>,
    first_lookup: AtomicBool,
}

#[async_trait]
impl AbsOrderRepo for UtStaleLookupRepo {
    async fn create(
        &self,
        order: &OrderModel,
        lines: &[OrderLineModel],
        discard_cart_skus: &[u64],
    ) -> Result<(), AppError> {
        self.inner.create(order, lines, discard_cart_skus).await
    }
    async fn fetch_by_idempotency_key(
        &self,
        customer: u32,
        key: &str,
    ) -> Result<Option<OrderModel>, AppError> {
        if self.first_lookup.swap(false, Ordering::Relaxed) {
            Ok(None)
        } else {
            self.inner.fetch_by_idempotency_key(customer, key).await
        }
    }
    async fn fetch_lines(&self, order_id: &str) -> Result<Vec<OrderLineModel>, AppError> {
        self.inner.fetch_lines(order_id).await
    }
}

#[tokio::test]
async fn duplicate_key_race_recovered_by_requery() {
    let ds = ut_setup_datastore(100);
    ut_seed_catalog(ds.clone()).await;
    let uc = ut_usecase(ds.clone(), 188).await;
    let resp = uc
        .execute(ut_request(&[(140, 2)], Some("req-a1b2")))
        .await
        .unwrap_or_else(|_e| panic!("expect-ok"));
    let uc = CreateOrderUseCase {
        catalog_repo: ut_catalog_repo(ds.clone()).await,
        order_repo: Box::new(UtStaleLookupRepo {
            inner: ut_order_repo(ds).await,
            first_lookup: AtomicBool::new(true),
        }),
        log_ctx: ut_logctx(),
        authed_usr: ut_authed_claim(188),
    };
    // the pre-check misses, the storage-level unique key still fires and
    // the conflict carries the previously created order
    match uc.execute(ut_request(&[(152, 1)], Some("req-a1b2"))).await {
        Err(CreateOrderUsKsErr::IdempotencyConflict(c)) => {
            assert_eq!(c.existing_order_id, resp.order_id);
            assert_eq!(c.idempotency_key.as_str(), "req-a1b2");
        }
        _others => panic!("expect-conflict"),
    }
}
