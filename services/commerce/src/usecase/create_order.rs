use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::error::AppErrorCode;
use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::api::web::dto::{
    OrderConflictDto, OrderCreateReqDto, OrderCreateRespErrorDto, OrderCreateRespOkDto,
    OrderLineCreateErrorDto, OrderLineErrorReason, OrderLineRespDto,
};
use crate::constant::hard_limit;
use crate::error::AppError;
use crate::model::{
    aggregate_quantities, dedup_sku_ids, ContactAddressModel, OrderLineModel, OrderModel,
};
use crate::repository::{AbsOrderRepo, AbsSkuCatalogRepo};
use crate::AppAuthedClaim;

pub struct CreateOrderUseCase {
    pub catalog_repo: Box<dyn AbsSkuCatalogRepo>,
    pub order_repo: Box<dyn AbsOrderRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}

pub enum CreateOrderUsKsErr {
    ReqContent(OrderCreateRespErrorDto),
    IdempotencyConflict(OrderConflictDto),
    Server(AppError),
}

impl CreateOrderUseCase {
    pub async fn execute(
        self,
        req: OrderCreateReqDto,
    ) -> DefaultResult<OrderCreateRespOkDto, CreateOrderUsKsErr> {
        self.validate_shape(&req)?;
        let customer = self.authed_usr.profile;
        // the pre-check catches most replays cheaply, the unique index in
        // the repository still closes the remaining race window, both only
        // apply when the client sent a key at all
        if let Some(key) = req.idempotency_key.as_deref() {
            if let Some(existing) = self
                .order_repo
                .fetch_by_idempotency_key(customer, key)
                .await
                .map_err(CreateOrderUsKsErr::Server)?
            {
                return Err(CreateOrderUsKsErr::IdempotencyConflict(OrderConflictDto {
                    existing_order_id: existing.id_,
                    idempotency_key: key.to_string(),
                }));
            }
        }
        let pairs = req
            .lines
            .iter()
            .map(|l| (l.sku_id, l.quantity))
            .collect::<Vec<_>>();
        let aggregated = aggregate_quantities(&pairs);
        let sku_ids = dedup_sku_ids(aggregated.iter().map(|(sku, _q)| *sku));
        let pricing = self
            .catalog_repo
            .fetch_pricing(sku_ids.clone())
            .await
            .map_err(CreateOrderUsKsErr::Server)?;
        let mut line_errors = Vec::new();
        let mut priced_lines = Vec::new();
        for (sku_id, quantity) in aggregated.iter() {
            let reason = match pricing.find_sku(*sku_id) {
                None => Some(OrderLineErrorReason::NotExist),
                Some(s) if !s.active => Some(OrderLineErrorReason::Inactive),
                Some(_s) => match pricing.unit_price(*sku_id, *quantity) {
                    Some(unit_price) => {
                        priced_lines.push((*sku_id, *quantity, unit_price));
                        None
                    }
                    None => Some(OrderLineErrorReason::PriceTierNotFound),
                },
            };
            if let Some(reason) = reason {
                line_errors.push(OrderLineCreateErrorDto {
                    sku_id: *sku_id,
                    reason,
                });
            }
        }
        if !line_errors.is_empty() {
            return Err(CreateOrderUsKsErr::ReqContent(OrderCreateRespErrorDto {
                idempotency_key: None,
                num_lines: None,
                lines: line_errors,
            }));
        }
        let order = OrderModel::create(
            customer,
            req.sales_owner,
            ContactAddressModel::from(req.address),
            req.remark.unwrap_or_default(),
            req.idempotency_key.clone(),
        );
        let lines = priced_lines
            .into_iter()
            .map(|(sku_id, quantity, unit_price)| OrderLineModel {
                order_id: order.id_.clone(),
                sku_id,
                quantity,
                unit_price,
            })
            .collect::<Vec<_>>();
        if let Err(e) = self.order_repo.create(&order, &lines, &sku_ids).await {
            return Err(self.handle_create_failure(customer, req.idempotency_key, e).await);
        }
        let logctx = &self.log_ctx;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "order:{}, customer:{customer}, num-lines:{}",
            order.id_,
            lines.len()
        );
        Ok(Self::assemble_ok(&order, &lines))
    } // end of fn execute

    fn validate_shape(&self, req: &OrderCreateReqDto) -> DefaultResult<(), CreateOrderUsKsErr> {
        // absent key means the client opted out of replay protection, a
        // key consisting of whitespace only is a client mistake instead
        if matches!(req.idempotency_key.as_deref(), Some(k) if k.trim().is_empty()) {
            let e = OrderCreateRespErrorDto {
                idempotency_key: Some("empty".to_string()),
                num_lines: None,
                lines: Vec::new(),
            };
            return Err(CreateOrderUsKsErr::ReqContent(e));
        }
        if req.lines.is_empty() || req.lines.len() > hard_limit::MAX_ORDER_LINES_PER_REQUEST {
            let label = if req.lines.is_empty() {
                "empty"
            } else {
                "exceeding-limit"
            };
            let e = OrderCreateRespErrorDto {
                idempotency_key: None,
                num_lines: Some(label.to_string()),
                lines: Vec::new(),
            };
            return Err(CreateOrderUsKsErr::ReqContent(e));
        }
        let qty_errors = req
            .lines
            .iter()
            .filter(|l| l.quantity < 1)
            .map(|l| OrderLineCreateErrorDto {
                sku_id: l.sku_id,
                reason: OrderLineErrorReason::InvalidQuantity,
            })
            .collect::<Vec<_>>();
        if qty_errors.is_empty() {
            Ok(())
        } else {
            Err(CreateOrderUsKsErr::ReqContent(OrderCreateRespErrorDto {
                idempotency_key: None,
                num_lines: None,
                lines: qty_errors,
            }))
        }
    } // end of fn validate_shape

    /// A duplicate-key failure means another request with the same key won
    /// the race after the pre-check, surface it as the same conflict shape.
    async fn handle_create_failure(
        &self,
        customer: u32,
        idempotency_key: Option<String>,
        e: AppError,
    ) -> CreateOrderUsKsErr {
        if !matches!(e.code, AppErrorCode::DuplicateKeyExists) {
            return CreateOrderUsKsErr::Server(e);
        }
        let idempotency_key = match idempotency_key {
            Some(k) => k,
            None => return CreateOrderUsKsErr::Server(e),
        };
        match self
            .order_repo
            .fetch_by_idempotency_key(customer, idempotency_key.as_str())
            .await
        {
            Ok(Some(existing)) => CreateOrderUsKsErr::IdempotencyConflict(OrderConflictDto {
                existing_order_id: existing.id_,
                idempotency_key,
            }),
            Ok(None) => CreateOrderUsKsErr::Server(e),
            Err(e2) => CreateOrderUsKsErr::Server(e2),
        }
    }

    fn assemble_ok(order: &OrderModel, lines: &[OrderLineModel]) -> OrderCreateRespOkDto {
        let lines_out = lines
            .iter()
            .map(|l| OrderLineRespDto {
                sku_id: l.sku_id,
                quantity: l.quantity,
                unit_price: l.unit_price,
                subtotal: (l.quantity as u64) * (l.unit_price as u64),
            })
            .collect::<Vec<_>>();
        let total_amount = lines_out.iter().map(|l| l.subtotal).sum();
        OrderCreateRespOkDto {
            order_id: order.id_.clone(),
            status: order.status.label().to_string(),
            total_amount,
            lines: lines_out,
        }
    }
} // end of impl CreateOrderUseCase
