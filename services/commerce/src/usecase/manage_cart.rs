use std::boxed::Box;
use std::sync::Arc;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::api::web::dto::CartDto;
use crate::constant::hard_limit;
use crate::error::AppError;
use crate::model::{CartItemModel, CartModel};
use crate::repository::AbsCartRepo;
use crate::AppAuthedClaim;

pub struct RetrieveCartUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub authed_usr: AppAuthedClaim,
}
pub struct ModifyCartLinesUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}
pub struct DiscardCartUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub authed_usr: AppAuthedClaim,
}

pub enum RetrieveCartUsKsResult {
    Success(CartDto),
    ServerError(AppError),
}
pub enum ModifyCartUsKsResult {
    Success,
    TooManyItems,
    ServerError(AppError),
}
pub enum DiscardCartUsKsResult {
    Success,
    ServerError(AppError),
}

impl RetrieveCartUseCase {
    pub async fn execute(self) -> RetrieveCartUsKsResult {
        let owner = self.authed_usr.profile;
        match self.repo.fetch_cart(owner).await {
            Ok(m) => RetrieveCartUsKsResult::Success(m.into()),
            Err(e) => RetrieveCartUsKsResult::ServerError(e),
        }
    }
}

impl ModifyCartLinesUseCase {
    pub async fn execute(self, data: CartDto) -> ModifyCartUsKsResult {
        if data.items.len() > hard_limit::MAX_ORDER_LINES_PER_REQUEST {
            return ModifyCartUsKsResult::TooManyItems;
        }
        let owner = self.authed_usr.profile;
        let items = data
            .items
            .into_iter()
            .map(|d| CartItemModel {
                owner,
                sku_id: d.sku_id,
                quantity: d.quantity,
            })
            .collect::<Vec<_>>();
        let obj = CartModel { owner, items };
        match self.repo.update(obj).await {
            Ok(num) => {
                let logctx = &self.log_ctx;
                app_log_event!(logctx, AppLogLevel::DEBUG, "owner:{owner}, num-saved:{num}");
                ModifyCartUsKsResult::Success
            }
            Err(e) => ModifyCartUsKsResult::ServerError(e),
        }
    }
}

impl DiscardCartUseCase {
    pub async fn execute(self) -> DiscardCartUsKsResult {
        let owner = self.authed_usr.profile;
        match self.repo.discard(owner, None).await {
            Ok(_num) => DiscardCartUsKsResult::Success,
            Err(e) => DiscardCartUsKsResult::ServerError(e),
        }
    }
}
