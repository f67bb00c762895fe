use axum::debug_handler;
use axum::extract::{Json as ExtractJson, State as ExtractState};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use ecommerce_common::logging::{app_log_event, AppLogLevel};

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::repository::{app_repo_order, app_repo_sku_catalog};
use crate::usecase::{CreateOrderUsKsErr, CreateOrderUseCase};
use crate::{AppAuthedClaim, AppSharedState};

use super::dto::OrderCreateReqDto;

#[debug_handler(state = AppSharedState)]
pub(super) async fn create_handler(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<OrderCreateReqDto>,
) -> impl IntoResponse {
    let hdr_map = {
        let resp_ctype_val = HeaderValue::from_str(HTTP_CONTENT_TYPE_JSON).unwrap();
        let mut hmap = HeaderMap::new();
        hmap.insert(header::CONTENT_TYPE, resp_ctype_val);
        hmap
    };
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let ds = appstate.datastore();
    let repos = (
        app_repo_sku_catalog(ds.clone()).await,
        app_repo_order(ds).await,
    );
    let (catalog_repo, order_repo) = match repos {
        (Ok(a), Ok(b)) => (a, b),
        _others => {
            app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = CreateOrderUseCase {
        catalog_repo,
        order_repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(req_body).await {
        Ok(v) => (StatusCode::CREATED, serde_json::to_string(&v).unwrap()),
        Err(CreateOrderUsKsErr::ReqContent(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::to_string(&e).unwrap(),
        ),
        // replays answer with the original order instead of a new one
        Err(CreateOrderUsKsErr::IdempotencyConflict(e)) => {
            (StatusCode::CONFLICT, serde_json::to_string(&e).unwrap())
        }
        Err(CreateOrderUsKsErr::Server(e)) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn create_handler
