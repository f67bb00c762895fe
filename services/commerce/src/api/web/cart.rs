use axum::debug_handler;
use axum::extract::{Json as ExtractJson, State as ExtractState};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use ecommerce_common::logging::{app_log_event, AppLogLevel};

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::repository::app_repo_cart;
use crate::usecase::{
    DiscardCartUsKsResult, DiscardCartUseCase, ModifyCartLinesUseCase, ModifyCartUsKsResult,
    RetrieveCartUsKsResult, RetrieveCartUseCase,
};
use crate::{AppAuthedClaim, AppSharedState};

use super::dto::CartDto;

#[debug_handler(state = AppSharedState)]
pub(super) async fn retrieve(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let hdr_map = {
        let resp_ctype_val = HeaderValue::from_str(HTTP_CONTENT_TYPE_JSON).unwrap();
        let mut hmap = HeaderMap::new();
        hmap.insert(header::CONTENT_TYPE, resp_ctype_val);
        hmap
    };
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = RetrieveCartUseCase { repo, authed_usr };
    let (status, resp_body) = match uc.execute().await {
        RetrieveCartUsKsResult::Success(v) => (StatusCode::OK, serde_json::to_string(&v).unwrap()),
        RetrieveCartUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn retrieve

#[debug_handler(state = AppSharedState)]
pub(super) async fn modify_lines(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CartDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    let uc = ModifyCartLinesUseCase {
        repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    match uc.execute(req_body).await {
        ModifyCartUsKsResult::Success => StatusCode::OK,
        ModifyCartUsKsResult::TooManyItems => StatusCode::BAD_REQUEST,
        ModifyCartUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[debug_handler(state = AppSharedState)]
pub(super) async fn discard(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context().clone();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    let uc = DiscardCartUseCase { repo, authed_usr };
    match uc.execute().await {
        DiscardCartUsKsResult::Success => StatusCode::NO_CONTENT,
        DiscardCartUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
