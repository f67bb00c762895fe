use axum::debug_handler;
use axum::extract::{Json as ExtractJson, Path as ExtractPath, State as ExtractState};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use ecommerce_common::error::AppErrorCode;
use ecommerce_common::logging::{app_log_event, AppLogLevel};

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::repository::{app_repo_cart, app_repo_cart_import, app_repo_sku_catalog};
use crate::usecase::{
    ConfirmCartImportUsKsResult, ConfirmCartImportUseCase, ProcessCartImportUsKsResult,
    ProcessCartImportUseCase, RetrieveImportJobUsKsResult, RetrieveImportJobUseCase,
};
use crate::{AppAuthedClaim, AppSharedState};

use super::dto::{CartImportConfirmReqDto, CartImportUploadReqDto};

fn json_hdr_map() -> HeaderMap {
    let resp_ctype_val = HeaderValue::from_str(HTTP_CONTENT_TYPE_JSON).unwrap();
    let mut hmap = HeaderMap::new();
    hmap.insert(header::CONTENT_TYPE, resp_ctype_val);
    hmap
}

#[debug_handler(state = AppSharedState)]
pub(super) async fn upload_handler(
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CartImportUploadReqDto>,
) -> impl IntoResponse {
    let hdr_map = json_hdr_map();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let ds = appstate.datastore();
    let repos = (
        app_repo_sku_catalog(ds.clone()).await,
        app_repo_cart(ds.clone()).await,
        app_repo_cart_import(ds).await,
    );
    let (catalog_repo, cart_repo, import_repo) = match repos {
        (Ok(a), Ok(b), Ok(c)) => (a, b, c),
        _others => {
            app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = ProcessCartImportUseCase {
        catalog_repo,
        cart_repo,
        import_repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(req_body).await {
        ProcessCartImportUsKsResult::Success(v) => (
            StatusCode::CREATED,
            serde_json::to_string(&v).unwrap(),
        ),
        ProcessCartImportUsKsResult::InvalidSheet(e) => {
            app_log_event!(logctx, AppLogLevel::INFO, "{:?}", e);
            let status = if matches!(e.code, AppErrorCode::ExceedingMaxLimit) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, default_body)
        }
        ProcessCartImportUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn upload_handler

#[debug_handler(state = AppSharedState)]
pub(super) async fn confirm_handler(
    ExtractPath(job_id): ExtractPath<String>,
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CartImportConfirmReqDto>,
) -> impl IntoResponse {
    let hdr_map = json_hdr_map();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let ds = appstate.datastore();
    let repos = (
        app_repo_sku_catalog(ds.clone()).await,
        app_repo_cart(ds.clone()).await,
        app_repo_cart_import(ds).await,
    );
    let (catalog_repo, cart_repo, import_repo) = match repos {
        (Ok(a), Ok(b), Ok(c)) => (a, b, c),
        _others => {
            app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = ConfirmCartImportUseCase {
        catalog_repo,
        cart_repo,
        import_repo,
        log_ctx: logctx.clone(),
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(job_id, req_body).await {
        ConfirmCartImportUsKsResult::Success(v) => {
            (StatusCode::OK, serde_json::to_string(&v).unwrap())
        }
        ConfirmCartImportUsKsResult::NotFound => (StatusCode::NOT_FOUND, default_body),
        ConfirmCartImportUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn confirm_handler

#[debug_handler(state = AppSharedState)]
pub(super) async fn retrieve_job_handler(
    ExtractPath(job_id): ExtractPath<String>,
    authed_usr: AppAuthedClaim,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let hdr_map = json_hdr_map();
    let default_body = "{}".to_string();
    let logctx = appstate.log_context().clone();
    let ds = appstate.datastore();
    let repos = (
        app_repo_sku_catalog(ds.clone()).await,
        app_repo_cart_import(ds).await,
    );
    let (catalog_repo, import_repo) = match repos {
        (Ok(a), Ok(b)) => (a, b),
        _others => {
            app_log_event!(logctx, AppLogLevel::ERROR, "repo-init-failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, hdr_map, default_body);
        }
    };
    let uc = RetrieveImportJobUseCase {
        catalog_repo,
        import_repo,
        authed_usr,
    };
    let (status, resp_body) = match uc.execute(job_id).await {
        RetrieveImportJobUsKsResult::Success(v) => {
            (StatusCode::OK, serde_json::to_string(&v).unwrap())
        }
        RetrieveImportJobUsKsResult::NotFound => (StatusCode::NOT_FOUND, default_body),
        RetrieveImportJobUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, default_body)
        }
    };
    (status, hdr_map, resp_body)
} // end of fn retrieve_job_handler
