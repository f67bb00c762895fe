use std::collections::HashMap;

use axum::routing::{delete, get, patch, post, MethodRouter};
use http_body::Body as HttpBody;

use crate::constant::api::web as WebConst;
use crate::{AppSharedState, WebApiHdlrLabel};

mod cart;
mod cart_import;
pub mod dto;
mod order;

// type parameter `HB` for http body of the method router has to match the
// same type parameter in `axum::Router`
pub type ApiRouteType<HB> = MethodRouter<AppSharedState, HB>;
pub type ApiRouteTableType<HB> = HashMap<WebApiHdlrLabel, ApiRouteType<HB>>;

pub fn route_table<HB>() -> ApiRouteTableType<HB>
where
    HB: HttpBody + Send + 'static,
    <HB as HttpBody>::Data: Send,
    <HB as HttpBody>::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut out: ApiRouteTableType<HB> = HashMap::new();
    out.insert(
        WebConst::UPLOAD_CART_IMPORT,
        post(cart_import::upload_handler),
    );
    out.insert(
        WebConst::CONFIRM_CART_IMPORT,
        patch(cart_import::confirm_handler),
    );
    out.insert(
        WebConst::RETRIEVE_CART_IMPORT_JOB,
        get(cart_import::retrieve_job_handler),
    );
    out.insert(WebConst::CREATE_NEW_ORDER, post(order::create_handler));
    out.insert(WebConst::RETRIEVE_CART_LINES, get(cart::retrieve));
    out.insert(WebConst::MODIFY_CART_LINES, patch(cart::modify_lines));
    out.insert(WebConst::DISCARD_CART_LINES, delete(cart::discard));
    out
}
