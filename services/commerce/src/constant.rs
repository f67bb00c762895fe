use crate::WebApiHdlrLabel;

pub mod app_meta {
    pub const LABEL: &str = "commerce";
    // TODO, machine code to order-id generator should be configurable
    pub const MACHINE_CODE: u8 = 1;
}

pub use ecommerce_common::constant::env_vars::EXPECTED_LABELS as EXPECTED_ENV_VAR_LABELS;

pub mod hard_limit {
    pub const MAX_ITEMS_STORED_PER_MODEL: u32 = 2200u32;
    pub const MAX_DB_CONNECTIONS: u32 = 10000u32;
    pub const MAX_SECONDS_DB_IDLE: u16 = 600u16;
    // one spreadsheet upload is processed synchronously within the request
    // lifetime, the row count has to stay bounded
    pub const MAX_ROWS_PER_IMPORT: usize = 1000;
    pub const MAX_ORDER_LINES_PER_REQUEST: usize = 200;
}

pub(crate) mod api {
    use super::WebApiHdlrLabel;

    #[allow(non_camel_case_types)]
    pub(crate) struct web {}

    impl web {
        pub(crate) const UPLOAD_CART_IMPORT: WebApiHdlrLabel = "upload_cart_import";
        pub(crate) const CONFIRM_CART_IMPORT: WebApiHdlrLabel = "confirm_cart_import";
        pub(crate) const RETRIEVE_CART_IMPORT_JOB: WebApiHdlrLabel = "retrieve_cart_import_job";
        pub(crate) const CREATE_NEW_ORDER: WebApiHdlrLabel = "create_new_order";
        pub(crate) const RETRIEVE_CART_LINES: WebApiHdlrLabel = "retrieve_cart_lines";
        pub(crate) const MODIFY_CART_LINES: WebApiHdlrLabel = "modify_cart_lines";
        pub(crate) const DISCARD_CART_LINES: WebApiHdlrLabel = "discard_cart_lines";
    }
} // end of inner-mod api

pub(crate) const HTTP_CONTENT_TYPE_JSON: &str = "application/json";
