pub(super) mod cart;
pub(super) mod cart_import;
pub(super) mod order;
pub(super) mod sku_catalog;
