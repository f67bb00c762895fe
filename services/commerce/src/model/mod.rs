mod cart;
mod cart_import;
mod catalog;
mod order;

pub use cart::{CartItemModel, CartModel};
pub use cart_import::{
    parse_qty, recount_rows, CartImportJobModel, CartImportJobStatus, CartImportMatchType,
    CartImportRowInput, CartImportRowModel,
};
pub use catalog::{
    dedup_sku_ids, select_unit_price, SkuModel, SkuPriceModelSet, SkuPriceTierModel,
};
pub use order::{
    aggregate_quantities, generate_order_id, ContactAddressModel, OrderLineModel, OrderModel,
    OrderStatus,
};
