mod cart_import;
mod sku_catalog;
