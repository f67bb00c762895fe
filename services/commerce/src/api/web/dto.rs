use serde::{Deserialize, Serialize};

// ---- cart import ----

#[derive(Deserialize)]
pub struct CartImportUploadReqDto {
    // raw cell matrix of the uploaded sheet, the first row is the header
    pub rows: Vec<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
pub struct CartImportJobSummaryDto {
    pub job_id: String,
    pub status: String,
    pub progress: u8,
    pub auto_added: u32,
    pub pending: u32,
}

#[derive(Serialize, Deserialize)]
pub struct CartImportAutoItemDto {
    pub row_no: u32,
    pub sku_id: u64,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize)]
pub struct SkuPriceTierDto {
    pub min_qty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_qty: Option<u32>,
    pub unit_price: u32,
}

#[derive(Serialize, Deserialize)]
pub struct SkuCandidateDto {
    pub sku_id: u64,
    pub code: String,
    pub name: String,
    pub spec: String,
    pub active: bool,
    pub price_tiers: Vec<SkuPriceTierDto>,
}

#[derive(Serialize, Deserialize)]
pub struct CartImportPendingItemDto {
    pub row_no: u32,
    pub raw_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_qty: Option<String>,
    pub match_type: String,
    pub candidates: Vec<SkuCandidateDto>,
}

#[derive(Serialize, Deserialize)]
pub struct CartImportRespDto {
    pub job: CartImportJobSummaryDto,
    pub auto_added_items: Vec<CartImportAutoItemDto>,
    pub pending_items: Vec<CartImportPendingItemDto>,
}

#[derive(Deserialize)]
pub struct CartImportSelectionDto {
    pub row_no: u32,
    pub sku_id: u64,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Deserialize)]
pub struct CartImportConfirmReqDto {
    pub selections: Vec<CartImportSelectionDto>,
}

// ---- cart ----

#[derive(Serialize, Deserialize)]
pub struct CartItemDto {
    pub sku_id: u64,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize)]
pub struct CartDto {
    pub items: Vec<CartItemDto>,
}

// ---- order ----

#[derive(Deserialize)]
pub struct OrderLineReqDto {
    pub sku_id: u64,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize)]
pub struct OrderAddressReqDto {
    pub receiver: String,
    pub phone: String,
    pub detail: String,
}

#[derive(Deserialize)]
pub struct OrderCreateReqDto {
    pub lines: Vec<OrderLineReqDto>,
    pub address: OrderAddressReqDto,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub sales_owner: Option<u32>,
}

#[derive(Serialize, Deserialize)]
pub struct OrderLineRespDto {
    pub sku_id: u64,
    pub quantity: u32,
    pub unit_price: u32,
    pub subtotal: u64,
}

#[derive(Serialize, Deserialize)]
pub struct OrderCreateRespOkDto {
    pub order_id: String,
    pub status: String,
    pub total_amount: u64,
    pub lines: Vec<OrderLineRespDto>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OrderLineErrorReason {
    NotExist,
    Inactive,
    PriceTierNotFound,
    InvalidQuantity,
}

#[derive(Serialize, Deserialize)]
pub struct OrderLineCreateErrorDto {
    pub sku_id: u64,
    pub reason: OrderLineErrorReason,
}

#[derive(Serialize, Deserialize)]
pub struct OrderCreateRespErrorDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_lines: Option<String>,
    pub lines: Vec<OrderLineCreateErrorDto>,
}

/// Response body when the idempotency key was seen before, the original
/// order is referenced instead of creating a second one.
#[derive(Serialize, Deserialize)]
pub struct OrderConflictDto {
    pub existing_order_id: String,
    pub idempotency_key: String,
}
