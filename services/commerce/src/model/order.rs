use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Local as LocalTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::web::dto::OrderAddressReqDto;
use crate::error::{AppError, AppErrorCode};

/// Shipping contact captured verbatim at order time, stored as one JSON
/// document since no query path ever filters on individual address fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactAddressModel {
    pub receiver: String,
    pub phone: String,
    pub detail: String,
}

impl From<OrderAddressReqDto> for ContactAddressModel {
    fn from(value: OrderAddressReqDto) -> Self {
        Self {
            receiver: value.receiver,
            phone: value.phone,
            detail: value.detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderStatus {
    Created,
    Paid,
    Canceled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Paid => "PAID",
            Self::Canceled => "CANCELED",
        }
    }
}
impl TryFrom<&str> for OrderStatus {
    type Error = AppError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CREATED" => Ok(Self::Created),
            "PAID" => Ok(Self::Paid),
            "CANCELED" => Ok(Self::Canceled),
            _others => Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("order-status:{value}")),
            }),
        }
    }
}

/// Hyphen-free UUID prefixed with a machine code, collisions across app
/// instances are avoided without any central sequence.
pub fn generate_order_id(machine_code: u8) -> String {
    let uid = Uuid::new_v4().simple();
    format!("{machine_code:02x}{uid}")
}

pub struct OrderModel {
    pub id_: String,
    pub status: OrderStatus,
    pub customer: u32,
    pub owner_sales: Option<u32>,
    pub address: ContactAddressModel,
    pub remark: String,
    pub idempotency_key: Option<String>,
    pub created: DateTime<FixedOffset>,
}

impl OrderModel {
    pub fn create(
        customer: u32,
        owner_sales: Option<u32>,
        address: ContactAddressModel,
        remark: String,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id_: generate_order_id(crate::constant::app_meta::MACHINE_CODE),
            status: OrderStatus::Created,
            customer,
            owner_sales,
            address,
            remark,
            idempotency_key,
            created: LocalTime::now().fixed_offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineModel {
    pub order_id: String,
    pub sku_id: u64,
    pub quantity: u32,
    pub unit_price: u32,
}

/// Collapse duplicate SKUs into single `(sku_id, total_qty)` pairs, first
/// appearance keeps its position so the persisted line order follows the
/// request.
pub fn aggregate_quantities(pairs: &[(u64, u32)]) -> Vec<(u64, u32)> {
    let mut order = Vec::new();
    let mut totals: HashMap<u64, u32> = HashMap::new();
    for (sku_id, qty) in pairs.iter() {
        match totals.get_mut(sku_id) {
            Some(tot) => {
                *tot = tot.saturating_add(*qty);
            }
            None => {
                order.push(*sku_id);
                totals.insert(*sku_id, *qty);
            }
        }
    }
    order
        .into_iter()
        .map(|sku_id| (sku_id, totals[&sku_id]))
        .collect()
}
