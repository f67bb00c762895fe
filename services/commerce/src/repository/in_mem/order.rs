use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;

use super::cart::CartLineTable;
use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemDeleteInfo, AppInMemFetchKeys,
    AppInMemFetchedSingleRow, AppInMemFetchedSingleTable, AppInMemUpdateData,
};
use crate::error::{AppError, AppErrorCode};
use crate::model::{ContactAddressModel, OrderLineModel, OrderModel, OrderStatus};
use crate::repository::AbsOrderRepo;

#[allow(non_snake_case)]
mod OrderToplvlTable {
    use super::{AppInMemFetchedSingleRow, OrderModel};
    pub(super) const LABEL: &str = "order_toplvl";

    pub(super) struct UpdateArg<'a>(pub(super) &'a OrderModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let obj = value.0;
            let addr_serial = serde_json::to_string(&obj.address).unwrap();
            let row = vec![
                obj.status.label().to_string(),
                obj.customer.to_string(),
                obj.owner_sales.map_or(String::new(), |v| v.to_string()),
                addr_serial,
                obj.remark.clone(),
                obj.idempotency_key.clone().unwrap_or_default(),
                obj.created.to_rfc3339(),
            ];
            (obj.id_.clone(), row)
        }
    }
} // end of inner-mod OrderToplvlTable

#[allow(non_snake_case)]
mod OrderLineTable {
    use super::{AppInMemFetchedSingleRow, OrderLineModel};
    pub(super) const LABEL: &str = "order_line";

    // order IDs are hyphen-free hex strings, the composite key stays
    // splittable on the first hyphen
    pub(super) fn pkey(order_id: &str, sku_id: u64) -> String {
        format!("{order_id}-{sku_id}")
    }

    pub(super) struct UpdateArg<'a>(pub(super) usize, pub(super) &'a OrderLineModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let (seq, obj) = (value.0, value.1);
            let row = vec![
                seq.to_string(),
                obj.quantity.to_string(),
                obj.unit_price.to_string(),
            ];
            (pkey(obj.order_id.as_str(), obj.sku_id), row)
        }
    }
} // end of inner-mod OrderLineTable

#[allow(non_snake_case)]
mod OrderIdemTable {
    pub(super) const LABEL: &str = "order_idempotency";

    // the idempotency key itself may contain hyphens, decoding always
    // splits on the first one only
    pub(super) fn pkey(customer: u32, idem_key: &str) -> String {
        format!("{customer}-{idem_key}")
    }
} // end of inner-mod OrderIdemTable

impl TryFrom<(String, AppInMemFetchedSingleRow)> for OrderModel {
    type Error = AppError;
    fn try_from(value: (String, AppInMemFetchedSingleRow)) -> DefaultResult<Self, Self::Error> {
        let (key, row) = value;
        let corrupt = || AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("order-toplvl-row:{key}")),
        };
        if row.len() != 7 {
            return Err(corrupt());
        }
        let owner_sales = if row[2].is_empty() {
            None
        } else {
            Some(row[2].parse().map_err(|_e| corrupt())?)
        };
        let address =
            serde_json::from_str::<ContactAddressModel>(row[3].as_str()).map_err(|_e| corrupt())?;
        Ok(Self {
            id_: key.clone(),
            status: OrderStatus::try_from(row[0].as_str())?,
            customer: row[1].parse().map_err(|_e| corrupt())?,
            owner_sales,
            address,
            remark: row[4].clone(),
            // a keyless order was stored with the empty string at column 5
            idempotency_key: (!row[5].is_empty()).then(|| row[5].clone()),
            created: DateTime::parse_from_rfc3339(row[6].as_str()).map_err(|_e| corrupt())?,
        })
    }
}

struct OrderLineFilterOp {
    order_id: String,
}
impl AbsDStoreFilterKeyOp for OrderLineFilterOp {
    fn filter(&self, k: &String, _v: &Vec<String>) -> bool {
        k.split_once('-')
            .map_or(false, |(oid, _sku)| oid == self.order_id.as_str())
    }
}

pub struct OrderInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl OrderInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(OrderToplvlTable::LABEL).await?;
        m.create_table(OrderLineTable::LABEL).await?;
        m.create_table(OrderIdemTable::LABEL).await?;
        m.create_table(CartLineTable::LABEL).await?;
        Ok(Self { datastore: m })
    }
} // end of impl OrderInMemRepo

#[async_trait]
impl AbsOrderRepo for OrderInMemRepo {
    async fn create(
        &self,
        order: &OrderModel,
        lines: &[OrderLineModel],
        discard_cart_skus: &[u64],
    ) -> DefaultResult<(), AppError> {
        let t_toplvl = [OrderToplvlTable::UpdateArg(order).into()]
            .into_iter()
            .collect::<AppInMemFetchedSingleTable>();
        let t_lines = lines
            .iter()
            .enumerate()
            .map(|(seq, l)| OrderLineTable::UpdateArg(seq, l).into())
            .collect::<AppInMemFetchedSingleTable>();
        let mut data: AppInMemUpdateData = HashMap::from([
            (OrderToplvlTable::LABEL.to_string(), t_toplvl),
            (OrderLineTable::LABEL.to_string(), t_lines),
        ]);
        if let Some(key) = order.idempotency_key.as_deref() {
            let idem_pkey = OrderIdemTable::pkey(order.customer, key);
            let info: AppInMemFetchKeys =
                HashMap::from([(OrderIdemTable::LABEL.to_string(), vec![idem_pkey.clone()])]);
            // keep the store locked from the duplicate check to the write,
            // two racing requests with the same key cannot both pass
            let (fetched, lock) = self.datastore.fetch_acquire(info).await?;
            let existing = fetched
                .get(OrderIdemTable::LABEL)
                .map_or(false, |t| t.contains_key(idem_pkey.as_str()));
            if existing {
                return Err(AppError {
                    code: AppErrorCode::DuplicateKeyExists,
                    detail: Some(format!("order-idempotency:{idem_pkey}")),
                });
            }
            let t_idem = [(idem_pkey, vec![order.id_.clone()])]
                .into_iter()
                .collect::<AppInMemFetchedSingleTable>();
            data.insert(OrderIdemTable::LABEL.to_string(), t_idem);
            self.datastore.save_release(data, lock)?;
        } else {
            // keyless orders never clash with each other, no pre-check
            self.datastore.save(data).await?;
        }
        // all tables exist since repo construction, the removal below can
        // no longer fail halfway once the order rows are committed
        let cart_keys = discard_cart_skus
            .iter()
            .map(|sku| CartLineTable::pkey(order.customer, *sku))
            .collect::<Vec<_>>();
        let info: AppInMemDeleteInfo =
            HashMap::from([(CartLineTable::LABEL.to_string(), cart_keys)]);
        let _num = self.datastore.delete(info).await?;
        Ok(())
    } // end of fn create

    async fn fetch_by_idempotency_key(
        &self,
        customer: u32,
        key: &str,
    ) -> DefaultResult<Option<OrderModel>, AppError> {
        let idem_pkey = OrderIdemTable::pkey(customer, key);
        let info: AppInMemFetchKeys =
            HashMap::from([(OrderIdemTable::LABEL.to_string(), vec![idem_pkey.clone()])]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(OrderIdemTable::LABEL).unwrap_or_default();
        let order_id = match rows.get(idem_pkey.as_str()).and_then(|r| r.first()) {
            Some(oid) => oid.clone(),
            None => return Ok(None),
        };
        let info: AppInMemFetchKeys =
            HashMap::from([(OrderToplvlTable::LABEL.to_string(), vec![order_id])]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(OrderToplvlTable::LABEL).unwrap_or_default();
        rows.into_iter()
            .next()
            .map(OrderModel::try_from)
            .transpose()
    }

    async fn fetch_lines(&self, order_id: &str) -> DefaultResult<Vec<OrderLineModel>, AppError> {
        let op = OrderLineFilterOp {
            order_id: order_id.to_string(),
        };
        let keys = self
            .datastore
            .filter_keys(OrderLineTable::LABEL.to_string(), &op)
            .await?;
        let info: AppInMemFetchKeys = HashMap::from([(OrderLineTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(OrderLineTable::LABEL).unwrap_or_default();
        let corrupt = |key: &str| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("order-line-row:{key}")),
        };
        let mut decoded = rows
            .iter()
            .map(|(k, row)| {
                let (oid, sku) = k.split_once('-').ok_or_else(|| corrupt(k))?;
                if row.len() != 3 {
                    return Err(corrupt(k));
                }
                let seq: usize = row[0].parse().map_err(|_e| corrupt(k))?;
                let m = OrderLineModel {
                    order_id: oid.to_string(),
                    sku_id: sku.parse().map_err(|_e| corrupt(k))?,
                    quantity: row[1].parse().map_err(|_e| corrupt(k))?,
                    unit_price: row[2].parse().map_err(|_e| corrupt(k))?,
                };
                Ok((seq, m))
            })
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        // restore the line order of the original request
        decoded.sort_by_key(|(seq, _m)| *seq);
        Ok(decoded.into_iter().map(|(_seq, m)| m).collect())
    } // end of fn fetch_lines
} // end of impl AbsOrderRepo for OrderInMemRepo
