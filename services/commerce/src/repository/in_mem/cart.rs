use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemDeleteInfo, AppInMemFetchKeys,
    AppInMemFetchedSingleRow, AppInMemFetchedSingleTable, AppInMemUpdateData,
};
use crate::error::{AppError, AppErrorCode};
use crate::model::{CartItemModel, CartModel};
use crate::repository::AbsCartRepo;

// the order repo removes converted cart lines inside its checkout flow,
// table layout knowledge is shared at module level
#[allow(non_snake_case)]
pub(super) mod CartLineTable {
    use super::CartItemModel;
    pub(crate) const LABEL: &str = "cart_line";

    pub(crate) fn pkey(owner: u32, sku_id: u64) -> String {
        format!("{owner}-{sku_id}")
    }
    pub(super) fn row(item: &CartItemModel) -> Vec<String> {
        vec![item.quantity.to_string()]
    }
} // end of inner-mod CartLineTable

struct OwnerFilterOp {
    owner: u32,
    sku_ids: Option<Vec<u64>>,
}
impl AbsDStoreFilterKeyOp for OwnerFilterOp {
    fn filter(&self, k: &String, _v: &Vec<String>) -> bool {
        let mut tokens = k.split('-');
        let curr_owner = tokens.next().and_then(|t| t.parse::<u32>().ok());
        let mut cond = curr_owner == Some(self.owner);
        if let Some(ids) = self.sku_ids.as_ref() {
            let curr_sku = tokens.next().and_then(|t| t.parse::<u64>().ok());
            cond = cond && curr_sku.map_or(false, |s| ids.contains(&s));
        }
        cond
    }
}

fn decode_item(key: &str, row: &AppInMemFetchedSingleRow) -> DefaultResult<CartItemModel, AppError> {
    let corrupt = || AppError {
        code: AppErrorCode::DataCorruption,
        detail: Some(format!("cart-line-row:{key}")),
    };
    let mut tokens = key.split('-');
    let owner = tokens
        .next()
        .and_then(|t| t.parse::<u32>().ok())
        .ok_or_else(corrupt)?;
    let sku_id = tokens
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or_else(corrupt)?;
    let quantity = row
        .first()
        .and_then(|c| c.parse::<u32>().ok())
        .ok_or_else(corrupt)?;
    Ok(CartItemModel {
        owner,
        sku_id,
        quantity,
    })
}

pub struct CartInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl CartInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(CartLineTable::LABEL).await?;
        Ok(Self { datastore: m })
    }

    async fn owner_keys(
        &self,
        owner: u32,
        sku_ids: Option<Vec<u64>>,
    ) -> DefaultResult<Vec<String>, AppError> {
        let op = OwnerFilterOp { owner, sku_ids };
        self.datastore
            .filter_keys(CartLineTable::LABEL.to_string(), &op)
            .await
    }
} // end of impl CartInMemRepo

#[async_trait]
impl AbsCartRepo for CartInMemRepo {
    async fn add_quantities(
        &self,
        owner: u32,
        items: Vec<(u64, u32)>,
    ) -> DefaultResult<usize, AppError> {
        let keys = items
            .iter()
            .map(|(sku, _q)| CartLineTable::pkey(owner, *sku))
            .collect::<Vec<_>>();
        let info: AppInMemFetchKeys = HashMap::from([(CartLineTable::LABEL.to_string(), keys)]);
        // hold the lock across read-modify-write so concurrent imports
        // cannot drop each other's increments
        let (mut fetched, lock) = self.datastore.fetch_acquire(info).await?;
        let curr_rows = fetched.remove(CartLineTable::LABEL).unwrap_or_default();
        let updated = items
            .into_iter()
            .map(|(sku, q)| {
                let key = CartLineTable::pkey(owner, sku);
                let prev = curr_rows
                    .get(&key)
                    .and_then(|row| row.first())
                    .and_then(|c| c.parse::<u32>().ok())
                    .unwrap_or(0);
                (key, vec![prev.saturating_add(q).to_string()])
            })
            .collect::<AppInMemFetchedSingleTable>();
        let num = updated.len();
        let data: AppInMemUpdateData = HashMap::from([(CartLineTable::LABEL.to_string(), updated)]);
        self.datastore.save_release(data, lock)?;
        Ok(num)
    } // end of fn add_quantities

    async fn fetch_cart(&self, owner: u32) -> DefaultResult<CartModel, AppError> {
        let keys = self.owner_keys(owner, None).await?;
        let info: AppInMemFetchKeys = HashMap::from([(CartLineTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(CartLineTable::LABEL).unwrap_or_default();
        let mut items = rows
            .iter()
            .map(|(k, v)| decode_item(k, v))
            .collect::<DefaultResult<Vec<_>, _>>()?;
        items.sort_by_key(|it| it.sku_id);
        Ok(CartModel { owner, items })
    }

    async fn update(&self, obj: CartModel) -> DefaultResult<usize, AppError> {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            obj.items.into_iter().partition(|it| it.quantity > 0);
        let rows = kept
            .iter()
            .map(|it| (CartLineTable::pkey(obj.owner, it.sku_id), CartLineTable::row(it)))
            .collect::<AppInMemFetchedSingleTable>();
        let num = rows.len();
        let data: AppInMemUpdateData = HashMap::from([(CartLineTable::LABEL.to_string(), rows)]);
        self.datastore.save(data).await?;
        if !dropped.is_empty() {
            let keys = dropped
                .iter()
                .map(|it| CartLineTable::pkey(obj.owner, it.sku_id))
                .collect::<Vec<_>>();
            let info: AppInMemDeleteInfo =
                HashMap::from([(CartLineTable::LABEL.to_string(), keys)]);
            let _n = self.datastore.delete(info).await?;
        }
        Ok(num)
    }

    async fn discard(
        &self,
        owner: u32,
        sku_ids: Option<Vec<u64>>,
    ) -> DefaultResult<usize, AppError> {
        let keys = self.owner_keys(owner, sku_ids).await?;
        let info: AppInMemDeleteInfo = HashMap::from([(CartLineTable::LABEL.to_string(), keys)]);
        let num = self.datastore.delete(info).await?;
        Ok(num)
    }
} // end of impl AbsCartRepo for CartInMemRepo
