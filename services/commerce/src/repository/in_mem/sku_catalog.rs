use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemFetchKeys, AppInMemFetchedSingleRow,
    AppInMemFetchedSingleTable,
};
use crate::error::{AppError, AppErrorCode};
use crate::model::{SkuModel, SkuPriceModelSet, SkuPriceTierModel};
use crate::repository::{tiers_sorted, AbsSkuCatalogRepo};

#[allow(non_snake_case)]
mod SkuTable {
    use super::{AppInMemFetchedSingleRow, SkuModel};
    pub(super) const LABEL: &str = "product_sku";

    pub(super) struct UpdateArg<'a>(pub(super) &'a SkuModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let obj = value.0;
            let row = vec![
                obj.product_id.to_string(),
                obj.code.clone(),
                obj.name.clone(),
                obj.spec.clone(),
                (obj.active as u8).to_string(),
            ];
            (obj.id_.to_string(), row)
        }
    }
} // end of inner-mod SkuTable

#[allow(non_snake_case)]
mod TierTable {
    use super::{AppInMemFetchedSingleRow, SkuPriceTierModel};
    pub(super) const LABEL: &str = "product_price_tier";

    // the sequence number keeps tiers of one SKU distinguishable and the
    // sort in `fetch_pricing` reproducible
    pub(super) struct UpdateArg<'a>(pub(super) usize, pub(super) &'a SkuPriceTierModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let (seq, obj) = (value.0, value.1);
            let row = vec![
                obj.min_qty.to_string(),
                obj.max_qty.map_or(String::new(), |m| m.to_string()),
                obj.unit_price.to_string(),
            ];
            (format!("{}-{}", obj.sku_id, seq), row)
        }
    }
} // end of inner-mod TierTable

impl TryFrom<(String, AppInMemFetchedSingleRow)> for SkuModel {
    type Error = AppError;
    fn try_from(value: (String, AppInMemFetchedSingleRow)) -> DefaultResult<Self, Self::Error> {
        let (key, row) = value;
        if row.len() != 5 {
            return Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("sku-row:{key}")),
            });
        }
        let corrupt = |field: &str| AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("sku-row:{key},field:{field}")),
        };
        Ok(Self {
            id_: key.parse().map_err(|_e| corrupt("id"))?,
            product_id: row[0].parse().map_err(|_e| corrupt("product-id"))?,
            code: row[1].clone(),
            name: row[2].clone(),
            spec: row[3].clone(),
            active: row[4].as_str() == "1",
        })
    }
}

struct SkuFieldFilterOp {
    code: Option<String>,
    name: Option<String>,
    spec: Option<String>,
}
impl AbsDStoreFilterKeyOp for SkuFieldFilterOp {
    fn filter(&self, _k: &String, v: &Vec<String>) -> bool {
        let mut cond = true;
        if let Some(c) = self.code.as_ref() {
            cond = cond && v.get(1).map(String::as_str) == Some(c.as_str());
        }
        if let Some(n) = self.name.as_ref() {
            cond = cond && v.get(2).map(String::as_str) == Some(n.as_str());
        }
        if let Some(s) = self.spec.as_ref() {
            cond = cond && v.get(3).map(String::as_str) == Some(s.as_str());
        }
        cond
    }
}

struct TierSkuFilterOp {
    sku_ids: Vec<u64>,
}
impl AbsDStoreFilterKeyOp for TierSkuFilterOp {
    fn filter(&self, k: &String, _v: &Vec<String>) -> bool {
        k.split('-')
            .next()
            .and_then(|tok| tok.parse::<u64>().ok())
            .map_or(false, |sku| self.sku_ids.contains(&sku))
    }
}

pub struct SkuCatalogInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl SkuCatalogInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(SkuTable::LABEL).await?;
        m.create_table(TierTable::LABEL).await?;
        Ok(Self { datastore: m })
    }

    async fn fetch_filtered(&self, op: SkuFieldFilterOp) -> DefaultResult<Vec<SkuModel>, AppError> {
        let keys = self
            .datastore
            .filter_keys(SkuTable::LABEL.to_string(), &op)
            .await?;
        self.fetch_keys(keys).await
    }

    async fn fetch_keys(&self, keys: Vec<String>) -> DefaultResult<Vec<SkuModel>, AppError> {
        let info: AppInMemFetchKeys = HashMap::from([(SkuTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(SkuTable::LABEL).unwrap_or_default();
        let mut out = rows
            .into_iter()
            .map(SkuModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()?;
        out.sort_by_key(|s| s.id_);
        Ok(out)
    }

    fn decode_tier(
        key: &str,
        row: &AppInMemFetchedSingleRow,
    ) -> DefaultResult<(usize, SkuPriceTierModel), AppError> {
        let corrupt = || AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("price-tier-row:{key}")),
        };
        let mut toks = key.split('-');
        let sku_id = toks
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .ok_or_else(corrupt)?;
        let seq = toks
            .next()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(corrupt)?;
        if row.len() != 3 {
            return Err(corrupt());
        }
        let max_qty = if row[1].is_empty() {
            None
        } else {
            Some(row[1].parse().map_err(|_e| corrupt())?)
        };
        let m = SkuPriceTierModel {
            sku_id,
            min_qty: row[0].parse().map_err(|_e| corrupt())?,
            max_qty,
            unit_price: row[2].parse().map_err(|_e| corrupt())?,
        };
        Ok((seq, m))
    }
} // end of impl SkuCatalogInMemRepo

#[async_trait]
impl AbsSkuCatalogRepo for SkuCatalogInMemRepo {
    async fn fetch_by_ids(&self, ids: Vec<u64>) -> DefaultResult<Vec<SkuModel>, AppError> {
        let keys = ids.into_iter().map(|i| i.to_string()).collect();
        self.fetch_keys(keys).await
    }

    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Vec<SkuModel>, AppError> {
        let op = SkuFieldFilterOp {
            code: Some(code.to_string()),
            name: None,
            spec: None,
        };
        self.fetch_filtered(op).await
    }

    async fn fetch_by_name_spec(
        &self,
        name: &str,
        spec: &str,
    ) -> DefaultResult<Vec<SkuModel>, AppError> {
        let op = SkuFieldFilterOp {
            code: None,
            name: Some(name.to_string()),
            spec: Some(spec.to_string()),
        };
        self.fetch_filtered(op).await
    }

    async fn fetch_by_name(&self, name: &str) -> DefaultResult<Vec<SkuModel>, AppError> {
        let op = SkuFieldFilterOp {
            code: None,
            name: Some(name.to_string()),
            spec: None,
        };
        self.fetch_filtered(op).await
    }

    async fn fetch_pricing(&self, ids: Vec<u64>) -> DefaultResult<SkuPriceModelSet, AppError> {
        let skus = self.fetch_by_ids(ids.clone()).await?;
        let op = TierSkuFilterOp { sku_ids: ids };
        let keys = self
            .datastore
            .filter_keys(TierTable::LABEL.to_string(), &op)
            .await?;
        let info: AppInMemFetchKeys = HashMap::from([(TierTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(TierTable::LABEL).unwrap_or_default();
        let mut decoded = rows
            .iter()
            .map(|(k, v)| Self::decode_tier(k, v))
            .collect::<DefaultResult<Vec<_>, _>>()?;
        // preserve per-SKU insertion order recorded in the sequence number
        decoded.sort_by_key(|(seq, m)| (m.sku_id, *seq));
        let tiers = tiers_sorted(decoded.into_iter().map(|(_seq, m)| m).collect());
        Ok(SkuPriceModelSet { skus, tiers })
    } // end of fn fetch_pricing

    async fn save(&self, ms: SkuPriceModelSet) -> DefaultResult<(), AppError> {
        let t_sku = ms
            .skus
            .iter()
            .map(|m| SkuTable::UpdateArg(m).into())
            .collect::<AppInMemFetchedSingleTable>();
        let mut seq_per_sku: HashMap<u64, usize> = HashMap::new();
        let t_tier = ms
            .tiers
            .iter()
            .map(|m| {
                let seq = seq_per_sku.entry(m.sku_id).or_insert(0);
                let out = TierTable::UpdateArg(*seq, m).into();
                *seq += 1;
                out
            })
            .collect::<AppInMemFetchedSingleTable>();
        let data = HashMap::from([
            (SkuTable::LABEL.to_string(), t_sku),
            (TierTable::LABEL.to_string(), t_tier),
        ]);
        let _num = self.datastore.save(data).await?;
        Ok(())
    }
} // end of impl AbsSkuCatalogRepo for SkuCatalogInMemRepo
