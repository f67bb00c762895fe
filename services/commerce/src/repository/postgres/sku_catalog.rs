use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::adapter::datastore::AppPgDbStore;
use crate::error::AppError;
use crate::model::{SkuModel, SkuPriceModelSet, SkuPriceTierModel};
use crate::repository::{tiers_sorted, AbsSkuCatalogRepo};

use super::{pick_primary_db, placeholder_groups};

impl TryFrom<PgRow> for SkuModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        Ok(Self {
            id_: row.try_get::<i64, usize>(0)? as u64,
            product_id: row.try_get::<i64, usize>(1)? as u64,
            code: row.try_get::<String, usize>(2)?,
            name: row.try_get::<String, usize>(3)?,
            spec: row.try_get::<String, usize>(4)?,
            active: row.try_get::<bool, usize>(5)?,
        })
    }
}

impl TryFrom<PgRow> for SkuPriceTierModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        Ok(Self {
            sku_id: row.try_get::<i64, usize>(0)? as u64,
            min_qty: row.try_get::<i32, usize>(1)? as u32,
            max_qty: row.try_get::<Option<i32>, usize>(2)?.map(|v| v as u32),
            unit_price: row.try_get::<i32, usize>(3)? as u32,
        })
    }
}

const SKU_COLUMNS: &str = "\"id\",\"product_id\",\"code\",\"name\",\"spec\",\"active\"";

pub(crate) struct SkuCatalogPgRepo {
    _db: Arc<AppPgDbStore>,
}

impl SkuCatalogPgRepo {
    pub(crate) fn new(dbs: &[Arc<AppPgDbStore>]) -> DefaultResult<Self, AppError> {
        let _db = pick_primary_db(dbs)?;
        Ok(Self { _db })
    }

    async fn fetch_sku_rows(
        &self,
        sql: String,
        binds: Vec<String>,
    ) -> DefaultResult<Vec<SkuModel>, AppError> {
        let mut query = sqlx::query(sql.as_str());
        for b in binds.iter() {
            query = query.bind(b.as_str());
        }
        let rows = query.fetch_all(self._db.pool()).await?;
        rows.into_iter()
            .map(SkuModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()
    }
} // end of impl SkuCatalogPgRepo

#[async_trait]
impl AbsSkuCatalogRepo for SkuCatalogPgRepo {
    async fn fetch_by_ids(&self, ids: Vec<u64>) -> DefaultResult<Vec<SkuModel>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {SKU_COLUMNS} FROM \"product_sku\" WHERE \"id\" = ANY($1) ORDER BY \"id\""
        );
        let ids = ids.into_iter().map(|v| v as i64).collect::<Vec<_>>();
        let rows = sqlx::query(sql.as_str())
            .bind(&ids)
            .fetch_all(self._db.pool())
            .await?;
        rows.into_iter()
            .map(SkuModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()
    }

    async fn fetch_by_code(&self, code: &str) -> DefaultResult<Vec<SkuModel>, AppError> {
        let sql = format!(
            "SELECT {SKU_COLUMNS} FROM \"product_sku\" WHERE \"code\" = $1 ORDER BY \"id\""
        );
        self.fetch_sku_rows(sql, vec![code.to_string()]).await
    }

    async fn fetch_by_name_spec(
        &self,
        name: &str,
        spec: &str,
    ) -> DefaultResult<Vec<SkuModel>, AppError> {
        let sql = format!(
            "SELECT {SKU_COLUMNS} FROM \"product_sku\" WHERE \"name\" = $1 AND \"spec\" = $2 \
             ORDER BY \"id\""
        );
        self.fetch_sku_rows(sql, vec![name.to_string(), spec.to_string()])
            .await
    }

    async fn fetch_by_name(&self, name: &str) -> DefaultResult<Vec<SkuModel>, AppError> {
        let sql = format!(
            "SELECT {SKU_COLUMNS} FROM \"product_sku\" WHERE \"name\" = $1 ORDER BY \"id\""
        );
        self.fetch_sku_rows(sql, vec![name.to_string()]).await
    }

    async fn fetch_pricing(&self, ids: Vec<u64>) -> DefaultResult<SkuPriceModelSet, AppError> {
        let skus = self.fetch_by_ids(ids.clone()).await?;
        if ids.is_empty() {
            return Ok(SkuPriceModelSet {
                skus,
                tiers: Vec::new(),
            });
        }
        let sql = "SELECT \"sku_id\",\"min_qty\",\"max_qty\",\"unit_price\" \
                   FROM \"product_price_tier\" WHERE \"sku_id\" = ANY($1) \
                   ORDER BY \"sku_id\",\"seq\"";
        let ids = ids.into_iter().map(|v| v as i64).collect::<Vec<_>>();
        let rows = sqlx::query(sql)
            .bind(&ids)
            .fetch_all(self._db.pool())
            .await?;
        let tiers = rows
            .into_iter()
            .map(SkuPriceTierModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()?;
        Ok(SkuPriceModelSet {
            skus,
            tiers: tiers_sorted(tiers),
        })
    } // end of fn fetch_pricing

    async fn save(&self, ms: SkuPriceModelSet) -> DefaultResult<(), AppError> {
        let mut tx = self._db.pool().begin().await?;
        if !ms.skus.is_empty() {
            let sql = format!(
                "INSERT INTO \"product_sku\"({SKU_COLUMNS}) VALUES {} \
                 ON CONFLICT (\"id\") DO UPDATE SET \"product_id\"=EXCLUDED.\"product_id\",\
                 \"code\"=EXCLUDED.\"code\",\"name\"=EXCLUDED.\"name\",\
                 \"spec\"=EXCLUDED.\"spec\",\"active\"=EXCLUDED.\"active\"",
                placeholder_groups(ms.skus.len(), 6)
            );
            let mut query = sqlx::query(sql.as_str());
            for m in ms.skus.iter() {
                query = query
                    .bind(m.id_ as i64)
                    .bind(m.product_id as i64)
                    .bind(m.code.as_str())
                    .bind(m.name.as_str())
                    .bind(m.spec.as_str())
                    .bind(m.active);
            }
            let _rs = query.execute(&mut *tx).await?;
        }
        if !ms.tiers.is_empty() {
            let sql = format!(
                "INSERT INTO \"product_price_tier\"(\"sku_id\",\"seq\",\"min_qty\",\
                 \"max_qty\",\"unit_price\") VALUES {} \
                 ON CONFLICT (\"sku_id\",\"seq\") DO UPDATE SET \
                 \"min_qty\"=EXCLUDED.\"min_qty\",\"max_qty\"=EXCLUDED.\"max_qty\",\
                 \"unit_price\"=EXCLUDED.\"unit_price\"",
                placeholder_groups(ms.tiers.len(), 5)
            );
            let mut query = sqlx::query(sql.as_str());
            let mut seq_prev_sku = (0i32, None::<u64>);
            for m in ms.tiers.iter() {
                let seq = if seq_prev_sku.1 == Some(m.sku_id) {
                    seq_prev_sku.0 + 1
                } else {
                    0
                };
                seq_prev_sku = (seq, Some(m.sku_id));
                query = query
                    .bind(m.sku_id as i64)
                    .bind(seq)
                    .bind(m.min_qty as i32)
                    .bind(m.max_qty.map(|v| v as i32))
                    .bind(m.unit_price as i32);
            }
            let _rs = query.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    } // end of fn save
} // end of impl AbsSkuCatalogRepo for SkuCatalogPgRepo
