use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use ecommerce_common::error::AppErrorCode;

use crate::adapter::datastore::AppPgDbStore;
use crate::error::AppError;
use crate::model::{ContactAddressModel, OrderLineModel, OrderModel, OrderStatus};
use crate::repository::AbsOrderRepo;

use super::{pick_primary_db, placeholder_groups};

impl TryFrom<PgRow> for OrderModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        let status = row.try_get::<String, usize>(1)?;
        let addr_serial = row.try_get::<String, usize>(4)?;
        let address =
            serde_json::from_str::<ContactAddressModel>(addr_serial.as_str()).map_err(|e| {
                AppError {
                    code: AppErrorCode::DataCorruption,
                    detail: Some(format!("order-address:{e}")),
                }
            })?;
        let created = row.try_get::<DateTime<Utc>, usize>(7)?;
        Ok(Self {
            id_: row.try_get::<String, usize>(0)?,
            status: OrderStatus::try_from(status.as_str())?,
            customer: row.try_get::<i64, usize>(2)? as u32,
            owner_sales: row.try_get::<Option<i64>, usize>(3)?.map(|v| v as u32),
            address,
            remark: row.try_get::<String, usize>(5)?,
            idempotency_key: row.try_get::<Option<String>, usize>(6)?,
            created: created.fixed_offset(),
        })
    } // end of fn try_from
}

const ORDER_COLUMNS: &str = "\"o_id\",\"status\",\"usr_id\",\"sales_usr_id\",\"address\",\
    \"remark\",\"idempotency_key\",\"created\"";

pub(crate) struct OrderPgRepo {
    _db: Arc<AppPgDbStore>,
}

impl OrderPgRepo {
    pub(crate) fn new(dbs: &[Arc<AppPgDbStore>]) -> DefaultResult<Self, AppError> {
        let _db = pick_primary_db(dbs)?;
        Ok(Self { _db })
    }
} // end of impl OrderPgRepo

#[async_trait]
impl AbsOrderRepo for OrderPgRepo {
    async fn create(
        &self,
        order: &OrderModel,
        lines: &[OrderLineModel],
        discard_cart_skus: &[u64],
    ) -> DefaultResult<(), AppError> {
        let addr_serial = serde_json::to_string(&order.address).map_err(|e| AppError {
            code: AppErrorCode::InvalidJsonFormat,
            detail: Some(e.to_string()),
        })?;
        let mut tx = self._db.pool().begin().await?;
        // the unique index on (usr_id, idempotency_key) turns a concurrent
        // replay into a DuplicateKeyExists error, the caller re-queries
        // then, keyless orders store NULL which the index never collides on
        let sql = format!(
            "INSERT INTO \"order_toplvl\"({ORDER_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)"
        );
        let _rs = sqlx::query(sql.as_str())
            .bind(order.id_.as_str())
            .bind(order.status.label())
            .bind(order.customer as i64)
            .bind(order.owner_sales.map(|v| v as i64))
            .bind(addr_serial.as_str())
            .bind(order.remark.as_str())
            .bind(order.idempotency_key.as_deref())
            .bind(order.created.with_timezone(&Utc))
            .execute(&mut *tx)
            .await?;
        if !lines.is_empty() {
            let sql = format!(
                "INSERT INTO \"order_line\"(\"o_id\",\"seq\",\"sku_id\",\"quantity\",\
                 \"unit_price\") VALUES {}",
                placeholder_groups(lines.len(), 5)
            );
            let mut query = sqlx::query(sql.as_str());
            for (seq, l) in lines.iter().enumerate() {
                query = query
                    .bind(l.order_id.as_str())
                    .bind(seq as i32)
                    .bind(l.sku_id as i64)
                    .bind(l.quantity as i32)
                    .bind(l.unit_price as i32);
            }
            let _rs = query.execute(&mut *tx).await?;
        }
        if !discard_cart_skus.is_empty() {
            let sql = "DELETE FROM \"cart_line\" WHERE \"usr_id\" = $1 AND \"sku_id\" = ANY($2)";
            let ids = discard_cart_skus
                .iter()
                .map(|v| *v as i64)
                .collect::<Vec<_>>();
            let _rs = sqlx::query(sql)
                .bind(order.customer as i64)
                .bind(&ids)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    } // end of fn create

    async fn fetch_by_idempotency_key(
        &self,
        customer: u32,
        key: &str,
    ) -> DefaultResult<Option<OrderModel>, AppError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM \"order_toplvl\" WHERE \"usr_id\"=$1 \
             AND \"idempotency_key\"=$2"
        );
        let result = sqlx::query(sql.as_str())
            .bind(customer as i64)
            .bind(key)
            .fetch_optional(self._db.pool())
            .await?;
        result.map(OrderModel::try_from).transpose()
    }

    async fn fetch_lines(&self, order_id: &str) -> DefaultResult<Vec<OrderLineModel>, AppError> {
        let sql = "SELECT \"o_id\",\"sku_id\",\"quantity\",\"unit_price\" \
                   FROM \"order_line\" WHERE \"o_id\"=$1 ORDER BY \"seq\"";
        let rows = sqlx::query(sql)
            .bind(order_id)
            .fetch_all(self._db.pool())
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(OrderLineModel {
                    order_id: row.try_get::<String, usize>(0)?,
                    sku_id: row.try_get::<i64, usize>(1)? as u64,
                    quantity: row.try_get::<i32, usize>(2)? as u32,
                    unit_price: row.try_get::<i32, usize>(3)? as u32,
                })
            })
            .collect::<DefaultResult<Vec<_>, AppError>>()
    }
} // end of impl AbsOrderRepo for OrderPgRepo
