use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::adapter::datastore::AppPgDbStore;
use crate::error::AppError;
use crate::model::{CartItemModel, CartModel};
use crate::repository::AbsCartRepo;

use super::{pick_primary_db, placeholder_groups};

impl TryFrom<PgRow> for CartItemModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        Ok(Self {
            owner: row.try_get::<i64, usize>(0)? as u32,
            sku_id: row.try_get::<i64, usize>(1)? as u64,
            quantity: row.try_get::<i32, usize>(2)? as u32,
        })
    }
}

pub(crate) struct CartPgRepo {
    _db: Arc<AppPgDbStore>,
}

impl CartPgRepo {
    pub(crate) fn new(dbs: &[Arc<AppPgDbStore>]) -> DefaultResult<Self, AppError> {
        let _db = pick_primary_db(dbs)?;
        Ok(Self { _db })
    }
} // end of impl CartPgRepo

#[async_trait]
impl AbsCartRepo for CartPgRepo {
    async fn add_quantities(
        &self,
        owner: u32,
        items: Vec<(u64, u32)>,
    ) -> DefaultResult<usize, AppError> {
        if items.is_empty() {
            return Ok(0);
        }
        // the conflict clause makes the increment atomic on the server,
        // no read-modify-write cycle on the application side
        let sql = format!(
            "INSERT INTO \"cart_line\"(\"usr_id\",\"sku_id\",\"quantity\") VALUES {} \
             ON CONFLICT (\"usr_id\",\"sku_id\") DO UPDATE SET \
             \"quantity\" = \"cart_line\".\"quantity\" + EXCLUDED.\"quantity\"",
            placeholder_groups(items.len(), 3)
        );
        let num = items.len();
        let mut query = sqlx::query(sql.as_str());
        for (sku_id, qty) in items.into_iter() {
            query = query
                .bind(owner as i64)
                .bind(sku_id as i64)
                .bind(qty as i32);
        }
        let _rs = query.execute(self._db.pool()).await?;
        Ok(num)
    } // end of fn add_quantities

    async fn fetch_cart(&self, owner: u32) -> DefaultResult<CartModel, AppError> {
        let sql = "SELECT \"usr_id\",\"sku_id\",\"quantity\" FROM \"cart_line\" \
                   WHERE \"usr_id\" = $1 ORDER BY \"sku_id\"";
        let rows = sqlx::query(sql)
            .bind(owner as i64)
            .fetch_all(self._db.pool())
            .await?;
        let items = rows
            .into_iter()
            .map(CartItemModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()?;
        Ok(CartModel { owner, items })
    }

    async fn update(&self, obj: CartModel) -> DefaultResult<usize, AppError> {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            obj.items.into_iter().partition(|it| it.quantity > 0);
        let mut tx = self._db.pool().begin().await?;
        if !kept.is_empty() {
            let sql = format!(
                "INSERT INTO \"cart_line\"(\"usr_id\",\"sku_id\",\"quantity\") VALUES {} \
                 ON CONFLICT (\"usr_id\",\"sku_id\") DO UPDATE SET \
                 \"quantity\" = EXCLUDED.\"quantity\"",
                placeholder_groups(kept.len(), 3)
            );
            let mut query = sqlx::query(sql.as_str());
            for it in kept.iter() {
                query = query
                    .bind(obj.owner as i64)
                    .bind(it.sku_id as i64)
                    .bind(it.quantity as i32);
            }
            let _rs = query.execute(&mut *tx).await?;
        }
        if !dropped.is_empty() {
            let sql = "DELETE FROM \"cart_line\" WHERE \"usr_id\" = $1 AND \"sku_id\" = ANY($2)";
            let ids = dropped.iter().map(|it| it.sku_id as i64).collect::<Vec<_>>();
            let _rs = sqlx::query(sql)
                .bind(obj.owner as i64)
                .bind(&ids)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(kept.len())
    } // end of fn update

    async fn discard(
        &self,
        owner: u32,
        sku_ids: Option<Vec<u64>>,
    ) -> DefaultResult<usize, AppError> {
        let rs = match sku_ids {
            Some(ids) => {
                let sql =
                    "DELETE FROM \"cart_line\" WHERE \"usr_id\" = $1 AND \"sku_id\" = ANY($2)";
                let ids = ids.into_iter().map(|v| v as i64).collect::<Vec<_>>();
                sqlx::query(sql)
                    .bind(owner as i64)
                    .bind(&ids)
                    .execute(self._db.pool())
                    .await?
            }
            None => {
                let sql = "DELETE FROM \"cart_line\" WHERE \"usr_id\" = $1";
                sqlx::query(sql)
                    .bind(owner as i64)
                    .execute(self._db.pool())
                    .await?
            }
        };
        Ok(rs.rows_affected() as usize)
    }
} // end of impl AbsCartRepo for CartPgRepo
