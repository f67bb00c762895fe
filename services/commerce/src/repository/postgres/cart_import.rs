use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::adapter::datastore::AppPgDbStore;
use crate::error::AppError;
use crate::model::{
    CartImportJobModel, CartImportJobStatus, CartImportMatchType, CartImportRowModel,
};
use crate::repository::AbsCartImportRepo;

use super::{pick_primary_db, placeholder_groups};

impl TryFrom<PgRow> for CartImportJobModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        let status = row.try_get::<String, usize>(2)?;
        let created = row.try_get::<DateTime<Utc>, usize>(6)?;
        Ok(Self {
            id_: row.try_get::<String, usize>(0)?,
            owner: row.try_get::<i64, usize>(1)? as u32,
            status: CartImportJobStatus::try_from(status.as_str())?,
            progress: row.try_get::<i16, usize>(3)? as u8,
            auto_added: row.try_get::<i32, usize>(4)? as u32,
            pending: row.try_get::<i32, usize>(5)? as u32,
            created: created.fixed_offset(),
        })
    }
}

impl TryFrom<PgRow> for CartImportRowModel {
    type Error = AppError;
    fn try_from(row: PgRow) -> DefaultResult<Self, Self::Error> {
        let match_type = row.try_get::<String, usize>(5)?;
        let candidates_serial = row.try_get::<String, usize>(8)?;
        let candidates = if candidates_serial.is_empty() {
            Vec::new()
        } else {
            candidates_serial
                .split(',')
                .filter_map(|tok| tok.parse::<u64>().ok())
                .collect()
        };
        Ok(Self {
            job_id: row.try_get::<String, usize>(0)?,
            row_no: row.try_get::<i32, usize>(1)? as u32,
            raw_name: row.try_get::<String, usize>(2)?,
            raw_spec: row.try_get::<String, usize>(3)?,
            raw_qty: row.try_get::<String, usize>(4)?,
            match_type: CartImportMatchType::try_from(match_type.as_str())?,
            matched_sku: row.try_get::<Option<i64>, usize>(6)?.map(|v| v as u64),
            parsed_qty: row.try_get::<Option<i32>, usize>(7)?.map(|v| v as u32),
            candidates,
            selected_sku: row.try_get::<Option<i64>, usize>(9)?.map(|v| v as u64),
            selected_qty: row.try_get::<Option<i32>, usize>(10)?.map(|v| v as u32),
        })
    } // end of fn try_from
}

const JOB_COLUMNS: &str =
    "\"id\",\"usr_id\",\"status\",\"progress\",\"auto_added\",\"pending\",\"created\"";
const ROW_COLUMNS: &str = "\"job_id\",\"row_no\",\"raw_name\",\"raw_spec\",\"raw_qty\",\
    \"match_type\",\"matched_sku\",\"parsed_qty\",\"candidates\",\"selected_sku\",\"selected_qty\"";

pub(crate) struct CartImportPgRepo {
    _db: Arc<AppPgDbStore>,
}

impl CartImportPgRepo {
    pub(crate) fn new(dbs: &[Arc<AppPgDbStore>]) -> DefaultResult<Self, AppError> {
        let _db = pick_primary_db(dbs)?;
        Ok(Self { _db })
    }
} // end of impl CartImportPgRepo

#[async_trait]
impl AbsCartImportRepo for CartImportPgRepo {
    async fn create_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError> {
        let sql = format!(
            "INSERT INTO \"cart_import_job\"({JOB_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7)"
        );
        let _rs = sqlx::query(sql.as_str())
            .bind(job.id_.as_str())
            .bind(job.owner as i64)
            .bind(job.status.label())
            .bind(job.progress as i16)
            .bind(job.auto_added as i32)
            .bind(job.pending as i32)
            .bind(job.created.with_timezone(&Utc))
            .execute(self._db.pool())
            .await?;
        Ok(())
    }

    async fn update_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError> {
        let sql = "UPDATE \"cart_import_job\" SET \"status\"=$1,\"progress\"=$2,\
                   \"auto_added\"=$3,\"pending\"=$4 WHERE \"id\"=$5";
        let _rs = sqlx::query(sql)
            .bind(job.status.label())
            .bind(job.progress as i16)
            .bind(job.auto_added as i32)
            .bind(job.pending as i32)
            .bind(job.id_.as_str())
            .execute(self._db.pool())
            .await?;
        Ok(())
    }

    async fn fetch_job(
        &self,
        owner: u32,
        job_id: &str,
    ) -> DefaultResult<Option<CartImportJobModel>, AppError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM \"cart_import_job\" WHERE \"id\"=$1 AND \"usr_id\"=$2"
        );
        let result = sqlx::query(sql.as_str())
            .bind(job_id)
            .bind(owner as i64)
            .fetch_optional(self._db.pool())
            .await?;
        result.map(CartImportJobModel::try_from).transpose()
    }

    async fn save_rows(&self, rows: &[CartImportRowModel]) -> DefaultResult<usize, AppError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "INSERT INTO \"cart_import_row\"({ROW_COLUMNS}) VALUES {} \
             ON CONFLICT (\"job_id\",\"row_no\") DO UPDATE SET \
             \"selected_sku\"=EXCLUDED.\"selected_sku\",\
             \"selected_qty\"=EXCLUDED.\"selected_qty\"",
            placeholder_groups(rows.len(), 11)
        );
        let mut query = sqlx::query(sql.as_str());
        for r in rows.iter() {
            let candidates = r
                .candidates
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            query = query
                .bind(r.job_id.as_str())
                .bind(r.row_no as i32)
                .bind(r.raw_name.as_str())
                .bind(r.raw_spec.as_str())
                .bind(r.raw_qty.as_str())
                .bind(r.match_type.label())
                .bind(r.matched_sku.map(|v| v as i64))
                .bind(r.parsed_qty.map(|v| v as i32))
                .bind(candidates)
                .bind(r.selected_sku.map(|v| v as i64))
                .bind(r.selected_qty.map(|v| v as i32));
        }
        let _rs = query.execute(self._db.pool()).await?;
        Ok(rows.len())
    } // end of fn save_rows

    async fn fetch_rows(
        &self,
        job_id: &str,
    ) -> DefaultResult<Vec<CartImportRowModel>, AppError> {
        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM \"cart_import_row\" WHERE \"job_id\"=$1 \
             ORDER BY \"row_no\""
        );
        let rows = sqlx::query(sql.as_str())
            .bind(job_id)
            .fetch_all(self._db.pool())
            .await?;
        rows.into_iter()
            .map(CartImportRowModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()
    }
} // end of impl AbsCartImportRepo for CartImportPgRepo
