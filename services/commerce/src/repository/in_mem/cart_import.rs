use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;

use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemFetchKeys, AppInMemFetchedSingleRow,
    AppInMemFetchedSingleTable, AppInMemUpdateData,
};
use crate::error::{AppError, AppErrorCode};
use crate::model::{CartImportJobModel, CartImportJobStatus, CartImportMatchType, CartImportRowModel};
use crate::repository::AbsCartImportRepo;

#[allow(non_snake_case)]
mod JobTable {
    use super::{AppInMemFetchedSingleRow, CartImportJobModel};
    pub(super) const LABEL: &str = "cart_import_job";

    pub(super) struct UpdateArg<'a>(pub(super) &'a CartImportJobModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let obj = value.0;
            let row = vec![
                obj.owner.to_string(),
                obj.status.label().to_string(),
                obj.progress.to_string(),
                obj.auto_added.to_string(),
                obj.pending.to_string(),
                obj.created.to_rfc3339(),
            ];
            (obj.id_.clone(), row)
        }
    }
} // end of inner-mod JobTable

#[allow(non_snake_case)]
mod RowTable {
    use super::{AppInMemFetchedSingleRow, CartImportRowModel};
    pub(super) const LABEL: &str = "cart_import_row";

    // job IDs are hyphen-free hex strings, the composite key stays
    // splittable on the first hyphen
    pub(super) fn pkey(job_id: &str, row_no: u32) -> String {
        format!("{job_id}-{row_no}")
    }

    pub(super) struct UpdateArg<'a>(pub(super) &'a CartImportRowModel);

    impl<'a> From<UpdateArg<'a>> for (String, AppInMemFetchedSingleRow) {
        fn from(value: UpdateArg<'a>) -> Self {
            let obj = value.0;
            let candidates = obj
                .candidates
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let row = vec![
                obj.raw_name.clone(),
                obj.raw_spec.clone(),
                obj.raw_qty.clone(),
                obj.match_type.label().to_string(),
                obj.matched_sku.map_or(String::new(), |v| v.to_string()),
                obj.parsed_qty.map_or(String::new(), |v| v.to_string()),
                candidates,
                obj.selected_sku.map_or(String::new(), |v| v.to_string()),
                obj.selected_qty.map_or(String::new(), |v| v.to_string()),
            ];
            (pkey(obj.job_id.as_str(), obj.row_no), row)
        }
    }
} // end of inner-mod RowTable

impl TryFrom<(String, AppInMemFetchedSingleRow)> for CartImportJobModel {
    type Error = AppError;
    fn try_from(value: (String, AppInMemFetchedSingleRow)) -> DefaultResult<Self, Self::Error> {
        let (key, row) = value;
        let corrupt = || AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("cart-import-job-row:{key}")),
        };
        if row.len() != 6 {
            return Err(corrupt());
        }
        Ok(Self {
            id_: key.clone(),
            owner: row[0].parse().map_err(|_e| corrupt())?,
            status: CartImportJobStatus::try_from(row[1].as_str())?,
            progress: row[2].parse().map_err(|_e| corrupt())?,
            auto_added: row[3].parse().map_err(|_e| corrupt())?,
            pending: row[4].parse().map_err(|_e| corrupt())?,
            created: DateTime::parse_from_rfc3339(row[5].as_str()).map_err(|_e| corrupt())?,
        })
    }
}

impl TryFrom<(String, AppInMemFetchedSingleRow)> for CartImportRowModel {
    type Error = AppError;
    fn try_from(value: (String, AppInMemFetchedSingleRow)) -> DefaultResult<Self, Self::Error> {
        let (key, row) = value;
        let corrupt = || AppError {
            code: AppErrorCode::DataCorruption,
            detail: Some(format!("cart-import-row:{key}")),
        };
        let (job_id, row_no) = key.split_once('-').ok_or_else(corrupt)?;
        if row.len() != 9 {
            return Err(corrupt());
        }
        let opt_u64 = |cell: &String| -> DefaultResult<Option<u64>, AppError> {
            if cell.is_empty() {
                Ok(None)
            } else {
                cell.parse().map(Some).map_err(|_e| corrupt())
            }
        };
        let opt_u32 = |cell: &String| -> DefaultResult<Option<u32>, AppError> {
            if cell.is_empty() {
                Ok(None)
            } else {
                cell.parse().map(Some).map_err(|_e| corrupt())
            }
        };
        let candidates = if row[6].is_empty() {
            Vec::new()
        } else {
            row[6]
                .split(',')
                .map(|tok| tok.parse::<u64>().map_err(|_e| corrupt()))
                .collect::<DefaultResult<Vec<_>, _>>()?
        };
        Ok(Self {
            job_id: job_id.to_string(),
            row_no: row_no.parse().map_err(|_e| corrupt())?,
            raw_name: row[0].clone(),
            raw_spec: row[1].clone(),
            raw_qty: row[2].clone(),
            match_type: CartImportMatchType::try_from(row[3].as_str())?,
            matched_sku: opt_u64(&row[4])?,
            parsed_qty: opt_u32(&row[5])?,
            candidates,
            selected_sku: opt_u64(&row[7])?,
            selected_qty: opt_u32(&row[8])?,
        })
    } // end of fn try_from
}

struct JobRowFilterOp {
    job_id: String,
}
impl AbsDStoreFilterKeyOp for JobRowFilterOp {
    fn filter(&self, k: &String, _v: &Vec<String>) -> bool {
        k.split_once('-')
            .map_or(false, |(job, _row_no)| job == self.job_id.as_str())
    }
}

pub struct CartImportInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl CartImportInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(JobTable::LABEL).await?;
        m.create_table(RowTable::LABEL).await?;
        Ok(Self { datastore: m })
    }

    async fn save_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError> {
        let rows = [JobTable::UpdateArg(job).into()]
            .into_iter()
            .collect::<AppInMemFetchedSingleTable>();
        let data: AppInMemUpdateData = HashMap::from([(JobTable::LABEL.to_string(), rows)]);
        let _num = self.datastore.save(data).await?;
        Ok(())
    }
} // end of impl CartImportInMemRepo

#[async_trait]
impl AbsCartImportRepo for CartImportInMemRepo {
    async fn create_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError> {
        self.save_job(job).await
    }

    async fn update_job(&self, job: &CartImportJobModel) -> DefaultResult<(), AppError> {
        self.save_job(job).await
    }

    async fn fetch_job(
        &self,
        owner: u32,
        job_id: &str,
    ) -> DefaultResult<Option<CartImportJobModel>, AppError> {
        let keys = vec![job_id.to_string()];
        let info: AppInMemFetchKeys = HashMap::from([(JobTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let rows = result.remove(JobTable::LABEL).unwrap_or_default();
        let found = rows
            .into_iter()
            .next()
            .map(CartImportJobModel::try_from)
            .transpose()?;
        // job visibility is scoped to its creator
        Ok(found.filter(|j| j.owner == owner))
    }

    async fn save_rows(&self, rows: &[CartImportRowModel]) -> DefaultResult<usize, AppError> {
        let table = rows
            .iter()
            .map(|r| RowTable::UpdateArg(r).into())
            .collect::<AppInMemFetchedSingleTable>();
        let data: AppInMemUpdateData = HashMap::from([(RowTable::LABEL.to_string(), table)]);
        let num = self.datastore.save(data).await?;
        Ok(num)
    }

    async fn fetch_rows(
        &self,
        job_id: &str,
    ) -> DefaultResult<Vec<CartImportRowModel>, AppError> {
        let op = JobRowFilterOp {
            job_id: job_id.to_string(),
        };
        let keys = self
            .datastore
            .filter_keys(RowTable::LABEL.to_string(), &op)
            .await?;
        let info: AppInMemFetchKeys = HashMap::from([(RowTable::LABEL.to_string(), keys)]);
        let mut result = self.datastore.fetch(info).await?;
        let raw = result.remove(RowTable::LABEL).unwrap_or_default();
        let mut out = raw
            .into_iter()
            .map(CartImportRowModel::try_from)
            .collect::<DefaultResult<Vec<_>, _>>()?;
        out.sort_by_key(|r| r.row_no);
        Ok(out)
    }
} // end of impl AbsCartImportRepo for CartImportInMemRepo
