use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ecommerce_common::config::AppInMemoryDbCfg;

use crate::error::{AppError, AppErrorCode};

// simple in-memory data storage, every cell is stringified regardless of
// its original type, application callers maintain the column layout of
// each row in each table.
pub type AppInMemFetchedSingleRow = Vec<String>;
pub type AppInMemFetchedSingleTable = HashMap<String, AppInMemFetchedSingleRow>;
type AllTable = HashMap<String, AppInMemFetchedSingleTable>;
pub type AppInMemUpdateData = AllTable;
pub type AppInMemDeleteInfo = AppInMemFetchedSingleTable; // list of IDs per table
pub type AppInMemFetchKeys = AppInMemFetchedSingleTable; // list of IDs per table
pub type AppInMemFetchedData = AllTable;

/// Opaque handle proving the caller still owns the store-wide lock taken by
/// `fetch_acquire`, it has to be given back through `save_release`.
pub struct AppInMemDstoreLock {
    guard: OwnedMutexGuard<AllTable>,
}

pub trait AbsDStoreFilterKeyOp: Sync + Send {
    fn filter(&self, k: &String, v: &Vec<String>) -> bool;
}

#[async_trait]
pub trait AbstInMemoryDStore: Sync + Send {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError>;
    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError>;
    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError>;
    async fn fetch(&self, keys: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError>;
    async fn filter_keys(
        &self,
        table: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError>;
    /// Fetch while keeping the store locked, callers modify the returned
    /// rows then commit with `save_release`, nothing else can interleave.
    async fn fetch_acquire(
        &self,
        keys: AppInMemFetchKeys,
    ) -> DefaultResult<(AppInMemFetchedData, AppInMemDstoreLock), AppError>;
    fn save_release(
        &self,
        data: AppInMemUpdateData,
        lock: AppInMemDstoreLock,
    ) -> DefaultResult<usize, AppError>;
}

pub struct AppInMemoryDStore {
    max_items_per_table: u32,
    table_map: Arc<Mutex<AllTable>>,
}

impl AppInMemoryDStore {
    pub fn new(cfg: &AppInMemoryDbCfg) -> Self {
        Self {
            max_items_per_table: cfg.max_items,
            table_map: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // capacity is verified against the would-be size, a batch which does
    // not fit must not leave any of its rows behind
    fn check_capacity(&self, map: &AllTable, data: &AppInMemUpdateData) -> DefaultResult<(), AppError> {
        let limit = self.max_items_per_table as usize;
        let mut invalid = data.iter().filter(|(label, d_grp)| {
            let table = map.get(label.as_str()).unwrap();
            let num_new = d_grp
                .keys()
                .filter(|k| !table.contains_key(k.as_str()))
                .count();
            limit < table.len() + num_new
        });
        if let Some((label, _)) = invalid.next() {
            let msg = format!("{}, {}", module_path!(), label);
            Err(AppError {
                code: AppErrorCode::ExceedingMaxLimit,
                detail: Some(msg),
            })
        } else {
            Ok(())
        }
    }

    fn check_table_existence<'a>(
        map: &AllTable,
        labels: impl Iterator<Item = &'a String>,
    ) -> DefaultResult<(), AppError> {
        let mut invalid = labels.filter(|label| !map.contains_key(label.as_str()));
        if let Some(d) = invalid.next() {
            Err(AppError {
                code: AppErrorCode::DataTableNotExist,
                detail: Some(d.to_string()),
            })
        } else {
            Ok(())
        }
    }

    fn save_into(
        &self,
        map: &mut AllTable,
        data: AppInMemUpdateData,
    ) -> DefaultResult<usize, AppError> {
        Self::check_table_existence(map, data.keys())?;
        self.check_capacity(map, &data)?;
        let tot_cnt = data
            .into_iter()
            .map(|(label, d_grp)| {
                let table = map.get_mut(label.as_str()).unwrap();
                d_grp
                    .into_iter()
                    .map(|(id, row)| {
                        table.insert(id, row);
                    })
                    .count()
            })
            .sum();
        Ok(tot_cnt)
    }

    fn fetch_from(
        map: &AllTable,
        keys: AppInMemFetchKeys,
    ) -> DefaultResult<AppInMemFetchedData, AppError> {
        Self::check_table_existence(map, keys.keys())?;
        let rs_a = keys
            .iter()
            .map(|(label, ids)| {
                let table = map.get(label.as_str()).unwrap();
                let rs_t = ids
                    .iter()
                    .filter_map(|id| table.get(id).map(|row| (id.clone(), row.clone())))
                    .collect::<AppInMemFetchedSingleTable>();
                (label.clone(), rs_t)
            })
            .collect::<AppInMemFetchedData>();
        Ok(rs_a)
    }
} // end of impl AppInMemoryDStore

#[async_trait]
impl AbstInMemoryDStore for AppInMemoryDStore {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError> {
        let mut map = self.table_map.lock().await;
        if !map.contains_key(label) {
            map.insert(label.to_string(), HashMap::new());
        }
        Ok(())
    }

    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError> {
        let mut map = self.table_map.lock().await;
        self.save_into(&mut map, data)
    }

    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError> {
        let mut map = self.table_map.lock().await;
        Self::check_table_existence(&map, info.keys())?;
        let tot_cnt = info
            .iter()
            .map(|(label, ids)| {
                let table = map.get_mut(label.as_str()).unwrap();
                ids.iter()
                    .map(|id| {
                        table.remove(id);
                    })
                    .count()
            })
            .sum();
        Ok(tot_cnt)
    }

    async fn fetch(&self, keys: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError> {
        let map = self.table_map.lock().await;
        Self::fetch_from(&map, keys)
    }

    async fn filter_keys(
        &self,
        table: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError> {
        let map = self.table_map.lock().await;
        Self::check_table_existence(&map, [&table].into_iter())?;
        let t = map.get(table.as_str()).unwrap();
        let keys = t
            .iter()
            .filter(|(k, v)| op.filter(k, v))
            .map(|(k, _)| k.clone())
            .collect::<Vec<_>>();
        Ok(keys)
    }

    async fn fetch_acquire(
        &self,
        keys: AppInMemFetchKeys,
    ) -> DefaultResult<(AppInMemFetchedData, AppInMemDstoreLock), AppError> {
        let guard = self.table_map.clone().lock_owned().await;
        let fetched = Self::fetch_from(&guard, keys)?;
        Ok((fetched, AppInMemDstoreLock { guard }))
    }

    fn save_release(
        &self,
        data: AppInMemUpdateData,
        lock: AppInMemDstoreLock,
    ) -> DefaultResult<usize, AppError> {
        let mut guard = lock.guard;
        self.save_into(&mut guard, data)
    } // lock dropped here, other tasks may proceed
} // end of impl AbstInMemoryDStore for AppInMemoryDStore
