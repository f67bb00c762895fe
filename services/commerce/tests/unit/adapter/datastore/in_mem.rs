use std::collections::HashMap;

use ecommerce_common::config::AppInMemoryDbCfg;
use ecommerce_common::error::AppErrorCode;

use commerce::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemDeleteInfo, AppInMemFetchKeys,
    AppInMemUpdateData, AppInMemoryDStore,
};

const UT_TABLE_SKU: &str = "ut_product_sku";
const UT_TABLE_CART: &str = "ut_cart_line";

fn ut_dstore(max_items: u32) -> AppInMemoryDStore {
    let cfg = AppInMemoryDbCfg {
        alias: "roja".to_string(),
        max_items,
    };
    AppInMemoryDStore::new(&cfg)
}

fn ut_sku_rows() -> HashMap<String, Vec<String>> {
    let mut t = HashMap::new();
    let row = ["1001", "KB-0042", "wireless keyboard", "US layout", "1"]
        .into_iter()
        .map(String::from)
        .collect();
    t.insert("140".to_string(), row);
    let row = ["1001", "KB-0043", "wireless keyboard", "DE layout", "1"]
        .into_iter()
        .map(String::from)
        .collect();
    t.insert("141".to_string(), row);
    t
}

#[tokio::test]
async fn save_fetch_ok() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_SKU).await.is_ok());
    assert!(dstore.create_table(UT_TABLE_CART).await.is_ok());
    let new_data: AppInMemUpdateData = {
        let mut out = HashMap::new();
        out.insert(UT_TABLE_SKU.to_string(), ut_sku_rows());
        let t2 = {
            let mut t = HashMap::new();
            let row = ["6"].into_iter().map(String::from).collect();
            t.insert("188-140".to_string(), row);
            t
        };
        out.insert(UT_TABLE_CART.to_string(), t2);
        out
    };
    let result = dstore.save(new_data).await;
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 3);

    let fetching_keys: AppInMemFetchKeys = {
        let mut out = HashMap::new();
        let t1 = ["140", "141", "999"].into_iter().map(String::from).collect();
        let t2 = ["188-140", "188-975"].into_iter().map(String::from).collect();
        out.insert(UT_TABLE_SKU.to_string(), t1);
        out.insert(UT_TABLE_CART.to_string(), t2);
        out
    };
    let result = dstore.fetch(fetching_keys).await;
    assert!(result.is_ok());
    let fetched = result.unwrap();
    {
        let a_table = fetched.get(UT_TABLE_SKU).unwrap();
        let item = a_table
            .get("141")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>();
        assert_eq!(
            item,
            ["1001", "KB-0043", "wireless keyboard", "DE layout", "1"]
        );
        assert!(a_table.get("999").is_none());
    }
    {
        let a_table = fetched.get(UT_TABLE_CART).unwrap();
        let item = a_table
            .get("188-140")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>();
        assert_eq!(item, ["6"]);
        assert!(a_table.get("188-975").is_none());
    }
} // end of fn save_fetch_ok

#[tokio::test]
async fn save_overwrite_existing_row() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_CART).await.is_ok());
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec!["2".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save(data).await.unwrap(), 1);
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec!["9".to_string()]);
        t.insert("188-141".to_string(), vec!["1".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save(data).await.unwrap(), 2);
    let keys: AppInMemFetchKeys = HashMap::from([(
        UT_TABLE_CART.to_string(),
        vec!["188-140".to_string(), "188-141".to_string()],
    )]);
    let fetched = dstore.fetch(keys).await.unwrap();
    let a_table = fetched.get(UT_TABLE_CART).unwrap();
    assert_eq!(a_table.get("188-140").unwrap()[0].as_str(), "9");
    assert_eq!(a_table.get("188-141").unwrap()[0].as_str(), "1");
}

#[tokio::test]
async fn access_nonexistent_table() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_SKU).await.is_ok());
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec!["2".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    let result = dstore.save(data).await;
    assert!(result.is_err());
    let e = result.unwrap_err();
    assert_eq!(e.code, AppErrorCode::DataTableNotExist);
    assert_eq!(e.detail.as_deref(), Some(UT_TABLE_CART));
}

#[tokio::test]
async fn save_exceed_limit() {
    let dstore = ut_dstore(3);
    assert!(dstore.create_table(UT_TABLE_CART).await.is_ok());
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        for sku in [140u64, 141, 142, 143] {
            t.insert(format!("188-{sku}"), vec!["1".to_string()]);
        }
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    let result = dstore.save(data).await;
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code, AppErrorCode::ExceedingMaxLimit);
    // the rejected batch left no row behind
    let keys: AppInMemFetchKeys = HashMap::from([(
        UT_TABLE_CART.to_string(),
        vec!["188-140".to_string(), "188-143".to_string()],
    )]);
    let fetched = dstore.fetch(keys).await.unwrap();
    assert!(fetched.get(UT_TABLE_CART).unwrap().is_empty());
}

#[tokio::test]
async fn save_overwrite_at_limit_ok() {
    let dstore = ut_dstore(2);
    assert!(dstore.create_table(UT_TABLE_CART).await.is_ok());
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec!["1".to_string()]);
        t.insert("188-141".to_string(), vec!["1".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save(data).await.unwrap(), 2);
    // replacing existing rows adds nothing, the full table still accepts it
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-141".to_string(), vec!["5".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save(data).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_ok() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_SKU).await.is_ok());
    let data: AppInMemUpdateData =
        HashMap::from([(UT_TABLE_SKU.to_string(), ut_sku_rows())]);
    assert_eq!(dstore.save(data).await.unwrap(), 2);
    let info: AppInMemDeleteInfo =
        HashMap::from([(UT_TABLE_SKU.to_string(), vec!["140".to_string()])]);
    assert_eq!(dstore.delete(info).await.unwrap(), 1);
    let keys: AppInMemFetchKeys = HashMap::from([(
        UT_TABLE_SKU.to_string(),
        vec!["140".to_string(), "141".to_string()],
    )]);
    let fetched = dstore.fetch(keys).await.unwrap();
    let a_table = fetched.get(UT_TABLE_SKU).unwrap();
    assert!(a_table.get("140").is_none());
    assert!(a_table.get("141").is_some());
}

struct UtNameFilter {
    name: String,
}
impl AbsDStoreFilterKeyOp for UtNameFilter {
    fn filter(&self, _k: &String, v: &Vec<String>) -> bool {
        v.get(2).map(String::as_str) == Some(self.name.as_str())
    }
}

#[tokio::test]
async fn filter_keys_ok() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_SKU).await.is_ok());
    let data: AppInMemUpdateData =
        HashMap::from([(UT_TABLE_SKU.to_string(), ut_sku_rows())]);
    assert_eq!(dstore.save(data).await.unwrap(), 2);
    let op = UtNameFilter {
        name: "wireless keyboard".to_string(),
    };
    let mut keys = dstore
        .filter_keys(UT_TABLE_SKU.to_string(), &op)
        .await
        .unwrap();
    keys.sort();
    assert_eq!(keys, ["140".to_string(), "141".to_string()]);
    let op = UtNameFilter {
        name: "trackball".to_string(),
    };
    let keys = dstore
        .filter_keys(UT_TABLE_SKU.to_string(), &op)
        .await
        .unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn fetch_acquire_save_release_ok() {
    let dstore = ut_dstore(10);
    assert!(dstore.create_table(UT_TABLE_CART).await.is_ok());
    let data: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec!["3".to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save(data).await.unwrap(), 1);
    let keys: AppInMemFetchKeys =
        HashMap::from([(UT_TABLE_CART.to_string(), vec!["188-140".to_string()])]);
    let (fetched, lock) = dstore.fetch_acquire(keys).await.unwrap();
    let prev: u32 = fetched
        .get(UT_TABLE_CART)
        .and_then(|t| t.get("188-140"))
        .and_then(|row| row.first())
        .and_then(|c| c.parse().ok())
        .unwrap();
    assert_eq!(prev, 3);
    let updated: AppInMemUpdateData = {
        let mut t = HashMap::new();
        t.insert("188-140".to_string(), vec![(prev + 4).to_string()]);
        HashMap::from([(UT_TABLE_CART.to_string(), t)])
    };
    assert_eq!(dstore.save_release(updated, lock).unwrap(), 1);
    // the store is accessible again after the lock was given back
    let keys: AppInMemFetchKeys =
        HashMap::from([(UT_TABLE_CART.to_string(), vec!["188-140".to_string()])]);
    let fetched = dstore.fetch(keys).await.unwrap();
    let saved = fetched
        .get(UT_TABLE_CART)
        .and_then(|t| t.get("188-140"))
        .and_then(|row| row.first())
        .cloned();
    assert_eq!(saved.as_deref(), Some("7"));
} // end of fn fetch_acquire_save_release_ok
