use commerce::model::{
    CartImportJobModel, CartImportJobStatus, CartImportMatchType, CartImportRowInput,
    CartImportRowModel,
};
use commerce::repository::{AbsCartImportRepo, CartImportInMemRepo};

use crate::model::ut_sku;
use crate::ut_setup_datastore;

async fn ut_setup_repo() -> CartImportInMemRepo {
    let ds = ut_setup_datastore(40);
    CartImportInMemRepo::new(ds).await.unwrap()
}

fn ut_row(job_id: &str, row_no: u32, code: &str, qty: &str) -> CartImportRowModel {
    let input = CartImportRowInput {
        row_no,
        sku_code: code.to_string(),
        qty: qty.to_string(),
        ..Default::default()
    };
    let matches = [ut_sku(140, code, "wireless keyboard", "US layout", true)];
    CartImportRowModel::classify(job_id, &input, &matches)
}

#[tokio::test]
async fn job_visibility_scoped_to_owner() {
    let repo = ut_setup_repo().await;
    let mut job = CartImportJobModel::start(188);
    repo.create_job(&job).await.unwrap();
    let found = repo.fetch_job(188, job.id_.as_str()).await.unwrap();
    assert!(found.is_some());
    assert_eq!(found.unwrap().status, CartImportJobStatus::Running);
    // another user never sees the job
    let found = repo.fetch_job(189, job.id_.as_str()).await.unwrap();
    assert!(found.is_none());
    let found = repo.fetch_job(188, "no-such-job").await.unwrap();
    assert!(found.is_none());
    job.finish(5, 2);
    repo.update_job(&job).await.unwrap();
    let found = repo.fetch_job(188, job.id_.as_str()).await.unwrap().unwrap();
    assert_eq!(found.status, CartImportJobStatus::Succeeded);
    assert_eq!((found.auto_added, found.pending), (5, 2));
}

#[tokio::test]
async fn fetch_rows_ordered_by_row_number() {
    let repo = ut_setup_repo().await;
    let rows = [
        ut_row("9a4f", 3, "KB-0044", "1"),
        ut_row("9a4f", 1, "KB-0042", "2"),
        ut_row("9a4f", 2, "KB-0043", "5"),
        ut_row("77b0", 1, "MS-0007", "4"),
    ];
    let num = repo.save_rows(&rows).await.unwrap();
    assert_eq!(num, 4);
    let found = repo.fetch_rows("9a4f").await.unwrap();
    let row_nos = found.iter().map(|r| r.row_no).collect::<Vec<_>>();
    assert_eq!(row_nos, vec![1, 2, 3]);
    assert_eq!(found[0].raw_qty.as_str(), "2");
    let found = repo.fetch_rows("77b0").await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn save_rows_overwrites_selection() {
    let repo = ut_setup_repo().await;
    let mut row = ut_row("9a4f", 1, "KB-0042", "junk");
    assert_eq!(row.match_type, CartImportMatchType::Ambiguous);
    repo.save_rows(std::slice::from_ref(&row)).await.unwrap();
    row.selected_sku = Some(140);
    row.selected_qty = Some(6);
    repo.save_rows(std::slice::from_ref(&row)).await.unwrap();
    let found = repo.fetch_rows("9a4f").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].selected_sku, Some(140));
    assert_eq!(found[0].selected_qty, Some(6));
    assert_eq!(found[0].candidates, vec![140]);
    assert!(found[0].resolved());
}
