use ecommerce_common::error::AppErrorCode;

use commerce::ingest::parse_sheet;

fn ut_sheet(cells: &[&[&str]]) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[test]
fn parse_ok_english_header() {
    let rows = ut_sheet(&[
        &["SKU Code", "Product Name", "Spec", "Qty"],
        &["KB-0042", "wireless keyboard", "US layout", "3"],
        &["", "optical mouse", "", "1"],
    ]);
    let out = parse_sheet(&rows).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].row_no, 1);
    assert_eq!(out[0].sku_code.as_str(), "KB-0042");
    assert_eq!(out[0].spec.as_str(), "US layout");
    assert_eq!(out[1].name.as_str(), "optical mouse");
}

#[test]
fn parse_ok_chinese_header() {
    let rows = ut_sheet(&[
        &["商品编码", "品名", "规格型号", "数量"],
        &["KB-0042", "无线键盘", "US布局", "3"],
    ]);
    let out = parse_sheet(&rows).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].sku_code.as_str(), "KB-0042");
    assert_eq!(out[0].name.as_str(), "无线键盘");
    assert_eq!(out[0].qty.as_str(), "3");
}

#[test]
fn header_normalization_tolerates_punctuation() {
    // "SKU-Code", "sku_code" and "Sku Code" all map to the same column
    let rows = ut_sheet(&[
        &["SKU-Code", "Product_Name", " Q t y "],
        &["KB-0042", "wireless keyboard", "2"],
    ]);
    let out = parse_sheet(&rows).unwrap();
    assert_eq!(out[0].sku_code.as_str(), "KB-0042");
    assert_eq!(out[0].qty.as_str(), "2");
}

#[test]
fn unrecognized_columns_are_skipped() {
    let rows = ut_sheet(&[
        &["warehouse", "name", "remark", "qty"],
        &["north-3", "optical mouse", "fragile", "4"],
    ]);
    let out = parse_sheet(&rows).unwrap();
    assert_eq!(out[0].name.as_str(), "optical mouse");
    assert_eq!(out[0].qty.as_str(), "4");
    assert!(out[0].sku_code.is_empty());
}

#[test]
fn blank_rows_leave_numbering_gaps() {
    let rows = ut_sheet(&[
        &["name", "qty"],
        &["wireless keyboard", "1"],
        &["", ""],
        &["optical mouse", "2"],
    ]);
    let out = parse_sheet(&rows).unwrap();
    assert_eq!(out.len(), 2);
    // row numbers follow the sheet position, the blank row keeps its slot
    assert_eq!(out[0].row_no, 1);
    assert_eq!(out[1].row_no, 3);
}

#[test]
fn empty_sheet_rejected() {
    let e = parse_sheet(&[]).unwrap_err();
    assert_eq!(e.code, AppErrorCode::EmptyInputData);
}

#[test]
fn header_without_known_column_rejected() {
    let rows = ut_sheet(&[&["warehouse", "remark"], &["north-3", "fragile"]]);
    let e = parse_sheet(&rows).unwrap_err();
    assert_eq!(e.code, AppErrorCode::InvalidInput);
}

#[test]
fn too_many_rows_rejected() {
    let mut rows = vec![vec!["name".to_string(), "qty".to_string()]];
    for i in 0..1001 {
        rows.push(vec![format!("item-{i}"), "1".to_string()]);
    }
    let e = parse_sheet(&rows).unwrap_err();
    assert_eq!(e.code, AppErrorCode::ExceedingMaxLimit);
}

#[test]
fn header_only_sheet_yields_no_rows() {
    let rows = ut_sheet(&[&["name", "qty"]]);
    let out = parse_sheet(&rows).unwrap();
    assert!(out.is_empty());
}
