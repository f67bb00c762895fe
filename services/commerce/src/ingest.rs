use regex::Regex;

use crate::constant::hard_limit;
use crate::error::{AppError, AppErrorCode};
use crate::model::CartImportRowInput;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SheetColumn {
    SkuId,
    SkuCode,
    Name,
    Spec,
    Qty,
}

/// Strip every non-alphanumeric character (unicode aware) and lowercase, so
/// `"SKU ID"`, `"sku-id"` and `"Sku_Id"` normalize to the same key.
fn normalize_header(strip: &Regex, raw: &str) -> String {
    strip.replace_all(raw, "").to_lowercase()
}

/// Recognized header aliases, spreadsheets in the wild come both in English
/// and in Chinese.
fn column_of(normalized: &str) -> Option<SheetColumn> {
    let found = match normalized {
        "skuid" | "id" | "sku编号" => SheetColumn::SkuId,
        "skucode" | "code" | "productcode" | "编码" | "商品编码" | "货号" => {
            SheetColumn::SkuCode
        }
        "name" | "productname" | "名称" | "商品名称" | "品名" => SheetColumn::Name,
        "spec" | "specification" | "规格" | "规格型号" => SheetColumn::Spec,
        "qty" | "quantity" | "amount" | "数量" => SheetColumn::Qty,
        _others => {
            return None;
        }
    };
    Some(found)
}

/// Map one uploaded sheet to row inputs. The first row is the header and
/// must mention at least one recognized column, unrecognized columns are
/// silently skipped. Data rows are numbered from 1, entirely blank rows are
/// dropped here before any catalog lookup happens.
pub fn parse_sheet(rows: &[Vec<String>]) -> Result<Vec<CartImportRowInput>, AppError> {
    if rows.is_empty() {
        return Err(AppError {
            code: AppErrorCode::EmptyInputData,
            detail: Some("sheet-without-header".to_string()),
        });
    }
    if rows.len() - 1 > hard_limit::MAX_ROWS_PER_IMPORT {
        return Err(AppError {
            code: AppErrorCode::ExceedingMaxLimit,
            detail: Some(format!("num-rows:{}", rows.len() - 1)),
        });
    }
    let header = &rows[0];
    let strip = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
    let columns = header
        .iter()
        .map(|cell| column_of(normalize_header(&strip, cell).as_str()))
        .collect::<Vec<_>>();
    if columns.iter().all(Option::is_none) {
        return Err(AppError {
            code: AppErrorCode::InvalidInput,
            detail: Some("sheet-header-unrecognized".to_string()),
        });
    }
    let out = rows[1..]
        .iter()
        .enumerate()
        .map(|(idx, cells)| {
            let mut row = CartImportRowInput {
                row_no: (idx + 1) as u32,
                ..Default::default()
            };
            for (col, cell) in columns.iter().zip(cells.iter()) {
                let dst = match col {
                    Some(SheetColumn::SkuId) => &mut row.sku_id,
                    Some(SheetColumn::SkuCode) => &mut row.sku_code,
                    Some(SheetColumn::Name) => &mut row.name,
                    Some(SheetColumn::Spec) => &mut row.spec,
                    Some(SheetColumn::Qty) => &mut row.qty,
                    None => {
                        continue;
                    }
                };
                *dst = cell.clone();
            }
            row
        })
        .filter(|r| !r.is_blank())
        .collect::<Vec<_>>();
    Ok(out)
} // end of fn parse_sheet
