use chrono::{DateTime, FixedOffset, Local as LocalTime};
use uuid::Uuid;

use crate::error::{AppError, AppErrorCode};

use super::SkuModel;

#[derive(Debug, Clone, PartialEq)]
pub enum CartImportJobStatus {
    Running,
    Succeeded,
}

impl CartImportJobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
        }
    }
}
impl TryFrom<&str> for CartImportJobStatus {
    type Error = AppError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            _others => Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("cart-import-job-status:{value}")),
            }),
        }
    }
}

/// The three possible outcomes of matching one spreadsheet row against the
/// catalog. Immutable once the row is persisted, a later confirmation only
/// fills the selection fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CartImportMatchType {
    Auto,
    Ambiguous,
    NotFound,
}

impl CartImportMatchType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Ambiguous => "AMBIGUOUS",
            Self::NotFound => "NOT_FOUND",
        }
    }
}
impl TryFrom<&str> for CartImportMatchType {
    type Error = AppError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "AUTO" => Ok(Self::Auto),
            "AMBIGUOUS" => Ok(Self::Ambiguous),
            "NOT_FOUND" => Ok(Self::NotFound),
            _others => Err(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("cart-import-match-type:{value}")),
            }),
        }
    }
}

/// Durable record of one spreadsheet-upload processing pass.
pub struct CartImportJobModel {
    pub id_: String,
    pub owner: u32,
    pub status: CartImportJobStatus,
    pub progress: u8,
    pub auto_added: u32,
    pub pending: u32,
    pub created: DateTime<FixedOffset>,
}

impl CartImportJobModel {
    pub fn start(owner: u32) -> Self {
        Self {
            id_: Uuid::new_v4().simple().to_string(),
            owner,
            status: CartImportJobStatus::Running,
            progress: 0,
            auto_added: 0,
            pending: 0,
            created: LocalTime::now().fixed_offset(),
        }
    }

    pub fn finish(&mut self, auto_added: u32, pending: u32) {
        self.status = CartImportJobStatus::Succeeded;
        self.progress = 100;
        self.auto_added = auto_added;
        self.pending = pending;
    }
}

/// One parsed spreadsheet row, all cells kept as submitted. Row number 1 is
/// the first data row below the header.
#[derive(Debug, Clone, Default)]
pub struct CartImportRowInput {
    pub row_no: u32,
    pub sku_id: String,
    pub sku_code: String,
    pub name: String,
    pub spec: String,
    pub qty: String,
}

impl CartImportRowInput {
    /// Fully blank rows are non-data, they vanish without producing any
    /// persisted row. Rows with partial garbage stay tracked as pending
    /// work items, keep the asymmetry.
    pub fn is_blank(&self) -> bool {
        [
            &self.sku_id,
            &self.sku_code,
            &self.name,
            &self.spec,
            &self.qty,
        ]
        .iter()
        .all(|v| v.trim().is_empty())
    }

    /// Display-only fallback when the name cell is empty, never consulted
    /// by the matching cascade.
    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            self.name.clone()
        } else if !self.sku_code.trim().is_empty() {
            self.sku_code.clone()
        } else {
            self.sku_id.clone()
        }
    }
}

/// Trim, require a positive integer, clamp into i32 range.
pub fn parse_qty(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(v) if v >= 1 => Some(v.min(i32::MAX as i64) as u32),
        _others => None,
    }
}

pub struct CartImportRowModel {
    pub job_id: String,
    pub row_no: u32,
    pub raw_name: String,
    pub raw_spec: String,
    pub raw_qty: String,
    pub match_type: CartImportMatchType,
    pub matched_sku: Option<u64>,
    pub parsed_qty: Option<u32>,
    pub candidates: Vec<u64>,
    pub selected_sku: Option<u64>,
    pub selected_qty: Option<u32>,
}

impl CartImportRowModel {
    /// Classify one row given the candidate SKUs the cascade produced :
    /// - exactly one match and a parsable quantity, auto-resolve
    /// - several matches, or one match without usable quantity, ambiguous
    /// - no match at all, not-found with an empty candidate list
    pub fn classify(job_id: &str, input: &CartImportRowInput, matches: &[SkuModel]) -> Self {
        let qty = parse_qty(input.qty.as_str());
        let (match_type, matched_sku, parsed_qty, candidates) = match (matches.len(), qty) {
            (1, Some(q)) => (
                CartImportMatchType::Auto,
                Some(matches[0].id_),
                Some(q),
                Vec::new(),
            ),
            (0, _) => (CartImportMatchType::NotFound, None, None, Vec::new()),
            (_many_or_unparsable, _) => (
                CartImportMatchType::Ambiguous,
                None,
                None,
                matches.iter().map(|m| m.id_).collect(),
            ),
        };
        Self {
            job_id: job_id.to_string(),
            row_no: input.row_no,
            raw_name: input.display_name(),
            raw_spec: input.spec.clone(),
            raw_qty: input.qty.clone(),
            match_type,
            matched_sku,
            parsed_qty,
            candidates,
            selected_sku: None,
            selected_qty: None,
        }
    } // end of fn classify

    /// A row counts toward the auto-added side once it was originally
    /// auto-resolved or a human picked a SKU for it.
    pub fn resolved(&self) -> bool {
        matches!(self.match_type, CartImportMatchType::Auto) || self.selected_sku.is_some()
    }

    /// Quantity applied on confirmation : the caller-supplied value wins,
    /// then the raw cell re-parsed, then 1.
    pub fn effective_confirm_qty(&self, requested: Option<u32>) -> u32 {
        requested
            .or_else(|| parse_qty(self.raw_qty.as_str()))
            .unwrap_or(1)
    }
}

/// Recompute `(auto_added, pending)` over all persisted rows, running this
/// any number of times over the same rows yields the same counters.
pub fn recount_rows(rows: &[CartImportRowModel]) -> (u32, u32) {
    let auto = rows.iter().filter(|r| r.resolved()).count() as u32;
    let pending = (rows.len() as u32) - auto;
    (auto, pending)
}
