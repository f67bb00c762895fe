use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use ecommerce_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::api::web::dto::{
    CartImportAutoItemDto, CartImportConfirmReqDto, CartImportJobSummaryDto,
    CartImportPendingItemDto, CartImportRespDto, CartImportUploadReqDto, SkuCandidateDto,
    SkuPriceTierDto,
};
use crate::error::AppError;
use crate::ingest;
use crate::model::{
    dedup_sku_ids, recount_rows, CartImportJobModel, CartImportRowInput, CartImportRowModel,
    SkuModel, SkuPriceModelSet,
};
use crate::repository::{AbsCartImportRepo, AbsCartRepo, AbsSkuCatalogRepo};
use crate::AppAuthedClaim;

pub struct ProcessCartImportUseCase {
    pub catalog_repo: Box<dyn AbsSkuCatalogRepo>,
    pub cart_repo: Box<dyn AbsCartRepo>,
    pub import_repo: Box<dyn AbsCartImportRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}
pub struct ConfirmCartImportUseCase {
    pub catalog_repo: Box<dyn AbsSkuCatalogRepo>,
    pub cart_repo: Box<dyn AbsCartRepo>,
    pub import_repo: Box<dyn AbsCartImportRepo>,
    pub log_ctx: Arc<AppLogContext>,
    pub authed_usr: AppAuthedClaim,
}
pub struct RetrieveImportJobUseCase {
    pub catalog_repo: Box<dyn AbsSkuCatalogRepo>,
    pub import_repo: Box<dyn AbsCartImportRepo>,
    pub authed_usr: AppAuthedClaim,
}

pub enum ProcessCartImportUsKsResult {
    Success(CartImportRespDto),
    InvalidSheet(AppError),
    ServerError(AppError),
}
pub enum ConfirmCartImportUsKsResult {
    Success(CartImportRespDto),
    NotFound,
    ServerError(AppError),
}
pub enum RetrieveImportJobUsKsResult {
    Success(CartImportRespDto),
    NotFound,
    ServerError(AppError),
}

/// The matching cascade stops at the first column that carries data, later
/// columns never rescue a failed lookup on an earlier one.
async fn match_candidates(
    repo: &dyn AbsSkuCatalogRepo,
    input: &CartImportRowInput,
) -> DefaultResult<Vec<SkuModel>, AppError> {
    let sku_id_cell = input.sku_id.trim();
    if !sku_id_cell.is_empty() {
        return match sku_id_cell.parse::<u64>() {
            Ok(id) => repo.fetch_by_ids(vec![id]).await,
            Err(_e) => Ok(Vec::new()),
        };
    }
    let code_cell = input.sku_code.trim();
    if !code_cell.is_empty() {
        return repo.fetch_by_code(code_cell).await;
    }
    let name_cell = input.name.trim();
    let spec_cell = input.spec.trim();
    if !name_cell.is_empty() && !spec_cell.is_empty() {
        return repo.fetch_by_name_spec(name_cell, spec_cell).await;
    }
    if !name_cell.is_empty() {
        return repo.fetch_by_name(name_cell).await;
    }
    Ok(Vec::new())
} // end of fn match_candidates

fn job_summary(job: &CartImportJobModel) -> CartImportJobSummaryDto {
    CartImportJobSummaryDto {
        job_id: job.id_.clone(),
        status: job.status.label().to_string(),
        progress: job.progress,
        auto_added: job.auto_added,
        pending: job.pending,
    }
}

fn candidate_dto(pricing: &SkuPriceModelSet, sku_id: u64) -> Option<SkuCandidateDto> {
    pricing.find_sku(sku_id).map(|s| SkuCandidateDto {
        sku_id: s.id_,
        code: s.code.clone(),
        name: s.name.clone(),
        spec: s.spec.clone(),
        active: s.active,
        price_tiers: pricing
            .tiers_of(sku_id)
            .into_iter()
            .map(|t| SkuPriceTierDto {
                min_qty: t.min_qty,
                max_qty: t.max_qty,
                unit_price: t.unit_price,
            })
            .collect(),
    })
}

/// Hydrate the per-row result with full SKU records, all referenced IDs are
/// loaded through one batched fetch.
async fn assemble_result(
    catalog_repo: &dyn AbsSkuCatalogRepo,
    job: &CartImportJobModel,
    rows: &[CartImportRowModel],
) -> DefaultResult<CartImportRespDto, AppError> {
    let referenced = dedup_sku_ids(rows.iter().flat_map(|r| {
        r.candidates
            .iter()
            .copied()
            .chain(r.matched_sku)
            .chain(r.selected_sku)
            .collect::<Vec<_>>()
    }));
    let pricing = catalog_repo.fetch_pricing(referenced).await?;
    let auto_added_items = rows
        .iter()
        .filter(|r| r.resolved())
        .filter_map(|r| {
            let sku_id = r.matched_sku.or(r.selected_sku)?;
            let quantity = r.parsed_qty.or(r.selected_qty)?;
            Some(CartImportAutoItemDto {
                row_no: r.row_no,
                sku_id,
                quantity,
            })
        })
        .collect::<Vec<_>>();
    let pending_items = rows
        .iter()
        .filter(|r| !r.resolved())
        .map(|r| CartImportPendingItemDto {
            row_no: r.row_no,
            raw_name: r.raw_name.clone(),
            raw_spec: (!r.raw_spec.is_empty()).then(|| r.raw_spec.clone()),
            raw_qty: (!r.raw_qty.is_empty()).then(|| r.raw_qty.clone()),
            match_type: r.match_type.label().to_string(),
            candidates: r
                .candidates
                .iter()
                .filter_map(|c| candidate_dto(&pricing, *c))
                .collect(),
        })
        .collect::<Vec<_>>();
    Ok(CartImportRespDto {
        job: job_summary(job),
        auto_added_items,
        pending_items,
    })
} // end of fn assemble_result

impl ProcessCartImportUseCase {
    pub async fn execute(self, req: CartImportUploadReqDto) -> ProcessCartImportUsKsResult {
        let inputs = match ingest::parse_sheet(&req.rows) {
            Ok(v) => v,
            Err(e) => return ProcessCartImportUsKsResult::InvalidSheet(e),
        };
        match self.process(inputs).await {
            Ok(v) => ProcessCartImportUsKsResult::Success(v),
            Err(e) => ProcessCartImportUsKsResult::ServerError(e),
        }
    }

    async fn process(
        &self,
        inputs: Vec<CartImportRowInput>,
    ) -> DefaultResult<CartImportRespDto, AppError> {
        let owner = self.authed_usr.profile;
        let mut job = CartImportJobModel::start(owner);
        self.import_repo.create_job(&job).await?;
        let mut rows = Vec::with_capacity(inputs.len());
        // rows are applied one by one on purpose, a failure in the middle
        // keeps already-added cart items in place and the job reports what
        // was processed so far
        for input in inputs.iter() {
            let matches = match_candidates(self.catalog_repo.as_ref(), input).await?;
            let row = CartImportRowModel::classify(job.id_.as_str(), input, &matches);
            self.import_repo.save_rows(std::slice::from_ref(&row)).await?;
            if let (Some(sku_id), Some(qty)) = (row.matched_sku, row.parsed_qty) {
                let _num = self
                    .cart_repo
                    .add_quantities(owner, vec![(sku_id, qty)])
                    .await?;
            }
            rows.push(row);
        }
        let (auto_added, pending) = recount_rows(&rows);
        job.finish(auto_added, pending);
        self.import_repo.update_job(&job).await?;
        let logctx = &self.log_ctx;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "job:{}, owner:{owner}, auto:{auto_added}, pending:{pending}",
            job.id_
        );
        assemble_result(self.catalog_repo.as_ref(), &job, &rows).await
    } // end of fn process
} // end of impl ProcessCartImportUseCase

impl ConfirmCartImportUseCase {
    pub async fn execute(
        self,
        job_id: String,
        req: CartImportConfirmReqDto,
    ) -> ConfirmCartImportUsKsResult {
        let owner = self.authed_usr.profile;
        let job = match self.import_repo.fetch_job(owner, job_id.as_str()).await {
            Ok(Some(v)) => v,
            Ok(None) => return ConfirmCartImportUsKsResult::NotFound,
            Err(e) => return ConfirmCartImportUsKsResult::ServerError(e),
        };
        match self.confirm(job, req).await {
            Ok(v) => ConfirmCartImportUsKsResult::Success(v),
            Err(e) => ConfirmCartImportUsKsResult::ServerError(e),
        }
    }

    async fn confirm(
        &self,
        mut job: CartImportJobModel,
        req: CartImportConfirmReqDto,
    ) -> DefaultResult<CartImportRespDto, AppError> {
        let owner = self.authed_usr.profile;
        let mut rows = self.import_repo.fetch_rows(job.id_.as_str()).await?;
        let logctx = &self.log_ctx;
        for sel in req.selections.iter() {
            let row = match rows.iter_mut().find(|r| r.row_no == sel.row_no) {
                Some(r) => r,
                None => {
                    app_log_event!(
                        logctx,
                        AppLogLevel::WARNING,
                        "job:{}, unknown-row:{}",
                        job.id_,
                        sel.row_no
                    );
                    continue;
                }
            };
            // rows resolved earlier are skipped, replaying the same
            // confirmation cannot double the cart quantities
            if row.resolved() {
                continue;
            }
            if !row.candidates.is_empty() && !row.candidates.contains(&sel.sku_id) {
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "job:{}, row:{}, sku-not-candidate:{}",
                    job.id_,
                    sel.row_no,
                    sel.sku_id
                );
                continue;
            }
            let known = self.catalog_repo.fetch_by_ids(vec![sel.sku_id]).await?;
            if known.is_empty() {
                continue;
            }
            let qty = row.effective_confirm_qty(sel.quantity);
            row.selected_sku = Some(sel.sku_id);
            row.selected_qty = Some(qty);
            self.import_repo.save_rows(std::slice::from_ref(row)).await?;
            let _num = self
                .cart_repo
                .add_quantities(owner, vec![(sel.sku_id, qty)])
                .await?;
        } // end of selection loop
        let (auto_added, pending) = recount_rows(&rows);
        job.finish(auto_added, pending);
        self.import_repo.update_job(&job).await?;
        assemble_result(self.catalog_repo.as_ref(), &job, &rows).await
    } // end of fn confirm
} // end of impl ConfirmCartImportUseCase

impl RetrieveImportJobUseCase {
    pub async fn execute(self, job_id: String) -> RetrieveImportJobUsKsResult {
        let owner = self.authed_usr.profile;
        let job = match self.import_repo.fetch_job(owner, job_id.as_str()).await {
            Ok(Some(v)) => v,
            Ok(None) => return RetrieveImportJobUsKsResult::NotFound,
            Err(e) => return RetrieveImportJobUsKsResult::ServerError(e),
        };
        let rows = match self.import_repo.fetch_rows(job.id_.as_str()).await {
            Ok(v) => v,
            Err(e) => return RetrieveImportJobUsKsResult::ServerError(e),
        };
        match assemble_result(self.catalog_repo.as_ref(), &job, &rows).await {
            Ok(v) => RetrieveImportJobUsKsResult::Success(v),
            Err(e) => RetrieveImportJobUsKsResult::ServerError(e),
        }
    }
} // end of impl RetrieveImportJobUseCase
