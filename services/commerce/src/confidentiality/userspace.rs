use std::collections::HashMap;
use std::fs;
use std::result::Result as DefaultResult;
use std::sync::RwLock;

use serde_json::Value as JsnVal;

use ecommerce_common::error::AppErrorCode;

use super::AbstractConfidentiality;
use crate::error::AppError;

const SOURCE_SIZE_LIMIT_NBYTES: u64 = 8192;

/// Secrets kept in one local JSON document owned by the runtime user,
/// individual entries are addressed with slash-separated paths such as
/// `backend_apps/databases/commerce_service`.
pub struct UserSpaceConfidentiality {
    src_fullpath: String,
    // entries stay cached for the process lifetime, the secret set of one
    // application instance is small and rarely rotated while running
    cached: RwLock<HashMap<String, String>>,
}

impl UserSpaceConfidentiality {
    pub fn build(fullpath: String) -> Self {
        Self {
            src_fullpath: fullpath,
            cached: RwLock::new(HashMap::new()),
        }
    }

    fn load_document(&self) -> DefaultResult<JsnVal, AppError> {
        let srcpath = self.src_fullpath.as_str();
        let meta = fs::metadata(srcpath).map_err(|e| AppError {
            code: AppErrorCode::IOerror(e.kind()),
            detail: Some(e.to_string()),
        })?;
        if meta.len() >= SOURCE_SIZE_LIMIT_NBYTES {
            return Err(AppError {
                code: AppErrorCode::ExceedingMaxLimit,
                detail: Some("secret-source-file".to_string()),
            });
        }
        let rawbuf = fs::read(srcpath).map_err(|e| AppError {
            code: AppErrorCode::IOerror(e.kind()),
            detail: Some(e.to_string()),
        })?;
        serde_json::from_slice::<JsnVal>(&rawbuf).map_err(|e| AppError {
            code: AppErrorCode::InvalidJsonFormat,
            detail: Some(e.to_string()),
        })
    } // end of fn load_document

    fn search_payload<'a>(toplvl: &'a JsnVal, id_: &str) -> DefaultResult<&'a JsnVal, AppError> {
        let mut curr_lvl = toplvl;
        for tok in id_.split('/') {
            let nxt = match curr_lvl {
                JsnVal::Object(o) => o.get(tok),
                JsnVal::Array(a) => tok.parse::<usize>().ok().and_then(|t| a.get(t)),
                _scalar => None,
            };
            match nxt {
                Some(v) => {
                    curr_lvl = v;
                }
                None => {
                    return Err(AppError {
                        code: AppErrorCode::NoConfidentialityCfg,
                        detail: Some(format!("path:{id_}, stopped-at:{tok}")),
                    });
                }
            }
        }
        Ok(curr_lvl)
    }
} // end of impl UserSpaceConfidentiality

impl AbstractConfidentiality for UserSpaceConfidentiality {
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppError> {
        let rguard = self.cached.read().map_err(|e| AppError {
            code: AppErrorCode::AcquireLockFailure,
            detail: Some(e.to_string()),
        })?;
        if let Some(v) = rguard.get(id_) {
            return Ok(v.clone());
        }
        drop(rguard);
        let toplvl = self.load_document()?;
        let found = Self::search_payload(&toplvl, id_)?;
        let serial = serde_json::to_string(found).unwrap();
        let mut wguard = self.cached.write().map_err(|e| AppError {
            code: AppErrorCode::AcquireLockFailure,
            detail: Some(e.to_string()),
        })?;
        wguard.insert(id_.to_string(), serial.clone());
        Ok(serial)
    } // end of fn try_get_payload
} // end of impl AbstractConfidentiality
