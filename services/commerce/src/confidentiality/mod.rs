mod userspace;

use std::boxed::Box;
use std::result::Result as DefaultResult;

use ecommerce_common::config::{AppConfidentialCfg, AppConfig};

use crate::error::AppError;

pub use userspace::UserSpaceConfidentiality;

pub fn build_context(cfg: &AppConfig) -> DefaultResult<Box<dyn AbstractConfidentiality>, AppError> {
    match &cfg.api_server.confidentiality {
        AppConfidentialCfg::UserSpace { sys_path } => {
            let fullpath = cfg.basepath.system.clone() + sys_path;
            let obj = UserSpaceConfidentiality::build(fullpath);
            Ok(Box::new(obj))
        }
    }
}

// read-only interface to fetch user-defined private data, the id is a
// slash-separated path into the secret document
pub trait AbstractConfidentiality: Send + Sync {
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppError>;
}
