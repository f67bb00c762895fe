use std::fmt::{Debug, Display};

use ecommerce_common::error::AppCfgError;
pub use ecommerce_common::error::AppErrorCode;

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub detail: Option<String>,
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dp = self.detail.as_deref().unwrap_or("none");
        write!(f, "code:{:?}, detail:{}", self.code, dp)
    }
}

impl From<AppCfgError> for AppError {
    fn from(value: AppCfgError) -> Self {
        AppError {
            code: value.code,
            detail: value.detail,
        }
    }
}
impl From<(AppErrorCode, String)> for AppError {
    fn from(value: (AppErrorCode, String)) -> Self {
        AppError {
            code: value.0,
            detail: Some(value.1),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        let code = match &value {
            sqlx::Error::PoolTimedOut => AppErrorCode::DatabaseServerBusy,
            sqlx::Error::RowNotFound => AppErrorCode::ObjectNotExist,
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                AppErrorCode::DuplicateKeyExists
            }
            _others => AppErrorCode::RemoteDbServerFailure,
        };
        Self {
            code,
            detail: Some(value.to_string()),
        }
    }
}
