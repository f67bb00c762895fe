use std::borrow::BorrowMut;
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::result::Result as DefaultResult;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, FixedOffset, Local as LocalTime};
use http_body::Body as HttpBody;
use hyper::client::conn as ClientConn;
use hyper::{header, Body as HyperBody, Request, Response, StatusCode, Uri};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::task;

use ecommerce_common::config::AppAuthCfg;
use ecommerce_common::error::AppErrorCode;

use crate::constant::{app_meta, HTTP_CONTENT_TYPE_JSON};
use crate::error::AppError;
use crate::AppSharedState;

const MAX_NBYTES_LOADED_RESPONSE_KEYSTORE: usize = 102400;

/// claim decoded from access token issued by the user-management service,
/// `profile` is the numeric ID of the authenticated user profile
#[derive(Serialize, Deserialize, Clone)]
pub struct AppAuthedClaim {
    pub profile: u32,
    pub iat: i64,
    pub exp: i64,
    pub aud: Vec<String>,
}

#[async_trait]
pub trait AbstractAuthKeystore: Send + Sync {
    fn update_period(&self) -> Duration;
    async fn refresh(&self) -> DefaultResult<AppKeystoreRefreshResult, AppError>;
    async fn find(&self, kid: &str) -> DefaultResult<Jwk, AppError>;
}

pub struct AppAuthKeystore {
    update_period: Duration,
    inner: RwLock<InnerKeystoreContext>,
}
struct InnerKeystoreContext {
    keyset: JwkSet,
    keystore_url: Uri,
    last_update: DateTime<FixedOffset>,
}
pub struct AppKeystoreRefreshResult {
    // number of minutes to next refresh operation
    pub period_next_op: Duration,
    pub num_discarded: usize,
    pub num_added: usize,
}

impl AppAuthKeystore {
    pub fn new(cfg: &AppAuthCfg) -> Self {
        let update_period = Duration::minutes(cfg.update_interval_minutes as i64);
        // caller can start refresh operation immediately after initialization
        let last_update = LocalTime::now().fixed_offset() - update_period - Duration::seconds(5);
        let keystore_url = cfg.keystore_url.parse::<Uri>().unwrap();
        let inner = InnerKeystoreContext {
            keyset: JwkSet { keys: vec![] },
            keystore_url,
            last_update,
        };
        Self {
            inner: RwLock::new(inner),
            update_period,
        }
    }

    pub fn merge(target: &mut JwkSet, new: JwkSet) -> (usize, usize) {
        // key ID must be present in every key this application accepts
        let get_kid = |item: &Jwk| -> Option<String> { item.common.key_id.clone() };
        let kids_iter_1 = target.keys.iter().filter_map(get_kid);
        let kids_iter_2 = new.keys.iter().filter_map(get_kid);
        let kidset1: HashSet<String, RandomState> = HashSet::from_iter(kids_iter_1);
        let kidset2 = HashSet::from_iter(kids_iter_2);
        let added = kidset2.difference(&kidset1).collect::<Vec<_>>();
        let discarded = kidset1.difference(&kidset2).collect::<Vec<_>>();
        discarded
            .iter()
            .map(|d_kid| {
                let result = target.keys.iter().position(|item| {
                    let t_kid = item.common.key_id.as_ref().unwrap().as_str();
                    d_kid.as_str() == t_kid
                });
                if let Some(idx) = result {
                    let _item = target.keys.remove(idx);
                }
            })
            .count();
        let new_iter = new.keys.into_iter().filter(|item| {
            if let Some(id) = item.common.key_id.as_ref() {
                added.contains(&id)
            } else {
                false
            }
        });
        target.keys.extend(new_iter);
        (discarded.len(), added.len())
    } // end of fn merge

    async fn request_new_keys(&self, url: &Uri) -> DefaultResult<JwkSet, AppError> {
        let (sender, connector) = self.setup_tcp_keyserver(url).await?;
        // make the low-level connection process inbound / outbound messages
        // in a spawned task, optionally return error
        let _handle = task::spawn(async move { connector.await });
        let resp = self.request_to_key_server(url, sender).await?;
        let keys = self.resp_body_to_keys(resp).await?;
        Ok(keys)
    }

    async fn setup_tcp_keyserver(
        &self,
        url: &Uri,
    ) -> DefaultResult<
        (
            ClientConn::SendRequest<HyperBody>,
            ClientConn::Connection<TcpStream, HyperBody>,
        ),
        AppError,
    > {
        let host = url.host().unwrap();
        let port = url.port().map(|p| p.as_u16()).unwrap_or(80u16);
        let addr = format!("{host}:{port}");
        match TcpStream::connect(addr).await {
            Ok(stream) => match ClientConn::handshake(stream).await {
                Ok(m) => Ok(m),
                Err(net_e) => Err(AppError::from(&net_e)),
            },
            Err(net_e) => Err(AppError {
                detail: Some(net_e.to_string()),
                code: AppErrorCode::IOerror(net_e.kind()),
            }),
        }
    }

    async fn request_to_key_server(
        &self,
        url: &Uri,
        mut sender: ClientConn::SendRequest<HyperBody>,
    ) -> DefaultResult<Response<HyperBody>, AppError> {
        let req = Request::builder()
            .uri(url.path())
            .method(hyper::Method::GET)
            .header(header::ACCEPT, HTTP_CONTENT_TYPE_JSON)
            .body(HyperBody::empty())
            .map_err(|e| AppError {
                detail: Some(e.to_string()),
                code: AppErrorCode::InvalidInput,
            })?;
        match sender.send_request(req).await {
            Ok(resp) => {
                if resp.status() == StatusCode::OK {
                    Ok(resp)
                } else {
                    Err(AppError {
                        detail: Some(format!(
                            "remote-key-server-response-status:{}",
                            resp.status()
                        )),
                        code: AppErrorCode::IOerror(ErrorKind::ConnectionRefused),
                    })
                }
            }
            Err(net_e) => Err(AppError::from(&net_e)),
        }
    }

    async fn resp_body_to_keys(
        &self,
        mut resp: Response<HyperBody>,
    ) -> DefaultResult<JwkSet, AppError> {
        let body = resp.body_mut();
        let mut raw_collected: Vec<u8> = Vec::new();
        while let Some(data) = body.data().await {
            let result = match data {
                Ok(raw) => {
                    raw_collected.extend(raw.to_vec());
                    let result = serde_json::from_slice::<JwkSet>(raw_collected.as_slice());
                    if let Ok(out) = result {
                        Some(Ok(out))
                    } else if raw_collected.len() > MAX_NBYTES_LOADED_RESPONSE_KEYSTORE {
                        Some(Err(AppError {
                            detail: Some("auth-keys-resp-body".to_string()),
                            code: AppErrorCode::ExceedingMaxLimit,
                        }))
                    } else {
                        None
                    }
                }
                Err(net_e) => Some(Err(AppError::from(&net_e))),
            };
            if let Some(v) = result {
                return v;
            }
        }
        Err(AppError {
            detail: Some("resp-body-recv-complete".to_string()),
            code: AppErrorCode::DataCorruption,
        })
    } // end of fn resp_body_to_keys
} // end of impl AppAuthKeystore

#[async_trait]
impl AbstractAuthKeystore for AppAuthKeystore {
    fn update_period(&self) -> Duration {
        self.update_period
    }

    async fn refresh(&self) -> DefaultResult<AppKeystoreRefreshResult, AppError> {
        let mut guard = self.inner.write().await;
        let ctx = guard.borrow_mut();
        let expect_time = ctx.last_update + self.update_period;
        let t0 = LocalTime::now().fixed_offset();
        // the write lock ensures there's only one task refreshing the key
        // store in multithreaded application
        if t0 > expect_time {
            let keys = self.request_new_keys(&ctx.keystore_url).await?;
            let (num_discarded, num_added) = Self::merge(&mut ctx.keyset, keys);
            ctx.last_update = t0;
            Ok(AppKeystoreRefreshResult {
                num_discarded,
                num_added,
                period_next_op: self.update_period,
            })
        } else {
            let period_next_op = expect_time - t0;
            Ok(AppKeystoreRefreshResult {
                period_next_op,
                num_discarded: 0,
                num_added: 0,
            })
        }
    }

    async fn find(&self, kid: &str) -> DefaultResult<Jwk, AppError> {
        let guard = self.inner.read().await;
        guard.keyset.find(kid).cloned().ok_or(AppError {
            detail: Some(format!("missing-jwk:{kid}")),
            code: AppErrorCode::ObjectNotExist,
        })
    }
} // end of impl AbstractAuthKeystore

pub(crate) async fn validate_jwt(
    keystore: &dyn AbstractAuthKeystore,
    encoded: &str,
) -> DefaultResult<AppAuthedClaim, AppError> {
    let jwt_hdr = decode_header(encoded).map_err(|e| AppError {
        detail: Some(e.to_string()),
        code: AppErrorCode::InvalidInput,
    })?;
    let kid = jwt_hdr.kid.as_deref().ok_or(AppError {
        detail: Some("jwt-missing-key-id".to_string()),
        code: AppErrorCode::InvalidInput,
    })?;
    let jwk = keystore.find(kid).await?;
    let decode_key = DecodingKey::from_jwk(&jwk).map_err(|e| AppError {
        detail: Some(e.to_string()),
        code: AppErrorCode::DataCorruption,
    })?;
    let mut validation = Validation::new(jwt_hdr.alg);
    validation.set_audience(&[app_meta::LABEL]);
    validation.set_required_spec_claims(&["exp", "aud"]);
    let decoded = decode::<AppAuthedClaim>(encoded, &decode_key, &validation).map_err(|e| {
        AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::InvalidInput,
        }
    })?;
    Ok(decoded.claims)
} // end of fn validate_jwt

#[async_trait]
impl FromRequestParts<AppSharedState> for AppAuthedClaim {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppSharedState,
    ) -> DefaultResult<Self, Self::Rejection> {
        let encoded = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let keystore = state.auth_keystore();
        validate_jwt(keystore.as_ref().as_ref(), encoded)
            .await
            .map_err(|_e| StatusCode::UNAUTHORIZED)
    }
}

impl From<&hyper::Error> for AppError {
    fn from(value: &hyper::Error) -> Self {
        let code = if value.is_connect() {
            AppErrorCode::IOerror(ErrorKind::NotConnected)
        } else if value.is_parse() || value.is_incomplete_message() {
            AppErrorCode::DataCorruption
        } else if value.is_parse_too_large() {
            AppErrorCode::ExceedingMaxLimit
        } else if value.is_user() {
            AppErrorCode::IOerror(ErrorKind::InvalidInput)
        } else if value.is_timeout() {
            AppErrorCode::IOerror(ErrorKind::TimedOut)
        } else if value.is_canceled() {
            AppErrorCode::IOerror(ErrorKind::Interrupted)
        } else {
            AppErrorCode::IOerror(ErrorKind::Other)
        };
        Self {
            code,
            detail: Some(value.to_string()),
        }
    }
}
