use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::result::Result as DefaultResult;

use serde::de::{Error as DeserializeError, Expected};
use serde::Deserialize;

use crate::constant::{env_vars, logging as const_log};
use crate::error::{AppCfgError, AppErrorCode};
use crate::{AppLogAlias, WebApiPath};

#[derive(Deserialize, Debug)]
pub struct AppLogHandlerCfg {
    pub min_level: const_log::Level,
    pub destination: const_log::Destination,
    pub alias: AppLogAlias,
    pub path: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AppLoggerCfg {
    pub alias: AppLogAlias,
    pub handlers: Vec<String>,
    pub level: Option<const_log::Level>,
}

#[derive(Deserialize, Debug)]
pub struct AppLoggingCfg {
    pub handlers: Vec<AppLogHandlerCfg>,
    pub loggers: Vec<AppLoggerCfg>,
}

#[derive(Deserialize, Debug)]
pub struct WebApiRouteCfg {
    pub path: WebApiPath,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub handler: String,
}

impl std::fmt::Display for WebApiRouteCfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path:{}, handler:{}", self.path, self.handler)
    }
}

#[derive(Deserialize, Debug)]
pub struct WebApiListenCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub api_version: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub cors: String,
    pub routes: Vec<WebApiRouteCfg>,
}

#[derive(Deserialize, Debug)]
pub struct AppAuthCfg {
    pub keystore_url: String,
    pub update_interval_minutes: u32,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "source")]
pub enum AppConfidentialCfg {
    UserSpace {
        #[serde(deserialize_with = "jsn_deny_empty_string")]
        sys_path: String,
    },
}

#[allow(non_camel_case_types)]
#[derive(Deserialize, Debug, Clone)]
pub enum AppDbServerType {
    PostgreSQL,
}

#[derive(Deserialize, Debug)]
pub struct AppInMemoryDbCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub max_items: u32,
}

#[derive(Deserialize, Debug)]
pub struct AppDbServerCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub srv_type: AppDbServerType,
    pub max_conns: u32,
    pub acquire_timeout_secs: u16, // for acquiring connection from pool
    pub idle_timeout_secs: u16,
    pub confidentiality_path: String,
    pub db_name: String,
}

#[allow(non_camel_case_types)]
#[derive(Deserialize, Debug)]
#[serde(tag = "_type")]
pub enum AppDataStoreCfg {
    InMemory(AppInMemoryDbCfg),
    DbServer(AppDbServerCfg),
}

#[derive(Deserialize, Debug)]
pub struct ApiServerCfg {
    pub logging: AppLoggingCfg,
    pub listen: WebApiListenCfg,
    pub limit_req_body_in_bytes: usize,
    pub num_workers: u8,
    pub stack_sz_kb: u16,
    pub data_store: Vec<AppDataStoreCfg>,
    pub auth: AppAuthCfg,
    pub confidentiality: AppConfidentialCfg,
}

#[derive(Debug)]
pub struct AppBasepathCfg {
    pub system: String,
    pub service: String,
}

#[derive(Debug)]
pub struct AppConfig {
    pub basepath: AppBasepathCfg,
    pub api_server: ApiServerCfg,
}

pub struct AppCfgHardLimit {
    pub nitems_per_inmem_table: u32,
    pub num_db_conns: u32,
    pub seconds_db_idle: u16,
}
pub struct AppCfgInitArgs {
    pub env_var_map: HashMap<String, String, RandomState>,
    pub limit: AppCfgHardLimit,
}

impl AppConfig {
    pub fn new(args: AppCfgInitArgs) -> DefaultResult<Self, AppCfgError> {
        let (mut env_var_map, limit) = (args.env_var_map, args.limit);
        let sys_basepath = env_var_map
            .remove(env_vars::SYS_BASEPATH)
            .map(|s| s + "/")
            .ok_or(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingSysBasePath,
            })?;
        let app_basepath = env_var_map
            .remove(env_vars::SERVICE_BASEPATH)
            .map(|s| s + "/")
            .ok_or(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAppBasePath,
            })?;
        let cfg_relpath = env_var_map
            .remove(env_vars::CFG_FILEPATH)
            .ok_or(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingConfigPath,
            })?;
        let api_server = Self::parse_from_file(app_basepath.clone() + &cfg_relpath, limit)?;
        Ok(Self {
            api_server,
            basepath: AppBasepathCfg {
                system: sys_basepath,
                service: app_basepath,
            },
        })
    } // end of fn new

    pub fn parse_from_file(
        filepath: String,
        limit: AppCfgHardLimit,
    ) -> DefaultResult<ApiServerCfg, AppCfgError> {
        let fileobj = File::open(filepath).map_err(|e| AppCfgError {
            detail: Some(e.to_string()),
            code: AppErrorCode::IOerror(e.kind()),
        })?;
        let reader = BufReader::new(fileobj);
        let jsnobj = serde_json::from_reader::<BufReader<File>, ApiServerCfg>(reader).map_err(
            |e| AppCfgError {
                detail: Some(e.to_string()),
                code: AppErrorCode::InvalidJsonFormat,
            },
        )?;
        Self::check_web_listener(&jsnobj.listen)?;
        Self::check_logging(&jsnobj.logging)?;
        Self::check_datastore(&jsnobj.data_store, limit)?;
        Ok(jsnobj)
    }

    fn check_web_listener(obj: &WebApiListenCfg) -> DefaultResult<(), AppCfgError> {
        let mut bad_version = obj
            .api_version
            .split('.')
            .filter(|i| i.parse::<u16>().is_err());
        let mut bad_routes = obj
            .routes
            .iter()
            .filter(|i| i.path.is_empty() || i.handler.is_empty());
        if obj.routes.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoRouteApiServerCfg,
            })
        } else if bad_version.next().is_some() {
            Err(AppCfgError {
                detail: Some("version must be numeric".to_string()),
                code: AppErrorCode::InvalidVersion,
            })
        } else if let Some(badroute) = bad_routes.next() {
            Err(AppCfgError {
                detail: Some(badroute.to_string()),
                code: AppErrorCode::InvalidRouteConfig,
            })
        } else {
            Ok(())
        }
    } // end of fn check_web_listener

    fn check_logging(obj: &AppLoggingCfg) -> DefaultResult<(), AppCfgError> {
        let mut no_hdlr_logger = obj.loggers.iter().filter(|item| item.handlers.is_empty());
        let mut no_path_hdlr = obj.handlers.iter().filter(|item| match &item.destination {
            const_log::Destination::LOCALFS => item.path.is_none(),
            _other => false,
        }); // file-type handlers require the `path` field
        let mut unnamed_hdlr = obj.handlers.iter().filter(|item| item.alias.is_empty());
        let mut unnamed_logger = obj.loggers.iter().filter(|item| item.alias.is_empty());
        if obj.handlers.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoLogHandlerCfg,
            })
        } else if obj.loggers.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoLoggerCfg,
            })
        } else if let Some(alogger) = no_hdlr_logger.next() {
            Err(AppCfgError {
                detail: Some(format!("the logger does not have handler: {}", alogger.alias)),
                code: AppErrorCode::NoHandlerInLoggerCfg,
            })
        } else if unnamed_hdlr.next().is_some() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAliasLogHdlerCfg,
            })
        } else if unnamed_logger.next().is_some() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAliasLoggerCfg,
            })
        } else if let Some(ahdlr) = no_path_hdlr.next() {
            Err(AppCfgError {
                detail: Some(format!("file-type handler does not contain path: {}", ahdlr.alias)),
                code: AppErrorCode::InvalidHandlerLoggerCfg,
            })
        } else {
            let hdlr_alias_map: HashSet<&str> =
                HashSet::from_iter(obj.handlers.iter().map(|i| i.alias.as_str()));
            let mut bad_ref = obj.loggers.iter().filter(|item| {
                item.handlers
                    .iter()
                    .any(|i| !hdlr_alias_map.contains(i.as_str()))
            }); // handler alias in each logger has to be declared
            if let Some(alogger) = bad_ref.next() {
                Err(AppCfgError {
                    detail: Some(format!(
                        "the logger contains invalid handler alias: {}",
                        alogger.alias
                    )),
                    code: AppErrorCode::InvalidHandlerLoggerCfg,
                })
            } else {
                Ok(())
            }
        }
    } // end of fn check_logging

    fn check_datastore(
        obj: &[AppDataStoreCfg],
        limit: AppCfgHardLimit,
    ) -> DefaultResult<(), AppCfgError> {
        if obj.is_empty() {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoDatabaseCfg,
            });
        }
        for item in obj {
            match item {
                AppDataStoreCfg::InMemory(c) => {
                    if c.max_items > limit.nitems_per_inmem_table {
                        return Err(AppCfgError {
                            detail: Some(format!("limit:{}", limit.nitems_per_inmem_table)),
                            code: AppErrorCode::ExceedingMaxLimit,
                        });
                    }
                }
                AppDataStoreCfg::DbServer(c) => {
                    if c.max_conns > limit.num_db_conns {
                        return Err(AppCfgError {
                            detail: Some(format!("limit-conn:{}", limit.num_db_conns)),
                            code: AppErrorCode::ExceedingMaxLimit,
                        });
                    } else if c.idle_timeout_secs > limit.seconds_db_idle {
                        return Err(AppCfgError {
                            detail: Some(format!("limit-idle-time:{}", limit.seconds_db_idle)),
                            code: AppErrorCode::ExceedingMaxLimit,
                        });
                    }
                }
            }
        } // end of loop
        Ok(())
    } // end of fn check_datastore
} // end of impl AppConfig

struct ExpectNonEmptyString {
    min_len: u32,
}

impl Expected for ExpectNonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = format!("minimum string length >= {}", self.min_len);
        formatter.write_str(msg.as_str())
    }
}

fn jsn_deny_empty_string<'de, D>(raw: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(raw)?;
    if s.is_empty() {
        let exp = ExpectNonEmptyString { min_len: 1 };
        Err(DeserializeError::invalid_length(0, &exp))
    } else {
        Ok(s)
    }
}
