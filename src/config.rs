//! Service configuration.
//!
//! Precedence: CLI > env (`SLEEQC_*`) > config file > defaults. The first config file found
//! among `--config`, `$SLEEQC_CONFIG`, `~/.config/sleeqc.toml` and `./sleeqc.toml` is used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Which inference capability backs the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    None,
    Logistic,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    // logistic model: features are (free_kb, previous_latency_ms, reserved)
    pub mean: [f32; 3],
    pub scale: [f32; 3],
    pub weights: [f32; 3],
    pub bias: f32,
    // rule model
    pub min_free_kb: f32,
    pub max_latency_ms: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Logistic,
            mean: [250.0, 150.0, 0.0],
            scale: [50.0, 100.0, 1.0],
            weights: [2.0, -2.0, 0.0],
            bias: 0.0,
            min_free_kb: 200.0,
            max_latency_ms: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for rolling log files; current directory when unset.
    pub dir: Option<PathBuf>,
    /// error|warn|info|debug|trace
    pub level: String,
    /// Number of rolled files to keep.
    pub retention: usize,
    /// Mirror app logs to stderr.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: None, level: "info".into(), retention: 7, console: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    /// Largest request read in the single receive call.
    pub max_request_bytes: usize,
    /// Delay before accepting again after an accept failure.
    pub accept_retry_ms: u64,
    /// Client-side connect/read timeout. The server itself never times out a peer.
    pub client_timeout_secs: u64,
    pub model: ModelConfig,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            max_request_bytes: 10_000,
            accept_retry_ms: 500,
            client_timeout_secs: 15,
            model: ModelConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Apply `SLEEQC_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, ServiceError> {
            raw.trim().parse::<T>().map_err(|_| ServiceError::Config(format!("{key}={raw} is not valid")))
        }
        if let Some(v) = lookup("SLEEQC_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("SLEEQC_PORT") {
            self.port = parse("SLEEQC_PORT", v)?;
        }
        if let Some(v) = lookup("SLEEQC_MAX_REQUEST_BYTES") {
            self.max_request_bytes = parse("SLEEQC_MAX_REQUEST_BYTES", v)?;
        }
        if let Some(v) = lookup("SLEEQC_ACCEPT_RETRY_MS") {
            self.accept_retry_ms = parse("SLEEQC_ACCEPT_RETRY_MS", v)?;
        }
        if let Some(v) = lookup("SLEEQC_MODEL") {
            self.model.kind = match v.to_ascii_lowercase().as_str() {
                "none" => ModelKind::None,
                "logistic" => ModelKind::Logistic,
                "rule" => ModelKind::Rule,
                other => return Err(ServiceError::Config(format!("unknown model kind {other}"))),
            };
        }
        if let Some(v) = lookup("SLEEQC_LOG_DIR") {
            self.log.dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SLEEQC_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("SLEEQC_LOG_RETENTION") {
            self.log.retention = parse("SLEEQC_LOG_RETENTION", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.max_request_bytes == 0 {
            return Err(ServiceError::Config("max_request_bytes must be > 0".into()));
        }
        if self.model.kind == ModelKind::Logistic {
            crate::decision::LogisticModel::new(
                self.model.mean,
                self.model.scale,
                self.model.weights,
                self.model.bias,
            )
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        }
        Ok(())
    }
}

/// Candidate config files in precedence order.
pub fn find_config_paths(cli_cfg: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = cli_cfg {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("SLEEQC_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        paths.push(PathBuf::from(home).join(".config").join("sleeqc.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("sleeqc.toml"));
    }
    paths
}

/// Load the effective configuration (without CLI flag overrides, which the binary applies).
pub fn load_config(cli_cfg: Option<&Path>) -> Result<ServiceConfig, ServiceError> {
    if let Some(p) = cli_cfg
        && !p.exists()
    {
        return Err(ServiceError::Config(format!("config file {} not found", p.display())));
    }
    let mut cfg = match find_config_paths(cli_cfg).into_iter().find(|p| p.exists()) {
        Some(p) => {
            log::debug!("Loading config from {}", p.display());
            ServiceConfig::from_file(&p)?
        }
        None => ServiceConfig::default(),
    };
    cfg.apply_env_with(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}
