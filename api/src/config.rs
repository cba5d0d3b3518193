use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppCfg {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_model_path() -> PathBuf {
    PathBuf::from("demand_predictor_model.json")
}
fn default_log_filter() -> String {
    "pricing_api=info,tower_http=info".to_string()
}

impl AppCfg {
    /// Optional file at `path`, then `PRICING_*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(path).required(false))
                .add_source(Environment::with_prefix("PRICING").try_parsing(true)),
        )
        .with_context(|| format!("loading config from {path}"))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let cfg = builder.build()?.try_deserialize::<AppCfg>()?;
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
