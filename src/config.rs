use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Directory of `<preset>.json` template files; the builtin template is
    /// used when unset.
    pub template_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_string("JB_BIND_ADDR", "127.0.0.1:18085")
            .parse::<SocketAddr>()
            .context("JB_BIND_ADDR must be a valid host:port")?;

        let template_dir = std::env::var("JB_TEMPLATE_DIR").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            template_dir,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
