use std::path::{Path, PathBuf};

use runtime::paths::resolve_under;
use runtime::ServerConfig;

pub const DEFAULT_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// HTTP host settings, derived from the `server` section of the app config.
#[derive(Debug, Clone)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    pub timeout_sec: u64,
    pub cors_enabled: bool,
    /// Served for unmatched GET paths when it exists.
    pub static_dir: Option<PathBuf>,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8090".to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            cors_enabled: false,
            static_dir: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ApiIngressConfig {
    /// Relative `static_dir` resolves against `home_dir`.
    pub fn from_server(server: &ServerConfig, home_dir: &Path) -> Self {
        Self {
            bind_addr: format!("{}:{}", server.host, server.port),
            timeout_sec: match server.timeout_sec {
                0 => DEFAULT_TIMEOUT_SEC,
                n => n,
            },
            cors_enabled: server.cors_enabled,
            static_dir: server
                .static_dir
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| resolve_under(s, home_dir)),
            body_limit_bytes: match server.body_limit_bytes {
                0 => DEFAULT_BODY_LIMIT_BYTES,
                n => n,
            },
        }
    }
}
