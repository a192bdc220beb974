use serde::{Deserialize, Serialize};

/// HTTP host configuration (`modules.api_ingress`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// `host:port`; falls back to `server.host` / `server.port` when unset.
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub enable_docs: bool,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: false,
            cors_enabled: default_true(),
            body_limit_mb: default_body_limit_mb(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_body_limit_mb() -> usize {
    16
}

fn default_request_timeout_secs() -> u64 {
    30
}
