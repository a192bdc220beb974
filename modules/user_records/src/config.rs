use serde::{Deserialize, Serialize};

/// Configuration for the user_records module (`modules.user_records`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecordsConfig {
    /// Screenshot directory, relative to the server home dir unless absolute.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    #[serde(default = "default_max_screenshot_bytes")]
    pub max_screenshot_bytes: usize,
    #[serde(default = "default_max_user_id_length")]
    pub max_user_id_length: usize,
    #[serde(default)]
    pub push: PushConfig,
}

impl Default for UserRecordsConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            max_screenshot_bytes: default_max_screenshot_bytes(),
            max_user_id_length: default_max_user_id_length(),
            push: PushConfig::default(),
        }
    }
}

/// Web Push delivery settings.
///
/// Without `gateway_url` notifications are only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Served to browsers as the application server key.
    #[serde(default)]
    pub vapid_public_key: Option<String>,
    #[serde(default = "default_vapid_subject")]
    pub vapid_subject: String,
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            vapid_public_key: None,
            vapid_subject: default_vapid_subject(),
            timeout_ms: default_push_timeout_ms(),
        }
    }
}

fn default_assets_dir() -> String {
    "screenshots".to_string()
}

fn default_max_screenshot_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_user_id_length() -> usize {
    256
}

fn default_vapid_subject() -> String {
    "mailto:admin@sensus-app.com".to_string()
}

fn default_push_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let cfg: UserRecordsConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.assets_dir, "screenshots");
        assert_eq!(cfg.max_screenshot_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.push.vapid_subject, "mailto:admin@sensus-app.com");
        assert!(cfg.push.gateway_url.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<UserRecordsConfig, _> =
            serde_json::from_value(serde_json::json!({ "assets": "x" }));
        assert!(res.is_err());
    }
}
