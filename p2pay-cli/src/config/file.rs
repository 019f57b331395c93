//! TOML file configuration structures.
//!
//! These structs directly map to the `p2pay.toml` file format. Every
//! section and key is optional.

use serde::Deserialize;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub account: AccountConfig,
}

/// Backend used when the file does not name one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5050";

/// Wallet backend connection.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Root URL of the backend API. Parsed and checked by the loader.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Deadline for each backend request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Quiet period after the last amount change before a quote is fetched.
    #[serde(default = "default_quote_debounce_ms")]
    pub quote_debounce_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            quote_debounce_ms: default_quote_debounce_ms(),
        }
    }
}

fn default_quote_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountConfig {
    /// User id issued by the identity provider.
    #[serde(default)]
    pub uid: Option<String>,
}
