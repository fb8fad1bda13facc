//! Colombia provider configuration.

use serde::{Deserialize, Serialize};

use procesal_provider::error::{ProviderError, ProviderResult};

/// Configuration for the Rama Judicial CPNU client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColombiaConfig {
    /// Base URL of the CPNU API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pause between action pages, in milliseconds. The API is rate limited
    /// and has no documented concurrency tolerance.
    #[serde(default = "default_pause_between_pages_ms")]
    pub pause_between_pages_ms: u64,

    /// Safety cap on action pages fetched per process.
    #[serde(default = "default_max_action_pages")]
    pub max_action_pages: u32,
}

fn default_base_url() -> String {
    "https://consultaprocesos.ramajudicial.gov.co:448/api/v2".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pause_between_pages_ms() -> u64 {
    300
}

fn default_max_action_pages() -> u32 {
    50
}

impl Default for ColombiaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            pause_between_pages_ms: default_pause_between_pages_ms(),
            max_action_pages: default_max_action_pages(),
        }
    }
}

impl ColombiaConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ProviderError::InvalidConfiguration {
                message: "base_url must not be empty".to_string(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProviderError::InvalidConfiguration {
                message: format!("base_url must be http(s): {}", self.base_url),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ProviderError::InvalidConfiguration {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.max_action_pages == 0 {
            return Err(ProviderError::InvalidConfiguration {
                message: "max_action_pages must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
