use serde::{Deserialize, Serialize};

/// Configuration for the users module (`modules.users` in the app config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersConfig {
    /// Create the `users` table (and its index/trigger) on startup when missing.
    #[serde(default = "default_bootstrap_schema")]
    pub bootstrap_schema: bool,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            bootstrap_schema: default_bootstrap_schema(),
        }
    }
}

fn default_bootstrap_schema() -> bool {
    true
}
