use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// FIBOS mainnet chain id
pub const FIBOS_MAINNET_CHAIN_ID: &str =
    "6aa7bd33b6b45192465afa3553dedb531acaaff8928cf64b70bd4c5e49b7ec6a";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Chain id the node must report before a claim is signed
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    /// nodeos HTTP endpoint (e.g., "http://127.0.0.1:8870")
    pub http_endpoint: String,
    /// Producer account that claims its rewards
    pub account: String,
    /// Permission used to authorize `claimrewards`
    #[serde(default = "default_permission")]
    pub permission: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_chain_id() -> String {
    FIBOS_MAINNET_CHAIN_ID.to_string()
}

fn default_permission() -> String {
    "active".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

/// keosd-compatible wallet that holds the signing key
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Wallet daemon base URL
    #[serde(default = "default_wallet_url")]
    pub url: String,
    /// Public key the wallet signs with
    pub public_key: String,
}

fn default_wallet_url() -> String {
    "http://127.0.0.1:8900".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files (console only when unset)
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Self::builder_with_defaults()?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("AUTOCLAIM_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (AUTOCLAIM_CHAIN__ACCOUNT, etc.)
            .add_source(
                Environment::with_prefix("AUTOCLAIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Parse configuration from an in-memory TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::builder_with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder()
            .set_default("chain.chain_id", FIBOS_MAINNET_CHAIN_ID)?
            .set_default("chain.permission", "active")?
            .set_default("chain.request_timeout_secs", 10)?
            .set_default("wallet.url", "http://127.0.0.1:8900")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !is_valid_account_name(&self.chain.account) {
            errors.push(format!(
                "chain.account '{}' is not a valid account name (1-12 chars of a-z, 1-5, '.')",
                self.chain.account
            ));
        }

        if self.chain.permission.trim().is_empty() {
            errors.push("chain.permission must not be empty".to_string());
        }

        if self.chain.chain_id.len() != 64 || hex::decode(&self.chain.chain_id).is_err() {
            errors.push("chain.chain_id must be 32 bytes of hex".to_string());
        }

        if let Err(e) = Url::parse(&self.chain.http_endpoint) {
            errors.push(format!("chain.http_endpoint is not a valid URL: {e}"));
        }

        if self.chain.request_timeout_secs == 0 {
            errors.push("chain.request_timeout_secs must be positive".to_string());
        }

        if let Err(e) = Url::parse(&self.wallet.url) {
            errors.push(format!("wallet.url is not a valid URL: {e}"));
        }

        if self.wallet.public_key.trim().is_empty() {
            errors.push("wallet.public_key must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Account names are at most 12 characters of `a-z`, `1-5` and `.`
pub fn is_valid_account_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 12
        && name
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'1'..=b'5' | b'.'))
}
