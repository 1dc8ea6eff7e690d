use anyhow::{Context, Result};
use serde::Deserialize;
use web3_state_core::ChainIdInput;
use web3_state_logger::LogConfig;

/// The top-level configuration of a simulation run.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SimConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Replayed in order after the initial activation.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// What the simulated wallet reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectorConfig {
    pub chain_id: ChainIdInput,
    pub account: String,
    /// Simulates a wallet that is connected but exposes no account.
    pub no_account: bool,
    pub provider: String,
    /// Empty means every chain is accepted.
    pub supported_chain_ids: Vec<u64>,
    /// When false, the handshake returns nothing and the store falls back to
    /// the accessor calls.
    pub report_on_handshake: bool,
    /// Makes the handshake fail with this message.
    pub fail_handshake: Option<String>,
}

/// How activation failures are reported.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ActivationConfig {
    pub throw_errors: bool,
}

/// A single scripted event.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(
    tag = "action",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum Step {
    /// The wallet reports a change; absent fields are left untouched.
    Update {
        chain_id: Option<ChainIdInput>,
        account: Option<String>,
        provider: Option<String>,
        /// Report an explicit "no account".
        #[serde(default)]
        no_account: bool,
    },
    /// The wallet raises an error.
    Error { message: String },
    /// The wallet ends the session on its own.
    Deactivate,
    /// The caller ends the session.
    Disconnect,
    /// The caller activates the connector again.
    Activate,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            chain_id: ChainIdInput::Number(1),
            account: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            no_account: false,
            provider: "sim-provider".to_string(),
            supported_chain_ids: Vec::new(),
            report_on_handshake: true,
            fail_handshake: None,
        }
    }
}

/// Loads a scenario from a TOML file, with `WEB3_STATE__*` environment
/// overrides (e.g. `WEB3_STATE__LOG__LEVEL=debug`).
///
/// Environment keys are matched verbatim after lowercasing, so only
/// single-word keys such as `log.level` or `log.format` can be overridden;
/// kebab-case keys like `connector.chain-id` have to come from the file.
pub fn load_config(path: &str) -> Result<SimConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("WEB3_STATE").separator("__"));

    let settings: SimConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}

/// Parses a scenario from an in-memory TOML document.
pub fn parse_config(toml: &str) -> Result<SimConfig> {
    config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()
        .context("Failed to parse configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
