use crate::config::{ConnectorConfig, SimConfig, Step};
use anyhow::Result;
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use web3_state_core::{
    events::{Listener, Subscription},
    ActivateOptions, ChainIdInput, Connector, ConnectorUpdate, EventEmitter, SharedConnector,
    Web3Context, Web3Error,
};

/// An in-process wallet driven by the scenario's configuration.
pub struct SimulatedConnector {
    config: ConnectorConfig,
    emitter: EventEmitter<String>,
}

impl SimulatedConnector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            emitter: EventEmitter::new(),
        }
    }

    pub fn emitter(&self) -> &EventEmitter<String> {
        &self.emitter
    }

    fn account(&self) -> Option<String> {
        (!self.config.no_account).then(|| self.config.account.clone())
    }
}

#[async_trait]
impl Connector for SimulatedConnector {
    type Provider = String;

    async fn activate(&self) -> Result<ConnectorUpdate<String>, Web3Error> {
        if let Some(message) = &self.config.fail_handshake {
            return Err(Web3Error::msg(message.clone()));
        }
        if !self.config.report_on_handshake {
            return Ok(ConnectorUpdate::default());
        }
        let update = ConnectorUpdate::default()
            .with_provider(self.config.provider.clone())
            .with_chain_id(self.config.chain_id.clone());
        Ok(match self.account() {
            Some(account) => update.with_account(account),
            None => update.without_account(),
        })
    }

    fn deactivate(&self) {
        tracing::debug!("Simulated wallet closing its session");
        self.emitter.emit_deactivate();
    }

    async fn get_provider(&self) -> Result<String, Web3Error> {
        Ok(self.config.provider.clone())
    }

    async fn get_chain_id(&self) -> Result<ChainIdInput, Web3Error> {
        Ok(self.config.chain_id.clone())
    }

    async fn get_account(&self) -> Result<Option<String>, Web3Error> {
        Ok(self.account())
    }

    fn supported_chain_ids(&self) -> Option<&[u64]> {
        Some(self.config.supported_chain_ids.as_slice())
    }

    fn subscribe(&self, listener: Listener<String>) -> Subscription {
        self.emitter.subscribe(listener)
    }
}

/// The store's state after one scenario step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub active: bool,
    pub chain_id: Option<u64>,
    /// `None` when unknown, `Some(None)` when the wallet exposes no account.
    pub account: Option<Option<String>>,
    pub error: Option<String>,
    pub library: Option<String>,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: active={} chain_id={:?} account={:?} error={:?} library={:?}",
            self.step, self.active, self.chain_id, self.account, self.error, self.library
        )
    }
}

fn snapshot(step: impl Into<String>, ctx: &Web3Context<String, String>) -> StepReport {
    let state = ctx.state();
    StepReport {
        step: step.into(),
        active: state.is_active(),
        chain_id: state.chain_id(),
        account: state.account().map(|account| account.map(str::to_string)),
        error: state.error().map(ToString::to_string),
        library: state.library().cloned(),
    }
}

fn label(step: &Step) -> &'static str {
    match step {
        Step::Update { .. } => "update",
        Step::Error { .. } => "error",
        Step::Deactivate => "deactivate",
        Step::Disconnect => "disconnect",
        Step::Activate => "activate",
    }
}

fn options(config: &SimConfig) -> ActivateOptions {
    if config.activation.throw_errors {
        ActivateOptions::default().throw_errors()
    } else {
        ActivateOptions::default()
    }
}

async fn activate(
    ctx: &Web3Context<String, String>,
    connector: &Arc<SimulatedConnector>,
    config: &SimConfig,
) {
    let shared: SharedConnector<String> = connector.clone();
    if let Err(e) = ctx.activate_with(shared, options(config)).await {
        tracing::warn!("Activation rejected: {}", e);
    }
}

/// Activates a simulated wallet, replays `config.steps` against it and
/// returns the state observed after the activation and after every step.
pub async fn run_scenario(config: &SimConfig) -> Result<Vec<StepReport>> {
    let ctx = Web3Context::with_library_factory(|provider: &String, _connector, account| {
        format!("{}:{}", provider, account.unwrap_or("none"))
    });
    let connector = Arc::new(SimulatedConnector::new(config.connector.clone()));

    activate(&ctx, &connector, config).await;
    let mut reports = vec![snapshot("activate", &ctx)];
    tracing::info!("{}", reports[0]);

    for step in &config.steps {
        match step {
            Step::Update {
                chain_id,
                account,
                provider,
                no_account,
            } => {
                let mut update = ConnectorUpdate::default();
                if let Some(chain_id) = chain_id {
                    update = update.with_chain_id(chain_id.clone());
                }
                if let Some(provider) = provider {
                    update = update.with_provider(provider.clone());
                }
                if *no_account {
                    update = update.without_account();
                } else if let Some(account) = account {
                    update = update.with_account(account.clone());
                }
                connector.emitter().emit_update(update);
            }
            Step::Error { message } => {
                connector.emitter().emit_error(Web3Error::msg(message.clone()))
            }
            Step::Deactivate => connector.emitter().emit_deactivate(),
            Step::Disconnect => ctx.deactivate(),
            Step::Activate => activate(&ctx, &connector, config).await,
        }

        let report = snapshot(label(step), &ctx);
        tracing::info!("{}", report);
        reports.push(report);
    }

    ctx.release_listeners();
    Ok(reports)
}
