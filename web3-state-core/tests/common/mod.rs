//! A scriptable in-process connector for exercising `Web3Context` without a
//! wallet.
//!
//! Tests configure what the handshake and the accessors return, then drive
//! live events through the embedded `EventEmitter` (`emitter()`), and finally
//! inspect `deactivations()` / `accessor_calls()` for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::Notify;
use web3_state_core::{
    events::{Listener, Subscription},
    ChainIdInput, Connector, ConnectorUpdate, EventEmitter, SharedConnector, Web3Context,
    Web3Error,
};

pub const ACCOUNT_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const ACCOUNT_A_LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const ACCOUNT_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
pub const ACCOUNT_B_LOWER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";

pub type Provider = String;
pub type Library = String;

pub struct MockConnector {
    handshake: Result<ConnectorUpdate<Provider>, Web3Error>,
    chain_id: ChainIdInput,
    account: Option<String>,
    provider: Provider,
    supported: Option<Vec<u64>>,
    gate: Option<Arc<Notify>>,
    rendezvous: Option<Arc<Notify>>,
    emit_on_deactivate: AtomicBool,
    emitter: EventEmitter<Provider>,
    deactivations: AtomicUsize,
    accessor_calls: AtomicUsize,
}

impl MockConnector {
    /// A connector whose handshake reports chain 1, `ACCOUNT_A` and `provider-1`.
    pub fn new() -> Self {
        Self {
            handshake: Ok(ConnectorUpdate::default()
                .with_chain_id(1u64)
                .with_account(ACCOUNT_A)
                .with_provider("provider-1".to_string())),
            chain_id: ChainIdInput::Number(1),
            account: Some(ACCOUNT_A.to_string()),
            provider: "provider-1".to_string(),
            supported: None,
            gate: None,
            rendezvous: None,
            emit_on_deactivate: AtomicBool::new(false),
            emitter: EventEmitter::new(),
            deactivations: AtomicUsize::new(0),
            accessor_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_handshake(mut self, update: ConnectorUpdate<Provider>) -> Self {
        self.handshake = Ok(update);
        self
    }

    pub fn failing_with(mut self, err: Web3Error) -> Self {
        self.handshake = Err(err);
        self
    }

    /// Values returned by `get_chain_id`, `get_account` and `get_provider`.
    pub fn with_accessors(
        mut self,
        chain_id: impl Into<ChainIdInput>,
        account: Option<&str>,
        provider: &str,
    ) -> Self {
        self.chain_id = chain_id.into();
        self.account = account.map(str::to_string);
        self.provider = provider.to_string();
        self
    }

    pub fn with_supported(mut self, supported: &[u64]) -> Self {
        self.supported = Some(supported.to_vec());
        self
    }

    /// Blocks the handshake until the returned `Notify` fires.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Makes `get_chain_id` wait until `get_account` has been called, so the
    /// accessors only complete when they are polled together.
    pub fn with_accessor_rendezvous(mut self) -> Self {
        self.rendezvous = Some(Arc::new(Notify::new()));
        self
    }

    /// Makes `deactivate()` emit a deactivate event, like real wallets do.
    pub fn emitting_on_deactivate(self) -> Self {
        self.emit_on_deactivate.store(true, Ordering::SeqCst);
        self
    }

    pub fn emitter(&self) -> &EventEmitter<Provider> {
        &self.emitter
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    pub fn accessor_calls(&self) -> usize {
        self.accessor_calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Provider = Provider;

    async fn activate(&self) -> Result<ConnectorUpdate<Provider>, Web3Error> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.handshake.clone()
    }

    fn deactivate(&self) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        if self.emit_on_deactivate.load(Ordering::SeqCst) {
            self.emitter.emit_deactivate();
        }
    }

    async fn get_provider(&self) -> Result<Provider, Web3Error> {
        self.accessor_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.provider.clone())
    }

    async fn get_chain_id(&self) -> Result<ChainIdInput, Web3Error> {
        self.accessor_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rendezvous) = &self.rendezvous {
            rendezvous.notified().await;
        }
        Ok(self.chain_id.clone())
    }

    async fn get_account(&self) -> Result<Option<String>, Web3Error> {
        self.accessor_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rendezvous) = &self.rendezvous {
            rendezvous.notify_waiters();
        }
        Ok(self.account.clone())
    }

    fn supported_chain_ids(&self) -> Option<&[u64]> {
        self.supported.as_deref()
    }

    fn subscribe(&self, listener: Listener<Provider>) -> Subscription {
        self.emitter.subscribe(listener)
    }
}

/// Erases the concrete type the way callers hand connectors to the store.
pub fn erase(connector: &Arc<MockConnector>) -> SharedConnector<Provider> {
    connector.clone()
}

/// A context whose library is `lib:<provider>:<account>`.
pub fn context() -> Web3Context<Provider, Library> {
    Web3Context::with_library_factory(|provider: &Provider, _connector, account| {
        format!("lib:{}:{}", provider, account.unwrap_or("none"))
    })
}
