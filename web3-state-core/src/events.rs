//! # Connector Events
//!
//! Connectors notify the store about post-activation changes through three
//! event kinds: an [`ConnectorEvent::Update`] carrying a partial
//! [`ConnectorUpdate`], an [`ConnectorEvent::Error`], and a
//! [`ConnectorEvent::Deactivate`] when the wallet ends the session on its own.
//!
//! [`EventEmitter`] is a small listener registry a connector can embed to
//! implement [`crate::connector::Connector::subscribe`]. Every registration
//! hands back a [`Subscription`], which removes the listener when it is
//! disposed or dropped.

use crate::{errors::Web3Error, normalize::ChainIdInput};
use dashmap::DashMap;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

/// The fields a connector reports on activation or on a later update.
///
/// Every field is optional: a missing field means "not reported". `account`
/// separates "not reported" (`None`) from an explicit "no account"
/// (`Some(None)`).
#[derive(Debug, Clone)]
pub struct ConnectorUpdate<P> {
    pub provider: Option<P>,
    pub chain_id: Option<ChainIdInput>,
    pub account: Option<Option<String>>,
}

impl<P> Default for ConnectorUpdate<P> {
    fn default() -> Self {
        Self {
            provider: None,
            chain_id: None,
            account: None,
        }
    }
}

impl<P> ConnectorUpdate<P> {
    pub fn with_provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<ChainIdInput>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(Some(account.into()));
        self
    }

    /// Reports that the connector is live but exposes no account.
    pub fn without_account(mut self) -> Self {
        self.account = Some(None);
        self
    }
}

/// A lifecycle notification emitted by a connector.
#[derive(Debug, Clone)]
pub enum ConnectorEvent<P> {
    Update(ConnectorUpdate<P>),
    Error(Web3Error),
    Deactivate,
}

/// A callback registered on a connector.
pub type Listener<P> = Arc<dyn Fn(ConnectorEvent<P>) + Send + Sync>;

type Registry<P> = DashMap<u64, Listener<P>>;

/// A thread-safe listener registry that dispatches [`ConnectorEvent`]s.
pub struct EventEmitter<P> {
    listeners: Arc<Registry<P>>,
    next_id: AtomicU64,
}

impl<P: Clone + Send + Sync + 'static> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<P: Clone + Send + Sync + 'static> EventEmitter<P> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers `listener` and returns the disposer that removes it again.
    pub fn subscribe(&self, listener: Listener<P>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        tracing::debug!("Registered connector listener #{}", id);

        let registry: Weak<Registry<P>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                if registry.remove(&id).is_some() {
                    tracing::debug!("Removed connector listener #{}", id);
                }
            }
        })
    }

    /// Delivers `event` to every listener registered at the time of the call.
    ///
    /// The registry is snapshotted before dispatch, so listeners are free to
    /// dispose subscriptions (their own included) while they run.
    pub fn emit(&self, event: ConnectorEvent<P>) {
        let targets: Vec<Listener<P>> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for listener in targets {
            listener(event.clone());
        }
    }

    pub fn emit_update(&self, update: ConnectorUpdate<P>) {
        self.emit(ConnectorEvent::Update(update));
    }

    pub fn emit_error(&self, error: Web3Error) {
        self.emit(ConnectorEvent::Error(error));
    }

    pub fn emit_deactivate(&self) {
        self.emit(ConnectorEvent::Deactivate);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Disposer for a listener registration.
///
/// Calling [`Subscription::dispose`] or dropping the value unregisters the
/// listener. Disposal runs at most once.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to undo, for connectors that never emit.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    pub fn dispose(mut self) {
        self.run_dispose();
    }

    fn run_dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.dispose.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_dispose();
    }
}
