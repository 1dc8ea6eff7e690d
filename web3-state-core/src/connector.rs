//! # Connector Contract
//!
//! A [`Connector`] wraps a wallet or session provider (an injected browser
//! wallet, a WalletConnect bridge, a hardware signer, ...). The store only
//! relies on this trait: it never talks to a wallet protocol or an RPC
//! transport directly.

use crate::{
    errors::Web3Error,
    events::{ConnectorUpdate, Listener, Subscription},
    normalize::ChainIdInput,
};
use async_trait::async_trait;
use std::sync::Arc;

/// The asynchronous contract every wallet connector fulfils.
///
/// `Provider` is the opaque handle the connector hands out for further
/// requests; the store passes it through untouched.
#[async_trait]
pub trait Connector: Send + Sync {
    type Provider: Clone + Send + Sync + 'static;

    /// Runs the connect handshake. Fields the handshake leaves out are
    /// fetched afterwards through the accessor methods.
    async fn activate(&self) -> Result<ConnectorUpdate<Self::Provider>, Web3Error>;

    /// Tears the session down. Connectors may emit a deactivate event from
    /// inside this call.
    fn deactivate(&self);

    async fn get_provider(&self) -> Result<Self::Provider, Web3Error>;

    async fn get_chain_id(&self) -> Result<ChainIdInput, Web3Error>;

    /// `Ok(None)` means the wallet is connected but exposes no account.
    async fn get_account(&self) -> Result<Option<String>, Web3Error>;

    /// The chains this connector accepts. `None` or an empty slice means any.
    fn supported_chain_ids(&self) -> Option<&[u64]> {
        None
    }

    /// Registers a listener for update, error and deactivate events.
    fn subscribe(&self, listener: Listener<Self::Provider>) -> Subscription;
}

/// A shared, type-erased connector handle as stored in the connection state.
pub type SharedConnector<P> = Arc<dyn Connector<Provider = P>>;
