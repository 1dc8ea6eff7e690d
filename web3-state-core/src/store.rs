//! # Connection State Store
//!
//! [`Web3Context`] holds the active connector and everything derived from it
//! (chain id, account, provider, error, `active`, `library`) and keeps that
//! state in sync with the connector's lifecycle events.
//!
//! ## Lifecycle
//!
//! `Disconnected → Activating → Connected → {Connected, Disconnected}`
//!
//! - [`Web3Context::activate`] runs the connector handshake, resolves and
//!   validates the reported fields, commits them and registers the store's
//!   listener on the connector.
//! - While connected, the connector drives the store through
//!   [`Web3Context::on_update`], [`Web3Context::on_error`] and
//!   [`Web3Context::on_deactivate`].
//! - [`Web3Context::deactivate`] ends the session from the caller's side.
//!
//! Every state change is a single commit on a `tokio::sync::watch` channel:
//! the fields are written, `library` is refreshed, and observers obtained via
//! [`Web3Context::subscribe`] are notified, in that order and without
//! interruption.
//!
//! No lock is held while the store awaits the connector or calls back into it,
//! so connectors may emit events from inside `deactivate()`. Concurrent
//! `activate` calls are not serialized: the last one to commit wins.

use crate::{
    connector::{Connector, SharedConnector},
    errors::Web3Error,
    events::{ConnectorEvent, ConnectorUpdate, Listener, Subscription},
    normalize::{ensure_supported, normalize_account, normalize_chain_id},
    state::{ConnectionState, LibraryFactory},
};
use parking_lot::{Mutex, RwLock};
use std::{fmt, sync::Arc};
use tokio::sync::watch;

/// Callback invoked with errors raised for a session.
pub type ErrorCallback = Arc<dyn Fn(&Web3Error) + Send + Sync>;

/// How [`Web3Context::activate_with`] reports a failed activation.
#[derive(Clone, Default)]
pub struct ActivateOptions {
    /// Receives the error instead of it being stored silently. Once the
    /// session is up, it also receives errors from live updates.
    pub on_error: Option<ErrorCallback>,
    /// Return the error to the caller. Takes precedence over `on_error`.
    pub throw_errors: bool,
}

impl ActivateOptions {
    pub fn on_error(mut self, callback: impl Fn(&Web3Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn throw_errors(mut self) -> Self {
        self.throw_errors = true;
        self
    }
}

impl fmt::Debug for ActivateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivateOptions")
            .field("on_error", &self.on_error.is_some())
            .field("throw_errors", &self.throw_errors)
            .finish()
    }
}

/// Per-session bookkeeping that is not part of the observable state.
#[derive(Default)]
struct Session {
    on_error: Option<ErrorCallback>,
    subscription: Option<Subscription>,
}

struct Inner<P, L> {
    state: watch::Sender<ConnectionState<P, L>>,
    factory: RwLock<Option<LibraryFactory<P, L>>>,
    session: Mutex<Session>,
}

/// The reactive connection store. Cloning yields another handle to the same
/// state.
pub struct Web3Context<P, L> {
    inner: Arc<Inner<P, L>>,
}

impl<P, L> Clone for Web3Context<P, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Fields resolved from a successful handshake.
struct Resolved<P> {
    provider: P,
    chain_id: u64,
    account: Option<String>,
}

impl<P, L> Default for Web3Context<P, L>
where
    P: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, L> Web3Context<P, L>
where
    P: Clone + Send + Sync + 'static,
    L: Clone + Send + Sync + 'static,
{
    /// Creates a disconnected context with no library factory.
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                factory: RwLock::new(None),
                session: Mutex::new(Session::default()),
            }),
        }
    }

    pub fn with_library_factory(
        factory: impl Fn(&P, &SharedConnector<P>, Option<&str>) -> L + Send + Sync + 'static,
    ) -> Self {
        let ctx = Self::new();
        ctx.set_library_factory(factory);
        ctx
    }

    /// Replaces the factory used to derive `library`. The new factory is used
    /// from the next recompute on; the current `library` is kept until then.
    pub fn set_library_factory(
        &self,
        factory: impl Fn(&P, &SharedConnector<P>, Option<&str>) -> L + Send + Sync + 'static,
    ) {
        *self.inner.factory.write() = Some(Arc::new(factory));
    }

    // --- Observation ---

    pub fn state(&self) -> ConnectionState<P, L> {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that is notified after every committed change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState<P, L>> {
        self.inner.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_active()
    }

    pub fn connector(&self) -> Option<SharedConnector<P>> {
        self.inner.state.borrow().connector.clone()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.inner.state.borrow().chain_id
    }

    pub fn account(&self) -> Option<Option<String>> {
        self.inner.state.borrow().account.clone()
    }

    pub fn provider(&self) -> Option<P> {
        self.inner.state.borrow().provider.clone()
    }

    pub fn error(&self) -> Option<Web3Error> {
        self.inner.state.borrow().error.clone()
    }

    pub fn library(&self) -> Option<L> {
        self.inner.state.borrow().library.clone()
    }

    // --- Caller entry points ---

    /// Activates `connector`, storing any failure silently.
    pub async fn activate(&self, connector: SharedConnector<P>) {
        // Without `throw_errors` the call never returns `Err`.
        let _ = self.activate_with(connector, ActivateOptions::default()).await;
    }

    /// Activates `connector`.
    ///
    /// On failure the error is recorded in the state and then routed to
    /// exactly one place: returned as `Err` when `throw_errors` is set,
    /// otherwise handed to `on_error` if present, otherwise left in the state.
    /// In the first two cases a connector whose handshake already succeeded is
    /// deactivated again.
    pub async fn activate_with(
        &self,
        connector: SharedConnector<P>,
        options: ActivateOptions,
    ) -> Result<(), Web3Error> {
        tracing::debug!("Activating connector...");
        let mut started = false;
        let outcome = match connector.activate().await {
            Ok(update) => {
                started = true;
                resolve_activation(connector.as_ref(), update).await
            }
            Err(e) => Err(e),
        };

        let resolved = match outcome {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!("Connector activation failed: {}", err);
                self.commit(|state| state.error = Some(err.clone()));

                if options.throw_errors {
                    if started {
                        connector.deactivate();
                    }
                    return Err(err);
                }
                if let Some(callback) = options.on_error {
                    if started {
                        connector.deactivate();
                    }
                    callback(&err);
                }
                return Ok(());
            }
        };

        let Resolved {
            provider,
            chain_id,
            account,
        } = resolved;
        tracing::info!(
            "Connector activated: chain_id={} account={:?}",
            chain_id,
            account
        );
        self.commit(|state| {
            state.connector = Some(connector.clone());
            state.chain_id = Some(chain_id);
            state.set_provider(Some(provider));
            state.account = Some(account);
            state.error = None;
        });

        let subscription = connector.subscribe(self.listener());
        let previous = {
            let mut session = self.inner.session.lock();
            session.on_error = options.on_error;
            session.subscription.replace(subscription)
        };
        // Disposed outside the session lock.
        drop(previous);

        Ok(())
    }

    /// Asks the active connector to end its session, then clears the local
    /// state. A no-op when nothing is connected.
    pub fn deactivate(&self) {
        if let Some(connector) = self.connector() {
            tracing::info!("Deactivating connector");
            connector.deactivate();
        }
        self.reset();
    }

    /// Disposes the store's listener on the tracked connector without
    /// touching the state, e.g. when the owning view goes away.
    pub fn release_listeners(&self) {
        let subscription = self.inner.session.lock().subscription.take();
        if let Some(subscription) = subscription {
            tracing::debug!("Releasing connector listeners");
            subscription.dispose();
        }
    }

    // --- Connector event handlers ---

    /// Applies a partial update reported by the connector.
    ///
    /// An update arriving while an error is recorded only clears that error.
    /// Errors found in the update (bad chain id, unsupported chain, bad
    /// account) go to the session callback if there is one, else to
    /// [`Web3Context::on_error`]; they are never returned.
    pub fn on_update(&self, update: ConnectorUpdate<P>) {
        if self.inner.state.borrow().error.is_some() {
            tracing::debug!("Update received while an error is recorded; clearing error");
            self.commit(|state| state.error = None);
            return;
        }

        let Some(connector) = self.connector() else {
            tracing::debug!("Update received without an active connector");
            self.reset();
            return;
        };

        let ConnectorUpdate {
            provider,
            chain_id,
            account,
        } = update;

        let validated = chain_id
            .map(normalize_chain_id)
            .transpose()
            .and_then(|chain_id| {
                if let Some(id) = chain_id {
                    ensure_supported(id, connector.supported_chain_ids())?;
                }
                let account = account
                    .map(|a| a.as_deref().map(normalize_account).transpose())
                    .transpose()?;
                Ok((chain_id, account))
            });

        match validated {
            Ok((chain_id, account)) => {
                tracing::debug!(
                    "Connector update: chain_id={:?} account={:?} provider={}",
                    chain_id,
                    account,
                    provider.is_some()
                );
                self.commit(|state| {
                    if let Some(id) = chain_id {
                        state.chain_id = Some(id);
                    }
                    if let Some(provider) = provider {
                        state.set_provider(Some(provider));
                    }
                    if let Some(account) = account {
                        state.account = Some(account);
                    }
                });
            }
            Err(err) => {
                tracing::warn!("Rejected connector update: {}", err);
                let callback = self.inner.session.lock().on_error.clone();
                match callback {
                    Some(callback) => callback(&err),
                    None => self.on_error(err),
                }
            }
        }
    }

    /// Records `err`, notifies the session callback, disconnects the
    /// connector and clears the local state.
    pub fn on_error(&self, err: Web3Error) {
        tracing::warn!("Connector error: {}", err);
        self.commit(|state| state.error = Some(err.clone()));

        let callback = self.inner.session.lock().on_error.clone();
        if let Some(callback) = callback {
            callback(&err);
        }

        if let Some(connector) = self.connector() {
            connector.deactivate();
        }
        self.reset();
    }

    /// The connector ended the session on its own (e.g. the wallet was
    /// locked). Clears the local state only.
    pub fn on_deactivate(&self) {
        tracing::info!("Connector deactivated");
        self.reset();
    }

    // --- Internals ---

    fn reset(&self) {
        let subscription = self.inner.session.lock().subscription.take();
        drop(subscription);
        self.commit(ConnectionState::reset);
    }

    /// Applies one atomic change, refreshes `library` and notifies observers.
    fn commit(&self, mutate: impl FnOnce(&mut ConnectionState<P, L>)) {
        let factory = self.inner.factory.read().clone();
        self.inner
            .state
            .send_modify(|state| state.apply(factory.as_ref(), mutate));
    }

    /// The store's connector listener. It holds the context weakly so that a
    /// connector outliving the context does not keep it alive.
    fn listener(&self) -> Listener<P> {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |event: ConnectorEvent<P>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let ctx = Web3Context { inner };
            match event {
                ConnectorEvent::Update(update) => ctx.on_update(update),
                ConnectorEvent::Error(err) => ctx.on_error(err),
                ConnectorEvent::Deactivate => ctx.on_deactivate(),
            }
        })
    }
}

impl<P, L> fmt::Debug for Web3Context<P, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Context")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Completes a handshake result: missing fields are fetched concurrently from
/// the connector, then the chain id and account are normalized and the chain
/// is checked against the connector's allowlist.
async fn resolve_activation<P>(
    connector: &dyn Connector<Provider = P>,
    update: ConnectorUpdate<P>,
) -> Result<Resolved<P>, Web3Error>
where
    P: Clone + Send + Sync + 'static,
{
    let ConnectorUpdate {
        provider,
        chain_id,
        account,
    } = update;

    let (provider, chain_id, account) = futures::try_join!(
        async {
            match provider {
                Some(provider) => Ok(provider),
                None => connector.get_provider().await,
            }
        },
        async {
            match chain_id {
                Some(chain_id) => Ok(chain_id),
                None => connector.get_chain_id().await,
            }
        },
        async {
            match account {
                Some(account) => Ok(account),
                None => connector.get_account().await,
            }
        },
    )?;

    let chain_id = normalize_chain_id(chain_id)?;
    ensure_supported(chain_id, connector.supported_chain_ids())?;
    let account = account.as_deref().map(normalize_account).transpose()?;

    Ok(Resolved {
        provider,
        chain_id,
        account,
    })
}
