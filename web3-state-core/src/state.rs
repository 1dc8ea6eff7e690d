use crate::{connector::SharedConnector, errors::Web3Error};
use std::{fmt, sync::Arc};

/// Builds the derived `library` handle from the active session.
///
/// Called synchronously while a state change is being committed, so it must
/// not read the context it is installed in.
pub type LibraryFactory<P, L> =
    Arc<dyn Fn(&P, &SharedConnector<P>, Option<&str>) -> L + Send + Sync>;

/// A snapshot of the connection.
///
/// `active` and `library` are derived: `library` is refreshed only when one of
/// its inputs (`active`, `provider`, `connector`, `chain_id`, `account`)
/// changed during a commit.
pub struct ConnectionState<P, L> {
    pub(crate) connector: Option<SharedConnector<P>>,
    pub(crate) chain_id: Option<u64>,
    pub(crate) account: Option<Option<String>>,
    pub(crate) provider: Option<P>,
    pub(crate) error: Option<Web3Error>,
    pub(crate) library: Option<L>,
    provider_touched: bool,
}

impl<P, L> Default for ConnectionState<P, L> {
    fn default() -> Self {
        Self {
            connector: None,
            chain_id: None,
            account: None,
            provider: None,
            error: None,
            library: None,
            provider_touched: false,
        }
    }
}

impl<P: Clone, L: Clone> Clone for ConnectionState<P, L> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            chain_id: self.chain_id,
            account: self.account.clone(),
            provider: self.provider.clone(),
            error: self.error.clone(),
            library: self.library.clone(),
            provider_touched: false,
        }
    }
}

/// The inputs `library` depends on, minus the provider (which is opaque and
/// tracked through `provider_touched`).
#[derive(PartialEq, Eq)]
struct LibraryInputs {
    active: bool,
    connector: Option<*const ()>,
    chain_id: Option<u64>,
    account: Option<Option<String>>,
}

impl<P, L> ConnectionState<P, L> {
    pub fn connector(&self) -> Option<&SharedConnector<P>> {
        self.connector.as_ref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// `None` while unknown, `Some(None)` when the wallet exposes no account.
    pub fn account(&self) -> Option<Option<&str>> {
        self.account.as_ref().map(|a| a.as_deref())
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn error(&self) -> Option<&Web3Error> {
        self.error.as_ref()
    }

    pub fn library(&self) -> Option<&L> {
        self.library.as_ref()
    }

    /// True iff a connector, chain id and account are known and no error is
    /// recorded.
    pub fn is_active(&self) -> bool {
        self.connector.is_some()
            && self.chain_id.is_some()
            && self.account.is_some()
            && self.error.is_none()
    }

    pub(crate) fn set_provider(&mut self, provider: Option<P>) {
        self.provider = provider;
        self.provider_touched = true;
    }

    /// Clears the session fields. `error` is left alone.
    pub(crate) fn reset(&mut self) {
        self.connector = None;
        self.chain_id = None;
        self.account = None;
        self.set_provider(None);
    }

    fn library_inputs(&self) -> LibraryInputs {
        LibraryInputs {
            active: self.is_active(),
            connector: self
                .connector
                .as_ref()
                .map(|c| Arc::as_ptr(c) as *const ()),
            chain_id: self.chain_id,
            account: self.account.clone(),
        }
    }

    /// Applies `mutate` and refreshes `library` if any of its inputs moved.
    pub(crate) fn apply(
        &mut self,
        factory: Option<&LibraryFactory<P, L>>,
        mutate: impl FnOnce(&mut Self),
    ) {
        let before = self.library_inputs();
        mutate(self);

        if self.provider_touched || before != self.library_inputs() {
            self.library = self.derive_library(factory);
        }
        self.provider_touched = false;
    }

    fn derive_library(&self, factory: Option<&LibraryFactory<P, L>>) -> Option<L> {
        if !self.is_active() {
            return None;
        }
        match (factory, &self.provider, &self.connector) {
            (Some(factory), Some(provider), Some(connector)) => {
                let account = self.account.as_ref().and_then(|a| a.as_deref());
                Some(factory(provider, connector, account))
            }
            _ => None,
        }
    }
}

impl<P, L> fmt::Debug for ConnectionState<P, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionState")
            .field("connected", &self.connector.is_some())
            .field("chain_id", &self.chain_id)
            .field("account", &self.account)
            .field("provider", &self.provider.is_some())
            .field("error", &self.error)
            .field("library", &self.library.is_some())
            .field("active", &self.is_active())
            .finish()
    }
}
