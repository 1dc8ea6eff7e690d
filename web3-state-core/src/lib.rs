//! Reactive connection state for wallet connectors.
//!
//! This crate exposes a wallet/blockchain connector (account, chain id,
//! provider, error) as observable state and keeps that state in sync with the
//! connector's lifecycle.
//!
//! # Key Components
//!
//! *   [`store::Web3Context`]: the connection state store. Create one per
//!     application instance and hand clones of it to consumers.
//! *   [`connector::Connector`]: the contract a wallet connector implements.
//! *   [`events`]: connector lifecycle events, plus [`events::EventEmitter`] and
//!     [`events::Subscription`] for listener bookkeeping.
//! *   [`normalize`]: canonical forms for chain ids and accounts.
pub mod connector;
pub mod errors;
pub mod events;
pub mod normalize;
/// The observable connection snapshot and the `library` derivation.
pub mod state;
pub mod store;

pub use connector::{Connector, SharedConnector};
pub use errors::Web3Error;
pub use events::{ConnectorEvent, ConnectorUpdate, EventEmitter, Subscription};
pub use normalize::{normalize_account, normalize_chain_id, ChainIdInput};
pub use state::ConnectionState;
pub use store::{ActivateOptions, Web3Context};
