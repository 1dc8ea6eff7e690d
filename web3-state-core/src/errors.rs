use std::{error::Error as StdError, fmt, sync::Arc};
use thiserror::Error;

/// Errors produced while activating a connector or applying its updates.
///
/// The type is `Clone` so that the same error can be stored in the connection
/// state, handed to a caller-supplied callback, and returned from `activate`.
#[derive(Error, Debug, Clone)]
pub enum Web3Error {
    /// The connector reported a chain outside of its declared allowlist.
    #[error(
        "Unsupported chain id: {chain_id}. Supported chain ids are: {}.",
        ChainList(.supported.as_slice())
    )]
    UnsupportedChainId { chain_id: u64, supported: Vec<u64> },

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// An error raised by the connector itself, passed through unchanged.
    #[error(transparent)]
    Connector(Arc<dyn StdError + Send + Sync>),
}

impl Web3Error {
    /// Wraps any connector-side error.
    pub fn connector<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Web3Error::Connector(Arc::new(err))
    }

    /// Builds an opaque connector error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Web3Error::Connector(Arc::new(ConnectorMessage(message.into())))
    }

    /// Returns `true` for the allowlist violation raised by chain validation.
    pub fn is_unsupported_chain(&self) -> bool {
        matches!(self, Web3Error::UnsupportedChainId { .. })
    }
}

/// Plain-text connector error used by [`Web3Error::msg`].
#[derive(Debug)]
struct ConnectorMessage(String);

impl fmt::Display for ConnectorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for ConnectorMessage {}

/// Renders an allowlist the way it appears in error messages: `1,4`.
struct ChainList<'a>(&'a [u64]);

impl fmt::Display for ChainList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_chain_message_lists_allowlist() {
        let err = Web3Error::UnsupportedChainId {
            chain_id: 5,
            supported: vec![1, 4],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported chain id: 5. Supported chain ids are: 1,4."
        );
        assert!(err.is_unsupported_chain());
    }

    #[test]
    fn connector_errors_are_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "user rejected request");
        let err = Web3Error::connector(io);
        assert_eq!(err.to_string(), "user rejected request");
        assert_eq!(Web3Error::msg("locked").to_string(), "locked");
    }
}
