//! Error type for observed-graph operations.

use thiserror::Error;

use crate::value::NodeId;

/// Error produced by a subscriber callback.
///
/// Returning `Err` from a subscriber aborts delivery of the current patch;
/// the error reaches the caller of the mutating operation unchanged.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ObserveError {
    /// The node ID does not belong to this graph's arena.
    #[error("UNKNOWN_NODE: {0}")]
    UnknownNode(NodeId),
    /// A container was expected but the value is a scalar (or missing).
    #[error("NOT_A_CONTAINER: {0}")]
    NotAContainer(String),
    /// An array method was called on an object handle.
    #[error("NOT_AN_ARRAY")]
    NotAnArray,
    /// The key cannot be written or deleted through the observable surface.
    #[error("INVALID_KEY: {0}")]
    InvalidKey(String),
    /// A subscriber failed while a patch was being delivered.
    #[error("SUBSCRIBER: patch at \"{path}\" failed: {source}")]
    Subscriber {
        /// JSON Pointer of the patch as seen by the failing subscriber.
        path: String,
        #[source]
        source: SubscriberError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_tags() {
        assert_eq!(ObserveError::NotAnArray.to_string(), "NOT_AN_ARRAY");
        assert_eq!(
            ObserveError::InvalidKey("length".into()).to_string(),
            "INVALID_KEY: length"
        );
        assert_eq!(ObserveError::UnknownNode(NodeId(7)).to_string(), "UNKNOWN_NODE: #7");
    }

    #[test]
    fn subscriber_error_keeps_source() {
        let err = ObserveError::Subscriber {
            path: "/a/b".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "SUBSCRIBER: patch at \"/a/b\" failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
