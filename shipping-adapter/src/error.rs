//! Error types for the shipping adapter

use std::num::ParseIntError;
use thiserror::Error;
use tonic::Code;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Channel could not be set up
    #[error("Connection error: {0}")]
    Connection(String),

    /// Product code is not a base-10 i64
    #[error("Invalid product code ({product_code}): {source}")]
    InvalidProductCode {
        /// Offending product code
        product_code: String,
        /// Parse failure
        #[source]
        source: ParseIntError,
    },

    /// Quantity does not fit the wire's i32
    #[error("Quantity {quantity} out of range for product code {product_code}")]
    QuantityOutOfRange {
        /// Product code of the item
        product_code: String,
        /// Offending quantity
        quantity: u32,
    },

    /// Failure reported by the transport or the remote service, unmodified
    #[error(transparent)]
    Transport(#[from] tonic::Status),

    /// Call context was cancelled
    #[error("Call cancelled")]
    Cancelled,

    /// Call context deadline elapsed
    #[error("Call deadline exceeded")]
    DeadlineExceeded,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify the error onto a gRPC status code.
    ///
    /// Transport errors keep the code the remote side (or tonic) reported, so a
    /// caller can tell "service down" (`Unavailable`) from "bad request"
    /// (`InvalidArgument`) without unwrapping the variant.
    pub fn code(&self) -> Code {
        match self {
            Error::Connection(_) => Code::Unavailable,
            Error::InvalidProductCode { .. } | Error::QuantityOutOfRange { .. } => {
                Code::InvalidArgument
            }
            Error::Transport(status) => status.code(),
            Error::Cancelled => Code::Cancelled,
            Error::DeadlineExceeded => Code::DeadlineExceeded,
            Error::Config(_) => Code::InvalidArgument,
        }
    }

    /// True for errors raised before any network activity.
    pub fn is_translation(&self) -> bool {
        matches!(
            self,
            Error::InvalidProductCode { .. } | Error::QuantityOutOfRange { .. }
        )
    }

    /// The underlying transport status, if this is a transport error.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            Error::Transport(status) => Some(status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_product_code_names_the_code() {
        let source = "abc".parse::<i64>().unwrap_err();
        let err = Error::InvalidProductCode {
            product_code: "abc".to_string(),
            source,
        };

        assert!(err.to_string().contains("abc"));
        assert!(err.is_translation());
        assert_eq!(err.code(), Code::InvalidArgument);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transport_error_keeps_status() {
        let err: Error = tonic::Status::unavailable("shipping down").into();

        assert_eq!(err.code(), Code::Unavailable);
        assert_eq!(err.status().map(|s| s.message()), Some("shipping down"));
        assert!(!err.is_translation());
    }

    #[test]
    fn test_context_errors_classified() {
        assert_eq!(Error::Cancelled.code(), Code::Cancelled);
        assert_eq!(Error::DeadlineExceeded.code(), Code::DeadlineExceeded);
        assert!(Error::Cancelled.status().is_none());
    }
}
