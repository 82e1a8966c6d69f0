use thiserror::Error as ThisError;

/// Errors produced while building requests or decoding responses.
///
/// Validation failures (`UnsupportedType`, `UndeclaredAttribute`, `Schema`)
/// indicate a programming error in the caller and surface before any
/// transport call is made. `Transport` wraps a terminal transport failure;
/// retryable transport errors are recovered internally and never reach the
/// caller.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum Error {
    /// A date value could not be interpreted as RFC 3339 or epoch milliseconds.
    #[error("invalid date value for attribute '{attribute}': {value}")]
    InvalidDate {
        /// The attribute being encoded.
        attribute: String,
        /// The offending input value.
        value: String,
    },
    /// A value could not be interpreted as the key of the table.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Explanation.
        message: String,
    },
    /// A number value could not be parsed.
    #[error("invalid number value: {value}")]
    InvalidNumber {
        /// The offending input value.
        value: String,
    },
    /// The schema key layout is invalid.
    #[error("invalid schema: {message}")]
    Schema {
        /// Explanation.
        message: String,
    },
    /// A terminal (non-retryable) transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A condition referenced an attribute that no schema or index declares.
    #[error("attribute '{attribute}' is not declared in the schema or any index")]
    UndeclaredAttribute {
        /// The undeclared attribute name.
        attribute: String,
    },
    /// A wire value carried a tag the declared semantic type cannot decode.
    #[error("cannot decode {tag} value as {expected}")]
    UnexpectedTag {
        /// The wire type tag found.
        tag: String,
        /// The semantic type expected.
        expected: String,
    },
    /// A value does not fit the declared semantic type of its attribute.
    #[error("unsupported value for attribute '{attribute}'")]
    UnsupportedType {
        /// The attribute being encoded.
        attribute: String,
    },
}

/// Result alias for mapper operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error reported by the transport collaborator.
///
/// The `retryable` flag is the sole retry trigger: pagination and batch
/// loops reissue the identical outstanding request when it is set, and
/// treat the error as terminal otherwise.
#[derive(Clone, Debug, ThisError, PartialEq)]
#[error("{code}: {message}")]
pub struct TransportError {
    /// Machine-readable error code (e.g. `ProvisionedThroughputExceededException`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether reissuing the identical request may succeed.
    pub retryable: bool,
}

impl TransportError {
    /// A terminal transport error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// A transport error the caller should recover by reissuing the request.
    pub fn retryable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(code, message)
        }
    }
}
