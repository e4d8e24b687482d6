//! Error types produced by [`SparqlClient`](crate::SparqlClient).
use crate::transaction::TransactionState;
use quadwire_term::{InvalidIri, TermError};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error type produced by [`SparqlClient`](crate::SparqlClient).
///
/// Only [`Error::Transport`] is worth retrying as is;
/// see [`Error::is_retryable`].
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint could not be reached, or the connection failed mid-way.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-2xx status
    /// (malformed query, permission denied, server fault...).
    #[error("request failed with status {status}: {message}")]
    RequestFailed {
        /// The HTTP status code
        status: u16,
        /// The body of the response (truncated)
        message: String,
    },

    /// The graph store rejected a document as malformed or in an unsupported format.
    #[error("document rejected by the graph store (status {status}): {message}")]
    InvalidDocument {
        /// The HTTP status code
        status: u16,
        /// The body of the response (truncated)
        message: String,
    },

    /// The response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A variable was bound twice in the same [`BindingSet`](crate::BindingSet).
    #[error(transparent)]
    DuplicateBinding(#[from] DuplicateBindingError),

    /// A transaction was used after being committed or rolled back.
    #[error(transparent)]
    InvalidTransactionState(#[from] InvalidTransactionStateError),

    /// An invalid term (or term component) was provided by the caller.
    #[error("invalid term: {0}")]
    InvalidTerm(#[from] TermError),

    /// An invalid variable name was provided by the caller.
    #[error("The given variable name '{0}' does not comply with SPARQL's VARNAME")]
    InvalidVariable(String),

    /// The operation can not be expressed with the current configuration.
    #[error("{0}")]
    Unsupported(String),

    /// The configuration is incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A local file could not be read.
    #[error("can not read {}: {source}", .path.display())]
    File {
        /// The path of the file
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the failed operation may succeed if retried unchanged.
    ///
    /// This is the case of transport errors only:
    /// any other error reflects a problem with the request itself,
    /// with the response, or with the way the client is used.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<InvalidIri> for Error {
    fn from(other: InvalidIri) -> Error {
        Error::InvalidTerm(other.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(other: std::io::Error) -> Error {
        Error::Transport(other.into())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(other: quick_xml::Error) -> Error {
        match other {
            quick_xml::Error::Io(io) => Error::Transport(TransportError::wrap(io_cause(&io), io)),
            other => Error::Decode(DecodeError::new(format!("XML results parsing error: {other}"))),
        }
    }
}

impl From<rio_turtle::TurtleError> for Error {
    fn from(other: rio_turtle::TurtleError) -> Error {
        // syntax errors are wrapped as is, read failures are passed through
        let io = std::io::Error::from(other);
        if io.get_ref().is_some_and(|e| e.is::<rio_turtle::TurtleError>()) {
            Error::Decode(DecodeError::new(format!("turtle parsing error: {io}")))
        } else {
            Error::Transport(io.into())
        }
    }
}

impl From<rio_xml::RdfXmlError> for Error {
    fn from(other: rio_xml::RdfXmlError) -> Error {
        // read failures come back wrapping the shared io::Error of the XML reader
        let io = std::io::Error::from(other);
        if io.get_ref().is_some_and(|e| e.is::<Arc<std::io::Error>>()) {
            Error::Transport(io.into())
        } else {
            Error::Decode(DecodeError::new(format!("RDF/XML parsing error: {io}")))
        }
    }
}

/// The reason of a [`TransportError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportCause {
    /// The configured timeout elapsed; the connection was aborted.
    Timeout,
    /// The connection to the endpoint could not be established.
    Connect,
    /// Reading or writing a body failed.
    Io,
    /// Any other failure of the HTTP stack.
    Other,
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportCause::Timeout => "timeout",
            TransportCause::Connect => "connection failed",
            TransportCause::Io => "i/o error",
            TransportCause::Other => "http error",
        })
    }
}

/// A failure to communicate with the endpoint.
#[derive(Debug, Error)]
#[error("{cause}: {message}")]
pub struct TransportError {
    /// What went wrong
    pub cause: TransportCause,
    /// Human readable description
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Build a [`TransportError`] without an underlying error.
    pub fn new<T: Into<String>>(cause: TransportCause, message: T) -> Self {
        TransportError {
            cause,
            message: message.into(),
            source: None,
        }
    }

    /// Build a [`TransportError`] wrapping another error.
    pub fn wrap<E>(cause: TransportCause, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransportError {
            cause,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(other: reqwest::Error) -> Self {
        let cause = if other.is_timeout() {
            TransportCause::Timeout
        } else if other.is_connect() {
            TransportCause::Connect
        } else if other.is_body() || other.is_decode() {
            TransportCause::Io
        } else {
            TransportCause::Other
        };
        TransportError::wrap(cause, other)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(other: std::io::Error) -> Self {
        TransportError::wrap(io_cause(&other), other)
    }
}

/// Classify an I/O error, looking through the errors it wraps.
fn io_cause(err: &std::io::Error) -> TransportCause {
    if err.kind() == std::io::ErrorKind::TimedOut {
        return TransportCause::Timeout;
    }
    let Some(inner) = err.get_ref() else {
        return TransportCause::Io;
    };
    if let Some(reqwest) = inner.downcast_ref::<reqwest::Error>() {
        if reqwest.is_timeout() {
            return TransportCause::Timeout;
        }
    } else if let Some(shared) = inner.downcast_ref::<Arc<std::io::Error>>() {
        return io_cause(shared);
    } else if let Some(nested) = inner.downcast_ref::<std::io::Error>() {
        return io_cause(nested);
    }
    TransportCause::Io
}

/// A malformed response body.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub struct DecodeError {
    /// Description of the problem
    pub message: String,
    /// Byte offset of the problem in the response body, when the decoder can tell
    pub offset: Option<u64>,
}

impl DecodeError {
    /// A [`DecodeError`] with no known position.
    pub fn new<T: Into<String>>(message: T) -> Self {
        DecodeError {
            message: message.into(),
            offset: None,
        }
    }

    /// A [`DecodeError`] at the given byte offset.
    pub fn at<T: Into<String>>(offset: u64, message: T) -> Self {
        DecodeError {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "malformed response at byte {offset}: {}", self.message),
            None => write!(f, "malformed response: {}", self.message),
        }
    }
}

/// This error is raised when binding a variable that is already bound.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("variable ?{0} is already bound")]
pub struct DuplicateBindingError(pub String);

/// This error is raised when using a transaction that is no longer open.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("transaction {id} is already {state}")]
pub struct InvalidTransactionStateError {
    /// The identifier of the transaction
    pub id: String,
    /// Its (terminal) state
    pub state: TransactionState,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        let transport = Error::from(TransportError::new(TransportCause::Timeout, "slow"));
        assert!(transport.is_retryable());
        let failed = Error::RequestFailed {
            status: 400,
            message: "bad query".into(),
        };
        assert!(!failed.is_retryable());
        assert!(!Error::from(DecodeError::new("oops")).is_retryable());
    }

    #[test]
    fn io_timeout_is_timeout() {
        let err = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "deadline",
        ));
        assert_eq!(err.cause, TransportCause::Timeout);
        let err = TransportError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert_eq!(err.cause, TransportCause::Io);
    }

    #[test]
    fn read_failures_inside_parsers_are_transport_errors() {
        let timeout = || std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline");

        let err = Error::from(quick_xml::Error::from(timeout()));
        assert!(matches!(&err, Error::Transport(t) if t.cause == TransportCause::Timeout));

        let err = Error::from(rio_turtle::TurtleError::from(timeout()));
        assert!(matches!(&err, Error::Transport(t) if t.cause == TransportCause::Timeout));

        let err = Error::from(rio_xml::RdfXmlError::from(timeout()));
        assert!(matches!(&err, Error::Transport(t) if t.cause == TransportCause::Timeout));

        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::from(rio_turtle::TurtleError::from(reset));
        assert!(matches!(&err, Error::Transport(t) if t.cause == TransportCause::Io));
    }

    #[test]
    fn nested_io_timeout_is_timeout() {
        let shared = Arc::new(std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline"));
        let outer = std::io::Error::new(std::io::ErrorKind::Other, shared);
        assert_eq!(TransportError::from(outer).cause, TransportCause::Timeout);
    }

    #[test]
    fn decode_error_display() {
        assert_eq!(
            DecodeError::at(12, "unexpected tag").to_string(),
            "malformed response at byte 12: unexpected tag"
        );
        assert_eq!(
            DecodeError::new("empty").to_string(),
            "malformed response: empty"
        );
    }
}
