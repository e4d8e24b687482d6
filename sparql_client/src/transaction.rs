//! Server-side transactions spanning several requests.
//!
//! The SPARQL protocol does not define transactions,
//! so the way they are opened, used and closed is pluggable
//! through the [`TransactionProtocol`] trait.
use crate::error::{DecodeError, Error, InvalidTransactionStateError};
use crate::http::{HttpConnection, HttpRequest, Method};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The state of a [`TransactionHandle`].
///
/// The only possible transitions are from `Open` to one of the terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// The transaction accepts requests
    Open,
    /// The transaction was committed
    Committed,
    /// The transaction was rolled back
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::Open => "open",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
        })
    }
}

/// A server-side transaction, created by [`SparqlClient::begin`](crate::SparqlClient::begin).
///
/// It must be explicitly committed or rolled back.
/// A handle dropped while still open is only reported in the logs;
/// the server is expected to roll it back when it times out.
///
/// Requests made under the same handle are serialized.
#[derive(Debug)]
pub struct TransactionHandle {
    id: String,
    state: Mutex<TransactionState>,
}

impl TransactionHandle {
    pub(crate) fn new(id: String) -> Self {
        TransactionHandle {
            id,
            state: Mutex::new(TransactionState::Open),
        }
    }

    /// The identifier issued by the server.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current state of this transaction.
    pub fn state(&self) -> TransactionState {
        *self.lock()
    }

    /// Whether this transaction still accepts requests.
    pub fn is_open(&self) -> bool {
        self.state() == TransactionState::Open
    }

    /// Lock this handle for the duration of a request,
    /// failing if it is no longer open.
    pub(crate) fn lock_open(&self) -> Result<MutexGuard<'_, TransactionState>, Error> {
        let guard = self.lock();
        match *guard {
            TransactionState::Open => Ok(guard),
            state => Err(InvalidTransactionStateError {
                id: self.id.clone(),
                state,
            }
            .into()),
        }
    }

    /// Run `f` then move to `target`; the handle stays open if `f` fails.
    pub(crate) fn finish<F>(&self, target: TransactionState, f: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let mut guard = self.lock_open()?;
        f()?;
        *guard = target;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, TransactionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TransactionHandle {
    fn drop(&mut self) {
        let state = *self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state == TransactionState::Open {
            log::warn!(
                "transaction {} dropped while open; it will be rolled back by the server",
                self.id
            );
        }
    }
}

/// The wire mechanism of transactions.
pub trait TransactionProtocol: Send + Sync {
    /// Open a new transaction and return its identifier.
    fn begin(&self, connection: &dyn HttpConnection) -> Result<String, Error>;

    /// Commit transaction `id`.
    fn commit(&self, connection: &dyn HttpConnection, id: &str) -> Result<(), Error>;

    /// Roll back transaction `id`.
    fn rollback(&self, connection: &dyn HttpConnection, id: &str) -> Result<(), Error>;

    /// Make `request` part of transaction `id`.
    fn scope(&self, request: HttpRequest, id: &str) -> Result<HttpRequest, Error>;
}

/// The default [`TransactionProtocol`]:
/// every request is auto-committed, and [`begin`](TransactionProtocol::begin) fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTransactions;

impl NoTransactions {
    fn unsupported<T>(&self) -> Result<T, Error> {
        Err(Error::Unsupported(
            "transactions are not configured for this client".into(),
        ))
    }
}

impl TransactionProtocol for NoTransactions {
    fn begin(&self, _: &dyn HttpConnection) -> Result<String, Error> {
        self.unsupported()
    }

    fn commit(&self, _: &dyn HttpConnection, _: &str) -> Result<(), Error> {
        self.unsupported()
    }

    fn rollback(&self, _: &dyn HttpConnection, _: &str) -> Result<(), Error> {
        self.unsupported()
    }

    fn scope(&self, _: HttpRequest, _: &str) -> Result<HttpRequest, Error> {
        self.unsupported()
    }
}

/// A REST-style [`TransactionProtocol`]:
///
/// - `POST {endpoint}` opens a transaction; its id is the last segment of the
///   `Location` header of the response, or else the body of the response;
/// - `POST {endpoint}/{id}?result=commit` (resp. `rollback`) closes it;
/// - other requests join it with a `{parameter}={id}` query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestTransactions {
    endpoint: String,
    parameter: String,
}

impl RestTransactions {
    /// A protocol creating transactions at `endpoint`
    /// and identifying them with query parameter `parameter`.
    pub fn new<E: Into<String>, P: Into<String>>(endpoint: E, parameter: P) -> Self {
        RestTransactions {
            endpoint: endpoint.into(),
            parameter: parameter.into(),
        }
    }

    fn close(&self, connection: &dyn HttpConnection, id: &str, result: &str) -> Result<(), Error> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), id);
        let request = HttpRequest::new(Method::Post, &url).param("result", result);
        connection.execute(request)?.error_for_status()?;
        Ok(())
    }
}

impl TransactionProtocol for RestTransactions {
    fn begin(&self, connection: &dyn HttpConnection) -> Result<String, Error> {
        let request = HttpRequest::new(Method::Post, &self.endpoint);
        let response = connection.execute(request)?.error_for_status()?;
        let from_location = response
            .header("location")
            .map(|loc| loc.split(['?', '#']).next().unwrap_or(loc))
            .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let id = match from_location {
            Some(id) => id,
            None => response.into_message(),
        };
        if id.is_empty() || id.contains(char::is_whitespace) {
            let message = format!("no valid transaction id in response: {id:?}");
            return Err(DecodeError::new(message).into());
        }
        Ok(id)
    }

    fn commit(&self, connection: &dyn HttpConnection, id: &str) -> Result<(), Error> {
        self.close(connection, id, "commit")
    }

    fn rollback(&self, connection: &dyn HttpConnection, id: &str) -> Result<(), Error> {
        self.close(connection, id, "rollback")
    }

    fn scope(&self, request: HttpRequest, id: &str) -> Result<HttpRequest, Error> {
        Ok(request.param(self.parameter.as_str(), id))
    }
}
