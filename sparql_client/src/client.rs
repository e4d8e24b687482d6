//! I define [`SparqlClient`], which sends [`QueryRequest`]s to a SPARQL endpoint.
use crate::config::{ClientConfig, QueryMethod, TransactionConfig};
use crate::error::Error;
use crate::http::{Body, HttpConnection, HttpRequest, HttpResponse, Method, ReqwestConnection};
use crate::query::{QueryRequest, RequestKind};
use crate::results::{decode_boolean, decode_quads, decode_solutions, Quads, Solutions};
use crate::transaction::{
    NoTransactions, RestTransactions, TransactionHandle, TransactionProtocol, TransactionState,
};
use std::fmt;

/// A client of the [SPARQL 1.1 protocol].
///
/// A client can be shared between threads;
/// every operation is a blocking HTTP exchange.
///
/// [SPARQL 1.1 protocol]: https://www.w3.org/TR/sparql11-protocol/
pub struct SparqlClient {
    config: ClientConfig,
    connection: Box<dyn HttpConnection>,
    transactions: Box<dyn TransactionProtocol>,
}

impl SparqlClient {
    /// Build a client over [`ReqwestConnection`].
    ///
    /// # Errors
    /// [`Error::Config`] if `config` is invalid.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let connection = ReqwestConnection::new(&config)?;
        Ok(Self::with_connection(config, connection))
    }

    /// Build a client sending its requests through `connection`.
    ///
    /// The transaction protocol is chosen after
    /// [`ClientConfig::transactions`].
    pub fn with_connection<C: HttpConnection + 'static>(
        config: ClientConfig,
        connection: C,
    ) -> Self {
        let transactions: Box<dyn TransactionProtocol> = match config.transactions() {
            TransactionConfig::None => Box::new(NoTransactions),
            TransactionConfig::Rest {
                endpoint,
                parameter,
            } => Box::new(RestTransactions::new(endpoint.as_str(), parameter.as_str())),
        };
        SparqlClient {
            config,
            connection: Box::new(connection),
            transactions,
        }
    }

    /// Replace the transaction protocol of this client.
    #[must_use]
    pub fn with_transaction_protocol<T: TransactionProtocol + 'static>(
        mut self,
        protocol: T,
    ) -> Self {
        self.transactions = Box::new(protocol);
        self
    }

    /// The configuration of this client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Evaluate a `SELECT` query.
    ///
    /// The head of the response is read before returning;
    /// solutions are decoded as they are consumed.
    pub fn select(&self, request: &QueryRequest) -> Result<Solutions, Error> {
        let response = self.query(request, &self.config.accept().select)?;
        decode_solutions(response.content_type().as_deref(), response.body)
    }

    /// Evaluate a `DESCRIBE` or `CONSTRUCT` query.
    pub fn describe(&self, request: &QueryRequest) -> Result<Quads, Error> {
        let response = self.query(request, &self.config.accept().graph)?;
        decode_quads(response.content_type().as_deref(), response.body)
    }

    /// Evaluate an `ASK` query.
    pub fn ask(&self, request: &QueryRequest) -> Result<bool, Error> {
        let response = self.query(request, &self.config.accept().ask)?;
        decode_boolean(response.content_type().as_deref(), response.body)
    }

    /// Execute a SPARQL update.
    ///
    /// Updates are always `POST`ed to the
    /// [update endpoint](ClientConfig::update_endpoint).
    pub fn update(&self, request: &QueryRequest) -> Result<(), Error> {
        let rendered = request.render(&self.config, RequestKind::Update)?;
        let mut http = HttpRequest::new(Method::Post, self.config.update_endpoint())
            .header("Content-Type", "application/sparql-update")
            .body(Body::Text(rendered.text));
        http.query.extend(rendered.params);
        self.execute(http, request.transaction())?
            .error_for_status()?;
        Ok(())
    }

    /// Open a transaction.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if the endpoint has no transaction protocol.
    pub fn begin(&self) -> Result<TransactionHandle, Error> {
        let id = self.transactions.begin(&*self.connection)?;
        log::debug!("transaction {id} opened");
        Ok(TransactionHandle::new(id))
    }

    /// Commit `tx`.
    ///
    /// If the commit fails, `tx` remains open, and may be rolled back.
    ///
    /// # Errors
    /// [`Error::InvalidTransactionState`] if `tx` is no longer open.
    pub fn commit(&self, tx: &TransactionHandle) -> Result<(), Error> {
        tx.finish(TransactionState::Committed, || {
            self.transactions.commit(&*self.connection, tx.id())
        })?;
        log::debug!("transaction {} committed", tx.id());
        Ok(())
    }

    /// Roll `tx` back.
    ///
    /// # Errors
    /// [`Error::InvalidTransactionState`] if `tx` is no longer open.
    pub fn rollback(&self, tx: &TransactionHandle) -> Result<(), Error> {
        tx.finish(TransactionState::RolledBack, || {
            self.transactions.rollback(&*self.connection, tx.id())
        })?;
        log::debug!("transaction {} rolled back", tx.id());
        Ok(())
    }

    fn query(&self, request: &QueryRequest, accept: &str) -> Result<HttpResponse, Error> {
        let rendered = request.render(&self.config, RequestKind::Query)?;
        let endpoint = self.config.query_endpoint();
        let mut http = match self.config.query_method() {
            QueryMethod::Post => HttpRequest::new(Method::Post, endpoint)
                .header("Content-Type", "application/sparql-query")
                .body(Body::Text(rendered.text)),
            QueryMethod::Get => {
                HttpRequest::new(Method::Get, endpoint).param("query", rendered.text)
            }
        }
        .header("Accept", accept);
        http.query.extend(rendered.params);
        self.execute(http, request.transaction())?
            .error_for_status()
    }

    /// Send `request`, in `tx` if provided, and return the response whatever its status.
    ///
    /// The transaction is locked while the request is sent,
    /// so that it can not be committed or rolled back concurrently.
    pub(crate) fn execute(
        &self,
        request: HttpRequest,
        tx: Option<&TransactionHandle>,
    ) -> Result<HttpResponse, Error> {
        match tx {
            None => self.send(request),
            Some(tx) => {
                let _open = tx.lock_open()?;
                let request = self.transactions.scope(request, tx.id())?;
                self.send(request)
            }
        }
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        log::debug!("{:?} {}", request.method, request.url);
        let response = self.connection.execute(request)?;
        if !response.is_success() {
            log::debug!("endpoint answered with status {}", response.status);
        }
        Ok(response)
    }
}

impl fmt::Debug for SparqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparqlClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
