//! A client of the [SPARQL 1.1 protocol] and [Graph Store HTTP protocol],
//! with streamed results and optional server-side transactions.
//!
//! Example:
//! ```no_run
//! use quadwire_sparql_client::{ClientConfig, QueryRequest, SparqlClient};
//! use quadwire_term::RdfTerm;
//!
//! # fn bla() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SparqlClient::new(ClientConfig::new("http://localhost:3030/ds/sparql"))?;
//! let request = QueryRequest::new("SELECT ?label { ?s <http://www.w3.org/2000/01/rdf-schema#label> ?label }")
//!     .bind("s", RdfTerm::iri("http://example.org/alice")?)?
//!     .paginate(0, 10);
//! for solution in client.select(&request)? {
//!     let solution = solution?;
//!     if let Some(label) = solution.get("label").and_then(RdfTerm::lexical_form) {
//!         println!("{label}");
//!     }
//! }
//!
//! let tx = client.begin()?;
//! client.update(&QueryRequest::new("INSERT DATA { <tag:s> <tag:p> <tag:o> }").in_transaction(&tx))?;
//! client.commit(&tx)?;
//! # Ok(()) }
//! ```
//!
//! [SPARQL 1.1 protocol]: https://www.w3.org/TR/sparql11-protocol/
//! [Graph Store HTTP protocol]: https://www.w3.org/TR/sparql11-http-rdf-update/
#![deny(missing_docs)]

pub mod binding;
pub use binding::{BindingSet, WireBinding, WireBindings};
mod client;
pub use client::SparqlClient;
pub mod config;
pub use config::{
    AcceptConfig, BindingStrategy, ClientConfig, Credentials, PaginationStrategy, QueryMethod,
    TransactionConfig,
};
mod error;
pub use error::*;
pub mod graph_store;
pub use graph_store::{GraphDocument, GraphName, RdfFormat};
pub mod http;
pub use http::{Body, HttpConnection, HttpRequest, HttpResponse, Method, ReqwestConnection};
pub mod query;
pub use query::{build_query, Pagination, QueryRequest, RequestKind};
pub mod results;
pub use results::{decode_boolean, decode_quads, decode_solutions, Quad, Quads, Solutions};
mod statements;
pub mod transaction;
pub use transaction::{
    NoTransactions, RestTransactions, TransactionHandle, TransactionProtocol, TransactionState,
};
