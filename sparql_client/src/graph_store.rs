//! Operations of the [SPARQL 1.1 Graph Store HTTP Protocol].
//!
//! RDF documents sent to the store are streamed as is:
//! parsing them is left to the server.
//!
//! [SPARQL 1.1 Graph Store HTTP Protocol]: https://www.w3.org/TR/sparql11-http-rdf-update/
use crate::client::SparqlClient;
use crate::error::Error;
use crate::http::{Body, HttpRequest, Method};
use crate::query::QueryRequest;
use crate::results::{decode_quads, Quads};
use crate::transaction::TransactionHandle;
use quadwire_term::Iri;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// The target of a graph store operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphName {
    /// The default graph ("no context")
    Default,
    /// A named graph
    Named(Iri),
}

impl GraphName {
    /// A named graph, checking that `iri` is a valid absolute IRI.
    pub fn named(iri: &str) -> Result<Self, Error> {
        Ok(GraphName::Named(Iri::new(iri)?))
    }

    /// The query parameter identifying this graph in the Graph Store protocol.
    fn param(&self) -> (&'static str, &str) {
        match self {
            GraphName::Default => ("default", ""),
            GraphName::Named(iri) => ("graph", iri.as_str()),
        }
    }
}

impl From<Iri> for GraphName {
    fn from(iri: Iri) -> Self {
        GraphName::Named(iri)
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphName::Default => f.write_str("DEFAULT"),
            GraphName::Named(iri) => write!(f, "<{iri}>"),
        }
    }
}

/// The RDF serializations that can be sent to a graph store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    /// [N-Triples](https://www.w3.org/TR/n-triples/)
    NTriples,
    /// [N-Quads](https://www.w3.org/TR/n-quads/)
    NQuads,
    /// [Turtle](https://www.w3.org/TR/turtle/)
    Turtle,
    /// [TriG](https://www.w3.org/TR/trig/)
    TriG,
    /// [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/)
    RdfXml,
    /// [JSON-LD](https://www.w3.org/TR/json-ld/)
    JsonLd,
}

impl RdfFormat {
    /// The media type of this format.
    pub fn media_type(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::NQuads => "application/n-quads",
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::TriG => "application/trig",
            RdfFormat::RdfXml => "application/rdf+xml",
            RdfFormat::JsonLd => "application/ld+json",
        }
    }

    /// Whether documents in this format carry their own graph names.
    pub fn is_quad_format(self) -> bool {
        matches!(self, RdfFormat::NQuads | RdfFormat::TriG)
    }

    /// The format with the given media type, if any.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let media_type = media_type.split(';').next().unwrap_or_default().trim();
        [
            RdfFormat::NTriples,
            RdfFormat::NQuads,
            RdfFormat::Turtle,
            RdfFormat::TriG,
            RdfFormat::RdfXml,
            RdfFormat::JsonLd,
        ]
        .into_iter()
        .find(|f| f.media_type().eq_ignore_ascii_case(media_type))
    }
}

/// An RDF document to be sent to a graph store.
pub struct GraphDocument {
    format: RdfFormat,
    body: Box<dyn Read + Send>,
}

impl GraphDocument {
    /// A document read from `reader` while it is sent.
    pub fn from_reader<R: Read + Send + 'static>(format: RdfFormat, reader: R) -> Self {
        GraphDocument {
            format,
            body: Box::new(reader),
        }
    }

    /// An in-memory document.
    pub fn from_str<T: Into<String>>(format: RdfFormat, text: T) -> Self {
        Self::from_reader(format, Cursor::new(text.into().into_bytes()))
    }

    /// A document read from the file at `path`.
    ///
    /// # Errors
    /// [`Error::File`] if the file can not be opened.
    pub fn open<P: AsRef<Path>>(path: P, format: RdfFormat) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::File {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Self::from_reader(format, BufReader::new(file)))
    }

    /// The format of this document.
    pub fn format(&self) -> RdfFormat {
        self.format
    }
}

impl fmt::Debug for GraphDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDocument")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl SparqlClient {
    /// Add the statements of `document` to `graph` (`POST`).
    ///
    /// Documents in a quad format are sent to the whole store,
    /// so `graph` must then be [`GraphName::Default`].
    ///
    /// # Errors
    /// [`Error::InvalidDocument`] if the store rejects the document.
    pub fn graph_merge(
        &self,
        document: GraphDocument,
        graph: &GraphName,
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        self.graph_write(Method::Post, document, graph, tx)
    }

    /// Replace the content of `graph` with the statements of `document` (`PUT`).
    ///
    /// See [`graph_merge`](Self::graph_merge).
    pub fn graph_replace(
        &self,
        document: GraphDocument,
        graph: &GraphName,
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        self.graph_write(Method::Put, document, graph, tx)
    }

    /// Get the statements of `graph` (`GET`).
    pub fn graph_get(
        &self,
        graph: &GraphName,
        tx: Option<&TransactionHandle>,
    ) -> Result<Quads, Error> {
        let (key, value) = graph.param();
        let request = HttpRequest::new(Method::Get, self.config().graph_store_endpoint()?)
            .param(key, value)
            .header("Accept", self.config().accept().graph.as_str());
        let response = self.execute(request, tx)?.error_for_status()?;
        decode_quads(response.content_type().as_deref(), response.body)
    }

    /// Remove `graph` (`DELETE`); the default graph is emptied.
    pub fn graph_delete(
        &self,
        graph: &GraphName,
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        let (key, value) = graph.param();
        let endpoint = self.config().graph_store_endpoint()?;
        let request = HttpRequest::new(Method::Delete, endpoint).param(key, value);
        self.execute(request, tx)?.error_for_status()?;
        Ok(())
    }

    /// Remove every graph, and empty the default graph.
    ///
    /// This is a `DROP ALL` update, sent to the update endpoint.
    pub fn graph_delete_all(&self, tx: Option<&TransactionHandle>) -> Result<(), Error> {
        self.update(&QueryRequest::new("DROP ALL").with_transaction(tx))
    }

    fn graph_write(
        &self,
        method: Method,
        document: GraphDocument,
        graph: &GraphName,
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        let format = document.format;
        let mut request = HttpRequest::new(method, self.config().graph_store_endpoint()?)
            .header("Content-Type", format.media_type());
        if format.is_quad_format() {
            if let GraphName::Named(iri) = graph {
                return Err(Error::Unsupported(format!(
                    "a {} document carries its own graph names, and can not be sent to <{iri}>",
                    format.media_type()
                )));
            }
        } else {
            let (key, value) = graph.param();
            request = request.param(key, value);
        }
        let response = self.execute(request.body(Body::Stream(document.body)), tx)?;
        match response.status {
            400 | 415 => {
                let status = response.status;
                Err(Error::InvalidDocument {
                    status,
                    message: response.into_message(),
                })
            }
            _ => {
                response.error_for_status()?;
                Ok(())
            }
        }
    }
}
