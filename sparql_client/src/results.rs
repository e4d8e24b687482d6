//! Decoding the responses of SPARQL endpoints.
//!
//! Solutions and graph results are decoded lazily,
//! as the response body is read.
use crate::binding::BindingSet;
use crate::error::{DecodeError, Error};
use quadwire_term::{BnodeId, Iri, LanguageTag, Literal as RdfLiteral, RdfTerm, TermError};
use serde::Deserialize;
use std::fmt;
use std::io::{BufReader, Read};

mod graph;
mod json_parser;
mod tsv_parser;
mod xml_parser;

type Rows = Box<dyn Iterator<Item = Result<BindingSet, Error>> + Send>;
type QuadIter = Box<dyn Iterator<Item = Result<Quad, Error>> + Send>;

/// Media type of SPARQL results in XML.
pub const SPARQL_RESULTS_XML: &str = "application/sparql-results+xml";
/// Media type of SPARQL results in JSON.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
/// Media type of SPARQL results in TSV.
pub const SPARQL_RESULTS_TSV: &str = "text/tab-separated-values";

/// The solutions of a `SELECT` query.
///
/// This is a single-pass iterator, decoding the response as it is consumed.
/// Once an error has been returned, the iterator is exhausted.
/// Dropping it, or calling [`close`](Self::close), releases the response
/// without reading the remaining solutions.
pub struct Solutions {
    variables: Vec<String>,
    rows: Option<Rows>,
}

impl Solutions {
    fn new(variables: Vec<String>, rows: Rows) -> Self {
        Solutions {
            variables,
            rows: Some(rows),
        }
    }

    /// The variables announced by the endpoint, in order.
    pub fn variables(&self) -> Vec<&str> {
        self.variables.iter().map(AsRef::as_ref).collect()
    }

    /// Release the response without reading the remaining solutions.
    pub fn close(&mut self) {
        self.rows = None;
    }
}

impl fmt::Debug for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solutions")
            .field("variables", &self.variables)
            .field("closed", &self.rows.is_none())
            .finish()
    }
}

impl Iterator for Solutions {
    type Item = Result<BindingSet, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.rows.as_mut()?.next();
        if !matches!(item, Some(Ok(_))) {
            self.rows = None;
        }
        item
    }
}

/// A statement of a graph result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quad {
    /// The subject (an IRI or a blank node)
    pub subject: RdfTerm,
    /// The predicate
    pub predicate: Iri,
    /// The object
    pub object: RdfTerm,
    /// The graph name, `None` for the default graph
    pub graph: Option<RdfTerm>,
}

/// The statements of a graph result (`DESCRIBE`, `CONSTRUCT`, graph store reads).
///
/// This is a single-pass iterator, decoding the response as it is consumed.
/// Once an error has been returned, the iterator is exhausted.
pub struct Quads {
    inner: Option<QuadIter>,
}

impl Quads {
    /// Release the response without reading the remaining statements.
    pub fn close(&mut self) {
        self.inner = None;
    }
}

impl fmt::Debug for Quads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quads")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

impl Iterator for Quads {
    type Item = Result<Quad, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.as_mut()?.next();
        if !matches!(item, Some(Ok(_))) {
            self.inner = None;
        }
        item
    }
}

/// Decode the solutions of a `SELECT` query from a response with the given media type.
///
/// The head of the response is decoded before returning.
pub fn decode_solutions(
    content_type: Option<&str>,
    body: Box<dyn Read + Send>,
) -> Result<Solutions, Error> {
    let body = BufReader::new(body);
    match content_type.unwrap_or_default() {
        SPARQL_RESULTS_XML => match xml_parser::parse(body)? {
            xml_parser::XmlDocument::Solutions(rows) => {
                let variables = rows.variables().to_vec();
                Ok(Solutions::new(variables, Box::new(rows)))
            }
            xml_parser::XmlDocument::Boolean(_) => {
                Err(DecodeError::new("expected solutions, found a boolean").into())
            }
        },
        SPARQL_RESULTS_TSV => {
            let rows = tsv_parser::TsvSolutions::open(body)?;
            let variables = rows.variables().to_vec();
            Ok(Solutions::new(variables, Box::new(rows)))
        }
        SPARQL_RESULTS_JSON => {
            let rows = json_parser::JsonSolutions::spawn(body)?;
            let variables = rows.variables().to_vec();
            Ok(Solutions::new(variables, Box::new(rows)))
        }
        other => Err(unsupported(other)),
    }
}

/// Decode the result of an `ASK` query from a response with the given media type.
pub fn decode_boolean(
    content_type: Option<&str>,
    body: Box<dyn Read + Send>,
) -> Result<bool, Error> {
    let mut body = BufReader::new(body);
    match content_type.unwrap_or_default() {
        SPARQL_RESULTS_JSON => {
            let doc: BooleanDocument = serde_json::from_reader(body).map_err(|err| {
                if err.is_io() {
                    Error::from(std::io::Error::from(err))
                } else {
                    DecodeError::new(format!("JSON results parsing error: {err}")).into()
                }
            })?;
            Ok(doc.boolean)
        }
        SPARQL_RESULTS_XML => match xml_parser::parse(body)? {
            xml_parser::XmlDocument::Boolean(value) => Ok(value),
            xml_parser::XmlDocument::Solutions(_) => {
                Err(DecodeError::new("expected a boolean, found solutions").into())
            }
        },
        "text/boolean" => {
            let mut txt = String::new();
            body.read_to_string(&mut txt)?;
            match txt.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => {
                    let message = format!("unrecognized boolean value {other:?}");
                    Err(DecodeError::at(0, message).into())
                }
            }
        }
        other => Err(unsupported(other)),
    }
}

/// Decode a graph result from a response with the given media type.
pub fn decode_quads(
    content_type: Option<&str>,
    body: Box<dyn Read + Send>,
) -> Result<Quads, Error> {
    let body = BufReader::new(body);
    let quads = graph::GraphQuads::new(content_type.unwrap_or_default(), body)
        .ok_or_else(|| unsupported(content_type.unwrap_or_default()))?;
    Ok(Quads {
        inner: Some(Box::new(quads)),
    })
}

fn unsupported(content_type: &str) -> Error {
    Error::Unsupported(format!("unsupported content-type: {content_type:?}"))
}

#[derive(Debug, Deserialize)]
struct BooleanDocument {
    boolean: bool,
}

/// A term as described in SPARQL results documents.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum Term {
    Bnode {
        value: String,
    },
    Literal(Literal),
    #[serde(rename = "typed-literal")]
    TypedLiteral {
        value: String,
        datatype: String,
    },
    Uri {
        value: String,
    },
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Literal {
    // before Datatype, as some endpoints also give rdf:langString
    Lang {
        value: String,
        #[serde(rename = "xml:lang")]
        lang: String,
    },
    Datatype {
        value: String,
        datatype: String,
    },
    Simple {
        value: String,
    },
}

impl TryFrom<Term> for RdfTerm {
    type Error = TermError;

    fn try_from(other: Term) -> Result<RdfTerm, TermError> {
        use self::Literal::{Datatype, Lang, Simple};
        Ok(match other {
            Term::Bnode { value } => BnodeId::new(value)?.into(),
            Term::Uri { value } => Iri::new(value)?.into(),
            Term::Literal(Simple { value }) => RdfLiteral::simple(value).into(),
            Term::Literal(Lang { value, lang }) => {
                RdfLiteral::language_tagged(value, LanguageTag::new(lang)?).into()
            }
            Term::Literal(Datatype { value, datatype })
            | Term::TypedLiteral { value, datatype } => {
                RdfLiteral::typed(value, Iri::new(datatype)?).into()
            }
        })
    }
}

/// Build a solution from decoded bindings,
/// ordered after `variables`, then in document order.
pub(crate) fn ordered_row(mut raw: Vec<(String, RdfTerm)>, variables: &[String]) -> BindingSet {
    let mut row = BindingSet::new();
    for var in variables {
        if let Some(i) = raw.iter().position(|(name, _)| name == var) {
            let (name, term) = raw.remove(i);
            row.insert_decoded(&name, term);
        }
    }
    for (name, term) in raw {
        row.insert_decoded(&name, term);
    }
    row
}
