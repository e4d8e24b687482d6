use crate::{BnodeId, InvalidIri, Iri, Literal};
use std::fmt;

/// An RDF term, as bound to SPARQL variables or found in triples.
///
/// Its [`Display`](fmt::Display) implementation produces the syntax shared by
/// SPARQL and N-Triples, which [`FromStr`](std::str::FromStr) parses back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RdfTerm {
    /// An [RDF IRI](https://www.w3.org/TR/rdf11-concepts/#section-IRIs)
    Iri(Iri),
    /// An RDF [literal](https://www.w3.org/TR/rdf11-concepts/#section-Graph-Literal)
    Literal(Literal),
    /// An RDF [blank node](https://www.w3.org/TR/rdf11-concepts/#section-blank-nodes)
    BlankNode(BnodeId),
}

/// The different kinds of [`RdfTerm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// See [`RdfTerm::Iri`]
    Iri,
    /// See [`RdfTerm::Literal`]
    Literal,
    /// See [`RdfTerm::BlankNode`]
    BlankNode,
}

impl RdfTerm {
    /// Build an IRI term, checking that `iri` is a valid absolute IRI.
    pub fn iri<T: Into<Box<str>>>(iri: T) -> Result<Self, InvalidIri> {
        Iri::new(iri).map(RdfTerm::Iri)
    }

    /// Build a simple literal.
    pub fn literal<T: Into<Box<str>>>(lexical: T) -> Self {
        RdfTerm::Literal(Literal::simple(lexical))
    }

    /// The kind of this term.
    pub fn kind(&self) -> TermKind {
        match self {
            RdfTerm::Iri(_) => TermKind::Iri,
            RdfTerm::Literal(_) => TermKind::Literal,
            RdfTerm::BlankNode(_) => TermKind::BlankNode,
        }
    }

    /// Whether this term is an IRI
    pub fn is_iri(&self) -> bool {
        matches!(self, RdfTerm::Iri(_))
    }

    /// Whether this term is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, RdfTerm::Literal(_))
    }

    /// Whether this term is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, RdfTerm::BlankNode(_))
    }

    /// The IRI of this term, if it is an IRI.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            RdfTerm::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// This term as a literal, if it is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            RdfTerm::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// The identifier of this term, if it is a blank node.
    pub fn as_bnode_id(&self) -> Option<&BnodeId> {
        match self {
            RdfTerm::BlankNode(id) => Some(id),
            _ => None,
        }
    }

    /// The lexical form of this term, if it is a literal.
    pub fn lexical_form(&self) -> Option<&str> {
        self.as_literal().map(Literal::lexical_form)
    }

    /// The "string value" of this term:
    /// the IRI, the lexical form, or the blank node identifier.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Iri(iri) => iri.as_str(),
            RdfTerm::Literal(lit) => lit.lexical_form(),
            RdfTerm::BlankNode(id) => id.as_str(),
        }
    }
}

impl From<Iri> for RdfTerm {
    fn from(value: Iri) -> Self {
        RdfTerm::Iri(value)
    }
}

impl From<Literal> for RdfTerm {
    fn from(value: Literal) -> Self {
        RdfTerm::Literal(value)
    }
}

impl From<BnodeId> for RdfTerm {
    fn from(value: BnodeId) -> Self {
        RdfTerm::BlankNode(value)
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::Iri(iri) => write!(f, "<{iri}>"),
            RdfTerm::Literal(lit) => fmt::Display::fmt(lit, f),
            RdfTerm::BlankNode(id) => fmt::Display::fmt(id, f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::LanguageTag;

    #[test]
    fn structural_equality() {
        assert_eq!(
            RdfTerm::iri("http://ex/a").unwrap(),
            RdfTerm::Iri(Iri::new_unchecked("http://ex/a"))
        );
        assert_ne!(
            RdfTerm::iri("http://ex/a").unwrap(),
            RdfTerm::literal("http://ex/a")
        );
        assert_ne!(
            RdfTerm::literal("a"),
            RdfTerm::from(Literal::language_tagged("a", LanguageTag::new_unchecked("en")))
        );
    }

    #[test]
    fn display() {
        assert_eq!(RdfTerm::iri("http://ex/a").unwrap().to_string(), "<http://ex/a>");
        assert_eq!(RdfTerm::literal("v").to_string(), r#""v""#);
        assert_eq!(
            RdfTerm::from(BnodeId::new_unchecked("b1")).to_string(),
            "_:b1"
        );
    }

    #[test]
    fn value_and_kind() {
        let t = RdfTerm::from(BnodeId::new_unchecked("b1"));
        assert_eq!(t.kind(), TermKind::BlankNode);
        assert_eq!(t.value(), "b1");
        assert!(t.lexical_form().is_none());
        assert_eq!(RdfTerm::literal("x").lexical_form(), Some("x"));
    }
}
