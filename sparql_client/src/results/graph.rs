//! Graph results, parsed one statement at a time with [RIO](https://docs.rs/rio_api/) parsers.
use super::Quad;
use crate::error::{DecodeError, Error};
use quadwire_term::{BnodeId, Iri, LanguageTag, Literal, RdfTerm};
use rio_api::model;
use rio_api::parser::{QuadsParser, TriplesParser};
use rio_turtle::{NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use rio_xml::RdfXmlParser;
use std::collections::VecDeque;
use std::io::BufRead;

enum Parser<R: BufRead> {
    NTriples(NTriplesParser<R>),
    Turtle(TurtleParser<R>),
    RdfXml(RdfXmlParser<R>),
    NQuads(NQuadsParser<R>),
    TriG(TriGParser<R>),
}

pub(crate) struct GraphQuads<R: BufRead> {
    parser: Parser<R>,
    buffer: VecDeque<Quad>,
    done: bool,
}

impl<R: BufRead> GraphQuads<R> {
    /// A lazy parser of `body`, or `None` if `content_type` is not supported.
    pub(crate) fn new(content_type: &str, body: R) -> Option<Self> {
        let parser = match content_type {
            "application/n-triples" => Parser::NTriples(NTriplesParser::new(body)),
            "text/turtle" | "application/x-turtle" => Parser::Turtle(TurtleParser::new(body, None)),
            "application/rdf+xml" => Parser::RdfXml(RdfXmlParser::new(body, None)),
            "application/n-quads" => Parser::NQuads(NQuadsParser::new(body)),
            "application/trig" => Parser::TriG(TriGParser::new(body, None)),
            _ => return None,
        };
        Some(GraphQuads {
            parser,
            buffer: VecDeque::new(),
            done: false,
        })
    }

    /// Parse one step, which may produce zero, one or several statements.
    fn step(&mut self) -> Result<(), Error> {
        let buffer = &mut self.buffer;
        match &mut self.parser {
            Parser::NTriples(p) => triples_step(p, buffer),
            Parser::Turtle(p) => triples_step(p, buffer),
            Parser::RdfXml(p) => triples_step(p, buffer),
            Parser::NQuads(p) => quads_step(p, buffer),
            Parser::TriG(p) => quads_step(p, buffer),
        }
    }

    fn is_end(&self) -> bool {
        match &self.parser {
            Parser::NTriples(p) => p.is_end(),
            Parser::Turtle(p) => p.is_end(),
            Parser::RdfXml(p) => p.is_end(),
            Parser::NQuads(p) => p.is_end(),
            Parser::TriG(p) => p.is_end(),
        }
    }
}

impl<R: BufRead> Iterator for GraphQuads<R> {
    type Item = Result<Quad, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(quad) = self.buffer.pop_front() {
                return Some(Ok(quad));
            }
            if self.done || self.is_end() {
                self.done = true;
                return None;
            }
            if let Err(err) = self.step() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

fn triples_step<P>(parser: &mut P, buffer: &mut VecDeque<Quad>) -> Result<(), Error>
where
    P: TriplesParser,
    Error: From<P::Error>,
{
    parser.parse_step(&mut |t| -> Result<(), Error> {
        buffer.push_back(Quad {
            subject: subject(t.subject)?,
            predicate: named_node(t.predicate)?,
            object: object(t.object)?,
            graph: None,
        });
        Ok(())
    })
}

fn quads_step<P>(parser: &mut P, buffer: &mut VecDeque<Quad>) -> Result<(), Error>
where
    P: QuadsParser,
    Error: From<P::Error>,
{
    parser.parse_step(&mut |q| -> Result<(), Error> {
        let graph = match q.graph_name {
            None => None,
            Some(model::GraphName::NamedNode(n)) => Some(named_node(n)?.into()),
            Some(model::GraphName::BlankNode(b)) => Some(blank_node(b)?),
        };
        buffer.push_back(Quad {
            subject: subject(q.subject)?,
            predicate: named_node(q.predicate)?,
            object: object(q.object)?,
            graph,
        });
        Ok(())
    })
}

fn named_node(n: model::NamedNode<'_>) -> Result<Iri, Error> {
    Iri::new(n.iri).map_err(invalid)
}

fn blank_node(b: model::BlankNode<'_>) -> Result<RdfTerm, Error> {
    Ok(BnodeId::new(b.id).map_err(invalid)?.into())
}

fn subject(s: model::Subject<'_>) -> Result<RdfTerm, Error> {
    match s {
        model::Subject::NamedNode(n) => Ok(named_node(n)?.into()),
        model::Subject::BlankNode(b) => blank_node(b),
        _ => Err(Error::Unsupported("quoted triples are not supported".into())),
    }
}

fn object(o: model::Term<'_>) -> Result<RdfTerm, Error> {
    match o {
        model::Term::NamedNode(n) => Ok(named_node(n)?.into()),
        model::Term::BlankNode(b) => blank_node(b),
        model::Term::Literal(model::Literal::Simple { value }) => Ok(Literal::simple(value).into()),
        model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => {
            let tag = LanguageTag::new(language).map_err(invalid)?;
            Ok(Literal::language_tagged(value, tag).into())
        }
        model::Term::Literal(model::Literal::Typed { value, datatype }) => {
            Ok(Literal::typed(value, named_node(datatype)?).into())
        }
        _ => Err(Error::Unsupported("quoted triples are not supported".into())),
    }
}

fn invalid<E: std::fmt::Display>(err: E) -> Error {
    DecodeError::new(err.to_string()).into()
}
