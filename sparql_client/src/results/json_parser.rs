//! Parse JSON-formatted SPARQL results without buffering the whole document.
//!
//! `serde_json` only reads from a blocking reader in one go,
//! so the document is parsed by a dedicated thread,
//! which sends each solution through a bounded channel.
//! Dropping the receiving end stops the parser at the next solution.
use super::{ordered_row, Term};
use crate::binding::BindingSet;
use crate::error::{DecodeError, Error, TransportError};
use quadwire_term::RdfTerm;
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;

/// Number of decoded solutions that may wait in the channel.
const CHANNEL_BOUND: usize = 16;

enum JsonEvent {
    Variables(Vec<String>),
    Row(BindingSet),
    Boolean(bool),
    Error(String),
    Transport(TransportError),
}

pub(crate) struct JsonSolutions {
    events: Receiver<JsonEvent>,
    variables: Vec<String>,
    pending: Option<Result<BindingSet, Error>>,
    done: bool,
}

impl JsonSolutions {
    /// Start parsing `body`, and wait for the head and the first solution.
    pub(crate) fn spawn<R: Read + Send + 'static>(body: R) -> Result<Self, Error> {
        let (tx, rx) = sync_channel(CHANNEL_BOUND);
        thread::Builder::new()
            .name("sparql-json-results".into())
            .spawn(move || parse_document(body, tx))?;
        let mut solutions = JsonSolutions {
            events: rx,
            variables: vec![],
            pending: None,
            done: false,
        };
        match solutions.events.recv() {
            Ok(JsonEvent::Variables(variables)) => solutions.variables = variables,
            // results before head: variables are unknown
            Ok(JsonEvent::Row(row)) => {
                solutions.pending = Some(Ok(row));
                return Ok(solutions);
            }
            Ok(JsonEvent::Boolean(b)) => return Err(boolean_error(b)),
            Ok(other) => return Err(event_error(other)),
            Err(_) => return Err(DecodeError::new("empty JSON results document").into()),
        }
        // a boolean document may also have a head
        match solutions.events.recv() {
            Ok(JsonEvent::Boolean(b)) => return Err(boolean_error(b)),
            Ok(JsonEvent::Row(row)) => solutions.pending = Some(Ok(row)),
            Ok(JsonEvent::Variables(_)) => {}
            Ok(other) => {
                solutions.pending = Some(Err(event_error(other)));
                solutions.done = true;
            }
            Err(_) => solutions.done = true,
        }
        Ok(solutions)
    }

    pub(crate) fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl Iterator for JsonSolutions {
    type Item = Result<BindingSet, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.pending.take() {
            return Some(row);
        }
        while !self.done {
            match self.events.recv() {
                Ok(JsonEvent::Row(row)) => return Some(Ok(row)),
                Ok(JsonEvent::Variables(_)) => continue,
                Ok(JsonEvent::Boolean(_)) => {
                    self.done = true;
                    return Some(Err(
                        DecodeError::new("unexpected boolean in solutions").into()
                    ));
                }
                Ok(other) => {
                    self.done = true;
                    return Some(Err(event_error(other)));
                }
                Err(_) => self.done = true,
            }
        }
        None
    }
}

fn boolean_error(value: bool) -> Error {
    DecodeError::new(format!("expected solutions, found a boolean {value}")).into()
}

fn event_error(event: JsonEvent) -> Error {
    match event {
        JsonEvent::Transport(err) => err.into(),
        JsonEvent::Error(message) => DecodeError::new(message).into(),
        _ => DecodeError::new("unexpected event in JSON results").into(),
    }
}

fn parse_document<R: Read>(body: R, tx: SyncSender<JsonEvent>) {
    let mut de = serde_json::Deserializer::from_reader(std::io::BufReader::new(body));
    let res = DocumentSeed { tx: &tx }
        .deserialize(&mut de)
        .and_then(|()| de.end());
    if let Err(err) = res {
        // fails if the receiver was dropped, which is how cancellation ends here
        let event = if err.is_io() {
            JsonEvent::Transport(std::io::Error::from(err).into())
        } else {
            JsonEvent::Error(format!("JSON results parsing error: {err}"))
        };
        if tx.send(event).is_err() {
            log::debug!("JSON results reader dropped before the end of the document");
        }
    }
}

fn send<E: de::Error>(tx: &SyncSender<JsonEvent>, event: JsonEvent) -> Result<(), E> {
    tx.send(event)
        .map_err(|_| E::custom("results reader dropped"))
}

#[derive(Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

struct DocumentSeed<'a> {
    tx: &'a SyncSender<JsonEvent>,
}

impl<'de, 'a> DeserializeSeed<'de> for DocumentSeed<'a> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for DocumentSeed<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a SPARQL results document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut variables: Option<Vec<String>> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "head" => {
                    let head: Head = map.next_value()?;
                    send::<A::Error>(self.tx, JsonEvent::Variables(head.vars.clone()))?;
                    variables = Some(head.vars);
                }
                "results" => map.next_value_seed(ResultsSeed {
                    tx: self.tx,
                    variables: variables.as_deref(),
                })?,
                "boolean" => {
                    let value: bool = map.next_value()?;
                    send::<A::Error>(self.tx, JsonEvent::Boolean(value))?;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct ResultsSeed<'a> {
    tx: &'a SyncSender<JsonEvent>,
    variables: Option<&'a [String]>,
}

impl<'de, 'a> DeserializeSeed<'de> for ResultsSeed<'a> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for ResultsSeed<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a SPARQL results object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "bindings" {
                map.next_value_seed(BindingsSeed(self))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct BindingsSeed<'a>(ResultsSeed<'a>);

impl<'de, 'a> DeserializeSeed<'de> for BindingsSeed<'a> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a> Visitor<'de> for BindingsSeed<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of solutions")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let variables = self.0.variables.unwrap_or_default();
        while let Some(solution) = seq.next_element::<BTreeMap<String, Term>>()? {
            let mut raw = Vec::with_capacity(solution.len());
            for (name, term) in solution {
                let term = RdfTerm::try_from(term)
                    .map_err(|err| <A::Error as de::Error>::custom(format!("in ?{name}: {err}")))?;
                raw.push((name, term));
            }
            send::<A::Error>(self.0.tx, JsonEvent::Row(ordered_row(raw, variables)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quadwire_term::{BnodeId, Iri, LanguageTag, Literal};
    use std::io::Cursor;

    fn spawn(src: &str) -> Result<JsonSolutions, Error> {
        JsonSolutions::spawn(Cursor::new(src.as_bytes().to_vec()))
    }

    #[test]
    fn bindings_doc() {
        let src = r#"
        {
            "head": {
                "vars": ["a", "b", "c"]
            },
            "results": {
                "bindings": [
                    {
                        "a": { "type": "uri", "value": "tag:a0" },
                        "b": { "type": "literal", "value": "simple" },
                        "c": { "type": "bnode", "value": "bn0" }
                    },
                    {
                        "c": { "type": "literal", "value": "datatype", "datatype": "tag:d1" },
                        "a": { "type": "literal", "value": "lang", "xml:lang": "en" }
                    },
                    {}
                ]
            }
        }"#;
        let solutions = spawn(src).unwrap();
        assert_eq!(solutions.variables(), &["a", "b", "c"]);
        let rows: Vec<BindingSet> = solutions.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].variables().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(rows[0].get("a"), Some(&Iri::new_unchecked("tag:a0").into()));
        assert_eq!(rows[0].get("b"), Some(&RdfTerm::literal("simple")));
        assert_eq!(rows[0].get("c"), Some(&BnodeId::new_unchecked("bn0").into()));
        assert_eq!(rows[1].variables().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(
            rows[1].get("a"),
            Some(&Literal::language_tagged("lang", LanguageTag::new_unchecked("en")).into())
        );
        assert_eq!(
            rows[1].get("c"),
            Some(&Literal::typed("datatype", Iri::new_unchecked("tag:d1")).into())
        );
        assert!(rows[2].is_empty());
    }

    #[test]
    fn results_before_head() {
        let src = r#"{
            "results": { "bindings": [ { "y": { "type": "literal", "value": "1" }, "x": { "type": "literal", "value": "0" } } ] },
            "head": { "vars": ["y", "x"] }
        }"#;
        let solutions = spawn(src).unwrap();
        assert!(solutions.variables().is_empty());
        let rows: Vec<BindingSet> = solutions.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].variables().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn truncated_document() {
        let src = r#"{
            "head": { "vars": ["x"] },
            "results": { "bindings": [
                { "x": { "type": "literal", "value": "0" } },
                { "x": { "type": "literal", "#;
        let mut solutions = spawn(src).unwrap();
        assert!(solutions.next().unwrap().is_ok());
        assert!(matches!(solutions.next(), Some(Err(Error::Decode(_)))));
        assert!(solutions.next().is_none());
    }

    #[test]
    fn invalid_term() {
        let src = r#"{
            "head": { "vars": ["x"] },
            "results": { "bindings": [ { "x": { "type": "uri", "value": "no iri" } } ] }
        }"#;
        let mut solutions = spawn(src).unwrap();
        assert!(matches!(solutions.next(), Some(Err(Error::Decode(_)))));
    }

    #[test]
    fn boolean_instead_of_solutions() {
        assert!(matches!(
            spawn(r#"{"head": {}, "boolean": true}"#),
            Err(Error::Decode(_))
        ));
        assert!(matches!(spawn(""), Err(Error::Decode(_))));
    }

    #[test]
    fn dropping_stops_the_parser() {
        let mut src = String::from(r#"{"head": {"vars": ["x"]}, "results": {"bindings": ["#);
        for i in 0..(CHANNEL_BOUND * 10) {
            if i > 0 {
                src.push(',');
            }
            src.push_str(&format!(r#"{{"x": {{"type": "literal", "value": "{i}"}}}}"#));
        }
        src.push_str("]}}");
        let mut solutions = spawn(&src).unwrap();
        assert!(solutions.next().unwrap().is_ok());
        drop(solutions);
    }
}
