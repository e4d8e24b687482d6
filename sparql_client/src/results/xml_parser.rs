//! Parse XML-formatted SPARQL results.
//!
//! We are not using Serde here because `xml_serde` has a number of limitations.
//! The head is parsed eagerly, then one `<result>` is parsed at a time.

use std::io::BufRead;

use quick_xml::{
    events::{
        BytesStart, BytesText,
        Event::{CData, Empty, End, Eof, Start, Text},
    },
    name::{Namespace, QName, ResolveResult},
    NsReader,
};

use super::{ordered_row, Literal, Term};
use crate::binding::BindingSet;
use crate::error::{DecodeError, Error};
use quadwire_term::RdfTerm;

pub(crate) enum XmlDocument<R: BufRead> {
    Boolean(bool),
    Solutions(XmlSolutions<R>),
}

pub(crate) fn parse<R: BufRead>(data: R) -> Result<XmlDocument<R>, Error> {
    SparqlXmlParser::new(data).parse_head()
}

/// The solutions of an XML results document, decoded lazily.
pub(crate) struct XmlSolutions<R: BufRead> {
    parser: SparqlXmlParser<R>,
    variables: Vec<String>,
    done: bool,
}

impl<R: BufRead> XmlSolutions<R> {
    pub(crate) fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl<R: BufRead> Iterator for XmlSolutions<R> {
    type Item = Result<BindingSet, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parser.next_result(&self.variables) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

struct SparqlXmlParser<R: BufRead> {
    events: NsReader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> SparqlXmlParser<R> {
    fn new(data: R) -> Self {
        Self {
            events: NsReader::from_reader(data),
            buf: vec![],
        }
    }

    fn parse_head(mut self) -> Result<XmlDocument<R>, Error> {
        let (_, empty) = self.next_element_expecting("sparql")?;
        if empty {
            return Err(self.error("empty <sparql> element"));
        }
        let (_, empty_head) = self.next_element_expecting("head")?;
        let mut variables: Vec<String> = vec![];
        if !empty_head {
            while let Some((elt, empty)) = self.next_element()? {
                let (ns, local_name) = self.events.resolve_element(elt.name());
                if ns != ResolveResult::Bound(NS) {
                    return Err(self.error(format!(
                        "Unrecognized element in <head>: {local_name:?}"
                    )));
                }
                match local_name.into_inner() {
                    b"variable" => variables.push(self.get_attr(&elt, "name")?),
                    b"link" => (),
                    _ => return Err(self.error(format!("Unknown element <{local_name:?}>"))),
                }
                if !empty {
                    self.expect_closing(elt.name())?;
                }
            }
        }
        let Some((elt, empty)) = self.next_element()? else {
            return Err(self.error("Expected <results> or <boolean>, found no element"));
        };
        if self.check_element(&elt, "boolean") && !empty {
            match self.next_text()?.trim() {
                "true" => Ok(XmlDocument::Boolean(true)),
                "false" => Ok(XmlDocument::Boolean(false)),
                other => Err(self.error(format!("Unrecognized boolean value '{other}'"))),
            }
        } else if self.check_element(&elt, "results") {
            Ok(XmlDocument::Solutions(XmlSolutions {
                parser: self,
                variables,
                done: empty,
            }))
        } else {
            Err(self.error(format!(
                "Expected <results> or <boolean>, found {:?}",
                elt.name()
            )))
        }
    }

    /// Parse the next `<result>`, or return `None` at the end of `<results>`.
    fn next_result(&mut self, variables: &[String]) -> Result<Option<BindingSet>, Error> {
        let Some((result, empty)) = self.next_element()? else {
            return Ok(None);
        };
        if !self.check_element(&result, "result") {
            return Err(self.error(format!("Expected <result>, found {:?}", result.name())));
        }
        let mut raw: Vec<(String, RdfTerm)> = vec![];
        if !empty {
            while let Some((binding, empty)) = self.next_element()? {
                if !self.check_element(&binding, "binding") {
                    return Err(self.error(format!(
                        "Expected <binding>, found {:?}",
                        binding.name()
                    )));
                }
                let name = self.get_attr(&binding, "name")?;
                let child = if empty { None } else { self.next_element()? };
                let Some((elt, empty_term)) = child else {
                    return Err(self.error(format!("No child in <binding name='{name}'>")));
                };
                let term = self.parse_term(&elt, empty_term, &name)?;
                self.expect_closing(binding.name())?;
                raw.push((name, term));
            }
        }
        Ok(Some(ordered_row(raw, variables)))
    }

    fn parse_term(
        &mut self,
        start: &BytesStart<'static>,
        empty: bool,
        name: &str,
    ) -> Result<RdfTerm, Error> {
        let (ns, local_name) = self.events.resolve_element(start.name());
        if ns != ResolveResult::Bound(NS) {
            return Err(self.error(format!(
                "Unrecognized term in <binding name='{}'>: {:?}",
                name,
                start.name()
            )));
        }
        let local_name = local_name.into_inner().to_vec();
        let value = if empty {
            String::new()
        } else {
            self.next_text()?
        };
        let term = match &local_name[..] {
            b"uri" => Term::Uri { value },
            b"bnode" => Term::Bnode { value },
            b"literal" => {
                if let Some(lang) = self.get_attr_maybe(start, "xml:lang")? {
                    Term::Literal(Literal::Lang { value, lang })
                } else if let Some(datatype) = self.get_attr_maybe(start, "datatype")? {
                    Term::Literal(Literal::Datatype { value, datatype })
                } else {
                    Term::Literal(Literal::Simple { value })
                }
            }
            other => {
                return Err(self.error(format!(
                    "Unrecognized term in <binding name='{name}'>: {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        RdfTerm::try_from(term).map_err(|err| self.error(format!("in ?{name}: {err}")))
    }

    fn next_element_expecting(
        &mut self,
        local_name: &str,
    ) -> Result<(BytesStart<'static>, bool), Error> {
        match self.next_element()? {
            None => Err(self.error(format!("Expected <{local_name}>, found no element"))),
            Some((elt, empty)) if self.check_element(&elt, local_name) => Ok((elt, empty)),
            Some((elt, _)) => Err(self.error(format!(
                "Expected <{}>, found {:?}",
                local_name,
                elt.name()
            ))),
        }
    }

    /// The next start or empty element (flagged `true`),
    /// or `None` if the current element closes first.
    fn next_element(&mut self) -> Result<Option<(BytesStart<'static>, bool)>, Error> {
        loop {
            self.buf.clear();
            let event = match self.events.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => return Err(xml_error(&self.events, err)),
            };
            match event {
                Start(s) => return Ok(Some((s.into_owned(), false))),
                Empty(s) => return Ok(Some((s.into_owned(), true))),
                End(_) | Eof => return Ok(None),
                _ => continue,
            }
        }
    }

    /// The text content of the current element, up to its end tag.
    fn next_text(&mut self) -> Result<String, Error> {
        let mut text = String::new();
        loop {
            self.buf.clear();
            let event = match self.events.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => return Err(xml_error(&self.events, err)),
            };
            match event {
                Text(e) => match e.unescape() {
                    Ok(txt) => text.push_str(&txt),
                    Err(err) => return Err(xml_error(&self.events, err)),
                },
                CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                End(_) => return Ok(text),
                Eof => return Err(at(&self.events, "Unexpected end of document")),
                Start(_) | Empty(_) => return Err(at(&self.events, "Unexpected child")),
                _ => continue,
            }
        }
    }

    fn expect_closing(&mut self, name: QName<'_>) -> Result<(), Error> {
        loop {
            self.buf.clear();
            let event = match self.events.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => return Err(xml_error(&self.events, err)),
            };
            match event {
                End(e) if e.name() == name => return Ok(()),
                Start(_) | Empty(_) | CData(_) => {
                    return Err(at(&self.events, format!("Spurious content in {name:?}")))
                }
                Text(e) => {
                    if !is_blank(e) {
                        return Err(at(&self.events, format!("Spurious text in {name:?}")));
                    }
                }
                Eof => return Err(at(&self.events, "Unexpected end of document")),
                _ => continue,
            }
        }
    }

    fn get_attr(&self, start: &BytesStart<'_>, key: &str) -> Result<String, Error> {
        self.get_attr_maybe(start, key)?
            .ok_or_else(|| self.error(format!("Attribute '{key:?}' not found")))
    }

    fn get_attr_maybe(&self, start: &BytesStart<'_>, key: &str) -> Result<Option<String>, Error> {
        let key = QName(key.as_bytes());
        for res in start.attributes() {
            let attr = res.map_err(|err| xml_error(&self.events, err.into()))?;
            if attr.key == key {
                return match attr.decode_and_unescape_value(self.events.decoder()) {
                    Ok(value) => Ok(Some(value.into_owned())),
                    Err(err) => Err(xml_error(&self.events, err)),
                };
            }
        }
        Ok(None)
    }

    fn check_element(&self, start: &BytesStart<'_>, local_name: &str) -> bool {
        let (ns, local) = self.events.resolve_element(start.name());
        local.as_ref() == local_name.as_bytes() && ns == ResolveResult::Bound(NS)
    }

    fn error<T: Into<String>>(&self, message: T) -> Error {
        at(&self.events, message)
    }
}

fn at<R, T: Into<String>>(events: &NsReader<R>, message: T) -> Error {
    let offset = u64::try_from(events.buffer_position()).unwrap_or(u64::MAX);
    DecodeError::at(offset, message).into()
}

fn xml_error<R>(events: &NsReader<R>, err: quick_xml::Error) -> Error {
    match err {
        quick_xml::Error::Io(_) => err.into(),
        err => at(events, format!("XML results parsing error: {err}")),
    }
}

fn is_blank(bytes_text: BytesText<'_>) -> bool {
    bytes_text.iter().all(u8::is_ascii_whitespace)
}

const NS: Namespace = Namespace(b"http://www.w3.org/2005/sparql-results#");

#[cfg(test)]
mod test {
    use super::*;
    use quadwire_term::{BnodeId, Iri, LanguageTag, Literal as RdfLiteral};
    use std::io::Cursor;

    fn solutions(src: &str) -> XmlSolutions<Cursor<&str>> {
        match parse(Cursor::new(src)).unwrap() {
            XmlDocument::Solutions(s) => s,
            XmlDocument::Boolean(_) => panic!("unexpected boolean"),
        }
    }

    #[test]
    fn bindings_doc() {
        let src = r#"<?xml version="1.0"?>
            <sparql xmlns="http://www.w3.org/2005/sparql-results#">
              <head>
                <variable name="a"/>
                <variable name="b"/>
                <variable name="c"/>
                <link href="http://ex/meta"/>
              </head>
              <results>
                <result>
                  <binding name="a">
                    <uri>tag:a0</uri>
                  </binding>
                  <binding name="b">
                    <literal> simple </literal>
                  </binding>
                  <binding name="c">
                    <bnode>bn0</bnode>
                  </binding>
                </result>
                <result>
                  <binding name="c">
                    <literal datatype="tag:d1">datatype</literal>
                  </binding>
                  <binding name="a">
                    <literal xml:lang="en">lang &amp; more</literal>
                  </binding>
                </result>
                <result/>
              </results>
            </sparql>
        "#;
        let got = solutions(src);
        assert_eq!(got.variables(), &["a", "b", "c"]);
        let rows: Vec<BindingSet> = got.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("a"), Some(&Iri::new_unchecked("tag:a0").into()));
        assert_eq!(rows[0].get("b"), Some(&RdfTerm::literal(" simple ")));
        assert_eq!(rows[0].get("c"), Some(&BnodeId::new_unchecked("bn0").into()));
        assert_eq!(rows[1].variables().collect::<Vec<_>>(), vec!["a", "c"]);
        let lang = LanguageTag::new_unchecked("en");
        assert_eq!(
            rows[1].get("a"),
            Some(&RdfLiteral::language_tagged("lang & more", lang).into())
        );
        assert_eq!(
            rows[1].get("c"),
            Some(&RdfLiteral::typed("datatype", Iri::new_unchecked("tag:d1")).into())
        );
        assert!(rows[2].is_empty());
    }

    #[test]
    fn empty_results() {
        let src = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
              <head><variable name="x"/></head>
              <results/>
            </sparql>"#;
        assert_eq!(solutions(src).count(), 0);
    }

    #[test]
    fn boolean_doc_with_link() {
        let src = r#"<?xml version="1.0"?>
            <sparql xmlns="http://www.w3.org/2005/sparql-results#">
              <head>
                <link href="https://example.org" />
              </head>
              <boolean>false</boolean>
            </sparql>
        "#;
        assert!(matches!(
            parse(Cursor::new(src)).unwrap(),
            XmlDocument::Boolean(false)
        ));
    }

    #[test]
    fn wrong_namespace() {
        let src = r#"<sparql xmlns="http://ex/"><head/><boolean>true</boolean></sparql>"#;
        assert!(matches!(parse(Cursor::new(src)), Err(Error::Decode(_))));
    }

    #[test]
    fn error_has_offset() {
        let src = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
              <head><variable name="x"/></head>
              <results>
                <result><binding name="x"><uri>http://ex/ok</uri></binding></result>
                <result><binding name="x"><foo>bar</foo></binding></result>
              </results>
            </sparql>"#;
        let mut rows = solutions(src);
        assert!(rows.next().unwrap().is_ok());
        match rows.next() {
            Some(Err(Error::Decode(err))) => {
                let offset = err.offset.unwrap() as usize;
                assert!(offset > src.find("ok</uri>").unwrap());
                assert!(offset <= src.len());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn invalid_iri_is_decode_error() {
        let src = r#"<sparql xmlns="http://www.w3.org/2005/sparql-results#">
              <head><variable name="x"/></head>
              <results><result><binding name="x"><uri>not an iri</uri></binding></result></results>
            </sparql>"#;
        let mut rows = solutions(src);
        assert!(matches!(rows.next(), Some(Err(Error::Decode(_)))));
    }
}
