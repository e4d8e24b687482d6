//! Parse TSV-formatted SPARQL results, one line at a time.
//!
//! See <https://www.w3.org/TR/sparql11-results-csv-tsv/#tsv>.
use super::ordered_row;
use crate::binding::BindingSet;
use crate::error::{DecodeError, Error};
use quadwire_term::{RdfTerm, TermError};
use std::io::{BufRead, ErrorKind};

pub(crate) struct TsvSolutions<R: BufRead> {
    reader: R,
    variables: Vec<String>,
    offset: u64,
    line: String,
    done: bool,
}

impl<R: BufRead> TsvSolutions<R> {
    /// Read the header line.
    pub(crate) fn open(reader: R) -> Result<Self, Error> {
        let mut tsv = TsvSolutions {
            reader,
            variables: vec![],
            offset: 0,
            line: String::new(),
            done: false,
        };
        if !tsv.read_line()? {
            return Err(DecodeError::at(0, "missing TSV header").into());
        }
        let mut variables = Vec::new();
        let mut field_offset = 0;
        // an empty header line stands for zero variables
        let fields = Some(tsv.line.as_str()).filter(|line| !line.is_empty());
        for field in fields.into_iter().flat_map(|line| line.split('\t')) {
            let Some(name) = field.strip_prefix(['?', '$']) else {
                let message = format!("invalid variable {field:?}");
                return Err(DecodeError::at(field_offset, message).into());
            };
            variables.push(name.to_string());
            field_offset += field.len() as u64 + 1;
        }
        tsv.variables = variables;
        Ok(tsv)
    }

    pub(crate) fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Read the next line (without its line terminator) into `self.line`,
    /// returning `false` at the end of the input.
    fn read_line(&mut self) -> Result<bool, Error> {
        self.line.clear();
        let start = self.offset;
        let len = self.reader.read_line(&mut self.line).map_err(|err| {
            if err.kind() == ErrorKind::InvalidData {
                DecodeError::at(start, format!("invalid TSV line: {err}")).into()
            } else {
                Error::from(err)
            }
        })?;
        if len == 0 {
            return Ok(false);
        }
        self.offset += len as u64;
        let trimmed = self.line.trim_end_matches(['\n', '\r']).len();
        self.line.truncate(trimmed);
        Ok(true)
    }

    fn next_row(&mut self) -> Result<Option<BindingSet>, Error> {
        let line_offset = self.offset;
        if !self.read_line()? {
            return Ok(None);
        }
        let fields: Vec<&str> = self.line.split('\t').collect();
        if fields.len() != self.variables.len().max(1) {
            return Err(DecodeError::at(
                line_offset,
                format!(
                    "expected {} fields, found {}",
                    self.variables.len(),
                    fields.len()
                ),
            )
            .into());
        }
        let mut raw = Vec::with_capacity(fields.len());
        let mut field_offset = line_offset;
        for (name, field) in self.variables.iter().zip(fields) {
            if !field.is_empty() {
                let term = field.parse::<RdfTerm>().map_err(|err| {
                    let offset = match &err {
                        TermError::Syntax(e) => field_offset + e.offset as u64,
                        _ => field_offset,
                    };
                    DecodeError::at(offset, format!("in ?{name}: {err}"))
                })?;
                raw.push((name.clone(), term));
            }
            field_offset += field.len() as u64 + 1;
        }
        Ok(Some(ordered_row(raw, &self.variables)))
    }
}

impl<R: BufRead> Iterator for TsvSolutions<R> {
    type Item = Result<BindingSet, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_row();
        if !matches!(res, Ok(Some(_))) {
            self.done = true;
        }
        res.transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quadwire_term::{Iri, LanguageTag, Literal};
    use std::io::Cursor;
    use test_case::test_case;

    fn parse(src: &str) -> Result<Vec<BindingSet>, Error> {
        TsvSolutions::open(Cursor::new(src))?.collect()
    }

    #[test]
    fn rows() {
        let src = "?s\t?label\t?n\r\n<http://ex/a>\t\"chat\"@fr\t42\n_:b0\t\t\n";
        let tsv = TsvSolutions::open(Cursor::new(src)).unwrap();
        assert_eq!(tsv.variables(), &["s", "label", "n"]);
        let rows: Vec<BindingSet> = tsv.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("s"), Some(&Iri::new_unchecked("http://ex/a").into()));
        assert_eq!(
            rows[0].get("label"),
            Some(&Literal::language_tagged("chat", LanguageTag::new_unchecked("fr")).into())
        );
        assert_eq!(rows[0].get("n"), Some(&Literal::integer(42).into()));
        assert_eq!(rows[1].len(), 1);
        assert!(rows[1].get("s").unwrap().is_blank_node());
    }

    #[test]
    fn single_variable_empty_line_is_unbound() {
        let rows = parse("?x\n<http://ex/a>\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_empty());
    }

    #[test]
    fn empty_header_has_no_variables() {
        let tsv = TsvSolutions::open(Cursor::new("\n\n")).unwrap();
        assert!(tsv.variables().is_empty());
        let rows: Vec<BindingSet> = tsv.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());
    }

    #[test_case("", 0; "no header")]
    #[test_case("s\n", 0; "header without sigil")]
    #[test_case("?a\t?b\n<http://ex/a>\n", 6; "missing field")]
    #[test_case("?a\t?b\n<http://ex/a>\t\"oops\n", 20; "unterminated string")]
    #[test_case("?a\n<http://ex/a>\nnot a term\n", 17; "bad term on second row")]
    fn decode_errors(src: &str, offset: u64) {
        match parse(src) {
            Err(Error::Decode(err)) => assert_eq!(err.offset, Some(offset), "{err}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8() {
        let src: &[u8] = b"?a\n\"\xff\"\n";
        let res: Result<Vec<_>, _> = TsvSolutions::open(Cursor::new(src)).unwrap().collect();
        assert!(matches!(res, Err(Error::Decode(_))));
    }
}
