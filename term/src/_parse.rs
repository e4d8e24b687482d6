//! Parsing the textual form of terms,
//! as found in SPARQL TSV results or written by [`RdfTerm`]'s `Display`.
use crate::ns::xsd;
use crate::{BnodeId, Iri, LanguageTag, Literal, RdfTerm, TermError, TermSyntaxError};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").unwrap();
    static ref DOUBLE: Regex = Regex::new(
        r"(?x)^
          [+-]? ( [0-9]+ ( \. [0-9]* )? | \. [0-9]+ ) [eE] [+-]? [0-9]+
        $"
    )
    .unwrap();
}

impl FromStr for RdfTerm {
    type Err = TermError;

    /// Parse a single term, surrounding whitespace being ignored.
    ///
    /// Accepted forms are `<iri>`, `_:label`, quoted strings
    /// (optionally followed by `@tag` or `^^<datatype>`),
    /// and the Turtle shorthands for numbers and booleans.
    fn from_str(txt: &str) -> Result<Self, Self::Err> {
        let mut parser = TermParser { txt, pos: 0 };
        parser.skip_whitespace();
        let term = parser.term()?;
        parser.skip_whitespace();
        if parser.pos < txt.len() {
            return Err(parser.error("unexpected trailing characters").into());
        }
        Ok(term)
    }
}

struct TermParser<'a> {
    txt: &'a str,
    pos: usize,
}

impl<'a> TermParser<'a> {
    fn term(&mut self) -> Result<RdfTerm, TermError> {
        match self.peek() {
            None => Err(self.error("expected a term, found nothing").into()),
            Some('<') => Ok(RdfTerm::Iri(self.iri()?)),
            Some('_') => self.bnode(),
            Some('"') | Some('\'') => self.literal(),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.boolean(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}")).into()),
        }
    }

    fn iri(&mut self) -> Result<Iri, TermError> {
        let start = self.pos;
        self.expect('<')?;
        let mut iri = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated IRI").into()),
                Some('>') => break,
                Some('\\') => iri.push(self.uchar()?),
                Some(c) => iri.push(c),
            }
        }
        Ok(Iri::new(iri)?)
    }

    fn bnode(&mut self) -> Result<RdfTerm, TermError> {
        self.expect('_')?;
        self.expect(':')?;
        let label = self.token();
        Ok(RdfTerm::BlankNode(BnodeId::new(label)?))
    }

    fn literal(&mut self) -> Result<RdfTerm, TermError> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a quote").into());
        };
        let mut lexical = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, "unterminated string").into()),
                Some(c) if c == quote => break,
                Some('\\') => lexical.push(self.echar()?),
                Some('\n') | Some('\r') => {
                    return Err(self.error("raw line break in string").into())
                }
                Some(c) => lexical.push(c),
            }
        }
        match self.peek() {
            Some('@') => {
                self.bump();
                let tag = self.token();
                Ok(Literal::language_tagged(lexical, LanguageTag::new(tag)?).into())
            }
            Some('^') => {
                self.expect('^')?;
                self.expect('^')?;
                if self.peek() != Some('<') {
                    return Err(self.error("prefixed datatypes are not supported").into());
                }
                let datatype = self.iri()?;
                Ok(Literal::typed(lexical, datatype).into())
            }
            _ => Ok(Literal::simple(lexical).into()),
        }
    }

    fn number(&mut self) -> Result<RdfTerm, TermError> {
        let start = self.pos;
        let token = self.token();
        let datatype = if INTEGER.is_match(token) {
            xsd::INTEGER
        } else if DECIMAL.is_match(token) {
            xsd::DECIMAL
        } else if DOUBLE.is_match(token) {
            xsd::DOUBLE
        } else {
            return Err(self.error_at(start, format!("invalid number {token:?}")).into());
        };
        Ok(Literal::typed(token, Iri::new_unchecked(datatype)).into())
    }

    fn boolean(&mut self) -> Result<RdfTerm, TermError> {
        let start = self.pos;
        match self.token() {
            "true" => Ok(Literal::boolean(true).into()),
            "false" => Ok(Literal::boolean(false).into()),
            other => Err(self
                .error_at(start, format!("unexpected token {other:?}"))
                .into()),
        }
    }

    /// Decode the escape sequence following a backslash in a string.
    fn echar(&mut self) -> Result<char, TermSyntaxError> {
        match self.peek() {
            Some('t') => self.bump_as('\t'),
            Some('b') => self.bump_as('\u{08}'),
            Some('n') => self.bump_as('\n'),
            Some('r') => self.bump_as('\r'),
            Some('f') => self.bump_as('\u{0c}'),
            Some('"') => self.bump_as('"'),
            Some('\'') => self.bump_as('\''),
            Some('\\') => self.bump_as('\\'),
            _ => self.uchar(),
        }
    }

    /// Decode a `\uXXXX` or `\UXXXXXXXX` sequence (the backslash being already consumed).
    fn uchar(&mut self) -> Result<char, TermSyntaxError> {
        let start = self.pos - 1;
        let len = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(self.error_at(start, "invalid escape sequence")),
        };
        let txt = self.txt;
        let digits = txt
            .get(self.pos..self.pos + len)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error_at(start, "invalid unicode escape"))?;
        self.pos += len;
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error_at(start, "invalid unicode code point"))
    }

    /// Consume characters up to the next whitespace (or the end of the text).
    fn token(&mut self) -> &'a str {
        let txt = self.txt;
        let start = self.pos;
        let len = txt[start..]
            .find(char::is_whitespace)
            .unwrap_or(txt.len() - start);
        self.pos += len;
        &txt[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TermSyntaxError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error(format!("expected {expected:?}"))),
        }
    }

    fn peek(&self) -> Option<char> {
        self.txt[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump_as(&mut self, c: char) -> Result<char, TermSyntaxError> {
        self.bump();
        Ok(c)
    }

    fn error<T: Into<String>>(&self, message: T) -> TermSyntaxError {
        self.error_at(self.pos, message)
    }

    fn error_at<T: Into<String>>(&self, offset: usize, message: T) -> TermSyntaxError {
        TermSyntaxError {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ns::rdf;
    use test_case::test_case;

    #[test_case("<http://ex/a>"; "iri")]
    #[test_case("_:b0"; "bnode")]
    #[test_case(r#""simple""#; "simple literal")]
    #[test_case(r#""chat"@fr"#; "language string")]
    #[test_case(r#""42"^^<http://www.w3.org/2001/XMLSchema#integer>"#; "typed literal")]
    #[test_case(r#""tab\there \"quoted\" back\\slash""#; "escapes")]
    fn display_round_trip(txt: &str) {
        let term: RdfTerm = txt.parse().unwrap();
        assert_eq!(term.to_string(), txt);
    }

    #[test_case("42", xsd::INTEGER)]
    #[test_case("-7", xsd::INTEGER)]
    #[test_case("3.14", xsd::DECIMAL)]
    #[test_case("1.0e3", xsd::DOUBLE)]
    #[test_case("true", xsd::BOOLEAN)]
    fn shorthand(txt: &str, datatype: &str) {
        let term: RdfTerm = txt.parse().unwrap();
        let lit = term.as_literal().unwrap();
        assert_eq!(lit.lexical_form(), txt);
        assert_eq!(lit.datatype().as_str(), datatype);
    }

    #[test]
    fn unicode_escapes() {
        let term: RdfTerm = r#""café \U0001F600""#.parse().unwrap();
        assert_eq!(term.lexical_form(), Some("caf\u{e9} \u{1F600}"));
        let term: RdfTerm = r"<http://ex/café>".parse().unwrap();
        assert_eq!(term.value(), "http://ex/caf\u{e9}");
    }

    #[test]
    fn language_tag_datatype() {
        let term: RdfTerm = r#""hello"@en-GB"#.parse().unwrap();
        let lit = term.as_literal().unwrap();
        assert_eq!(lit.datatype().as_str(), rdf::LANG_STRING);
        assert_eq!(lit.language_tag().unwrap(), "en-gb");
    }

    #[test]
    fn surrounding_whitespace() {
        let term: RdfTerm = "  <http://ex/a> ".parse().unwrap();
        assert!(term.is_iri());
    }

    #[test_case("", 0; "empty")]
    #[test_case("<http://ex/a", 0; "unterminated iri")]
    #[test_case(r#""abc"#, 0; "unterminated string")]
    #[test_case("<http://ex/a> x", 14; "trailing")]
    #[test_case("?x", 0; "variable")]
    #[test_case(r#""a"^^xsd:string"#, 5; "prefixed datatype")]
    #[test_case("1.2.3", 0; "bad number")]
    fn syntax_error(txt: &str, offset: usize) {
        match txt.parse::<RdfTerm>() {
            Err(TermError::Syntax(err)) => assert_eq!(err.offset, offset, "{err}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_components() {
        assert!(matches!(
            "<not an iri>".parse::<RdfTerm>(),
            Err(TermError::Iri(_))
        ));
        assert!(matches!(
            "_:a,b".parse::<RdfTerm>(),
            Err(TermError::BnodeId(_))
        ));
        assert!(matches!(
            r#""x"@not_a_tag"#.parse::<RdfTerm>(),
            Err(TermError::LanguageTag(_))
        ));
    }
}
