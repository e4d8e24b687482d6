//! I define the [`Literal`] type.
use crate::ns::{rdf, xsd};
use crate::{quoted_string, Iri, LanguageTag};
use std::fmt;

/// An RDF [literal](https://www.w3.org/TR/rdf11-concepts/#section-Graph-Literal).
///
/// Every literal has a datatype:
/// simple literals have `xsd:string`,
/// language-tagged strings have `rdf:langString`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: Box<str>,
    datatype: Iri,
    language: Option<LanguageTag>,
}

impl Literal {
    /// A simple literal (datatype `xsd:string`).
    pub fn simple<T: Into<Box<str>>>(lexical: T) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype: Iri::new_unchecked(xsd::STRING),
            language: None,
        }
    }

    /// A literal with an explicit datatype.
    pub fn typed<T: Into<Box<str>>>(lexical: T, datatype: Iri) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype,
            language: None,
        }
    }

    /// A language-tagged string (datatype `rdf:langString`).
    pub fn language_tagged<T: Into<Box<str>>>(lexical: T, tag: LanguageTag) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype: Iri::new_unchecked(rdf::LANG_STRING),
            language: Some(tag),
        }
    }

    /// An `xsd:integer` literal.
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), Iri::new_unchecked(xsd::INTEGER))
    }

    /// An `xsd:boolean` literal.
    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), Iri::new_unchecked(xsd::BOOLEAN))
    }

    /// The lexical form of this literal.
    pub fn lexical_form(&self) -> &str {
        &self.lexical
    }

    /// The datatype of this literal.
    pub fn datatype(&self) -> &Iri {
        &self.datatype
    }

    /// The language tag of this literal, if any.
    pub fn language_tag(&self) -> Option<&LanguageTag> {
        self.language.as_ref()
    }

    /// Whether this literal is a simple literal (`xsd:string`, no language tag).
    pub fn is_simple(&self) -> bool {
        self.language.is_none() && self.datatype == xsd::STRING
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        quoted_string(f, &self.lexical)?;
        f.write_str("\"")?;
        match &self.language {
            Some(tag) => write!(f, "@{tag}"),
            None if self.is_simple() => Ok(()),
            None => write!(f, "^^<{}>", self.datatype),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple_has_xsd_string() {
        let lit = Literal::simple("v");
        assert!(lit.is_simple());
        assert_eq!(lit.datatype(), &Iri::new_unchecked(xsd::STRING));
        assert_eq!(lit.to_string(), r#""v""#);
    }

    #[test]
    fn explicit_xsd_string_equals_simple() {
        let lit = Literal::typed("v", Iri::new_unchecked(xsd::STRING));
        assert_eq!(lit, Literal::simple("v"));
    }

    #[test]
    fn tagged_has_lang_string() {
        let lit = Literal::language_tagged("chat", LanguageTag::new_unchecked("fr"));
        assert_eq!(lit.datatype(), &Iri::new_unchecked(rdf::LANG_STRING));
        assert_eq!(lit.to_string(), r#""chat"@fr"#);
    }

    #[test]
    fn typed_is_suffixed() {
        assert_eq!(
            Literal::integer(-3).to_string(),
            r#""-3"^^<http://www.w3.org/2001/XMLSchema#integer>"#
        );
        assert_eq!(
            Literal::boolean(true).to_string(),
            r#""true"^^<http://www.w3.org/2001/XMLSchema#boolean>"#
        );
    }

    #[test]
    fn lexical_form_is_escaped() {
        let lit = Literal::simple("say \"hi\"\\");
        assert_eq!(lit.to_string(), r#""say \"hi\"\\""#);
    }
}
