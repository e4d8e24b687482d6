//! I define [`BindingSet`],
//! an ordered mapping from SPARQL variables to [`RdfTerm`]s.
//!
//! Binding sets are used both ways:
//! to pass values to a query or update,
//! and to represent each solution of a `SELECT` query.
use crate::error::{DuplicateBindingError, Error};
use lazy_static::lazy_static;
use quadwire_term::RdfTerm;
use regex::Regex;
use std::fmt::Write;

lazy_static! {
    /// Production of SPARQL's VARNAME according to the
    /// [SPARQL spec](https://www.w3.org/TR/sparql11-query/#rVARNAME).
    ///
    /// # Rule
    ///
    /// `VARNAME ::= ( PN_CHARS_U | [0-9] ) ( PN_CHARS_U | [0-9] | #x00B7 | [#x0300-#x036F] | [#x203F-#x2040] )*`
    static ref VARNAME: Regex = Regex::new(r#"(?x)
      ^
      [_A-Za-z0-9\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{10000}-\U{EFFFF}]
      [_A-Za-z0-9\u{B7}\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{300}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{203F}-\u{2040}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{10000}-\U{EFFFF}]*
      $
    "#).unwrap();
}

/// An ordered mapping from variable names to [`RdfTerm`]s.
///
/// Variables are kept in insertion order, and can not be bound twice.
/// Names are stored without their leading `?` or `$`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingSet {
    entries: Vec<(Box<str>, RdfTerm)>,
}

impl BindingSet {
    /// An empty [`BindingSet`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind variable `name` to `term`.
    ///
    /// `name` may start with `?` or `$`, which is ignored.
    ///
    /// # Errors
    /// [`Error::InvalidVariable`] if `name` is not a valid SPARQL variable name,
    /// [`Error::DuplicateBinding`] if it is already bound.
    /// In both cases, the set is left unchanged.
    pub fn bind(&mut self, name: &str, term: RdfTerm) -> Result<(), Error> {
        let name = check_name(name)?;
        if self.get(name).is_some() {
            return Err(DuplicateBindingError(name.to_string()).into());
        }
        self.entries.push((name.into(), term));
        Ok(())
    }

    /// Chainable version of [`bind`](Self::bind).
    pub fn with(mut self, name: &str, term: RdfTerm) -> Result<Self, Error> {
        self.bind(name, term)?;
        Ok(self)
    }

    /// The term bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&RdfTerm> {
        let name = strip_sigil(name);
        self.entries
            .iter()
            .find(|(n, _)| &n[..] == name)
            .map(|(_, t)| t)
    }

    /// The number of bound variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (name, term) pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RdfTerm)> {
        self.entries.iter().map(|(n, t)| (&n[..], t))
    }

    /// The bound variables, in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| &n[..])
    }

    /// Serialize this set into the textual form sent over the wire:
    /// one entry per variable, in insertion order,
    /// each term in its SPARQL syntax.
    pub fn serialize(&self) -> WireBindings {
        self.entries
            .iter()
            .map(|(name, term)| WireBinding {
                name: name.to_string(),
                value: term.to_string(),
            })
            .collect()
    }

    /// Render this set as a one-row SPARQL `VALUES` block,
    /// or `None` if it is empty.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if a blank node is bound,
    /// as SPARQL data blocks can not contain blank nodes.
    pub fn values_clause(&self) -> Result<Option<String>, Error> {
        if self.is_empty() {
            return Ok(None);
        }
        if let Some((name, _)) = self.entries.iter().find(|(_, t)| t.is_blank_node()) {
            return Err(Error::Unsupported(format!(
                "variable ?{name} is bound to a blank node, which can not be sent in a VALUES block"
            )));
        }
        let mut clause = String::from("VALUES (");
        for (i, name) in self.variables().enumerate() {
            if i > 0 {
                clause.push(' ');
            }
            clause.push('?');
            clause.push_str(name);
        }
        clause.push_str(") { (");
        for (i, (_, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                clause.push(' ');
            }
            // writing into a String can not fail
            let _ = write!(clause, "{term}");
        }
        clause.push_str(") }");
        Ok(Some(clause))
    }

    /// Insert a binding decoded from a result row;
    /// duplicates are resolved in favour of the first value.
    pub(crate) fn insert_decoded(&mut self, name: &str, term: RdfTerm) {
        if self.get(name).is_none() {
            self.entries.push((name.into(), term));
        }
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = (&'a str, &'a RdfTerm);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a RdfTerm)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// The wire form of a [`BindingSet`], see [`BindingSet::serialize`].
pub type WireBindings = Vec<WireBinding>;

/// One entry of [`WireBindings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireBinding {
    /// The variable name, without `?`
    pub name: String,
    /// The SPARQL syntax of the bound term
    pub value: String,
}

fn strip_sigil(name: &str) -> &str {
    name.strip_prefix(['?', '$']).unwrap_or(name)
}

fn check_name(name: &str) -> Result<&str, Error> {
    let stripped = strip_sigil(name);
    if VARNAME.is_match(stripped) {
        Ok(stripped)
    } else {
        Err(Error::InvalidVariable(name.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quadwire_term::{BnodeId, Iri, LanguageTag, Literal};
    use test_case::test_case;

    fn iri(txt: &str) -> RdfTerm {
        Iri::new_unchecked(txt).into()
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut bs = BindingSet::new();
        bs.bind("z", iri("http://ex/z")).unwrap();
        bs.bind("?a", RdfTerm::literal("a")).unwrap();
        bs.bind("$m", Literal::integer(3).into()).unwrap();
        assert_eq!(bs.variables().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        let wire = bs.serialize();
        assert_eq!(
            wire,
            vec![
                WireBinding {
                    name: "z".into(),
                    value: "<http://ex/z>".into()
                },
                WireBinding {
                    name: "a".into(),
                    value: r#""a""#.into()
                },
                WireBinding {
                    name: "m".into(),
                    value: r#""3"^^<http://www.w3.org/2001/XMLSchema#integer>"#.into()
                },
            ]
        );
    }

    #[test_case("x", "x"; "plain")]
    #[test_case("x", "?x"; "question mark")]
    #[test_case("?x", "$x"; "dollar")]
    fn duplicate_leaves_set_unchanged(first: &str, second: &str) {
        let mut bs = BindingSet::new();
        bs.bind(first, RdfTerm::literal("1")).unwrap();
        let before = bs.clone();
        let err = bs.bind(second, RdfTerm::literal("2")).unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding(DuplicateBindingError(ref n)) if n == "x"));
        assert_eq!(bs, before);
        assert_eq!(bs.get("x"), Some(&RdfTerm::literal("1")));
    }

    #[test_case(""; "empty")]
    #[test_case("?"; "sigil only")]
    #[test_case("a b"; "space")]
    #[test_case("a-b"; "hyphen")]
    fn invalid_names(name: &str) {
        let mut bs = BindingSet::new();
        assert!(matches!(
            bs.bind(name, RdfTerm::literal("v")),
            Err(Error::InvalidVariable(_))
        ));
        assert!(bs.is_empty());
    }

    #[test]
    fn literals_are_escaped() {
        let bs = BindingSet::new()
            .with("s", RdfTerm::literal("say \"hi\"\n"))
            .unwrap();
        assert_eq!(bs.serialize()[0].value, r#""say \"hi\"\n""#);
    }

    #[test]
    fn values_clause() {
        assert_eq!(BindingSet::new().values_clause().unwrap(), None);
        let bs = BindingSet::new()
            .with("s", iri("http://ex/a"))
            .unwrap()
            .with(
                "o",
                Literal::language_tagged("chat", LanguageTag::new_unchecked("fr")).into(),
            )
            .unwrap();
        assert_eq!(
            bs.values_clause().unwrap().unwrap(),
            r#"VALUES (?s ?o) { (<http://ex/a> "chat"@fr) }"#
        );
    }

    #[test]
    fn values_clause_rejects_bnodes() {
        let bs = BindingSet::new()
            .with("b", BnodeId::new_unchecked("b0").into())
            .unwrap();
        assert!(matches!(bs.values_clause(), Err(Error::Unsupported(_))));
        // the wire form itself is fine
        assert_eq!(bs.serialize()[0].value, "_:b0");
    }
}
