//! I define the [`BnodeId`] wrapper type,
//! which guarantees that the underlying `str`
//! satisfies the `BLANK_NODE_LABEL` rule in [Turtle](https://www.w3.org/TR/turtle/#grammar-production-BLANK_NODE_LABEL)
//! (without the leading `_:`).
use crate::InvalidBnodeId;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    /// A modified production of Turtle's BLANK_NODE_LABEL according to the
    /// [Turtle spec](https://www.w3.org/TR/turtle/#grammar-production-BLANK_NODE_LABEL).
    ///
    /// In contrast to the original rule this regular expression does not look
    /// for a leading `_:`. Accordingly it only checks if the label is valid.
    ///
    /// # Rule
    ///
    /// `BLANK_NODE_LABEL ::= (PN_CHARS_U | [0-9]) ((PN_CHARS | '.')* PN_CHARS)?`
    pub(crate) static ref BNODE_ID: Regex = Regex::new(r"(?x)
      ^
      [A-Za-z\u{c0}-\u{d6}\u{d8}-\u{f6}\u{f8}-\u{2ff}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\u{10000}-\u{EFFFF}_0-9]
      (
          [A-Za-z\u{c0}-\u{d6}\u{d8}-\u{f6}\u{f8}-\u{2ff}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\u{10000}-\u{EFFFF}_\u{2d}0-9\u{00B7}\u{0300}-\u{036F}\u{203F}-\u{2040}]
          |
          \u{2e} [A-Za-z\u{c0}-\u{d6}\u{d8}-\u{f6}\u{f8}-\u{2ff}\u{370}-\u{37D}\u{37F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\u{10000}-\u{EFFFF}_\u{2d}0-9\u{00B7}\u{0300}-\u{036F}\u{203F}-\u{2040}]
      )*
      $
    ").unwrap();
}

/// A blank node identifier, as returned by SPARQL endpoints.
///
/// Blank node identifiers are only meaningful within a single result document:
/// two results using the same identifier do not necessarily denote the same node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BnodeId(Box<str>);

impl BnodeId {
    /// Build a new [`BnodeId`] from `id` (without the leading `_:`),
    /// returning an error if it is not a valid label.
    pub fn new<T: Into<Box<str>>>(id: T) -> Result<Self, InvalidBnodeId> {
        let id = id.into();
        if BNODE_ID.is_match(&id) {
            Ok(BnodeId(id))
        } else {
            Err(InvalidBnodeId(id.into()))
        }
    }

    /// Build a new [`BnodeId`] from `id` without checking it.
    pub fn new_unchecked<T: Into<Box<str>>>(id: T) -> Self {
        let id = id.into();
        debug_assert!(BNODE_ID.is_match(&id), "{id}");
        BnodeId(id)
    }

    /// Gets a reference to the underlying `str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BnodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BnodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("x")]
    #[test_case("_"; "underscore")]
    #[test_case("foo_bar_baz")]
    #[test_case("hé_hé")]
    #[test_case("1")]
    #[test_case("abc42")]
    #[test_case("a.b"; "with dot")]
    #[test_case("b0-x"; "with dash")]
    fn valid(id: &str) {
        assert!(BnodeId::new(id).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case(" "; "space")]
    #[test_case("a."; "trailing dot")]
    #[test_case(".b"; "leading dot")]
    #[test_case("a,b"; "with comma")]
    #[test_case("a:b"; "with colon")]
    #[test_case("-a"; "leading dash")]
    fn invalid(id: &str) {
        assert!(BnodeId::new(id).is_err());
    }

    #[test]
    fn display_has_prefix() {
        assert_eq!(BnodeId::new_unchecked("b0").to_string(), "_:b0");
    }
}
