//! I define the [`Iri`] type,
//! which guarantees that the underlying text is a valid
//! [absolute IRI](https://www.ietf.org/rfc/rfc3987.html#section-2.2).
use crate::InvalidIri;
use std::borrow::Borrow;
use std::fmt;

/// A valid absolute IRI.
///
/// Validation is delegated to [`oxiri`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Iri(Box<str>);

impl Iri {
    /// Build a new [`Iri`] from `iri`,
    /// returning an error if it is not a valid absolute IRI.
    pub fn new<T: Into<Box<str>>>(iri: T) -> Result<Self, InvalidIri> {
        let iri = iri.into();
        match oxiri::Iri::parse(&iri[..]) {
            Ok(_) => Ok(Iri(iri)),
            Err(err) => Err(InvalidIri {
                iri: iri.into(),
                reason: err.to_string(),
            }),
        }
    }

    /// Build a new [`Iri`] from `iri` without checking it.
    ///
    /// Only use this on text that is known to be valid,
    /// e.g. constants or the output of a validating parser.
    pub fn new_unchecked<T: Into<Box<str>>>(iri: T) -> Self {
        let iri = iri.into();
        debug_assert!(oxiri::Iri::parse(&iri[..]).is_ok(), "{iri}");
        Iri(iri)
    }

    /// Gets a reference to the underlying `str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Iri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Iri {
    fn eq(&self, other: &str) -> bool {
        &self.0[..] == other
    }
}

impl PartialEq<&str> for Iri {
    fn eq(&self, other: &&str) -> bool {
        &self.0[..] == *other
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Iri {
    type Error = InvalidIri;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Iri::new(value)
    }
}

impl TryFrom<&str> for Iri {
    type Error = InvalidIri;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Iri::new(value)
    }
}

impl From<Iri> for String {
    fn from(value: Iri) -> Self {
        value.0.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("http://example.org/"; "http")]
    #[test_case("tag:a"; "tag")]
    #[test_case("urn:isbn:0451450523"; "urn")]
    #[test_case("http://example.org/#frag"; "fragment")]
    #[test_case("http://www.w3.org/2001/XMLSchema#string"; "xsd")]
    #[test_case("http://example.org/caf\u{e9}"; "non ascii")]
    fn valid(txt: &str) {
        assert!(Iri::new(txt).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case("foo"; "relative")]
    #[test_case("../foo"; "relative path")]
    #[test_case("#frag"; "fragment only")]
    #[test_case("http://example.org/a b"; "space")]
    #[test_case("http://example.org/<"; "angle bracket")]
    fn invalid(txt: &str) {
        assert!(Iri::new(txt).is_err());
    }

    #[test]
    fn error_keeps_text() {
        let err = Iri::new("not an iri").unwrap_err();
        assert_eq!(err.iri, "not an iri");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_validates() {
        let iri: Iri = serde_json::from_str(r#""http://example.org/""#).unwrap();
        assert_eq!(iri, "http://example.org/");
        assert!(serde_json::from_str::<Iri>(r#""nope""#).is_err());
    }
}
