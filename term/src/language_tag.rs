//! I define the [`LanguageTag`] wrapper type,
//! which guarantees that the underlying `str`
//! is a valid [BCP47](https://tools.ietf.org/search/bcp47) language tag.

use crate::InvalidLanguageTag;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

lazy_static! {
    pub(crate) static ref LANG_TAG: Regex = Regex::new(LANG_TAG_SRC).unwrap();
}

/// This wrapper guarantees that the underlying `str`
/// is a valid [BCP47](https://tools.ietf.org/search/bcp47) language tag.
///
/// NB: it is actually slightly more permissive than BCP47,
/// as it does not check that the different subtags are registered (language, country...) codes.
///
/// Comparison, ordering and hashing are ASCII-case-insensitive,
/// but the original spelling is preserved for display.
#[derive(Clone, Debug)]
pub struct LanguageTag(Box<str>);

impl LanguageTag {
    /// Build a new [`LanguageTag`] from `tag`,
    /// returning an error if it is not a valid BCP47 language tag.
    pub fn new<T: Into<Box<str>>>(tag: T) -> Result<Self, InvalidLanguageTag> {
        let tag = tag.into();
        if LANG_TAG.is_match(&tag) {
            Ok(LanguageTag(tag))
        } else {
            Err(InvalidLanguageTag(tag.into()))
        }
    }

    /// Build a new [`LanguageTag`] from `tag` without checking it.
    pub fn new_unchecked<T: Into<Box<str>>>(tag: T) -> Self {
        let tag = tag.into();
        debug_assert!(LANG_TAG.is_match(&tag), "{tag}");
        LanguageTag(tag)
    }

    /// Gets a reference to the underlying `str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LanguageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for LanguageTag {
    fn eq(&self, other: &LanguageTag) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl PartialEq<str> for LanguageTag {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Eq for LanguageTag {}

impl PartialOrd for LanguageTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageTag {
    fn cmp(&self, other: &LanguageTag) -> Ordering {
        let iter1 = self.0.chars().map(|c| c.to_ascii_lowercase());
        let iter2 = other.0.chars().map(|c| c.to_ascii_lowercase());
        iter1.cmp(iter2)
    }
}

impl Hash for LanguageTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .for_each(|c| c.hash(state));
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match a valid BCP47 language tag
pub static LANG_TAG_SRC: &str = r"(?xi-u)^
(
  (?:
    (?: #language
      (?:
        [A-Z]{2,3}
        (?: #extlang
          (?:
            -[A-Z]{3}
          ){0,3}
        )
      )
    |
      [A-Z]{4,8}
    )
    (?: #script
      -[A-Z]{4}
    )?
    (?: #region
      -
      (?:
        [A-Z]{2}
      |
        [0-9]{3}
      )
    )?
    (?: #variant
      -
      (?:
        [A-Z0-9]{5,8}
      |
        [0-9][A-Z0-9]{3}
      )
    )*
    (?: #extension
      -[0-9A-WY-Z]
      (?:
        -[A-Z0-9]{2,8}
      )+
    )*
    (?: #privateUse
      -X
      (?:
        -[A-Z0-9]{1,8}
      )+
    )?
  )
|
  (?: #privateUse
    X
    (?:
      -[A-Z0-9]{1,8}
    )+
  )
|
  (?: #grandfathered
    en-GB-oed|i-ami|i-bnn|i-default|i-enochian|i-hak|i-klingon|i-lux|i-mingo|i-navajo|i-pwn|i-tao|i-tay|i-tsu|sgn-BE-FR|sgn-BE-NL|sgn-CH-DE
  )
)$";

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("en")]
    #[test_case("fr-CA")]
    #[test_case("zh-Hant-TW")]
    #[test_case("de-CH-1996")]
    #[test_case("x-private")]
    #[test_case("i-klingon")]
    fn valid(tag: &str) {
        assert!(LanguageTag::new(tag).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case("e"; "too short")]
    #[test_case("en_US"; "underscore")]
    #[test_case("en-"; "trailing dash")]
    #[test_case("abcdefghi"; "too long")]
    fn invalid(tag: &str) {
        assert!(LanguageTag::new(tag).is_err());
    }

    #[test_case("fr", "FR"; "language_differ")]
    #[test_case("en-us", "en-US"; "country_differ")]
    fn case_insensitive_eq(tag1: &str, tag2: &str) {
        let ltag1 = LanguageTag::new_unchecked(tag1);
        let ltag2 = LanguageTag::new_unchecked(tag2);
        assert_eq!(ltag1, ltag2);
        assert!(ltag1 == *tag2);
        let set: HashSet<_> = [ltag1, ltag2].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_preserves_case() {
        assert_eq!(LanguageTag::new_unchecked("en-US").to_string(), "en-US");
    }
}
