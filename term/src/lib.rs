//! This crate is part of quadwire,
//! a client for the [SPARQL 1.1 protocol].
//!
//! It defines [`RdfTerm`], the value type exchanged with SPARQL endpoints,
//! together with validated wrappers for its components
//! ([`Iri`], [`BnodeId`], [`LanguageTag`], [`Literal`]).
//!
//! Terms are written and read in the syntax shared by SPARQL and N-Triples:
//!
//! ```
//! use quadwire_term::{Literal, RdfTerm};
//!
//! let term: RdfTerm = r#""chat"@fr"#.parse().unwrap();
//! assert_eq!(term.lexical_form(), Some("chat"));
//! assert_eq!(term.to_string(), r#""chat"@fr"#);
//!
//! let answer = RdfTerm::from(Literal::integer(42));
//! assert_eq!(
//!     answer.to_string(),
//!     r#""42"^^<http://www.w3.org/2001/XMLSchema#integer>"#
//! );
//! ```
//!
//! [SPARQL 1.1 protocol]: https://www.w3.org/TR/sparql11-protocol/
#![deny(missing_docs)]

mod _display;
pub use _display::quoted_string;
mod _error;
pub use _error::*;
mod _parse;
mod _term;
pub use _term::*;
pub mod bnode_id;
pub use bnode_id::BnodeId;
pub mod iri;
pub use iri::Iri;
pub mod language_tag;
pub use language_tag::LanguageTag;
pub mod literal;
pub use literal::Literal;
pub mod ns;
