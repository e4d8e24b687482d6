use thiserror::Error;

/// This error is raised when trying to build an [`Iri`](crate::Iri) from an invalid string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("The given IRI '{iri}' is not a valid absolute IRI: {reason}")]
pub struct InvalidIri {
    /// The rejected text
    pub iri: String,
    /// Why it was rejected
    pub reason: String,
}

/// This error is raised when trying to parse an invalid blank node identifier.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("The given blank node identifier '{0}' does not comply with Turtle's BLANK_NODE_LABEL")]
pub struct InvalidBnodeId(pub String);

/// This error is raised when trying to parse an invalid language tag.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("The given language tag '{0}' does not comply with BCP47")]
pub struct InvalidLanguageTag(pub String);

/// This error is raised when the textual form of a term can not be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid term syntax at byte {offset}: {message}")]
pub struct TermSyntaxError {
    /// Byte offset of the offending character in the parsed text
    pub offset: usize,
    /// Description of the problem
    pub message: String,
}

/// Any error raised while building an [`RdfTerm`](crate::RdfTerm).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TermError {
    /// See [`InvalidIri`]
    #[error(transparent)]
    Iri(#[from] InvalidIri),
    /// See [`InvalidBnodeId`]
    #[error(transparent)]
    BnodeId(#[from] InvalidBnodeId),
    /// See [`InvalidLanguageTag`]
    #[error(transparent)]
    LanguageTag(#[from] InvalidLanguageTag),
    /// See [`TermSyntaxError`]
    #[error(transparent)]
    Syntax(#[from] TermSyntaxError),
}
