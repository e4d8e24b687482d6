//! IRIs of the standard vocabularies needed to handle literals.

/// The standard `xsd:` namespace.
pub mod xsd {
    /// The namespace IRI
    pub const PREFIX: &str = "http://www.w3.org/2001/XMLSchema#";
    /// `xsd:string`, the datatype of simple literals
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:boolean`
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:integer`
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:decimal`
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    /// `xsd:double`
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `xsd:dateTime`
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// The standard `rdf:` namespace.
pub mod rdf {
    /// The namespace IRI
    pub const PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// `rdf:langString`, the datatype of language-tagged strings
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    /// `rdf:type`
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}
