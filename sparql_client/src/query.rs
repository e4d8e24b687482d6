//! I define [`QueryRequest`],
//! and the functions turning it into the text and parameters sent to the endpoint.
use crate::binding::BindingSet;
use crate::config::{BindingStrategy, ClientConfig, PaginationStrategy};
use crate::error::Error;
use crate::transaction::TransactionHandle;
use quadwire_term::{Iri, RdfTerm};

/// Prepend a `BASE` declaration to `template`, if `base` is provided.
///
/// The template itself is left untouched.
pub fn build_query(template: &str, base: Option<&Iri>) -> String {
    match base {
        None => template.to_string(),
        Some(base) => format!("BASE <{base}>\n{template}"),
    }
}

/// A page of solutions: skip `offset` solutions, then return at most `limit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// Number of solutions to skip
    pub offset: u64,
    /// Maximum number of solutions to return
    pub limit: u64,
}

/// Whether a request is a query or an update;
/// they do not accept the same parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// `SELECT`, `ASK`, `DESCRIBE`, `CONSTRUCT`
    Query,
    /// SPARQL Update
    Update,
}

/// A query or update, with everything needed to send it.
///
/// It is built by value:
/// ```
/// # use quadwire_sparql_client::QueryRequest;
/// # use quadwire_term::RdfTerm;
/// # fn main() -> Result<(), quadwire_sparql_client::Error> {
/// let request = QueryRequest::new("SELECT ?o WHERE { ?s <http://ex/p> ?o }")
///     .with_base("http://ex/")?
///     .bind("s", RdfTerm::iri("http://ex/a")?)?
///     .paginate(0, 10);
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct QueryRequest<'t> {
    query_text: String,
    bindings: BindingSet,
    base_iri: Option<Iri>,
    include_inferred: bool,
    transaction: Option<&'t TransactionHandle>,
    pagination: Option<Pagination>,
    default_graphs: Vec<Iri>,
    named_graphs: Vec<Iri>,
}

impl<'t> QueryRequest<'t> {
    /// A request for `query_text`, with no binding,
    /// auto-committed, and including inferred statements.
    pub fn new<T: Into<String>>(query_text: T) -> Self {
        QueryRequest {
            query_text: query_text.into(),
            bindings: BindingSet::new(),
            base_iri: None,
            include_inferred: true,
            transaction: None,
            pagination: None,
            default_graphs: vec![],
            named_graphs: vec![],
        }
    }

    /// Resolve relative IRIs of the query against `base`.
    ///
    /// # Errors
    /// [`Error::InvalidTerm`] if `base` is not a valid absolute IRI.
    pub fn with_base(self, base: &str) -> Result<Self, Error> {
        Ok(self.with_base_iri(Iri::new(base)?))
    }

    /// Resolve relative IRIs of the query against `base`.
    #[must_use]
    pub fn with_base_iri(mut self, base: Iri) -> Self {
        self.base_iri = Some(base);
        self
    }

    /// Bind variable `name` to `term`, see [`BindingSet::bind`].
    pub fn bind(mut self, name: &str, term: RdfTerm) -> Result<Self, Error> {
        self.bindings.bind(name, term)?;
        Ok(self)
    }

    /// Replace all the bindings of this request.
    #[must_use]
    pub fn with_bindings(mut self, bindings: BindingSet) -> Self {
        self.bindings = bindings;
        self
    }

    /// Only return `limit` solutions, after skipping `offset` solutions.
    #[must_use]
    pub fn paginate(mut self, offset: u64, limit: u64) -> Self {
        self.pagination = Some(Pagination { offset, limit });
        self
    }

    /// Whether statements inferred by the server should be considered.
    ///
    /// Only sent if the client is configured with an
    /// [inference parameter](ClientConfig::with_inference_parameter).
    #[must_use]
    pub fn include_inferred(mut self, include: bool) -> Self {
        self.include_inferred = include;
        self
    }

    /// Run this request inside `transaction`.
    #[must_use]
    pub fn in_transaction(self, transaction: &'t TransactionHandle) -> Self {
        self.with_transaction(Some(transaction))
    }

    /// Run this request inside `transaction`, if any.
    #[must_use]
    pub fn with_transaction(mut self, transaction: Option<&'t TransactionHandle>) -> Self {
        self.transaction = transaction;
        self
    }

    /// Add a graph to the default graph of the dataset.
    #[must_use]
    pub fn with_default_graph(mut self, graph: Iri) -> Self {
        self.default_graphs.push(graph);
        self
    }

    /// Add a named graph to the dataset.
    #[must_use]
    pub fn with_named_graph(mut self, graph: Iri) -> Self {
        self.named_graphs.push(graph);
        self
    }

    /// The query text, as provided.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// The bindings of this request.
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// The base IRI of this request.
    pub fn base_iri(&self) -> Option<&Iri> {
        self.base_iri.as_ref()
    }

    /// Whether inferred statements should be considered.
    pub fn includes_inferred(&self) -> bool {
        self.include_inferred
    }

    /// The transaction of this request.
    pub fn transaction(&self) -> Option<&'t TransactionHandle> {
        self.transaction
    }

    /// The pagination of this request.
    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Produce the final text and parameters of this request,
    /// as configured by `config`.
    pub fn render(
        &self,
        config: &ClientConfig,
        kind: RequestKind,
    ) -> Result<RenderedRequest, Error> {
        let mut text = build_query(&self.query_text, self.base_iri.as_ref());
        let mut params = vec![];

        if let Some(Pagination { offset, limit }) = self.pagination {
            if kind == RequestKind::Update {
                return Err(Error::Unsupported("updates can not be paginated".into()));
            }
            match config.pagination_strategy() {
                PaginationStrategy::SolutionModifiers => {
                    text.push_str(&format!("\nOFFSET {offset}\nLIMIT {limit}"));
                }
                PaginationStrategy::Parameters {
                    offset: offset_param,
                    limit: limit_param,
                } => {
                    params.push((offset_param.clone(), offset.to_string()));
                    params.push((limit_param.clone(), limit.to_string()));
                }
            }
        }

        for (name, term) in self.bindings.iter() {
            log::trace!("binding ?{name} = {term}");
        }
        match config.binding_strategy() {
            BindingStrategy::ValuesClause => {
                if kind == RequestKind::Update && !self.bindings.is_empty() {
                    return Err(Error::Unsupported(
                        "bindings can not be sent with an update as a VALUES block; configure BindingStrategy::Parameters".into(),
                    ));
                }
                if let Some(values) = self.bindings.values_clause()? {
                    text.push('\n');
                    text.push_str(&values);
                }
            }
            BindingStrategy::Parameters { prefix } => {
                params.extend(
                    self.bindings
                        .serialize()
                        .into_iter()
                        .map(|wb| (format!("{prefix}{}", wb.name), wb.value)),
                );
            }
        }

        let (default_param, named_param) = match kind {
            RequestKind::Query => ("default-graph-uri", "named-graph-uri"),
            RequestKind::Update => ("using-graph-uri", "using-named-graph-uri"),
        };
        for graph in &self.default_graphs {
            params.push((default_param.to_string(), graph.to_string()));
        }
        for graph in &self.named_graphs {
            params.push((named_param.to_string(), graph.to_string()));
        }

        if let Some(name) = config.inference_parameter() {
            let value = if self.include_inferred {
                "include"
            } else {
                "exclude"
            };
            params.push((name.to_string(), value.to_string()));
        }

        params.extend(config.extra_parameters().iter().cloned());
        log::trace!("rendered {kind:?}:\n{text}");
        Ok(RenderedRequest { text, params })
    }
}

impl From<&str> for QueryRequest<'_> {
    fn from(query_text: &str) -> Self {
        QueryRequest::new(query_text)
    }
}

/// The output of [`QueryRequest::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRequest {
    /// The final query or update text
    pub text: String,
    /// Additional request parameters, in order
    pub params: Vec<(String, String)>,
}

#[cfg(test)]
mod test {
    use super::*;
    use quadwire_term::Literal;
    use test_case::test_case;

    const Q: &str = "SELECT ?s WHERE { ?s ?p ?o }";

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost/sparql")
    }

    fn iri(txt: &str) -> Iri {
        Iri::new_unchecked(txt)
    }

    #[test_case(Q; "select")]
    #[test_case("  PREFIX : <http://ex/>\nASK { :a ?p ?o }"; "leading whitespace")]
    #[test_case(""; "empty")]
    fn base_is_prepended_once(template: &str) {
        let base = iri("http://ex/base/");
        let got = build_query(template, Some(&base));
        assert_eq!(got.matches("BASE <").count(), 1);
        assert_eq!(got.strip_prefix("BASE <http://ex/base/>\n"), Some(template));
        assert_eq!(build_query(template, None), template);
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(matches!(
            QueryRequest::new(Q).with_base("not absolute"),
            Err(Error::InvalidTerm(_))
        ));
    }

    #[test]
    fn plain_render() {
        let got = QueryRequest::new(Q)
            .render(&config(), RequestKind::Query)
            .unwrap();
        assert_eq!(got.text, Q);
        assert!(got.params.is_empty());
    }

    #[test]
    fn values_and_modifiers() {
        let got = QueryRequest::new(Q)
            .with_base("http://ex/")
            .unwrap()
            .bind("p", iri("http://ex/p").into())
            .unwrap()
            .paginate(20, 10)
            .render(&config(), RequestKind::Query)
            .unwrap();
        assert_eq!(
            got.text,
            format!("BASE <http://ex/>\n{Q}\nOFFSET 20\nLIMIT 10\nVALUES (?p) {{ (<http://ex/p>) }}")
        );
        assert!(got.params.is_empty());
    }

    #[test]
    fn parameter_strategies() {
        let config = config()
            .with_binding_strategy(BindingStrategy::Parameters {
                prefix: "bind:".into(),
            })
            .with_pagination_strategy(PaginationStrategy::Parameters {
                offset: "start".into(),
                limit: "pageLength".into(),
            });
        let got = QueryRequest::new(Q)
            .bind("o", Literal::integer(5).into())
            .unwrap()
            .paginate(0, 3)
            .render(&config, RequestKind::Query)
            .unwrap();
        assert_eq!(got.text, Q);
        assert_eq!(
            got.params,
            vec![
                ("start".to_string(), "0".to_string()),
                ("pageLength".to_string(), "3".to_string()),
                (
                    "bind:o".to_string(),
                    r#""5"^^<http://www.w3.org/2001/XMLSchema#integer>"#.to_string()
                ),
            ]
        );
    }

    #[test]
    fn update_with_values_is_unsupported() {
        let req = QueryRequest::new("DELETE WHERE { ?s ?p ?o }")
            .bind("s", iri("http://ex/a").into())
            .unwrap();
        assert!(matches!(
            req.render(&config(), RequestKind::Update),
            Err(Error::Unsupported(_))
        ));
        let req = QueryRequest::new("CLEAR ALL").paginate(0, 1);
        assert!(matches!(
            req.render(&config(), RequestKind::Update),
            Err(Error::Unsupported(_))
        ));
    }

    #[test_case(RequestKind::Query, "default-graph-uri", "named-graph-uri")]
    #[test_case(RequestKind::Update, "using-graph-uri", "using-named-graph-uri")]
    fn dataset_inference_and_extra(kind: RequestKind, default: &str, named: &str) {
        let config = config()
            .with_inference_parameter("infer")
            .with_extra_parameter("ruleset", "rdfs");
        let got = QueryRequest::new(Q)
            .with_default_graph(iri("http://ex/g1"))
            .with_named_graph(iri("http://ex/g2"))
            .include_inferred(false)
            .render(&config, kind)
            .unwrap();
        assert_eq!(
            got.params,
            vec![
                (default.to_string(), "http://ex/g1".to_string()),
                (named.to_string(), "http://ex/g2".to_string()),
                ("infer".to_string(), "exclude".to_string()),
                ("ruleset".to_string(), "rdfs".to_string()),
            ]
        );
    }
}
