//! Per-client configuration.
//!
//! A [`ClientConfig`] is built once, either with its `with_*` methods,
//! deserialized (e.g. from JSON) or read from the environment,
//! and is immutable afterwards.
use crate::error::Error;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Name of the environment variable holding the query endpoint URL.
pub const ENV_ENDPOINT: &str = "QUADWIRE_ENDPOINT";
/// Name of the environment variable holding the update endpoint URL.
pub const ENV_UPDATE_ENDPOINT: &str = "QUADWIRE_UPDATE_ENDPOINT";
/// Name of the environment variable holding the graph store endpoint URL.
pub const ENV_GRAPH_STORE_ENDPOINT: &str = "QUADWIRE_GRAPH_STORE_ENDPOINT";
/// Name of the environment variable holding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "QUADWIRE_TIMEOUT_SECS";

/// The configuration of a [`SparqlClient`](crate::SparqlClient).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    query_endpoint: String,
    #[serde(default)]
    update_endpoint: Option<String>,
    #[serde(default)]
    graph_store_endpoint: Option<String>,
    #[serde(default)]
    query_method: QueryMethod,
    #[serde(default)]
    accept: AcceptConfig,
    #[serde(default)]
    binding_strategy: BindingStrategy,
    #[serde(default)]
    pagination_strategy: PaginationStrategy,
    #[serde(default)]
    inference_parameter: Option<String>,
    #[serde(default)]
    extra_parameters: Vec<(String, String)>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    credentials: Option<Credentials>,
    #[serde(default)]
    transactions: TransactionConfig,
    #[serde(default)]
    user_agent: Option<String>,
}

impl ClientConfig {
    /// The default `User-Agent` header.
    pub const DEFAULT_USER_AGENT: &'static str = "quadwire SPARQL client";

    /// A configuration with default settings for the given query endpoint.
    ///
    /// Updates are sent to the same endpoint unless
    /// [`with_update_endpoint`](Self::with_update_endpoint) is used.
    pub fn new<T: Into<String>>(query_endpoint: T) -> Self {
        ClientConfig {
            query_endpoint: query_endpoint.into(),
            update_endpoint: None,
            graph_store_endpoint: None,
            query_method: QueryMethod::default(),
            accept: AcceptConfig::default(),
            binding_strategy: BindingStrategy::default(),
            pagination_strategy: PaginationStrategy::default(),
            inference_parameter: None,
            extra_parameters: vec![],
            timeout_ms: None,
            credentials: None,
            transactions: TransactionConfig::default(),
            user_agent: None,
        }
    }

    /// Read the configuration from the `QUADWIRE_*` environment variables.
    ///
    /// `QUADWIRE_ENDPOINT` is required;
    /// `QUADWIRE_UPDATE_ENDPOINT`, `QUADWIRE_GRAPH_STORE_ENDPOINT`
    /// and `QUADWIRE_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars<F>(var: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = var(ENV_ENDPOINT)
            .ok_or_else(|| Error::Config(format!("{ENV_ENDPOINT} is not set")))?;
        let mut config = ClientConfig::new(endpoint);
        config.update_endpoint = var(ENV_UPDATE_ENDPOINT);
        config.graph_store_endpoint = var(ENV_GRAPH_STORE_ENDPOINT);
        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let timeout = secs
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|n| Duration::try_from_secs_f64(n).ok())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{ENV_TIMEOUT_SECS} is not a number of seconds: {secs:?}"
                    ))
                })?;
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }

    /// Check that every configured endpoint is a valid absolute URL.
    pub fn validate(&self) -> Result<(), Error> {
        let endpoints = [
            Some(&self.query_endpoint),
            self.update_endpoint.as_ref(),
            self.graph_store_endpoint.as_ref(),
            self.transaction_endpoint(),
        ];
        for url in endpoints.into_iter().flatten() {
            reqwest::Url::parse(url)
                .map_err(|err| Error::Config(format!("invalid endpoint URL {url:?}: {err}")))?;
        }
        Ok(())
    }

    /// Send updates to `endpoint` rather than to the query endpoint.
    #[must_use]
    pub fn with_update_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.update_endpoint = Some(endpoint.into());
        self
    }

    /// Enable Graph Store operations on `endpoint`.
    #[must_use]
    pub fn with_graph_store_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.graph_store_endpoint = Some(endpoint.into());
        self
    }

    /// Choose how queries are sent.
    #[must_use]
    pub fn with_query_method(mut self, method: QueryMethod) -> Self {
        self.query_method = method;
        self
    }

    /// Replace the [Accept HTTP headers](https://tools.ietf.org/html/rfc7231.html#section-5.3.2) used by this client.
    ///
    /// This might be useful if the endpoint implements content-negotiation incorrectly.
    #[must_use]
    pub fn with_accept(mut self, accept: AcceptConfig) -> Self {
        self.accept = accept;
        self
    }

    /// Choose how bindings are sent.
    #[must_use]
    pub fn with_binding_strategy(mut self, strategy: BindingStrategy) -> Self {
        self.binding_strategy = strategy;
        self
    }

    /// Choose how pagination is sent.
    #[must_use]
    pub fn with_pagination_strategy(mut self, strategy: PaginationStrategy) -> Self {
        self.pagination_strategy = strategy;
        self
    }

    /// Send the `include_inferred` flag of each request as parameter `name`,
    /// with value `include` or `exclude`.
    #[must_use]
    pub fn with_inference_parameter<T: Into<String>>(mut self, name: T) -> Self {
        self.inference_parameter = Some(name.into());
        self
    }

    /// Add a parameter sent verbatim with every query and update
    /// (e.g. a vendor-specific ruleset).
    #[must_use]
    pub fn with_extra_parameter<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> Self {
        self.extra_parameters.push((name.into(), value.into()));
        self
    }

    /// Abort any request that takes longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Authenticate every request with `credentials`.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use the REST transaction protocol, see [`RestTransactions`](crate::RestTransactions).
    #[must_use]
    pub fn with_rest_transactions<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.transactions = TransactionConfig::Rest {
            endpoint: endpoint.into(),
            parameter: default_transaction_parameter(),
        };
        self
    }

    /// Replace the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent<T: Into<String>>(mut self, user_agent: T) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// The URL queries are sent to.
    pub fn query_endpoint(&self) -> &str {
        &self.query_endpoint
    }

    /// The URL updates are sent to.
    pub fn update_endpoint(&self) -> &str {
        self.update_endpoint
            .as_deref()
            .unwrap_or(&self.query_endpoint)
    }

    /// The URL of the graph store.
    ///
    /// # Errors
    /// [`Error::Config`] if no graph store endpoint is configured.
    pub fn graph_store_endpoint(&self) -> Result<&str, Error> {
        self.graph_store_endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("no graph store endpoint configured".into()))
    }

    /// How queries are sent.
    pub fn query_method(&self) -> QueryMethod {
        self.query_method
    }

    /// The Accept headers.
    pub fn accept(&self) -> &AcceptConfig {
        &self.accept
    }

    /// How bindings are sent.
    pub fn binding_strategy(&self) -> &BindingStrategy {
        &self.binding_strategy
    }

    /// How pagination is sent.
    pub fn pagination_strategy(&self) -> &PaginationStrategy {
        &self.pagination_strategy
    }

    /// The parameter carrying the `include_inferred` flag, if any.
    pub fn inference_parameter(&self) -> Option<&str> {
        self.inference_parameter.as_deref()
    }

    /// Parameters sent verbatim with every query and update.
    pub fn extra_parameters(&self) -> &[(String, String)] {
        &self.extra_parameters
    }

    /// The request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The credentials sent with every request, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The transaction protocol settings.
    pub fn transactions(&self) -> &TransactionConfig {
        &self.transactions
    }

    /// The `User-Agent` header.
    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or(Self::DEFAULT_USER_AGENT)
    }

    fn transaction_endpoint(&self) -> Option<&String> {
        match &self.transactions {
            TransactionConfig::None => None,
            TransactionConfig::Rest { endpoint, .. } => Some(endpoint),
        }
    }
}

/// The HTTP method used to send queries.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueryMethod {
    /// `POST` with an `application/sparql-query` body
    #[default]
    Post,
    /// `GET` with a `query` parameter
    Get,
}

/// The [Accept HTTP headers](https://tools.ietf.org/html/rfc7231.html#section-5.3.2) sent for each kind of request.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AcceptConfig {
    /// Accept header of `SELECT` queries
    pub select: String,
    /// Accept header of `ASK` queries
    pub ask: String,
    /// Accept header of `DESCRIBE`/`CONSTRUCT` queries and graph store reads
    pub graph: String,
}

impl AcceptConfig {
    /// The default Accept header of `SELECT` queries.
    pub const DEFAULT_SELECT: &'static str = "application/sparql-results+xml,application/sparql-results+json;q=0.9,text/tab-separated-values;q=0.8";
    /// The default Accept header of `ASK` queries.
    pub const DEFAULT_ASK: &'static str =
        "application/sparql-results+json,application/sparql-results+xml;q=0.9";
    /// The default Accept header of graph results.
    pub const DEFAULT_GRAPH: &'static str = "application/n-triples,text/turtle;q=0.9,application/n-quads;q=0.8,application/trig;q=0.8,application/rdf+xml;q=0.7";
}

impl Default for AcceptConfig {
    fn default() -> Self {
        AcceptConfig {
            select: Self::DEFAULT_SELECT.into(),
            ask: Self::DEFAULT_ASK.into(),
            graph: Self::DEFAULT_GRAPH.into(),
        }
    }
}

/// How the bindings of a [`QueryRequest`](crate::QueryRequest) are sent to the endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingStrategy {
    /// Append a standard SPARQL `VALUES` block to the query.
    ///
    /// This can not be used for updates.
    #[default]
    ValuesClause,
    /// Send one request parameter `{prefix}{name}` per binding,
    /// for endpoints that support external bindings.
    Parameters {
        /// Prefix of the parameter names
        prefix: String,
    },
}

/// How the pagination of a [`QueryRequest`](crate::QueryRequest) is sent to the endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// Append standard `OFFSET`/`LIMIT` solution modifiers to the query.
    #[default]
    SolutionModifiers,
    /// Send the offset and the limit as request parameters.
    Parameters {
        /// Name of the offset parameter
        offset: String,
        /// Name of the limit parameter
        limit: String,
    },
}

/// Static credentials, sent with every request.
///
/// Authentication handshakes are not implemented by this crate;
/// for anything else, configure a [`reqwest::blocking::Client`] and use
/// [`ReqwestConnection::with_client`](crate::ReqwestConnection::with_client).
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum Credentials {
    /// HTTP Basic authentication
    Basic {
        /// User name
        user: String,
        /// Password
        #[serde(default)]
        password: Option<String>,
    },
    /// Bearer token
    Bearer {
        /// The token
        token: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Credentials::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// Which transaction protocol the endpoint supports.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum TransactionConfig {
    /// Only auto-committed requests; see [`NoTransactions`](crate::NoTransactions).
    #[default]
    None,
    /// See [`RestTransactions`](crate::RestTransactions).
    Rest {
        /// URL where transactions are created
        endpoint: String,
        /// Name of the parameter carrying the transaction id
        #[serde(default = "default_transaction_parameter")]
        parameter: String,
    },
}

fn default_transaction_parameter() -> String {
    "txid".into()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://localhost/sparql");
        assert_eq!(config.update_endpoint(), "http://localhost/sparql");
        assert!(matches!(config.graph_store_endpoint(), Err(Error::Config(_))));
        assert_eq!(config.query_method(), QueryMethod::Post);
        assert_eq!(config.binding_strategy(), &BindingStrategy::ValuesClause);
        assert_eq!(
            config.pagination_strategy(),
            &PaginationStrategy::SolutionModifiers
        );
        assert_eq!(config.transactions(), &TransactionConfig::None);
        assert_eq!(config.user_agent(), ClientConfig::DEFAULT_USER_AGENT);
        assert!(config.timeout().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn deserialize() {
        let src = r#"{
            "query_endpoint": "http://localhost/sparql",
            "update_endpoint": "http://localhost/update",
            "query_method": "get",
            "binding_strategy": { "kind": "parameters", "prefix": "bind:" },
            "extra_parameters": [["ruleset", "rdfs"]],
            "timeout_ms": 30000,
            "credentials": { "scheme": "basic", "user": "admin", "password": "secret" },
            "transactions": { "protocol": "rest", "endpoint": "http://localhost/tx" }
        }"#;
        let config: ClientConfig = serde_json::from_str(src).unwrap();
        assert_eq!(config.update_endpoint(), "http://localhost/update");
        assert_eq!(config.query_method(), QueryMethod::Get);
        assert_eq!(
            config.binding_strategy(),
            &BindingStrategy::Parameters {
                prefix: "bind:".into()
            }
        );
        assert_eq!(
            config.extra_parameters(),
            &[("ruleset".to_string(), "rdfs".to_string())]
        );
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            config.transactions(),
            &TransactionConfig::Rest {
                endpoint: "http://localhost/tx".into(),
                parameter: "txid".into()
            }
        );
        assert_eq!(config.accept(), &AcceptConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let src = r#"{ "query_endpoint": "http://localhost/sparql", "endpont": "x" }"#;
        assert!(serde_json::from_str::<ClientConfig>(src).is_err());
    }

    #[test]
    fn credentials_are_redacted() {
        let creds = Credentials::Basic {
            user: "admin".into(),
            password: Some("secret".into()),
        };
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("admin"));
        assert!(!dbg.contains("secret"));
        let dbg = format!(
            "{:?}",
            Credentials::Bearer {
                token: "t0k3n".into()
            }
        );
        assert!(!dbg.contains("t0k3n"));
    }

    #[test]
    fn from_vars() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://localhost/sparql"),
            (ENV_GRAPH_STORE_ENDPOINT, "http://localhost/store"),
            (ENV_TIMEOUT_SECS, "12"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.query_endpoint(), "http://localhost/sparql");
        assert_eq!(config.graph_store_endpoint().unwrap(), "http://localhost/store");
        assert_eq!(config.timeout(), Some(Duration::from_secs(12)));
    }

    #[test_case(Duration::from_millis(200); "below a second")]
    #[test_case(Duration::from_millis(1500); "fractional seconds")]
    #[test_case(Duration::from_secs(90); "whole seconds")]
    fn timeout_is_kept_as_given(timeout: Duration) {
        let config = ClientConfig::new("http://localhost/sparql").with_timeout(timeout);
        assert_eq!(config.timeout(), Some(timeout));
    }

    #[test]
    fn from_vars_fractional_timeout() {
        let config = ClientConfig::from_vars(|k| match k {
            ENV_ENDPOINT => Some("http://localhost/sparql".to_string()),
            ENV_TIMEOUT_SECS => Some("0.25".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn from_vars_errors() {
        assert!(matches!(
            ClientConfig::from_vars(|_| None),
            Err(Error::Config(_))
        ));
        let bad_timeout = |k: &str| match k {
            ENV_ENDPOINT => Some("http://localhost/sparql".to_string()),
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            _ => None,
        };
        assert!(matches!(
            ClientConfig::from_vars(bad_timeout),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_endpoint() {
        let config = ClientConfig::new("not a url");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
