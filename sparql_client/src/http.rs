//! The seam between [`SparqlClient`](crate::SparqlClient) and the HTTP stack.
//!
//! [`ReqwestConnection`] is the default implementation of [`HttpConnection`],
//! based on [`reqwest::blocking`].
use crate::config::{ClientConfig, Credentials};
use crate::error::{Error, TransportError};
use reqwest::blocking::Client;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Maximum number of bytes of an error response kept in error messages.
pub const MAX_ERROR_MESSAGE: u64 = 64 * 1024;

/// The HTTP methods used by the SPARQL protocols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

/// The body of an [`HttpRequest`].
pub enum Body {
    /// No body
    Empty,
    /// An in-memory body (query, update...)
    Text(String),
    /// A streamed body (RDF document)
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(txt) => f.debug_tuple("Text").field(txt).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A request to be sent by an [`HttpConnection`].
#[derive(Debug)]
pub struct HttpRequest {
    /// The HTTP method
    pub method: Method,
    /// The target URL, without the query parameters
    pub url: String,
    /// The query parameters, to be URL-encoded
    pub query: Vec<(String, String)>,
    /// The request headers
    pub headers: Vec<(String, String)>,
    /// The request body
    pub body: Body,
}

impl HttpRequest {
    pub(crate) fn new(method: Method, url: &str) -> Self {
        HttpRequest {
            method,
            url: url.to_string(),
            query: vec![],
            headers: vec![],
            body: Body::Empty,
        }
    }

    pub(crate) fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn param<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub(crate) fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// The value of the first query parameter called `name`, if any.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The value of the first header called `name` (case-insensitive), if any.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response returned by an [`HttpConnection`].
///
/// The body is streamed: it is consumed as it is read.
pub struct HttpResponse {
    /// The HTTP status code
    pub status: u16,
    /// The response headers
    pub headers: Vec<(String, String)>,
    /// The response body
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// The value of the first header called `name` (case-insensitive), if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The media type of the response, lowercased and without its parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`Error::RequestFailed`].
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            let status = self.status;
            Err(Error::RequestFailed {
                status,
                message: self.into_message(),
            })
        }
    }

    /// Read (the beginning of) the body as text, for error messages.
    pub(crate) fn into_message(self) -> String {
        let mut bytes = Vec::new();
        // a partial message is better than none
        let _ = self.body.take(MAX_ERROR_MESSAGE).read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).trim().to_string()
    }
}

/// Sends [`HttpRequest`]s.
///
/// Implement this trait to plug [`SparqlClient`](crate::SparqlClient)
/// on another HTTP stack, or on a pre-authenticated session.
pub trait HttpConnection: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    ///
    /// Errors are reserved to failures to communicate with the server.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpConnection + ?Sized> HttpConnection for Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        T::execute(self, request)
    }
}

/// An [`HttpConnection`] based on [`reqwest::blocking`].
#[derive(Clone, Debug)]
pub struct ReqwestConnection {
    client: Client,
    credentials: Option<Credentials>,
}

impl ReqwestConnection {
    /// Build a connection honoring the timeout, user agent and credentials of `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut builder = Client::builder().user_agent(config.user_agent());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| Error::Config(format!("can not build HTTP client: {err}")))?;
        Ok(ReqwestConnection {
            client,
            credentials: config.credentials().cloned(),
        })
    }

    /// Use a pre-configured [`reqwest::blocking::Client`],
    /// e.g. one with custom authentication or TLS settings.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        ReqwestConnection {
            client,
            credentials: None,
        }
    }

    /// Add static credentials to every request.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl HttpConnection for ReqwestConnection {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &self.credentials {
            Some(Credentials::Basic { user, password }) => {
                builder.basic_auth(user, password.as_ref())
            }
            Some(Credentials::Bearer { token }) => builder.bearer_auth(token),
            None => builder,
        };
        builder = match request.body {
            Body::Empty => builder,
            Body::Text(txt) => builder.body(txt),
            Body::Stream(reader) => builder.body(reqwest::blocking::Body::new(reader)),
        };
        let resp = builder.send()?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(resp),
        })
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
