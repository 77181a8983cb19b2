/* 📖 # HTTP types in the PAL

The HTTP abstraction lets services be written against plain request and
response values. RealPal serves them with tiny_http, MockPal dispatches
`simulate_request` calls straight to the registered service.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// HTTP methods supported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Parse an HTTP method from a string.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Convert the method to its string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers collection. Lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    inner: HashMap<String, String>,
}

impl HttpHeaders {
    /// Create empty headers.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Insert a header, replacing any existing header with the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.inner.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
        self.inner.insert(key, value.into());
    }

    /// Get a header value.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.inner
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Check if a header exists.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter()
    }
}

/// HTTP message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBody(Vec<u8>);

impl HttpBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Get content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get content as a string if valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        String::from_utf8(self.0.clone()).ok()
    }

    /// Check if body is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the content length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take ownership of the content.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<String> for HttpBody {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// HTTP request structure. `path` includes the query string, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// Get the request path, including the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path without the query string.
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    /// The raw query string (after `?`), if present.
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }

    /// Get the request headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the request body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }
}

/// HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusCode {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    UnsupportedMediaType = 415,
    InternalServerError = 500,
    /// Returned by the server for any `Err` produced by a service.
    NetworkConnectTimeoutError = 599,
}

impl HttpStatusCode {
    /// Get the numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the standard reason phrase.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::UnsupportedMediaType => "Unsupported Media Type",
            Self::InternalServerError => "Internal Server Error",
            Self::NetworkConnectTimeoutError => "Network Connect Timeout Error",
        }
    }
}

/// HTTP response structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    /// Create a new response with the given status.
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Create a 200 OK response.
    pub fn ok() -> Self {
        Self::new(HttpStatusCode::Ok)
    }

    /// Get the status code.
    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    /// Get the headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Take ownership of the body.
    pub fn into_body(self) -> HttpBody {
        self.body
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the Content-Type header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the status code.
    pub fn with_status(mut self, status: HttpStatusCode) -> Self {
        self.status = status;
        self
    }

    /// Create a JSON response.
    pub fn json(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("application/json")
            .with_body(body.into())
    }

    /// Create a plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("text/plain; charset=utf-8")
            .with_body(body.into())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. If None, the OS will assign an available port.
    pub port: Option<u16>,
    /// Server name used in responses.
    pub server_name: String,
    /// Requests with larger bodies are rejected with 413 before reaching the service.
    pub max_body_bytes: Option<usize>,
}

impl HttpServerConfig {
    /// Create a new configuration with the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the request body limit.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    /// Get the address string (host:port, port 0 for OS-assigned).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            server_name: "commentary".to_string(),
            max_body_bytes: None,
        }
    }
}

/// Trait for handling HTTP requests.
///
/// Errors returned by `handle_request` are answered with HTTP 599 by the PAL
/// implementation, so they stand out from deliberate 4xx responses.
pub trait HttpService: std::fmt::Debug + Send + Sync + 'static {
    /// Handle an HTTP request and return a response.
    fn handle_request(&self, request: HttpRequest) -> crate::CommentaryResult<HttpResponse>;
}

/// Handle to a running HTTP server.
///
/// Dropping a handle (or calling `shutdown`) stops the accept loop.
#[derive(Debug, Clone)]
pub struct HttpServerHandle {
    port: u16,
    shutdown: Arc<AtomicBool>,
    accept_thread: Arc<Mutex<Option<JoinHandle<()>>>>,
    owners: Arc<()>,
}

impl HttpServerHandle {
    /// Create a new handle for the given port.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            shutdown: Arc::new(AtomicBool::new(false)),
            accept_thread: Arc::new(Mutex::new(None)),
            owners: Arc::new(()),
        }
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the full address (host:port) the server is listening on.
    pub fn address(&self, host: &str) -> String {
        format!("{}:{}", host, self.port)
    }

    /// Signal the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Check if the server has been signaled to shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Access the shutdown flag (for internal use by implementations).
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown
    }

    /// Register the thread running the accept loop.
    pub fn attach_thread(&self, thread: JoinHandle<()>) {
        if let Ok(mut slot) = self.accept_thread.lock() {
            *slot = Some(thread);
        }
    }

    /// Block until the accept loop has finished.
    pub fn wait(&self) {
        let thread = match self.accept_thread.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        // The accept thread is shared by every clone, stop only with the last one
        if Arc::strong_count(&self.owners) == 1 {
            self.shutdown();
        }
    }
}
