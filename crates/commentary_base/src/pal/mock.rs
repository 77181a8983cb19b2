use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::CommentaryResult;
use crate::error::ErrorKind;
use crate::CommentaryError;

use super::FilePath;
use super::http::{
    HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService, HttpStatusCode,
};
use super::real_pal::build_glob_set;
use super::traits::Pal;

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use commentary_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("app.js"), b"// hi".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("app.js")).unwrap();
/// assert_eq!(content, "// hi");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    http_servers: Arc<Mutex<HashMap<u16, HttpServerInfo>>>,
    next_port: Arc<AtomicU16>,
}

/// Information about a registered HTTP server.
#[derive(Debug)]
struct HttpServerInfo {
    service: Box<dyn HttpService>,
    config: HttpServerConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        lock(&self.files).insert(path, content);
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Applies the same body limit and error-to-599 mapping as the real server.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> CommentaryResult<HttpResponse> {
        let servers = lock(&self.http_servers);
        let server_info = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        if let Some(limit) = server_info.config.max_body_bytes {
            if request.body().len() > limit {
                return Ok(HttpResponse::text(format!("Request body exceeds {} bytes", limit))
                    .with_status(HttpStatusCode::PayloadTooLarge));
            }
        }

        Ok(match server_info.service.handle_request(request) {
            Ok(response) => response,
            Err(e) => HttpResponse::text(e.to_string())
                .with_status(HttpStatusCode::NetworkConnectTimeoutError),
        })
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        lock(&self.http_servers).len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> CommentaryResult<bool> {
        Ok(lock(&self.files).contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> CommentaryResult<Box<dyn Read + 'static>> {
        let files = lock(&self.files);
        let content = files
            .get(path)
            .ok_or_else(|| {
                Box::new(CommentaryError::new(ErrorKind::FileError {
                    path: path.as_path().to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File not found: {}", path),
                    ),
                }))
            })?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    /// Matches globs against paths below `path`, in sorted order.
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CommentaryResult<Box<dyn Iterator<Item = CommentaryResult<FilePath>> + '_>> {
        let glob_set = build_glob_set(globs)?;
        let root = path.as_relative().normalize();
        let mut matching: Vec<FilePath> = lock(&self.files)
            .keys()
            .filter(|file| {
                let file = file.as_relative().normalize();
                let relative = if root.as_str().is_empty() {
                    Some(file.as_str().to_string())
                } else {
                    file.strip_prefix(&root).ok().map(|r| r.as_str().to_string())
                };
                relative.is_some_and(|r| glob_set.is_match(r))
            })
            .cloned()
            .collect();
        matching.sort();
        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CommentaryResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };
        lock(&self.http_servers).insert(port, HttpServerInfo { service, config });
        Ok(HttpServerHandle::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::http::HttpMethod;

    #[test]
    fn test_file_exists() {
        let pal = MockPal::new();
        pal.add_file(FilePath::from("index.html"), b"<!-- x -->".to_vec());

        assert!(pal.file_exists(&FilePath::from("index.html")).unwrap());
        assert!(!pal.file_exists(&FilePath::from("other.html")).unwrap());
    }

    #[test]
    fn test_read_file_not_found() {
        let pal = MockPal::new();
        assert!(pal.read_file(&FilePath::from("nonexistent.txt")).is_err());
    }

    #[test]
    fn test_walk_directory_respects_root() {
        let pal = MockPal::new();
        pal.add_file(FilePath::from("src/b.js"), vec![]);
        pal.add_file(FilePath::from("src/a.js"), vec![]);
        pal.add_file(FilePath::from("lib/c.js"), vec![]);
        pal.add_file(FilePath::from("src/d.py"), vec![]);

        let files: Vec<FilePath> = pal
            .walk_directory(&FilePath::from("src"), &["*.js".to_string()])
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(files, vec![FilePath::from("src/a.js"), FilePath::from("src/b.js")]);
    }

    #[test]
    fn test_walk_directory_from_base() {
        let pal = MockPal::new();
        pal.add_file(FilePath::from("src/a.js"), vec![]);
        pal.add_file(FilePath::from("lib/c.js"), vec![]);

        let count = pal
            .walk_directory(&FilePath::from("."), &["**/*.js".to_string()])
            .unwrap()
            .count();
        assert_eq!(count, 2);
    }

    #[derive(Debug)]
    struct FailingService;

    impl HttpService for FailingService {
        fn handle_request(&self, _request: HttpRequest) -> CommentaryResult<HttpResponse> {
            crate::bail!("boom")
        }
    }

    #[test]
    fn test_simulate_request_maps_errors_to_599() {
        let pal = MockPal::new();
        let handle = pal
            .start_http_server(Box::new(FailingService), HttpServerConfig::default())
            .unwrap();
        assert_eq!(pal.http_server_count(), 1);

        let response = pal
            .simulate_request(handle.port(), HttpRequest::new(HttpMethod::Get, "/"))
            .unwrap();
        assert_eq!(response.status().as_u16(), 599);
        assert_eq!(response.body().as_string(), Some("boom".to_string()));
    }

    #[test]
    fn test_simulate_request_enforces_body_limit() {
        let pal = MockPal::new();
        let config = HttpServerConfig::default().with_max_body_bytes(4);
        let handle = pal.start_http_server(Box::new(FailingService), config).unwrap();

        let request = HttpRequest::new(HttpMethod::Post, "/").with_body("too long");
        let response = pal.simulate_request(handle.port(), request).unwrap();
        assert_eq!(response.status(), HttpStatusCode::PayloadTooLarge);
    }

    #[test]
    fn test_simulate_request_unknown_port() {
        let pal = MockPal::new();
        let result = pal.simulate_request(1, HttpRequest::new(HttpMethod::Get, "/"));
        assert!(result.is_err());
    }
}
