use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

use crate::{CommentaryError, CommentaryResult, error::ErrorKind};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};
use super::traits::Pal;

/// How long the accept loop waits for a request before re-checking the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Concrete PAL implementation using the real filesystem via std::fs.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

/// Build a GlobSet from the given glob patterns.
pub(crate) fn build_glob_set(globs: &[String]) -> CommentaryResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = GlobBuilder::new(glob)
            .literal_separator(false)
            .build()
            .map_err(|e| crate::err!("Invalid glob pattern '{}': {}", glob, e))?;
        builder.add(compiled);
    }
    builder
        .build()
        .map_err(|e| crate::err!("Failed to build glob set: {}", e))
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> CommentaryResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> CommentaryResult<Box<dyn Read + 'static>> {
        let resolved = self.resolve_path(path);
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(CommentaryError::new(ErrorKind::FileError {
                path: resolved,
                source: e,
            }))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path, globs = ?globs))]
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CommentaryResult<Box<dyn Iterator<Item = CommentaryResult<FilePath>> + '_>> {
        let resolved = self.resolve_path(path);
        if !resolved.is_dir() {
            debug!(resolved = %resolved.display(), "directory not found");
            return Err(Box::new(CommentaryError::new(ErrorKind::FileError {
                path: resolved,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            })));
        }

        let glob_set = build_glob_set(globs)?;
        let base_path = path.clone();
        let iter = WalkDir::new(&resolved)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(e) => {
                    if !e.file_type().is_file() {
                        return None;
                    }
                    let relative = e.path().strip_prefix(&resolved).ok()?;
                    if glob_set.is_match(relative) {
                        Some(Ok(base_path.join(FilePath::from(relative).to_string())))
                    } else {
                        None
                    }
                }
                Err(e) => {
                    debug!(error = %e, "error walking directory");
                    Some(Err(Box::new(CommentaryError::new(ErrorKind::FileError {
                        path: e
                            .path()
                            .map(|p| p.to_path_buf())
                            .unwrap_or_else(|| PathBuf::from("unknown")),
                        source: std::io::Error::other(e.to_string()),
                    }))))
                }
            });
        Ok(Box::new(iter))
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CommentaryResult<HttpServerHandle> {
        let server = tiny_http::Server::http(config.address())
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", config.address(), e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server is not bound to an IP address"))?;

        let handle = HttpServerHandle::new(port);
        let shutdown = Arc::clone(handle.shutdown_flag());
        let service: Arc<dyn HttpService> = Arc::from(service);
        let thread = std::thread::Builder::new()
            .name("http-accept".to_string())
            .spawn(move || accept_loop(server, service, config, shutdown))
            .map_err(|e| crate::err!("Failed to spawn HTTP accept thread: {}", e))?;
        handle.attach_thread(thread);

        info!(port, "HTTP server listening");
        Ok(handle)
    }
}

fn accept_loop(
    server: tiny_http::Server,
    service: Arc<dyn HttpService>,
    config: HttpServerConfig,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                let config = config.clone();
                let spawned = std::thread::Builder::new()
                    .name("http-request".to_string())
                    .spawn(move || handle_connection(service.as_ref(), &config, request));
                if let Err(e) = spawned {
                    error!(error = %e, "failed to spawn request thread");
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "HTTP server stopped accepting connections");
                break;
            }
        }
    }
    debug!("HTTP accept loop finished");
}

#[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
fn handle_connection(
    service: &dyn HttpService,
    config: &HttpServerConfig,
    mut request: tiny_http::Request,
) {
    let response = match read_request(config, &mut request) {
        Ok(converted) => match service.handle_request(converted) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "service returned an error");
                HttpResponse::text(e.to_string())
                    .with_status(HttpStatusCode::NetworkConnectTimeoutError)
            }
        },
        Err(rejection) => rejection,
    };
    debug!(status = response.status().as_u16(), "sending response");

    let status = response.status().as_u16();
    let mut headers: Vec<tiny_http::Header> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| tiny_http::Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
        .collect();
    if let Ok(server) = tiny_http::Header::from_bytes(&b"Server"[..], config.server_name.as_bytes())
    {
        headers.push(server);
    }
    let mut reply = tiny_http::Response::from_data(response.into_body().into_bytes())
        .with_status_code(status);
    for header in headers {
        reply.add_header(header);
    }
    if let Err(e) = request.respond(reply) {
        warn!(error = %e, "failed to send response");
    }
}

/// Convert a tiny_http request, or produce the response rejecting it.
fn read_request(
    config: &HttpServerConfig,
    request: &mut tiny_http::Request,
) -> Result<HttpRequest, HttpResponse> {
    let Some(method) = HttpMethod::parse(request.method().as_str()) else {
        return Err(HttpResponse::text("Unsupported HTTP method")
            .with_status(HttpStatusCode::MethodNotAllowed));
    };

    let limit = config.max_body_bytes.unwrap_or(usize::MAX);
    if request.body_length().is_some_and(|length| length > limit) {
        return Err(too_large(limit));
    }

    let mut body = Vec::new();
    let read = request
        .as_reader()
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut body);
    if let Err(e) = read {
        return Err(HttpResponse::text(format!("Failed to read request body: {}", e))
            .with_status(HttpStatusCode::BadRequest));
    }
    if body.len() > limit {
        return Err(too_large(limit));
    }

    let mut converted = HttpRequest::new(method, request.url()).with_body(body);
    for header in request.headers() {
        converted = converted.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    Ok(converted)
}

fn too_large(limit: usize) -> HttpResponse {
    HttpResponse::text(format!("Request body exceeds {} bytes", limit))
        .with_status(HttpStatusCode::PayloadTooLarge)
}
