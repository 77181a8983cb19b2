use std::io::Read;
use std::sync::Arc;

use crate::CommentaryResult;
use crate::error::ErrorKind;

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/// Platform Abstraction Layer (PAL) trait providing filesystem and server operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs` and serves HTTP with tiny_http
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> CommentaryResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> CommentaryResult<Box<dyn Read + 'static>>;

    /// Read entire file contents as raw bytes.
    fn read_file_to_bytes(&self, path: &FilePath) -> CommentaryResult<Vec<u8>> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(crate::CommentaryError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        Ok(contents)
    }

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> CommentaryResult<String> {
        let contents = self.read_file_to_bytes(path)?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Walk a directory tree, yielding paths matching the given glob patterns.
    ///
    /// Patterns are matched against the path relative to `path`; yielded paths
    /// are relative to the PAL base directory.
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CommentaryResult<Box<dyn Iterator<Item = CommentaryResult<FilePath>> + '_>>;

    /// Start an HTTP server with the given service.
    ///
    /// The server starts listening immediately. When the last handle is dropped
    /// (or `shutdown()` is called) it stops accepting new connections.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CommentaryResult<HttpServerHandle>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// # Examples
///
/// ```
/// use commentary_base::{MockPal, PalHandle};
///
/// let pal = PalHandle::new(MockPal::new());
/// let pal_clone = pal.clone();
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
