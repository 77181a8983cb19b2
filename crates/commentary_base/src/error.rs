use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # How errors are structured

An error is an `ErrorKind` (what went wrong, with structured data such as the
file path) wrapped in a `CommentaryError`, which adds a stack of context
strings and the span trace captured at creation.

`Display` renders a single line, outermost context first
(`outer: inner: message`). `Debug` renders a tree with the contexts in the
order they were attached, followed by the span trace.
*/

/// Error variants that can occur in commentary operations.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid
    Config { path: PathBuf, message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

/// Error type wrapping an [`ErrorKind`] with context and span trace.
pub struct CommentaryError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl CommentaryError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a [`ErrorKind::Message`] error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    fn fmt_kind(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Config { path, message } => {
                write!(f, "Invalid configuration in {}: {}", path.display(), message)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_kind(f)?;
        writeln!(f)?;
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == self.context.len() { "└─" } else { "├─" };
            writeln!(f, "{} {}", branch, ctx)?;
        }
        Ok(())
    }
}

impl StdError for CommentaryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::Config { .. } | ErrorKind::Message { .. } => None,
        }
    }
}

impl fmt::Display for CommentaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in self.context.iter().rev() {
            write!(f, "{}: ", ctx)?;
        }
        self.fmt_kind(f)
    }
}

impl fmt::Debug for CommentaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f)?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Standard result type for commentary operations.
pub type CommentaryResult<T> = std::result::Result<T, Box<CommentaryError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> CommentaryResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> CommentaryResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for CommentaryResult<T> {
    fn context(self, context: impl Into<String>) -> CommentaryResult<T> {
        self.map_err(|err| Box::new((*err).context(context)))
    }

    fn with_context<F>(self, f: F) -> CommentaryResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new((*err).with_context(f)))
    }
}

/// Creates a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::CommentaryError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
