/* 📖 # What lives in commentary_base?
commentary_base holds the pieces every other crate builds on: the error type,
tracing setup and the platform abstraction layer (filesystem and HTTP server).
*/

pub mod error;
pub mod pal;
pub mod tracing;

pub use error::{CommentaryError, CommentaryResult, ErrorKind, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
