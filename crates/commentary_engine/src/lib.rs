/* 📖 # What lives in commentary_engine?
The comment scanner and everything built around it: grammars per file
extension, batch extraction with per-file errors, directory scanning,
configuration and the HTTP API.
*/

pub mod api;
pub mod comment_parser;
pub mod config;
pub mod extractor;
pub mod hit;
pub mod scanner;
pub mod syntax;

pub use api::ApiService;
pub use comment_parser::extract;
pub use config::{Config, DirectoryConfig, ExtensionConfig, LanguageConfig, ServerConfig, load_config};
pub use extractor::{ExtractionError, ExtractionReport, SourceFile, extract_batch, extract_files};
pub use hit::{Category, CommentFilter, CommentHit};
pub use scanner::{ScanError, ScanResult, scan_files};
pub use syntax::{BlockComment, CommentSyntax, SyntaxTable};
