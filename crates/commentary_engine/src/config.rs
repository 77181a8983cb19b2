/* 📖 # Configuration

`commentary.toml` is optional. Without it the tool scans the default
extensions with the `all` filter and serves on 127.0.0.1:8080.

```toml
default_filter = "todo"

[server]
host = "0.0.0.0"
port = 9000
max_upload_bytes = 1048576

[[directory]]
paths = ["src"]
globs = ["*.js", "*.ts"]

[[extension]]
extensions = ["rs", "go"]
grammar = "c-style"

[[language]]
extensions = ["hs"]
line_comment = "--"
doc_line_prefixes = ["-- |"]
blocks = [
    { start = "{-|", end = "-}", doc = true },
    { start = "{-", end = "-}" },
]
```

`[[extension]]` maps more extensions to a built-in grammar, `[[language]]`
defines a new one. Both are applied on top of the default table by
`Config::syntax_table`.
*/

use std::path::Path;
use std::sync::Arc;

use commentary_base::{CommentaryError, CommentaryResult, ErrorKind, FilePath, PalHandle, ResultExt};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::hit::CommentFilter;
use crate::syntax::{BUILTIN_GRAMMARS, BlockComment, CommentSyntax, SyntaxTable};

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Filter used when a request or command does not name one.
    #[serde(default)]
    pub default_filter: CommentFilter,
    #[serde(default)]
    pub server: ServerConfig,
    /// Roots scanned by the CLI when no paths are given.
    #[serde(default)]
    pub directory: Vec<DirectoryConfig>,
    #[serde(default)]
    pub extension: Vec<ExtensionConfig>,
    #[serde(default)]
    pub language: Vec<LanguageConfig>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Larger request bodies are answered with 413.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Directory roots and the glob patterns selecting files below them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    pub paths: Vec<String>,
    pub globs: Vec<String>,
}

/// Extra extensions for a built-in grammar.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    pub extensions: Vec<String>,
    /// One of `c-style`, `python`, `html`.
    pub grammar: String,
}

/// A custom comment grammar.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageConfig {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub line_comment: Option<String>,
    #[serde(default)]
    pub doc_line_prefixes: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockConfig {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub doc: bool,
}

impl Config {
    /// The default table plus configured extensions and languages.
    pub fn syntax_table(&self) -> CommentaryResult<SyntaxTable> {
        let mut table = SyntaxTable::with_defaults();
        for mapping in &self.extension {
            let Some(syntax) = CommentSyntax::builtin(&mapping.grammar) else {
                commentary_base::bail!(
                    "unknown grammar '{}' (expected one of: {})",
                    mapping.grammar,
                    BUILTIN_GRAMMARS.join(", ")
                );
            };
            let syntax = Arc::new(syntax);
            for extension in &mapping.extensions {
                table.register(extension, Arc::clone(&syntax));
            }
        }
        for language in &self.language {
            let syntax = Arc::new(language.to_syntax()?);
            for extension in &language.extensions {
                table.register(extension, Arc::clone(&syntax));
            }
        }
        Ok(table)
    }
}

impl LanguageConfig {
    fn to_syntax(&self) -> CommentaryResult<CommentSyntax> {
        let blocks = self
            .blocks
            .iter()
            .map(|block| BlockComment::new(&block.start, &block.end, block.doc))
            .collect();
        CommentSyntax::new(
            self.line_comment.clone(),
            blocks,
            self.doc_line_prefixes.clone(),
        )
        .with_context(|| format!("language for {}", self.extensions.join(", ")))
    }
}

/// Load configuration through the PAL. A missing file yields the defaults.
#[instrument(skip(pal))]
pub fn load_config(pal: &PalHandle, path: &FilePath) -> CommentaryResult<Config> {
    if !pal.file_exists(path)? {
        debug!("no configuration file, using defaults");
        return Ok(Config::default());
    }
    let text = pal.read_file_to_string(path)?;
    let config = parse_config(&text, path.as_path())?;
    debug!(
        directories = config.directory.len(),
        languages = config.language.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Parse configuration text and check that its grammars are valid.
/// `path` only shows up in error messages.
pub(crate) fn parse_config(text: &str, path: &Path) -> CommentaryResult<Config> {
    let config: Config = toml::from_str(text).map_err(|e| {
        Box::new(CommentaryError::new(ErrorKind::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        }))
    })?;
    config
        .syntax_table()
        .with_context(|| format!("in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentary_base::MockPal;

    fn parse(text: &str) -> CommentaryResult<Config> {
        parse_config(text, Path::new("commentary.toml"))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_filter, CommentFilter::All);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.syntax_table().unwrap().len(), 7);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            default_filter = "todo"

            [server]
            port = 9000

            [[directory]]
            paths = ["src", "lib"]
            globs = ["**/*.js"]

            [[extension]]
            extensions = ["rs", ".GO"]
            grammar = "c-style"

            [[language]]
            extensions = ["sql"]
            line_comment = "--"
            blocks = [{ start = "/*", end = "*/" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_filter, CommentFilter::TodosOrFixmes);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.directory[0].paths, vec!["src", "lib"]);

        let table = config.syntax_table().unwrap();
        assert_eq!(
            table.lookup("go").map(|s| s.as_ref()),
            Some(&CommentSyntax::c_style())
        );
        let sql = table.lookup("sql").unwrap();
        assert_eq!(sql.line_comment(), Some("--"));
        assert!(!sql.blocks()[0].is_doc);
    }

    #[test]
    fn test_haskell_language_with_doc_block() {
        let config = parse(
            r#"
            [[directory]]
            paths = ["src"]
            globs = ["*.js", "*.ts"]

            [[language]]
            extensions = ["hs"]
            line_comment = "--"
            doc_line_prefixes = ["-- |"]
            blocks = [
                { start = "{-|", end = "-}", doc = true },
                { start = "{-", end = "-}" },
            ]
            "#,
        )
        .unwrap();
        let table = config.syntax_table().unwrap();
        let haskell = table.lookup("hs").unwrap();
        assert_eq!(haskell.doc_line_prefixes(), ["-- |".to_string()]);
        assert!(haskell.blocks()[0].is_doc);
        assert!(!haskell.blocks()[1].is_doc);
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let error = parse("default_filter = \"docs\"").unwrap_err();
        assert!(error.to_string().contains("unknown filter 'docs'"), "{error}");
    }

    #[test]
    fn test_unknown_grammar_is_rejected() {
        let error = parse(
            r#"
            [[extension]]
            extensions = ["rb"]
            grammar = "ruby"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "in commentary.toml: unknown grammar 'ruby' (expected one of: c-style, python, html)"
        );
    }

    #[test]
    fn test_empty_custom_token_is_rejected() {
        let error = parse(
            r#"
            [[language]]
            extensions = ["x"]
            line_comment = ""
            "#,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "in commentary.toml: language for x: line comment token must not be empty"
        );
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let pal = PalHandle::new(MockPal::new());
        let config = load_config(&pal, &FilePath::from("commentary.toml")).unwrap();
        assert!(config.directory.is_empty());
    }

    #[test]
    fn test_load_config_from_pal() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from("commentary.toml"),
            b"[[directory]]\npaths = [\".\"]\nglobs = [\"*.py\"]\n".to_vec(),
        );
        let pal = PalHandle::new(mock);
        let config = load_config(&pal, &FilePath::from("commentary.toml")).unwrap();
        assert_eq!(config.directory[0].globs, vec!["*.py"]);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("commentary.toml"), b"[server\n".to_vec());
        let pal = PalHandle::new(mock);
        let error = load_config(&pal, &FilePath::from("commentary.toml")).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Config { .. }));
        assert!(
            error
                .to_string()
                .starts_with("Invalid configuration in commentary.toml")
        );
    }

    #[test]
    fn test_load_config_unknown_grammar_has_path_context() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from("commentary.toml"),
            b"[[extension]]\nextensions = [\"kt\"]\ngrammar = \"kotlin\"\n".to_vec(),
        );
        let pal = PalHandle::new(mock);
        let error = load_config(&pal, &FilePath::from("commentary.toml")).unwrap_err();
        assert!(
            error.to_string().starts_with("in commentary.toml: unknown grammar"),
            "{error}"
        );
    }
}
