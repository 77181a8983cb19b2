/* 📖 # Comment grammars and the extension table

A `CommentSyntax` describes how comments look in one language: an optional
line-comment token, block delimiter pairs (each possibly marking a doc
comment) and doc-line prefixes. The scanner only ever sees a grammar, never a
file extension; `SyntaxTable` maps extensions to grammars.

The defaults cover `.js .ts .java .c .cpp` (C-style), `.py` and `.html`.
Configuration can map more extensions to the named built-in grammars or
register custom grammars, without touching the scanner.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use commentary_base::CommentaryResult;
use serde::Serialize;

/// Names accepted by [`CommentSyntax::builtin`].
pub const BUILTIN_GRAMMARS: &[&str] = &["c-style", "python", "html"];

/// A block comment delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockComment {
    pub start: String,
    pub end: String,
    /// Whether comments opened with `start` are documentation comments.
    pub is_doc: bool,
}

impl BlockComment {
    pub fn new(start: impl Into<String>, end: impl Into<String>, is_doc: bool) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            is_doc,
        }
    }
}

/// Comment grammar of one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentSyntax {
    line_comment: Option<String>,
    blocks: Vec<BlockComment>,
    doc_line_prefixes: Vec<String>,
}

impl CommentSyntax {
    /// Build a grammar, rejecting empty tokens.
    pub fn new(
        line_comment: Option<String>,
        blocks: Vec<BlockComment>,
        doc_line_prefixes: Vec<String>,
    ) -> CommentaryResult<Self> {
        if line_comment.as_deref() == Some("") {
            commentary_base::bail!("line comment token must not be empty");
        }
        for block in &blocks {
            if block.start.is_empty() || block.end.is_empty() {
                commentary_base::bail!(
                    "block comment delimiters must not be empty (start '{}', end '{}')",
                    block.start,
                    block.end
                );
            }
        }
        if doc_line_prefixes.iter().any(String::is_empty) {
            commentary_base::bail!("doc line prefixes must not be empty");
        }
        Ok(Self {
            line_comment,
            blocks,
            doc_line_prefixes,
        })
    }

    /// Grammar that recognises nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `//` line comments, `/** */` doc blocks, `/* */` blocks, `///` doc lines.
    pub fn c_style() -> Self {
        Self {
            line_comment: Some("//".to_string()),
            blocks: vec![
                BlockComment::new("/**", "*/", true),
                BlockComment::new("/*", "*/", false),
            ],
            doc_line_prefixes: vec!["///".to_string()],
        }
    }

    /// `#` line comments, triple-quoted strings as doc blocks, `##` doc lines.
    pub fn python() -> Self {
        Self {
            line_comment: Some("#".to_string()),
            blocks: vec![
                BlockComment::new("\"\"\"", "\"\"\"", true),
                BlockComment::new("'''", "'''", true),
            ],
            doc_line_prefixes: vec!["##".to_string()],
        }
    }

    /// `<!-- -->` blocks only.
    pub fn html() -> Self {
        Self {
            line_comment: None,
            blocks: vec![BlockComment::new("<!--", "-->", false)],
            doc_line_prefixes: vec![],
        }
    }

    /// Look up a built-in grammar by name (see [`BUILTIN_GRAMMARS`]).
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "c-style" | "c" => Some(Self::c_style()),
            "python" => Some(Self::python()),
            "html" => Some(Self::html()),
            _ => None,
        }
    }

    pub fn line_comment(&self) -> Option<&str> {
        self.line_comment.as_deref()
    }

    pub fn blocks(&self) -> &[BlockComment] {
        &self.blocks
    }

    pub fn doc_line_prefixes(&self) -> &[String] {
        &self.doc_line_prefixes
    }

    /// True when the grammar cannot match anything.
    pub fn is_empty(&self) -> bool {
        self.line_comment.is_none() && self.blocks.is_empty()
    }
}

/// Lookup table from file extension to comment grammar.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTable {
    by_extension: BTreeMap<String, Arc<CommentSyntax>>,
}

impl SyntaxTable {
    /// A table without any entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default table.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        let c_style = Arc::new(CommentSyntax::c_style());
        for extension in ["js", "ts", "java", "c", "cpp"] {
            table.register(extension, Arc::clone(&c_style));
        }
        table.register("py", Arc::new(CommentSyntax::python()));
        table.register("html", Arc::new(CommentSyntax::html()));
        table
    }

    /// Map an extension (with or without leading dot, any case) to a grammar.
    pub fn register(&mut self, extension: &str, syntax: Arc<CommentSyntax>) {
        self.by_extension.insert(normalize_extension(extension), syntax);
    }

    /// Grammar for an extension, if the extension is supported.
    pub fn lookup(&self, extension: &str) -> Option<&Arc<CommentSyntax>> {
        self.by_extension.get(&normalize_extension(extension))
    }

    /// Grammar for a file name, by its extension.
    pub fn lookup_file(&self, file_name: &str) -> Option<&Arc<CommentSyntax>> {
        self.lookup(file_extension(file_name)?)
    }

    /// Supported extensions in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommentSyntax)> {
        self.by_extension
            .iter()
            .map(|(extension, syntax)| (extension.as_str(), syntax.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

/// Extension of a file name without the dot. Dotfiles such as `.bashrc` have none.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => Some(extension),
        _ => None,
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_extensions() {
        let table = SyntaxTable::with_defaults();
        let extensions: Vec<&str> = table.iter().map(|(ext, _)| ext).collect();
        assert_eq!(extensions, vec!["c", "cpp", "html", "java", "js", "py", "ts"]);
    }

    #[test]
    fn test_lookup_is_case_and_dot_insensitive() {
        let table = SyntaxTable::with_defaults();
        assert_eq!(table.lookup(".JS").map(|s| s.as_ref()), Some(&CommentSyntax::c_style()));
        assert_eq!(table.lookup("py").map(|s| s.as_ref()), Some(&CommentSyntax::python()));
        assert!(table.lookup("rb").is_none());
    }

    #[test]
    fn test_lookup_file() {
        let table = SyntaxTable::with_defaults();
        assert_eq!(
            table.lookup_file("web/Index.HTML").map(|s| s.as_ref()),
            Some(&CommentSyntax::html())
        );
        assert!(table.lookup_file("Makefile").is_none());
        assert!(table.lookup_file("notes.txt").is_none());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a/b/main.cpp"), Some("cpp"));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("dir.d\\README"), None);
    }

    #[test]
    fn test_register_custom_grammar() {
        let mut table = SyntaxTable::with_defaults();
        let sql = CommentSyntax::new(
            Some("--".to_string()),
            vec![BlockComment::new("/*", "*/", false)],
            vec![],
        )
        .unwrap();
        table.register("SQL", Arc::new(sql.clone()));
        assert_eq!(table.lookup("sql").map(|s| s.as_ref()), Some(&sql));
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_new_rejects_empty_tokens() {
        assert!(CommentSyntax::new(Some(String::new()), vec![], vec![]).is_err());
        assert!(CommentSyntax::new(None, vec![BlockComment::new("{-", "", false)], vec![]).is_err());
        assert!(CommentSyntax::new(None, vec![], vec![String::new()]).is_err());
    }

    #[test]
    fn test_builtin_names() {
        for name in BUILTIN_GRAMMARS {
            assert!(CommentSyntax::builtin(name).is_some(), "{name}");
        }
        assert!(CommentSyntax::builtin("cobol").is_none());
        assert!(CommentSyntax::empty().is_empty());
        assert!(!CommentSyntax::html().is_empty());
    }
}
