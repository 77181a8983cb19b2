/* 📖 # Batch extraction

Uploads, pasted snippets and files read from disk all end up here as
`SourceFile`s. Each file is checked on its own (empty? supported extension?),
decoded and handed to the scanner with the grammar for its extension.

Extraction is fail-tolerant the same way scanning directories is: a bad file
becomes an entry in `errors` and the rest of the batch goes on. The report
merges all hits, sorted by file name and line. The sort is stable, so two
fragments on the same line keep their left-to-right order.
*/

use std::fmt;

use commentary_base::{CommentaryError, CommentaryResult, FilePath, PalHandle, bail};
use serde::{Serialize, Serializer};
use tracing::{debug, instrument, warn};

use crate::comment_parser::extract;
use crate::hit::{CommentFilter, CommentHit};
use crate::syntax::{SyntaxTable, file_extension};

/// A named blob of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A file that could not be scanned.
#[derive(Debug)]
pub struct ExtractionError {
    /// Name of the file as given by the caller.
    pub file_name: String,
    pub error: Box<CommentaryError>,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.error)
    }
}

impl Serialize for ExtractionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of extracting a batch of files.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    /// Files that were actually scanned.
    pub files_processed: usize,
    pub total_comments: usize,
    pub comments: Vec<CommentHit>,
    pub errors: Vec<ExtractionError>,
}

impl ExtractionReport {
    /// True when not a single file could be scanned.
    pub fn is_empty(&self) -> bool {
        self.files_processed == 0
    }

    fn collect(
        outcomes: impl IntoIterator<Item = (String, CommentaryResult<Vec<CommentHit>>)>,
    ) -> Self {
        let mut report = Self::default();
        for (file_name, outcome) in outcomes {
            match outcome {
                Ok(hits) => {
                    report.files_processed += 1;
                    report.comments.extend(hits);
                }
                Err(error) => {
                    warn!("failed to extract {}: {}", file_name, error);
                    report.errors.push(ExtractionError { file_name, error });
                }
            }
        }
        report.comments.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.line_number.cmp(&b.line_number))
        });
        report.total_comments = report.comments.len();
        report
    }
}

/// Extract comments from in-memory files.
#[instrument(skip_all, fields(file_count = files.len(), filter = %filter))]
pub fn extract_batch(
    table: &SyntaxTable,
    files: &[SourceFile],
    filter: CommentFilter,
) -> ExtractionReport {
    let report = ExtractionReport::collect(files.iter().map(|file| {
        (
            file.name.clone(),
            extract_source(table, &file.name, &file.content, filter),
        )
    }));
    debug!(
        files_processed = report.files_processed,
        total_comments = report.total_comments,
        errors_count = report.errors.len(),
        "batch extraction complete"
    );
    report
}

/// Read files through the PAL and extract their comments.
///
/// Read failures are reported per file, like any other extraction error.
#[instrument(skip_all, fields(file_count = paths.len(), filter = %filter))]
pub fn extract_files(
    pal: &PalHandle,
    table: &SyntaxTable,
    paths: &[FilePath],
    filter: CommentFilter,
) -> ExtractionReport {
    let report = ExtractionReport::collect(paths.iter().map(|path| {
        let name = path.to_string();
        let outcome = pal
            .read_file_to_bytes(path)
            .and_then(|content| extract_source(table, &name, &content, filter));
        (name, outcome)
    }));
    debug!(
        files_processed = report.files_processed,
        total_comments = report.total_comments,
        errors_count = report.errors.len(),
        "file extraction complete"
    );
    report
}

fn extract_source(
    table: &SyntaxTable,
    name: &str,
    content: &[u8],
    filter: CommentFilter,
) -> CommentaryResult<Vec<CommentHit>> {
    if content.is_empty() {
        bail!("file is empty");
    }
    let Some(syntax) = table.lookup_file(name) else {
        match file_extension(name) {
            Some(extension) => bail!("unsupported file type '.{}'", extension),
            None => bail!("unsupported file type (no extension)"),
        }
    };
    let text = String::from_utf8_lossy(content);
    if let std::borrow::Cow::Owned(_) = text {
        warn!("{} is not valid UTF-8, invalid sequences were replaced", name);
    }
    Ok(extract(&text, name, syntax, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Category;
    use commentary_base::MockPal;
    use expect_test::expect;

    fn batch(files: &[SourceFile], filter: CommentFilter) -> ExtractionReport {
        extract_batch(&SyntaxTable::with_defaults(), files, filter)
    }

    #[test]
    fn test_batch_merges_and_sorts() {
        let report = batch(
            &[
                SourceFile::new("b.py", "# second file\nx = 1  # inline"),
                SourceFile::new("a.js", "// first\n/* one */ /* two */"),
            ],
            CommentFilter::All,
        );

        assert_eq!(report.files_processed, 2);
        assert_eq!(report.total_comments, 5);
        let rendered: Vec<String> = report.comments.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "a.js:1 [comment] first",
                "a.js:2 [comment] one",
                "a.js:2 [comment] two",
                "b.py:1 [comment] second file",
                "b.py:2 [comment] inline",
            ]
        );
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_per_file_errors_do_not_abort_batch() {
        let report = batch(
            &[
                SourceFile::new("empty.js", ""),
                SourceFile::new("notes.txt", "// looks like a comment"),
                SourceFile::new("Makefile", "# target"),
                SourceFile::new("ok.c", "/** fine */"),
            ],
            CommentFilter::All,
        );

        assert_eq!(report.files_processed, 1);
        assert!(!report.is_empty());
        let errors: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            errors,
            vec![
                "empty.js: file is empty",
                "notes.txt: unsupported file type '.txt'",
                "Makefile: unsupported file type (no extension)",
            ]
        );
        assert_eq!(report.comments[0].category, Category::Doc);
    }

    #[test]
    fn test_report_is_empty_when_nothing_scanned() {
        let report = batch(&[SourceFile::new("a.rb", "# ruby")], CommentFilter::All);
        assert!(report.is_empty());
        assert_eq!(report.errors.len(), 1);

        assert!(batch(&[], CommentFilter::All).is_empty());
    }

    #[test]
    fn test_scanned_file_without_comments_is_not_empty() {
        let report = batch(&[SourceFile::new("a.js", "let x = 1;")], CommentFilter::All);
        assert!(!report.is_empty());
        assert_eq!(report.total_comments, 0);
    }

    #[test]
    fn test_extension_lookup_ignores_case() {
        let report = batch(&[SourceFile::new("MAIN.CPP", "// upper")], CommentFilter::All);
        assert_eq!(report.total_comments, 1);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut content = b"// caf".to_vec();
        content.push(0xE9);
        let report = batch(&[SourceFile::new("a.c", content)], CommentFilter::All);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.comments[0].text, "caf\u{FFFD}");
    }

    #[test]
    fn test_filter_is_applied() {
        let files = [SourceFile::new(
            "a.ts",
            "/** doc */\n// TODO: a\n// FIXME: b\n// plain",
        )];
        assert_eq!(batch(&files, CommentFilter::TodosOrFixmes).total_comments, 2);
        assert_eq!(batch(&files, CommentFilter::DocCommentsOnly).total_comments, 1);
    }

    #[test]
    fn test_report_json() {
        let report = batch(
            &[
                SourceFile::new("a.py", "## docs\n# TODO: fix"),
                SourceFile::new("b.html", ""),
            ],
            CommentFilter::All,
        );
        let json = serde_json::to_string_pretty(&report).unwrap();
        expect![[r#"
            {
              "filesProcessed": 1,
              "totalComments": 2,
              "comments": [
                {
                  "File": "a.py",
                  "LineNumber": 1,
                  "Text": "docs",
                  "Category": "doc"
                },
                {
                  "File": "a.py",
                  "LineNumber": 2,
                  "Text": "TODO: fix",
                  "Category": "todo"
                }
              ],
              "errors": [
                "b.html: file is empty"
              ]
            }"#]]
        .assert_eq(&json);
    }

    #[test]
    fn test_extract_files_reports_read_errors() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("src/app.js"), b"// hello".to_vec());
        let pal = PalHandle::new(mock);

        let report = extract_files(
            &pal,
            &SyntaxTable::with_defaults(),
            &[FilePath::from("src/app.js"), FilePath::from("src/missing.js")],
            CommentFilter::All,
        );

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.comments[0].file, "src/app.js");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].file_name, "src/missing.js");
    }
}
