use std::fmt;
use std::str::FromStr;

use commentary_base::{CommentaryError, err};
use serde::{Deserialize, Serialize};

/// Classification of a comment fragment.
///
/// Ordered by priority: a fragment mentioning TODO or FIXME is `Todo` even
/// inside a doc comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Todo,
    Doc,
    Comment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doc => "doc",
            Self::Comment => "comment",
        }
    }

    /// Category of a cleaned fragment.
    pub fn classify(text: &str, is_doc: bool) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("TODO") || upper.contains("FIXME") {
            Self::Todo
        } else if is_doc {
            Self::Doc
        } else {
            Self::Comment
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which categories end up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum CommentFilter {
    #[default]
    All,
    TodosOrFixmes,
    DocCommentsOnly,
}

impl CommentFilter {
    /// The wire name (`all`, `todo` or `doc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::TodosOrFixmes => "todo",
            Self::DocCommentsOnly => "doc",
        }
    }

    pub fn accepts(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::TodosOrFixmes => category == Category::Todo,
            Self::DocCommentsOnly => category == Category::Doc,
        }
    }
}

impl fmt::Display for CommentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentFilter {
    type Err = Box<CommentaryError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "todo" => Ok(Self::TodosOrFixmes),
            "doc" => Ok(Self::DocCommentsOnly),
            _ => Err(err!(
                "unknown filter '{}' (expected 'all', 'todo' or 'doc')",
                s
            )),
        }
    }
}

impl TryFrom<String> for CommentFilter {
    type Error = Box<CommentaryError>;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One comment fragment found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentHit {
    #[serde(rename = "File")]
    pub file: String,
    /// 1-based physical line of the fragment.
    #[serde(rename = "LineNumber")]
    pub line_number: usize,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Category")]
    pub category: Category,
}

impl fmt::Display for CommentHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} [{}] {}",
            self.file, self.line_number, self.category, self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        assert_eq!(Category::classify("todo: fix me", true), Category::Todo);
        assert_eq!(Category::classify("Fixme later", false), Category::Todo);
        assert_eq!(Category::classify("returns the sum", true), Category::Doc);
        assert_eq!(Category::classify("plain", false), Category::Comment);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<CommentFilter>().unwrap(), CommentFilter::All);
        assert_eq!(
            " TODO ".parse::<CommentFilter>().unwrap(),
            CommentFilter::TodosOrFixmes
        );
        assert_eq!(
            "doc".parse::<CommentFilter>().unwrap(),
            CommentFilter::DocCommentsOnly
        );
        let error = "docs".parse::<CommentFilter>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "unknown filter 'docs' (expected 'all', 'todo' or 'doc')"
        );
    }

    #[test]
    fn test_filter_accepts() {
        assert!(CommentFilter::All.accepts(Category::Comment));
        assert!(CommentFilter::TodosOrFixmes.accepts(Category::Todo));
        assert!(!CommentFilter::TodosOrFixmes.accepts(Category::Doc));
        assert!(CommentFilter::DocCommentsOnly.accepts(Category::Doc));
        assert!(!CommentFilter::DocCommentsOnly.accepts(Category::Todo));
    }

    #[test]
    fn test_hit_serialization() {
        let hit = CommentHit {
            file: "a.js".to_string(),
            line_number: 3,
            text: "TODO: x".to_string(),
            category: Category::Todo,
        };
        assert_eq!(
            serde_json::to_string(&hit).unwrap(),
            r#"{"File":"a.js","LineNumber":3,"Text":"TODO: x","Category":"todo"}"#
        );
        assert_eq!(hit.to_string(), "a.js:3 [todo] TODO: x");
    }
}
