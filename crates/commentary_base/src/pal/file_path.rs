use relative_path::{RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};

/// File path relative to the PAL base directory.
///
/// # Examples
///
/// ```
/// use commentary_base::FilePath;
///
/// let path = FilePath::from("src/app.js");
/// assert_eq!(path.file_name(), Some("app.js"));
/// assert_eq!(path.extension(), Some("js"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePathBuf as a reference.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path for use with std::fs operations.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_relative().as_str())
    }

    /// Consumes the FilePath and returns a PathBuf.
    pub fn into_path_buf(self) -> PathBuf {
        PathBuf::from(self.0.as_str())
    }

    /// Final component of the path, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    /// Extension of the final component, without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension()
    }

    /// Joins a relative component onto this path.
    pub fn join(&self, component: impl AsRef<str>) -> Self {
        Self(self.0.join(component.as_ref()))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        Self(RelativePathBuf::from(p.to_string_lossy().replace('\\', "/")))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("src/main.c");
        assert_eq!(path.as_path(), Path::new("src/main.c"));
    }

    #[test]
    fn test_file_path_from_windows_style_path() {
        let path = FilePath::from(Path::new("src\\lib\\util.py"));
        assert_eq!(path.to_string(), "src/lib/util.py");
    }

    #[test]
    fn test_file_name_and_extension() {
        let path = FilePath::from("web/index.html");
        assert_eq!(path.file_name(), Some("index.html"));
        assert_eq!(path.extension(), Some("html"));

        let bare = FilePath::from("Makefile");
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_join() {
        let path = FilePath::from("src").join("app.ts");
        assert_eq!(path, FilePath::from("src/app.ts"));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut paths = vec![FilePath::from("b.js"), FilePath::from("a.js")];
        paths.sort();
        assert_eq!(paths[0], FilePath::from("a.js"));
    }
}
