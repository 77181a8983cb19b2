/* 📖 # Finding files to scan

The CLI scans the `[[directory]]` roots of the configuration when it is not
given explicit paths. Each root is walked with its glob patterns; a root that
cannot be walked is recorded in `errors` and the other roots are still
scanned. Roots may overlap, so the file list is deduplicated and sorted.
*/

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use commentary_base::{CommentaryError, FilePath, PalHandle};

use crate::Config;

/// Files found under the configured directories.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Matching files, sorted and without duplicates.
    pub files: Vec<FilePath>,
    /// Roots (or entries below them) that could not be walked.
    pub errors: Vec<ScanError>,
}

/// Error while walking one configured root.
#[derive(Debug)]
pub struct ScanError {
    pub directory_path: String,
    pub error: Box<CommentaryError>,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.directory_path, self.error)
    }
}

/// Collect the files matching the configured directories and globs.
#[instrument(skip(pal, config), fields(directory_count = config.directory.len()))]
pub fn scan_files(pal: &PalHandle, config: &Config) -> ScanResult {
    let mut files = BTreeSet::new();
    let mut errors = Vec::new();

    for directory in &config.directory {
        for root in &directory.paths {
            let walk = match pal.walk_directory(&FilePath::from(root.as_str()), &directory.globs) {
                Ok(walk) => walk,
                Err(error) => {
                    warn!("cannot walk '{}': {}", root, error);
                    errors.push(ScanError {
                        directory_path: root.clone(),
                        error,
                    });
                    continue;
                }
            };
            for entry in walk {
                match entry {
                    Ok(file) => {
                        files.insert(file);
                    }
                    Err(error) => {
                        warn!("error below '{}': {}", root, error);
                        errors.push(ScanError {
                            directory_path: root.clone(),
                            error,
                        });
                    }
                }
            }
        }
    }

    debug!(
        files_found = files.len(),
        errors_count = errors.len(),
        "directory scan complete"
    );
    ScanResult {
        files: files.into_iter().collect(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectoryConfig;
    use commentary_base::MockPal;

    fn config(directories: Vec<DirectoryConfig>) -> Config {
        Config {
            directory: directories,
            ..Config::default()
        }
    }

    fn directory(paths: &[&str], globs: &[&str]) -> DirectoryConfig {
        DirectoryConfig {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            globs: globs.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_scan_files_across_directories() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("src/app.js"), b"// app".to_vec());
        mock.add_file(FilePath::from("src/util.py"), b"# util".to_vec());
        mock.add_file(FilePath::from("web/index.html"), b"<!-- i -->".to_vec());
        mock.add_file(FilePath::from("web/readme.txt"), b"text".to_vec());

        let pal = PalHandle::new(mock);
        let result = scan_files(
            &pal,
            &config(vec![
                directory(&["src"], &["*.js", "*.py"]),
                directory(&["web"], &["*.html"]),
            ]),
        );

        assert_eq!(
            result.files,
            vec![
                FilePath::from("src/app.js"),
                FilePath::from("src/util.py"),
                FilePath::from("web/index.html"),
            ]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_overlapping_roots_are_deduplicated() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("src/a.c"), vec![]);
        mock.add_file(FilePath::from("src/nested/b.c"), vec![]);

        let pal = PalHandle::new(mock);
        let result = scan_files(
            &pal,
            &config(vec![
                directory(&["src", "src/nested"], &["**/*.c"]),
                directory(&["."], &["**/*.c"]),
            ]),
        );

        assert_eq!(
            result.files,
            vec![FilePath::from("src/a.c"), FilePath::from("src/nested/b.c")]
        );
    }

    #[test]
    fn test_empty_config_finds_nothing() {
        let pal = PalHandle::new(MockPal::new());
        let result = scan_files(&pal, &Config::default());
        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_invalid_glob_is_collected_and_scan_continues() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("lib/x.ts"), vec![]);

        let pal = PalHandle::new(mock);
        let result = scan_files(
            &pal,
            &config(vec![
                directory(&["src"], &["[broken"]),
                directory(&["lib"], &["*.ts"]),
            ]),
        );

        assert_eq!(result.files, vec![FilePath::from("lib/x.ts")]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].directory_path, "src");
    }
}
