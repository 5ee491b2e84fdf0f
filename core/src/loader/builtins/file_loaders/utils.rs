use glob::glob;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::loader::LoaderError;

const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

/// Resolves glob patterns (or plain paths) to a sorted, de-duplicated list of files.
///
/// Directories are walked recursively and contribute only delimited text files.
/// Every pattern has to match at least one file.
pub(super) fn resolve_input_to_files(inputs: &[String]) -> Result<Vec<PathBuf>, LoaderError> {
    let mut files = Vec::new();

    for input in inputs {
        let mut matched = false;
        for entry in glob(input)? {
            match entry {
                Ok(path) => {
                    if path.is_dir() {
                        for entry in WalkDir::new(&path) {
                            let entry = entry.map_err(|e| LoaderError::Io {
                                path: path.clone(),
                                source: e.into(),
                            })?;
                            if entry.file_type().is_file() && is_delimited(entry.path()) {
                                files.push(entry.path().to_path_buf());
                                matched = true;
                            }
                        }
                    } else if path.is_file() {
                        files.push(path);
                        matched = true;
                    }
                }
                Err(e) => warn!("Glob error: {e}"),
            }
        }
        if !matched {
            return Err(LoaderError::NoMatchingFiles(input.clone()));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DELIMITED_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();
        std::fs::write(dir.path().join("nested/b.csv"), "x\n2\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let files = resolve_input_to_files(&[dir.path().display().to_string()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.csv"), dir.path().join("nested/b.csv")]
        );
    }

    #[test]
    fn test_resolve_glob_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();
        let pattern = format!("{}/*.csv", dir.path().display());
        let plain = dir.path().join("a.csv").display().to_string();

        let files = resolve_input_to_files(&[pattern, plain]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_resolve_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.csv", dir.path().display());

        let result = resolve_input_to_files(&[pattern.clone()]);
        assert!(matches!(result, Err(LoaderError::NoMatchingFiles(p)) if p == pattern));
    }
}
