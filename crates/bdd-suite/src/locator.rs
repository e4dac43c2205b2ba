//! Resolution of a resource path to feature files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

fn feature_path(entry: DirEntry) -> Option<PathBuf> {
    if !entry.file_type().is_file() {
        return None;
    }
    let path = entry.into_path();
    is_feature_file(&path).then_some(path)
}

fn convert_walkdir_error(err: walkdir::Error) -> Option<io::Error> {
    if err.loop_ancestor().is_some() {
        return None;
    }
    let message = err.to_string();
    Some(err.into_io_error().unwrap_or_else(|| io::Error::other(message)))
}

fn collect_feature_files(base: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for next in WalkDir::new(base).follow_links(true) {
        match next {
            Ok(entry) => files.extend(feature_path(entry)),
            Err(err) => {
                if let Some(err) = convert_walkdir_error(err) {
                    return Err(err);
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Feature files named by `path`.
///
/// A directory is searched recursively for `*.feature` files (extension
/// compared case-insensitively) and the result is sorted. When listing
/// `path` fails because it is not a directory, `path` itself is returned.
///
/// # Errors
///
/// Any other I/O error, including a missing path, is returned unchanged.
pub fn locate_features(path: &Path) -> io::Result<Vec<PathBuf>> {
    match fs::read_dir(path) {
        Ok(_) => collect_feature_files(path),
        Err(err) if err.kind() == io::ErrorKind::NotADirectory => {
            tracing::debug!(path = %path.display(), "resource is a single feature file");
            Ok(vec![path.to_path_buf()])
        }
        Err(err) => Err(err),
    }
}
