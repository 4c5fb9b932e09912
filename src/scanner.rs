//! Top-level directory scanning.
//!
//! Enumerates the entries directly inside a directory (never recursing),
//! classifies the regular files by extension and groups them into a
//! [`ScanResult`]. The same enumeration feeds the relocator's candidate list.

use crate::config::CompiledFilters;
use crate::error::{SortError, SortResult};
use crate::file_category::{ExtensionTable, extension_of};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A regular file found directly inside the scanned directory.
#[derive(Debug, Clone)]
pub(crate) struct ListedFile {
    /// Lossy UTF-8 name, used for classification and reporting.
    pub name: String,
    /// Name as stored on disk.
    pub os_name: OsString,
    pub path: PathBuf,
}

/// Lists the regular files directly inside `dir`, in enumeration order.
///
/// Symlinks are followed, so a link to a regular file is listed; directories and
/// dangling links are skipped. Files rejected by `filters` are skipped as well.
pub(crate) fn list_files(
    dir: &Path,
    filters: Option<&CompiledFilters>,
) -> SortResult<Vec<ListedFile>> {
    let entries = fs::read_dir(dir).map_err(|e| SortError::from_enumeration(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SortError::from_enumeration(dir, e))?;
        let path = entry.path();

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                debug!(path = %path.display(), "skipping non-file entry");
                continue;
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        }

        let os_name = entry.file_name();
        let name = os_name.to_string_lossy().into_owned();
        if let Some(filters) = filters
            && !filters.should_include(&name)
        {
            debug!(file = %name, "excluded by filters");
            continue;
        }

        files.push(ListedFile {
            name,
            os_name,
            path,
        });
    }

    Ok(files)
}

/// Files of one extension found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionBucket {
    /// Always equal to `files.len()`.
    pub count: usize,
    /// File names in enumeration order, which is platform-dependent.
    pub files: Vec<String>,
    pub category: String,
}

/// Classified files of a directory, keyed by normalized extension.
///
/// Every key is present in the extension table the scan used. The order of
/// `files` within a bucket is whatever the OS enumeration returned; compare
/// buckets as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    buckets: BTreeMap<String, ExtensionBucket>,
}

impl ScanResult {
    fn add(&mut self, ext: String, category: &str, file_name: String) {
        let bucket = self
            .buckets
            .entry(ext)
            .or_insert_with(|| ExtensionBucket {
                count: 0,
                files: Vec::new(),
                category: category.to_string(),
            });
        bucket.count += 1;
        bucket.files.push(file_name);
    }

    pub fn get(&self, ext: &str) -> Option<&ExtensionBucket> {
        self.buckets.get(ext)
    }

    /// Buckets sorted by extension.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionBucket)> {
        self.buckets.iter().map(|(ext, bucket)| (ext.as_str(), bucket))
    }

    /// Extensions that were found, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    /// Number of distinct extensions found.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.count).sum()
    }

    /// File counts per category.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for bucket in self.buckets.values() {
            *counts.entry(bucket.category.clone()).or_insert(0) += bucket.count;
        }
        counts
    }
}

/// Scans a directory against an extension table.
pub struct Scanner<'a> {
    table: &'a ExtensionTable,
    filters: Option<&'a CompiledFilters>,
}

impl<'a> Scanner<'a> {
    pub fn new(table: &'a ExtensionTable) -> Self {
        Self {
            table,
            filters: None,
        }
    }

    /// Leaves out files the filters reject.
    pub fn with_filters(mut self, filters: &'a CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Counts the classified files directly inside `dir`, by extension.
    ///
    /// A missing directory yields an empty result rather than an error.
    ///
    /// # Errors
    ///
    /// [`SortError::PermissionDenied`] if the directory cannot be read, and
    /// [`SortError::Io`] for any other enumeration failure. No partial result is
    /// returned in either case.
    pub fn scan(&self, dir: &Path) -> SortResult<ScanResult> {
        let mut result = ScanResult::default();
        if !dir.exists() {
            debug!(path = %dir.display(), "scan path does not exist");
            return Ok(result);
        }

        for file in list_files(dir, self.filters)? {
            let ext = extension_of(&file.name);
            if let Some(category) = self.table.classify(&file.name) {
                result.add(ext, category, file.name);
            }
        }

        debug!(
            path = %dir.display(),
            extensions = result.len(),
            files = result.total_files(),
            "scan complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SorterConfig;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"content").expect("Failed to write test file");
    }

    #[test]
    fn test_scan_nonexistent_path_is_empty() {
        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table)
            .scan(Path::new("/non/existent/path"))
            .expect("scan of a missing path must not fail");
        assert!(result.is_empty());
        assert_eq!(result.total_files(), 0);
    }

    #[test]
    fn test_scan_groups_by_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        touch(base, "a.jpg");
        touch(base, "B.JPG");
        touch(base, "c.pdf");
        touch(base, "README");
        touch(base, "data.unknownext");

        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table).scan(base).unwrap();

        assert_eq!(result.extensions(), vec![".jpg", ".pdf"]);
        let jpg = result.get(".jpg").unwrap();
        assert_eq!(jpg.count, 2);
        assert_eq!(jpg.category, "Images");
        let names: HashSet<&str> = jpg.files.iter().map(String::as_str).collect();
        assert_eq!(names, HashSet::from(["a.jpg", "B.JPG"]));

        assert_eq!(result.get(".pdf").unwrap().count, 1);
        assert_eq!(result.total_files(), 3);
    }

    #[test]
    fn test_scan_does_not_recurse() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("nested.jpg")).unwrap();
        touch(&base.join("nested.jpg"), "inner.png");
        touch(base, "top.png");

        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table).scan(base).unwrap();

        assert_eq!(result.extensions(), vec![".png"]);
        assert_eq!(result.get(".png").unwrap().files, vec!["top.png".to_string()]);
    }

    #[test]
    fn test_scan_count_matches_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for i in 0..7 {
            touch(temp_dir.path(), &format!("song{}.mp3", i));
        }

        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table).scan(temp_dir.path()).unwrap();
        for (_, bucket) in result.iter() {
            assert_eq!(bucket.count, bucket.files.len());
        }
        assert_eq!(result.category_counts().get("Audio"), Some(&7));
    }

    #[test]
    fn test_scan_applies_filters() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "keep.txt");
        touch(temp_dir.path(), "skip.txt");

        let config = SorterConfig::from_toml_str(
            r#"
            [filters.exclude]
            filenames = ["skip.txt"]
            "#,
        )
        .unwrap();
        let filters = config.compile_filters().unwrap();
        let table = ExtensionTable::builtin();

        let result = Scanner::new(&table)
            .with_filters(&filters)
            .scan(temp_dir.path())
            .unwrap();
        assert_eq!(result.get(".txt").unwrap().files, vec!["keep.txt".to_string()]);
    }

    #[test]
    fn test_scan_file_instead_of_directory_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "plain.txt");

        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table).scan(&temp_dir.path().join("plain.txt"));
        assert!(matches!(result, Err(SortError::Io { .. })));
    }

    #[test]
    fn test_scan_result_serializes_as_map() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "a.zip");

        let table = ExtensionTable::builtin();
        let result = Scanner::new(&table).scan(temp_dir.path()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json[".zip"]["count"], 1);
        assert_eq!(json[".zip"]["category"], "Compressed");
        assert_eq!(json[".zip"]["files"][0], "a.zip");
    }
}
