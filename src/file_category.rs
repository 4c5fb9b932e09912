//! Extension-based file classification.
//!
//! This module owns the [`ExtensionTable`], an immutable mapping from a normalized
//! extension (leading dot, lowercase) to a category name, together with the
//! filename classifier built on top of it.
//!
//! # Examples
//!
//! ```
//! use dirsorter::file_category::ExtensionTable;
//!
//! let table = ExtensionTable::builtin();
//! assert_eq!(table.classify("holiday.JPG"), Some("Images"));
//! assert_eq!(table.classify("notes.txt"), Some("Documents"));
//! assert_eq!(table.classify("Makefile"), None);
//! ```

use crate::config::ConfigError;
use std::collections::{BTreeMap, HashMap};

/// The built-in category table, grouped by category.
///
/// `.ts` is listed under Code only: a TypeScript source is far more common in a
/// download folder than an MPEG transport stream.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".webp", ".tif", ".tiff",
            ".raw", ".cr2", ".nef", ".orf", ".sr2", ".heic", ".heif", ".psd", ".ai", ".eps",
            ".dng", ".jfif", ".avif",
        ],
    ),
    (
        "Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods",
            ".odp", ".rtf", ".tex", ".wpd", ".pages", ".numbers", ".key", ".csv", ".md", ".log",
            ".epub", ".mobi", ".azw", ".azw3",
        ],
    ),
    (
        "Audio",
        &[
            ".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma", ".opus", ".alac", ".ape",
            ".aiff", ".aif", ".mid", ".midi", ".amr", ".weba", ".ra", ".ram", ".dsf", ".dff",
        ],
    ),
    (
        "Video",
        &[
            ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg",
            ".3gp", ".3g2", ".f4v", ".swf", ".vob", ".ogv", ".m2ts", ".mts", ".divx",
        ],
    ),
    (
        "Compressed",
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".tbz2", ".zipx", ".cab",
            ".iso", ".dmg", ".pkg", ".deb", ".rpm", ".z", ".lz",
        ],
    ),
    (
        "Code",
        &[
            // Programming languages
            ".py", ".js", ".java", ".cpp", ".c", ".h", ".hpp", ".cs", ".rb", ".php", ".swift",
            ".go", ".rs", ".kt", ".scala", ".r", ".m", ".vb", ".pl", ".perl", ".sh", ".bash",
            ".bat", ".cmd", ".ps1", ".lua", ".dart", ".f", ".f90", ".asm", ".s",
            // Web
            ".html", ".htm", ".css", ".scss", ".sass", ".less", ".jsx", ".tsx", ".ts", ".vue",
            ".svelte", ".xml", ".xhtml", ".asp", ".aspx", ".jsp",
            // Configuration and data
            ".json", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".properties", ".env",
            ".sql", ".db", ".sqlite",
        ],
    ),
    (
        "Executables",
        &[
            ".exe", ".msi", ".app", ".apk", ".jar", ".war", ".dll", ".so", ".dylib", ".bin",
            ".com", ".gadget",
        ],
    ),
    (
        "Fonts",
        &[".ttf", ".otf", ".woff", ".woff2", ".eot", ".fon", ".fnt"],
    ),
    (
        "3D",
        &[
            ".obj", ".fbx", ".stl", ".dae", ".3ds", ".blend", ".max", ".c4d", ".ma", ".mb",
            ".skp", ".ply",
        ],
    ),
    (
        "Databases",
        &[".sqlite3", ".mdb", ".accdb", ".frm", ".myd", ".myi"],
    ),
    (
        "Virtualization",
        &[".vmdk", ".vdi", ".vhd", ".vhdx", ".ova", ".ovf"],
    ),
    (
        "Other",
        &[
            ".torrent", ".lnk", ".url", ".webloc", ".tmp", ".temp", ".bak", ".old",
        ],
    ),
];

/// Extracts the normalized extension of a filename.
///
/// The extension is everything from the last `.` onwards, lowercased. A name
/// without a dot, or ending in a dot, yields the empty string, which is never a
/// table key.
///
/// ```
/// use dirsorter::file_category::extension_of;
///
/// assert_eq!(extension_of("Report.PDF"), ".pdf");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of(".env"), ".env");
/// assert_eq!(extension_of("README"), "");
/// assert_eq!(extension_of("trailing."), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => file_name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Normalizes a user-supplied extension (`jpg`, `.JPG`, ` .Jpg `) to table form.
///
/// Returns `None` for input that cannot name an extension.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty()
        || trimmed.contains(['.', '/', '\\'])
        || trimmed.contains(char::is_whitespace)
    {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Immutable extension to category mapping.
///
/// Built once at startup (from [`ExtensionTable::builtin`] or from configuration)
/// and handed to the scanner and relocator by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionTable {
    map: HashMap<String, String>,
}

impl ExtensionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table covering images, documents, audio, video, archives,
    /// source code, executables, fonts, 3D models, databases, disk images and
    /// miscellaneous leftovers.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (category, extensions) in BUILTIN_CATEGORIES {
            for ext in *extensions {
                table
                    .map
                    .insert((*ext).to_string(), (*category).to_string());
            }
        }
        table
    }

    /// Builds a table from `category -> extensions` groups.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a category name is blank or an extension
    /// cannot be normalized.
    pub fn from_categories<I, C, E>(groups: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (C, Vec<E>)>,
        C: AsRef<str>,
        E: AsRef<str>,
    {
        let mut table = Self::new();
        table.extend_categories(groups)?;
        Ok(table)
    }

    /// Adds or overrides mappings from `category -> extensions` groups.
    pub fn extend_categories<I, C, E>(&mut self, groups: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (C, Vec<E>)>,
        C: AsRef<str>,
        E: AsRef<str>,
    {
        for (category, extensions) in groups {
            for ext in extensions {
                self.insert(ext.as_ref(), category.as_ref())?;
            }
        }
        Ok(())
    }

    /// Maps one extension to a category, replacing any previous mapping.
    pub fn insert(&mut self, ext: &str, category: &str) -> Result<(), ConfigError> {
        let category = category.trim();
        if category.is_empty()
            || category.contains(['/', '\\'])
            || category == "."
            || category == ".."
        {
            return Err(ConfigError::InvalidCategory(category.to_string()));
        }
        let ext = normalize_extension(ext)
            .ok_or_else(|| ConfigError::InvalidExtension(ext.to_string()))?;
        self.map.insert(ext, category.to_string());
        Ok(())
    }

    /// Classifies a filename by its extension.
    ///
    /// Case-insensitive; returns `None` when the extension is missing or unknown.
    pub fn classify(&self, file_name: &str) -> Option<&str> {
        let ext = extension_of(file_name);
        if ext.is_empty() {
            return None;
        }
        self.map.get(&ext).map(String::as_str)
    }

    /// Looks up the category of a single extension, accepting `jpg` or `.JPG`.
    pub fn category_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = normalize_extension(ext)?;
        self.map.get(&ext).map(String::as_str)
    }

    /// All known extensions, sorted.
    pub fn all_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.map.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Extensions grouped by category; both levels sorted.
    pub fn extensions_by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (ext, category) in &self.map {
            groups.entry(category.as_str()).or_default().push(ext.as_str());
        }
        for extensions in groups.values_mut() {
            extensions.sort_unstable();
        }
        groups
    }

    /// Extensions belonging to `category`, compared case-insensitively.
    pub fn extensions_in_category(&self, category: &str) -> Vec<&str> {
        let mut extensions: Vec<&str> = self
            .map
            .iter()
            .filter(|(_, cat)| cat.eq_ignore_ascii_case(category))
            .map(|(ext, _)| ext.as_str())
            .collect();
        extensions.sort_unstable();
        extensions
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
