/// File classification: maps a file to the name of the folder it belongs in.
///
/// Two families of rules are supported. Type-mode and extension-mode look at
/// the file name only; size-mode and date-mode derive a bucket from the
/// file's metadata.
///
/// # Examples
///
/// ```
/// use onlyfiles::file_category::TypeTable;
///
/// let table = TypeTable::V1.table();
/// assert_eq!(table.classify("holiday.JPG"), "Images");
/// assert_eq!(table.classify("notes.md"), "Documents");
/// assert_eq!(table.classify("firmware.bin"), "Others");
/// ```
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::Metadata;
use thiserror::Error;

/// Folder used by extension-mode for files without an extension.
pub const NO_EXTENSION: &str = "no_extension";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Problems found while building a [`CategoryTable`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("extension '{extension}' is listed under both '{first}' and '{second}'")]
    OverlappingExtension {
        extension: String,
        first: String,
        second: String,
    },

    #[error("category names must not be empty")]
    EmptyCategoryName,

    #[error("category '{0}' is declared twice")]
    DuplicateCategory(String),
}

/// The built-in category tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TypeTable {
    /// Images / Documents / Music / Videos / Others
    #[default]
    V1,
    /// images / documents / audio / video / archives / code / others
    V2,
}

const TABLE_V1: &[(&str, &[&str])] = &[
    ("Music", &[".mp3", ".wav", ".aac", ".flac", ".ogg", ".m4a"]),
    ("Videos", &[".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"]),
    (
        "Images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
    ),
    (
        "Documents",
        &[
            ".pdf", ".txt", ".docx", ".doc", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".md",
        ],
    ),
];

const TABLE_V2: &[(&str, &[&str])] = &[
    ("images", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"]),
    (
        "documents",
        &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx"],
    ),
    ("audio", &[".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg"]),
    ("video", &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv"]),
    ("archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    ("code", &[".py", ".js", ".html", ".css", ".java", ".cpp", ".h", ".php"]),
];

impl TypeTable {
    fn entries(&self) -> (&'static [(&'static str, &'static [&'static str])], &'static str) {
        match self {
            TypeTable::V1 => (TABLE_V1, "Others"),
            TypeTable::V2 => (TABLE_V2, "others"),
        }
    }

    /// Builds the category table for this variant.
    pub fn table(&self) -> CategoryTable {
        let (entries, catch_all) = self.entries();
        let mut table = CategoryTable::empty(catch_all);
        for (name, extensions) in entries {
            table
                .push(name, extensions.iter().copied())
                .expect("built-in tables have disjoint extensions");
        }
        table
    }
}

/// A validated mapping from category name to a set of extensions.
///
/// Extensions are stored lowercase with a leading dot and are disjoint
/// across categories. The catch-all category has no extensions and receives
/// every file no other category claims.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<(String, Vec<String>)>,
    lookup: HashMap<String, usize>,
    catch_all: String,
}

impl CategoryTable {
    /// Creates a table from `(category, extensions)` pairs.
    ///
    /// Extensions may be given with or without the leading dot and in any
    /// case. Fails if an extension appears in two categories.
    pub fn new<I, N, E, S>(entries: I, catch_all: &str) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (N, E)>,
        N: AsRef<str>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if catch_all.trim().is_empty() {
            return Err(TableError::EmptyCategoryName);
        }
        let mut table = Self::empty(catch_all);
        for (name, extensions) in entries {
            table.push(name.as_ref(), extensions)?;
        }
        Ok(table)
    }

    fn empty(catch_all: &str) -> Self {
        Self {
            categories: Vec::new(),
            lookup: HashMap::new(),
            catch_all: catch_all.to_string(),
        }
    }

    fn push<E, S>(&mut self, name: &str, extensions: E) -> Result<(), TableError>
    where
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if name.trim().is_empty() {
            return Err(TableError::EmptyCategoryName);
        }
        if name == self.catch_all || self.categories.iter().any(|(n, _)| n == name) {
            return Err(TableError::DuplicateCategory(name.to_string()));
        }

        let index = self.categories.len();
        let mut normalized = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if ext.len() < 2 || normalized.contains(&ext) {
                continue;
            }
            if let Some(&other) = self.lookup.get(&ext) {
                return Err(TableError::OverlappingExtension {
                    extension: ext,
                    first: self.categories[other].0.clone(),
                    second: name.to_string(),
                });
            }
            self.lookup.insert(ext.clone(), index);
            normalized.push(ext);
        }
        self.categories.push((name.to_string(), normalized));
        Ok(())
    }

    /// Returns the category for `file_name`, falling back to the catch-all.
    pub fn classify(&self, file_name: &str) -> &str {
        extension_of(file_name)
            .and_then(|ext| self.category_for_extension(&ext))
            .unwrap_or(self.catch_all.as_str())
    }

    /// Looks up the category owning `extension` (with or without the dot).
    pub fn category_for_extension(&self, extension: &str) -> Option<&str> {
        self.lookup
            .get(&normalize_extension(extension))
            .map(|&i| self.categories[i].0.as_str())
    }

    /// True when some non-catch-all category lists the file's extension.
    pub fn is_known(&self, file_name: &str) -> bool {
        extension_of(file_name).is_some_and(|ext| self.lookup.contains_key(&ext))
    }

    /// Name of the catch-all category.
    pub fn catch_all(&self) -> &str {
        &self.catch_all
    }

    /// Extensions listed for `category`, empty for the catch-all.
    pub fn extensions(&self, category: &str) -> Option<&[String]> {
        if category == self.catch_all {
            return Some(&[]);
        }
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, exts)| exts.as_slice())
    }

    /// Category names in declaration order, catch-all last.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(std::iter::once(self.catch_all.as_str()))
    }
}

/// Lowercases an extension and ensures it carries a leading dot.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Extracts the lowercase extension (with its dot) from a file name.
///
/// Leading dots do not start an extension, so `.bashrc` has none, and a
/// trailing dot yields none either.
pub fn extension_of(file_name: &str) -> Option<String> {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    let (stem, ext) = file_name[stem_start..].rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

/// Folder naming for date-mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateLayout {
    /// `YYYY-MM`, one directory level.
    #[default]
    Flat,
    /// `YYYY/MM`, two directory levels.
    Nested,
}

/// How a directory is split into category folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMode {
    /// Table-driven lookup by extension.
    Type,
    /// One folder per extension.
    Extension,
    /// Size buckets: tiny, small, medium, large, huge.
    Size,
    /// Creation month.
    Date(DateLayout),
}

impl ClassificationMode {
    /// Derives the category for a file.
    ///
    /// `metadata` is only consulted for size and date modes; callers may pass
    /// `None` for the others.
    pub fn classify(
        &self,
        file_name: &str,
        metadata: Option<&Metadata>,
        table: &CategoryTable,
    ) -> std::io::Result<String> {
        match self {
            ClassificationMode::Type => Ok(table.classify(file_name).to_string()),
            ClassificationMode::Extension => Ok(extension_of(file_name)
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or_else(|| NO_EXTENSION.to_string())),
            ClassificationMode::Size => {
                let metadata = require_metadata(metadata)?;
                Ok(size_bucket(metadata.len()).to_string())
            }
            ClassificationMode::Date(layout) => {
                let metadata = require_metadata(metadata)?;
                let created = metadata.created().or_else(|_| metadata.modified())?;
                Ok(date_bucket(DateTime::<Local>::from(created), *layout))
            }
        }
    }
}

fn require_metadata(metadata: Option<&Metadata>) -> std::io::Result<&Metadata> {
    metadata.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "metadata required for this classification",
        )
    })
}

/// Size bucket for a byte count.
pub fn size_bucket(bytes: u64) -> &'static str {
    match bytes {
        b if b < KIB => "tiny",
        b if b < MIB => "small",
        b if b < 10 * MIB => "medium",
        b if b < 100 * MIB => "large",
        _ => "huge",
    }
}

/// Date bucket for a creation time.
pub fn date_bucket(time: DateTime<Local>, layout: DateLayout) -> String {
    match layout {
        DateLayout::Flat => time.format("%Y-%m").to_string(),
        DateLayout::Nested => time.format("%Y/%m").to_string(),
    }
}
