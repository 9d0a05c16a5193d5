//! Format detection shared by the producers

use std::path::Path;

/// Fixture file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// A `.csv` file, or a directory of them with an ordering file
    Csv,
    /// A `.json` document mapping table names to row arrays
    Json,
}

impl FileFormat {
    /// Detect the format of a file based on its extension
    ///
    /// Directories are always CSV directories.
    pub fn detect_from_path(path: &Path) -> Option<FileFormat> {
        if path.is_dir() {
            return Some(FileFormat::Csv);
        }
        let extension = path.extension()?.to_str()?.to_lowercase();

        match extension.as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Table name for a single-file fixture: the file stem
pub fn table_name_from_path(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()
}
