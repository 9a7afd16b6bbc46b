//! Export run configuration

use std::path::PathBuf;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Plain text document
    Text,
    /// YAML-like structured text document
    Yaml,
    /// HTML document set (index plus per-chat pages)
    Html,
    /// JSON document
    Json,
}

impl Format {
    /// File name of the entry-point artifact for this format
    pub fn main_file_name(&self) -> &'static str {
        match self {
            Format::Text => "export_results.txt",
            Format::Yaml => "export_results.yaml",
            Format::Html => "export_results.html",
            Format::Json => "export_results.json",
        }
    }
}

bitflags! {
    /// Data categories selected for inclusion in a run
    ///
    /// The driver owns the choice; the engine records it and the driver
    /// simply does not feed sections it excluded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Categories: u32 {
        const PERSONAL_INFO = 1 << 0;
        const USERPICS      = 1 << 1;
        const CONTACTS      = 1 << 2;
        const SESSIONS      = 1 << 3;
        const CHATS         = 1 << 4;
        const LEFT_CHANNELS = 1 << 5;
    }
}

impl Default for Categories {
    fn default() -> Self {
        Categories::all()
    }
}

/// Immutable configuration snapshot for one export run
///
/// Owned by the driver and read-only to the engine.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory all artifacts are produced under
    pub output_dir: PathBuf,
    /// Chosen output format
    pub format: Format,
    /// Categories the driver intends to feed
    pub categories: Categories,
}

impl Settings {
    /// Create settings for a run with all categories included
    pub fn new(output_dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            categories: Categories::default(),
        }
    }

    /// Restrict the run to the given categories
    pub fn with_categories(mut self, categories: Categories) -> Self {
        self.categories = categories;
        self
    }

    /// Path of the entry-point artifact for this configuration
    pub fn main_file_path(&self) -> PathBuf {
        self.output_dir.join(self.format.main_file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_file_path_is_deterministic() {
        let settings = Settings::new("/tmp/out", Format::Json);
        assert_eq!(
            settings.main_file_path(),
            PathBuf::from("/tmp/out/export_results.json")
        );
        assert_eq!(settings.main_file_path(), settings.main_file_path());
    }

    #[test]
    fn test_default_categories_include_everything() {
        let settings = Settings::new("/tmp/out", Format::Text);
        assert!(settings.categories.contains(Categories::USERPICS));
        assert!(settings.categories.contains(Categories::LEFT_CHANNELS));
    }

    #[test]
    fn test_with_categories() {
        let settings = Settings::new("/tmp/out", Format::Html)
            .with_categories(Categories::PERSONAL_INFO | Categories::CHATS);
        assert!(settings.categories.contains(Categories::CHATS));
        assert!(!settings.categories.contains(Categories::SESSIONS));
    }
}
