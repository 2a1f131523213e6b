//! Inclusion and exclusion rules applied to directory entries.

use std::fs::Metadata;

use crate::config::SourceConfig;
use crate::path::{is_descendant_path, is_same_or_descendant_path, normalize_index_path};

/// Directory names that are never indexed.
pub const RESERVED_DIRECTORIES: &[&str] = &["$RECYCLE.BIN", "System Volume Information"];

/// Directory suffix indexed as a regular file.
const BUNDLE_SUFFIX: &str = ".app";

/// Entry filters compiled from a `SourceConfig`, with paths normalized once.
#[derive(Debug, Clone, Default)]
pub struct EntryRules {
    ignore_hidden: bool,
    include_files: Vec<String>,
    include_folders: Vec<String>,
    exclude_file_paths: Vec<String>,
    exclude_folder_paths: Vec<String>,
    exclude_file_names: Vec<String>,
    exclude_folder_names: Vec<String>,
    exclude_file_suffixes: Vec<String>,
    exclude_folder_suffixes: Vec<String>,
}

impl EntryRules {
    pub fn from_config(config: &SourceConfig) -> Self {
        let normalize_all =
            |paths: &[String]| paths.iter().map(|path| normalize_index_path(path)).collect();
        Self {
            ignore_hidden: config.ignore_hidden,
            include_files: normalize_all(&config.include.file_paths),
            include_folders: normalize_all(&config.include.folder_paths),
            exclude_file_paths: normalize_all(&config.exclude.file_paths),
            exclude_folder_paths: normalize_all(&config.exclude.folder_paths),
            exclude_file_names: config.exclude.file_names.clone(),
            exclude_folder_names: config.exclude.folder_names.clone(),
            exclude_file_suffixes: config.exclude.file_ends_with.clone(),
            exclude_folder_suffixes: config.exclude.folder_ends_with.clone(),
        }
    }

    /// Returns true if the entry at `path` should be indexed.
    ///
    /// `is_dir` is false for bundles, which are indexed as files.
    pub fn admits(&self, path: &str, name: &str, is_dir: bool, hidden: bool) -> bool {
        if is_dir && RESERVED_DIRECTORIES.contains(&name) {
            return false;
        }
        if !self.included(path, is_dir) {
            return false;
        }
        !self.excluded(path, name, is_dir, hidden)
    }

    fn has_include_rules(&self) -> bool {
        !self.include_files.is_empty() || !self.include_folders.is_empty()
    }

    fn included(&self, path: &str, is_dir: bool) -> bool {
        if !self.has_include_rules() {
            return true;
        }
        if self
            .include_folders
            .iter()
            .any(|folder| is_same_or_descendant_path(path, folder))
        {
            return true;
        }
        if is_dir {
            // Ancestors of an included path must be walked to reach it.
            self.include_folders
                .iter()
                .chain(self.include_files.iter())
                .any(|included| is_descendant_path(included, path))
        } else {
            self.include_files.iter().any(|file| file == path)
        }
    }

    fn excluded(&self, path: &str, name: &str, is_dir: bool, hidden: bool) -> bool {
        if hidden && self.ignore_hidden {
            return true;
        }
        let under_excluded_folder = self.exclude_folder_paths.iter().any(|folder| {
            if is_dir {
                is_same_or_descendant_path(path, folder)
            } else {
                is_descendant_path(path, folder)
            }
        });
        if under_excluded_folder {
            return true;
        }
        if is_dir {
            self.exclude_folder_names.iter().any(|excluded| excluded == name)
                || self
                    .exclude_folder_suffixes
                    .iter()
                    .any(|suffix| name.ends_with(suffix.as_str()))
        } else {
            self.exclude_file_paths.iter().any(|excluded| excluded == path)
                || self.exclude_file_names.iter().any(|excluded| excluded == name)
                || self
                    .exclude_file_suffixes
                    .iter()
                    .any(|suffix| name.ends_with(suffix.as_str()))
        }
    }
}

/// Returns true for dotfiles, and for entries carrying the hidden attribute on Windows.
pub fn is_hidden(name: &str, metadata: &Metadata) -> bool {
    if name.starts_with('.') {
        return true;
    }
    hidden_attribute(metadata)
}

#[cfg(windows)]
fn hidden_attribute(metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn hidden_attribute(_metadata: &Metadata) -> bool {
    false
}

/// macOS application bundles are listed as files and never descended into.
pub fn is_bundle(name: &str) -> bool {
    name.len() > BUNDLE_SUFFIX.len() && name.ends_with(BUNDLE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExcludeRules, IncludeRules};

    fn rules_with(config: SourceConfig) -> EntryRules {
        EntryRules::from_config(&config)
    }

    #[test]
    fn default_rules_admit_everything_but_reserved() {
        let rules = EntryRules::default();
        assert!(rules.admits("/a.txt", "a.txt", false, false));
        assert!(rules.admits("/.git", ".git", true, true));
        assert!(!rules.admits("/$RECYCLE.BIN", "$RECYCLE.BIN", true, false));
        assert!(!rules.admits(
            "/System Volume Information",
            "System Volume Information",
            true,
            false
        ));
    }

    #[test]
    fn ignore_hidden_drops_hidden_entries() {
        let rules = rules_with(SourceConfig {
            ignore_hidden: true,
            ..SourceConfig::default()
        });
        assert!(!rules.admits("/.env", ".env", false, true));
        assert!(!rules.admits("/.cache", ".cache", true, true));
        assert!(rules.admits("/visible", "visible", true, false));
    }

    #[test]
    fn exclusions_by_name_suffix_and_path() {
        let rules = rules_with(SourceConfig {
            exclude: ExcludeRules {
                file_paths: vec!["docs/secret.txt".to_string()],
                folder_paths: vec!["/private".to_string()],
                file_names: vec!["Thumbs.db".to_string()],
                folder_names: vec!["node_modules".to_string()],
                file_ends_with: vec![".tmp".to_string()],
                folder_ends_with: vec!["_cache".to_string()],
            },
            ..SourceConfig::default()
        });

        assert!(!rules.admits("/docs/secret.txt", "secret.txt", false, false));
        assert!(rules.admits("/docs/public.txt", "public.txt", false, false));
        assert!(!rules.admits("/private", "private", true, false));
        assert!(!rules.admits("/private/a.txt", "a.txt", false, false));
        assert!(rules.admits("/private2", "private2", true, false));
        assert!(!rules.admits("/x/Thumbs.db", "Thumbs.db", false, false));
        assert!(!rules.admits("/x/node_modules", "node_modules", true, false));
        assert!(!rules.admits("/x/build.tmp", "build.tmp", false, false));
        assert!(rules.admits("/x/build.tmp", "build.tmp", true, false));
        assert!(!rules.admits("/x/img_cache", "img_cache", true, false));
    }

    #[test]
    fn inclusions_reach_nested_paths() {
        let rules = rules_with(SourceConfig {
            include: IncludeRules {
                file_paths: vec!["/notes/todo.md".to_string()],
                folder_paths: vec!["/media/photos".to_string()],
            },
            ..SourceConfig::default()
        });

        assert!(rules.admits("/media", "media", true, false));
        assert!(rules.admits("/media/photos", "photos", true, false));
        assert!(rules.admits("/media/photos/2024/a.jpg", "a.jpg", false, false));
        assert!(!rules.admits("/media/music", "music", true, false));
        assert!(!rules.admits("/media/readme.txt", "readme.txt", false, false));
        assert!(rules.admits("/notes", "notes", true, false));
        assert!(rules.admits("/notes/todo.md", "todo.md", false, false));
        assert!(!rules.admits("/notes/other.md", "other.md", false, false));
        assert!(!rules.admits("/other", "other", true, false));
    }

    #[test]
    fn bundles_need_a_stem() {
        assert!(is_bundle("Safari.app"));
        assert!(!is_bundle(".app"));
        assert!(!is_bundle("application"));
    }
}
