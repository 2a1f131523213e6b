//! Query string parsing: free-text terms plus `type:` and `case:` tokens.

use crate::file_type::FileKind;

const TYPE_PREFIX: &str = "type:";
const CASE_EXACT: &str = "case:exact";
const LARGER_THAN: &str = "largerThan=";
const SMALLER_THAN: &str = "smallerThan=";
const DEFAULT_SIZE_MIB: u64 = 100;
const MIB: u64 = 1024 * 1024;

/// Filters carried by `type:` tokens. All set filters must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilters {
    /// Allowed file kinds; empty means any kind.
    pub kinds: Vec<FileKind>,
    /// `Some(true)` keeps only directories, `Some(false)` only files.
    pub dir: Option<bool>,
    /// Exclusive lower bound in bytes.
    pub larger_than: Option<u64>,
    /// Exclusive upper bound in bytes.
    pub smaller_than: Option<u64>,
}

impl TypeFilters {
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
            && self.dir.is_none()
            && self.larger_than.is_none()
            && self.smaller_than.is_none()
    }

    pub fn admits(&self, kind: FileKind, size: u64) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&kind) {
            return false;
        }
        if let Some(dir) = self.dir {
            if dir != kind.is_dir() {
                return false;
            }
        }
        if let Some(bound) = self.larger_than {
            if size <= bound {
                return false;
            }
        }
        if let Some(bound) = self.smaller_than {
            if size >= bound {
                return false;
            }
        }
        true
    }

    /// Applies one `type:` value. Unknown values are ignored.
    fn apply(&mut self, value: &str) {
        if let Some(raw) = value.strip_prefix(LARGER_THAN) {
            self.larger_than = Some(parse_mib(raw));
            return;
        }
        if let Some(raw) = value.strip_prefix(SMALLER_THAN) {
            self.smaller_than = Some(parse_mib(raw));
            return;
        }
        let kind = match value {
            "image" => FileKind::Image,
            "audio" | "music" => FileKind::Audio,
            "video" => FileKind::Video,
            "doc" => FileKind::Doc,
            "archive" => FileKind::Archive,
            "folder" => {
                self.dir = Some(true);
                return;
            }
            "file" => {
                self.dir = Some(false);
                return;
            }
            other => {
                log::debug!("filesystem search ignoring type filter value={other}");
                return;
            }
        };
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }
}

/// Megabytes to bytes; zero or unparsable input falls back to 100.
fn parse_mib(raw: &str) -> u64 {
    let megabytes = match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => DEFAULT_SIZE_MIB,
        Ok(value) => value,
    };
    megabytes.saturating_mul(MIB)
}

/// A parsed search query.
///
/// Terms are OR'd. When the query is case-insensitive the terms are stored
/// lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub filters: TypeFilters,
    pub case_sensitive: bool,
}

impl SearchQuery {
    /// Parses a raw query. Parsing never fails; malformed tokens are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut filters = TypeFilters::default();
        let mut case_sensitive = false;

        // Split on single spaces so runs of spaces inside quotes survive the rejoin.
        let remaining = raw
            .split(' ')
            .filter(|token| {
                if let Some(value) = token.strip_prefix(TYPE_PREFIX) {
                    filters.apply(value);
                    false
                } else if *token == CASE_EXACT {
                    case_sensitive = true;
                    false
                } else {
                    true
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let remaining = remaining.trim();

        let mut terms = split_terms(remaining);
        if !case_sensitive {
            for term in &mut terms {
                *term = term.to_lowercase();
            }
        }

        Self {
            terms,
            filters,
            case_sensitive,
        }
    }

    /// Tests a name against one of this query's terms and the type filters.
    pub fn matches(&self, term: &str, name: &str, kind: FileKind, size: u64) -> bool {
        let name_matches = if self.case_sensitive {
            name.contains(term)
        } else {
            name.to_lowercase().contains(term)
        };
        name_matches && self.filters.admits(kind, size)
    }
}

fn split_terms(text: &str) -> Vec<String> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return vec![text[1..text.len() - 1].to_string()];
    }
    let terms: Vec<String> = text
        .split('|')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        vec![String::new()]
    } else {
        terms
    }
}
