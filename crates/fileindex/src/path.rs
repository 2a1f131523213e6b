//! Index path normalization and helpers.
//!
//! Index paths are always relative to a source root, use forward slashes,
//! start with `/`, and never end with `/` (except the root itself).

/// The index path of a source root.
pub const ROOT_PATH: &str = "/";

/// Normalizes a raw path into index form.
///
/// Backslashes become forward slashes, empty and `.` segments are dropped and
/// `..` pops a segment without escaping the root.
pub fn normalize_index_path(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in replaced.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return ROOT_PATH.to_string();
    }
    let mut normalized = String::with_capacity(replaced.len() + 1);
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

/// Joins a child name onto a normalized parent path.
pub fn join_index_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns the parent of a normalized path, or `None` for the root.
pub fn parent_index_path(path: &str) -> Option<&str> {
    if path == ROOT_PATH {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT_PATH),
        Some(split) => Some(&path[..split]),
        None => None,
    }
}

/// Returns the last segment of a normalized path (empty for the root).
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Checks if `candidate` is strictly below `parent`.
pub fn is_descendant_path(candidate: &str, parent: &str) -> bool {
    if candidate == parent {
        return false;
    }
    if parent == ROOT_PATH {
        return candidate.starts_with('/');
    }
    candidate
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Checks if `candidate` equals `parent` or lies below it.
pub fn is_same_or_descendant_path(candidate: &str, parent: &str) -> bool {
    candidate == parent || is_descendant_path(candidate, parent)
}

/// Number of `/`-separated segments in a relative or index path.
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

/// Returns `candidate` relative to `scope`, without a leading slash.
pub fn relative_to_scope<'a>(candidate: &'a str, scope: &str) -> &'a str {
    if scope == ROOT_PATH {
        return candidate.trim_start_matches('/');
    }
    candidate
        .strip_prefix(scope)
        .unwrap_or(candidate)
        .trim_start_matches('/')
}

/// Extracts the lowercase extension from a filename.
pub fn extension_of_name(name: &str) -> Option<String> {
    let split = name.rfind('.')?;
    if split == 0 || split + 1 >= name.len() {
        return None;
    }
    Some(name[split + 1..].to_ascii_lowercase())
}
