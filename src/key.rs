//! Key path utilities.

/// Splits a key path into its segments.
///
/// `"p.admin.drive.name"` with separator `"."` yields
/// `["p", "admin", "drive", "name"]`. An empty path has no segments.
#[must_use]
pub fn split_key<'a>(key: &'a str, separator: &str) -> Vec<&'a str> {
    if key.is_empty() {
        return Vec::new();
    }
    key.split(separator).collect()
}

/// Joins a parent path and a child segment.
#[must_use]
pub fn join_key(parent: Option<&str>, segment: &str, separator: &str) -> String {
    parent.map_or_else(|| segment.to_string(), |p| format!("{p}{separator}{segment}"))
}

/// Returns true if a single key segment can be reached through a joined path.
#[must_use]
pub fn is_reachable_segment(segment: &str, separator: &str) -> bool {
    !segment.is_empty() && !segment.contains(separator)
}

/// Checks if `child_key` lies under `parent_key`.
#[must_use]
pub fn is_child_key(child_key: &str, parent_key: &str, separator: &str) -> bool {
    let Some(remainder) = child_key.strip_prefix(parent_key) else {
        return false;
    };

    !remainder.is_empty() && remainder.starts_with(separator)
}
