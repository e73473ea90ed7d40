//! Core type definitions used throughout the codebase

/// Navigation target identifier carried by leaf menu entries
pub type ActionId = i64;

/// Department (organisational unit) scoping a catalog fetch
pub type DepartmentId = i64;

/// Returned when a leaf has no recorded action identifier
pub const ACTION_NOT_FOUND: ActionId = -1;

/// Menu group that is never part of the catalog, together with its subtree
pub const EXCLUDED_GROUP: &str = "Companies";

/// Separator between the level-1 group and the leaf in a full path
pub const PATH_SEPARATOR: char = '-';

/// Whether a name is a composite `group-leaf` path rather than a bare leaf name
pub fn is_composite(name: &str) -> bool {
    name.contains(PATH_SEPARATOR)
}

/// Final segment of a composite path (the name itself if not composite)
pub fn last_segment(name: &str) -> &str {
    name.rsplit(PATH_SEPARATOR).next().unwrap_or(name)
}

/// Level-1 group of a full path, `None` for a bare leaf name
pub fn parent_name(full_path: &str) -> Option<&str> {
    full_path
        .split_once(PATH_SEPARATOR)
        .map(|(parent, _)| parent)
}

/// Length in characters, which is what every scoring rule counts
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Numeric user id sent to the directory service.
///
/// Identities look like `<user>_<session>`; only the leading user part is
/// meaningful to the directory. Non-numeric identities map to 0.
pub fn directory_user_id(identity: &str) -> i64 {
    identity
        .split('_')
        .next()
        .and_then(|head| head.trim().parse().ok())
        .unwrap_or(0)
}
