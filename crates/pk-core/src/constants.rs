//! Shared constants

/// Name of the implicit identity mate every component has
pub const ORIGIN_MATE: &str = "origin";

/// Separator between child names in a component path
pub const PATH_SEPARATOR: char = '.';

/// Join a parent path and a child name
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    }
}
