//! File path helpers

use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory
///
/// Other paths, relative or absolute, are returned as given.
///
/// ```
/// use eventadmin_filter::utils::file::expand_path;
///
/// assert_eq!(expand_path("/etc/eventadmin.json"), std::path::PathBuf::from("/etc/eventadmin.json"));
/// assert_eq!(expand_path("filters/vip.json"), std::path::PathBuf::from("filters/vip.json"));
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }

    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/.eventadmin/eventadmin.json"), home.join(".eventadmin/eventadmin.json"));
        }
    }

    #[test]
    fn test_expand_path_trims_and_keeps_relative() {
        assert_eq!(expand_path("  catalog.json "), PathBuf::from("catalog.json"));
        assert_eq!(expand_path("./a/b"), PathBuf::from("./a/b"));
    }
}
