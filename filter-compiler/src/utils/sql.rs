//! SQL utility functions

use std::sync::OnceLock;

use regex::Regex;

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// MySQL uses backslash as the default LIKE escape character, so the escaped
/// pattern can be bound as-is without an `ESCAPE` clause.
///
/// # Example
///
/// ```
/// use eventadmin_filter::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build a comma-separated list of `?` placeholders
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Whether `name` is safe to splice into SQL as a (optionally qualified) identifier
///
/// Accepts `column`, `table.column` and `schema.table.column` built from
/// ASCII letters, digits and underscores. Used for names that come from
/// configuration or the field catalog, never for filter values.
pub fn is_valid_identifier(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

    let re = IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*){0,2}$").expect("Invalid regex")
    });
    re.is_match(name)
}

/// Point a column qualified by `from_table` at `to_table`
///
/// Unqualified columns and columns of other tables are returned unchanged.
pub fn requalify(column: &str, from_table: &str, to_table: &str) -> String {
    match column
        .strip_prefix(from_table)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        Some(name) => format!("{to_table}.{name}"),
        None => column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requalify() {
        assert_eq!(
            requalify("reservations.project_id", "reservations", "waitlist"),
            "waitlist.project_id"
        );
        assert_eq!(requalify("project_id", "reservations", "waitlist"), "project_id");
        assert_eq!(
            requalify("reservations_archive.project_id", "reservations", "waitlist"),
            "reservations_archive.project_id"
        );
        assert_eq!(
            requalify("guests.reservation_id", "reservations", "waitlist"),
            "guests.reservation_id"
        );
    }

    #[test]
    fn test_escape_like_pattern_no_special_chars() {
        assert_eq!(escape_like_pattern("hello"), "hello");
    }

    #[test]
    fn test_escape_like_pattern_percent() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
    }

    #[test]
    fn test_escape_like_pattern_underscore() {
        assert_eq!(escape_like_pattern("foo_bar"), "foo\\_bar");
    }

    #[test]
    fn test_escape_like_pattern_backslash() {
        assert_eq!(escape_like_pattern("path\\file"), "path\\\\file");
    }

    #[test]
    fn test_escape_like_pattern_multibyte() {
        assert_eq!(escape_like_pattern("予約_確定"), "予約\\_確定");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("reservations"));
        assert!(is_valid_identifier("reservations.project_id"));
        assert!(is_valid_identifier("event_db.reservations.project_id"));
        assert!(is_valid_identifier("_tmp1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a.b.c.d"));
        assert!(!is_valid_identifier("reservations; DROP TABLE x"));
        assert!(!is_valid_identifier("name`"));
        assert!(!is_valid_identifier("a..b"));
    }
}
