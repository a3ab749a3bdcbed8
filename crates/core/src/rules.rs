//! Field rules shared by request validation and the handlers.

/// Minimum accepted password length, counted after trimming.
pub const MIN_PASSWORD_LENGTH: u64 = 5;

/// Connection type assigned to sources that are created implicitly.
pub const DEFAULT_SOURCE_TYPE: &str = "stomp";

/// `next_id` value for a freshly created dashboard.
pub const INITIAL_NEXT_ID: i32 = 1;

/// Trim surrounding whitespace from a user-supplied string.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Trim and lower-case an email address.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Treat a missing or blank dashboard password as "no password".
///
/// A non-blank password is returned exactly as given, so it is hashed in
/// the same form a visitor submits it.
pub fn effective_password(value: Option<&str>) -> Option<&str> {
    value.filter(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Maria@Example.COM "), "maria@example.com");
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(normalize_text("\tmaria  "), "maria");
    }

    #[test]
    fn blank_passwords_are_absent() {
        assert_eq!(effective_password(None), None);
        assert_eq!(effective_password(Some("   ")), None);
        assert_eq!(effective_password(Some("")), None);
    }

    #[test]
    fn dashboard_password_keeps_surrounding_whitespace() {
        assert_eq!(effective_password(Some(" secret ")), Some(" secret "));
    }
}
