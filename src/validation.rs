//! Local input checks that run before any remote call.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Syntactic email pre-filter: `local@domain.tld` with no whitespace or
/// extra `@`. Says nothing about deliverability.
pub fn validate_email_syntax(email: &str) -> bool {
    EMAIL_SYNTAX.is_match(email)
}
