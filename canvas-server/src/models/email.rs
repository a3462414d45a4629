//! Owner email validation
//!
//! Accepts "email-shaped" strings: word characters optionally joined by
//! single dots or dashes, an `@`, a domain of the same shape, and one or
//! more 2-3 character TLD groups.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// `\w` is spelled out as ASCII `[A-Za-z0-9_]`.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$",
    )
    .expect("invalid email regex")
});

/// Validated owner email
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Create a new email, validating its shape.
    ///
    /// # Example
    /// ```
    /// use canvas_server::models::Email;
    ///
    /// assert!(Email::new("a@b.com").is_ok());
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "Invalid email format",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        assert!(Email::new("a@b.com").is_ok());
        assert!(Email::new("first.last@example.org").is_ok());
        assert!(Email::new("first-last@mail.example.co.uk").is_ok());
        assert!(Email::new("user_1@sub-domain.io").is_ok());
    }

    #[test]
    fn rejects_missing_at() {
        let err = Email::new("not-an-email").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "email", .. }));
    }

    #[test]
    fn rejects_bad_tld() {
        assert!(Email::new("a@b").is_err());
        assert!(Email::new("a@b.c").is_err());
        assert!(Email::new("a@b.comm").is_err());
    }

    #[test]
    fn rejects_doubled_separators() {
        assert!(Email::new("a..b@example.com").is_err());
        assert!(Email::new(".a@example.com").is_err());
        assert!(Email::new("a@-example.com").is_err());
    }

    #[test]
    fn rejects_non_ascii_word_chars() {
        assert!(Email::new("josé@example.com").is_err());
    }

    #[test]
    fn long_addresses_only_need_the_pattern() {
        let local = "a".repeat(250);
        assert!(Email::new(&format!("{}@b.com", local)).is_ok());
    }

    #[test]
    fn rejects_empty() {
        let err = Email::new("").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }
}
