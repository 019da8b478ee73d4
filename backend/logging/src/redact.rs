//! Log Redaction Layer
//!
//! Scrubs phone numbers (peer JIDs embed them) and access tokens from
//! strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+?\d{7,}|(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TELEPHONE_RE.replace_all(input, "[REDACTED_PHONE]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "Sending to +1-555-123-4567 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("+1-555-123-4567"));
        assert!(!clean.contains("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn test_jid_redaction() {
        let clean = redact_sensitive_data("4915112345678@s.whatsapp.net");
        assert_eq!(clean, "[REDACTED_PHONE]@s.whatsapp.net");
    }

    #[test]
    fn test_group_jid_redaction() {
        let clean = redact_sensitive_data("120363012345678901@g.us");
        assert_eq!(clean, "[REDACTED_PHONE]@g.us");
    }

    #[test]
    fn test_message_ids_untouched() {
        assert_eq!(redact_sensitive_data("3EB0ABCDEF"), "3EB0ABCDEF");
    }
}
