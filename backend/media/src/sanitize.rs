//! Message-id sanity check.
//!
//! A message id becomes a file name inside the downloads directory. Only
//! `A`-`Z` and `0`-`9` are accepted, which leaves no room for separators,
//! dots or drive prefixes that could break out of that directory.

/// Whether `id` consists solely of uppercase ASCII letters and digits.
///
/// The empty string is sane; `paths::ensure_direct_child` catches it.
pub fn is_sane_id(id: &str) -> bool {
    id.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
