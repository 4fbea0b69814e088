//! Slug derivation and validation.

use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};

/// Default upper bound on slug length (characters).
pub const DEFAULT_SLUG_MAX_LENGTH: usize = 50;

/// Derives slugs from labels and validates caller-supplied slugs.
///
/// Derived slugs are truncated to `max_length`; explicit slugs are validated
/// and rejected when too long. Callers that mutate existing sections must
/// pre-validate.
#[derive(Debug, Clone)]
pub struct SlugPolicy {
    max_length: usize,
    invalid_chars: Regex,
    separators: Regex,
    valid: Regex,
}

impl Default for SlugPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SLUG_MAX_LENGTH)
    }
}

impl SlugPolicy {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            invalid_chars: Regex::new(r"[^\w\s-]").expect("static slug pattern"),
            separators: Regex::new(r"[-\s]+").expect("static slug pattern"),
            valid: Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static slug pattern"),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Turn a label into a slug: drop punctuation, lowercase, collapse
    /// whitespace and dashes into single dashes, truncate.
    pub fn slugify(&self, label: &str) -> String {
        let ascii: String = label.chars().filter(char::is_ascii).collect();
        let stripped = self.invalid_chars.replace_all(&ascii, "");
        let lowered = stripped.trim().to_lowercase();
        let joined = self.separators.replace_all(&lowered, "-");
        self.truncate(joined.trim_matches('-'))
    }

    /// Truncate to the maximum length without leaving a dangling dash.
    pub fn truncate(&self, slug: &str) -> String {
        let cut: String = slug.chars().take(self.max_length).collect();
        cut.trim_end_matches('-').to_string()
    }

    /// Resolve the slug for a new section: explicit slugs are truncated and
    /// checked, missing ones derived from the label.
    pub fn for_new_section(&self, label: &str, slug: Option<&str>) -> DomainResult<String> {
        let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => self.truncate(explicit),
            None => self.slugify(label),
        };
        self.validate(&slug)?;
        Ok(slug)
    }

    /// Check a slug without modifying it.
    pub fn validate(&self, slug: &str) -> DomainResult<()> {
        self.validate_format(slug)?;
        let length = slug.chars().count();
        if length > self.max_length {
            return Err(DomainError::InvalidSlug {
                slug: slug.to_string(),
                reason: format!("{length} characters exceeds maximum of {}", self.max_length),
            });
        }
        Ok(())
    }

    /// Character checks only. Slugs that already exist keep their length
    /// when the maximum is lowered later.
    pub fn validate_format(&self, slug: &str) -> DomainResult<()> {
        if slug.is_empty() {
            return Err(DomainError::InvalidSlug {
                slug: slug.to_string(),
                reason: "slug is empty".to_string(),
            });
        }
        if !self.valid.is_match(slug) {
            return Err(DomainError::InvalidSlug {
                slug: slug.to_string(),
                reason: "only letters, digits, '-' and '_' are allowed".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello World", "hello-world")]
    #[case("  Intro: Part 1!  ", "intro-part-1")]
    #[case("a -- b", "a-b")]
    #[case("Crème brûlée", "crme-brle")]
    #[case("snake_case stays", "snake_case-stays")]
    fn test_slugify(#[case] label: &str, #[case] expected: &str) {
        let policy = SlugPolicy::default();
        assert_eq!(policy.slugify(label), expected);
    }

    #[test]
    fn test_slugify_truncates_to_max_length() {
        let policy = SlugPolicy::new(5);
        assert_eq!(policy.slugify("abcd efgh"), "abcd");
        assert_eq!(policy.slugify("abcdefgh"), "abcde");
    }

    #[test]
    fn test_validate_rejects_overlong_slug() {
        let policy = SlugPolicy::new(3);
        let err = policy.validate("abcd").unwrap_err();
        assert!(matches!(err, DomainError::InvalidSlug { .. }));
    }

    #[test]
    fn test_validate_format_ignores_length() {
        let policy = SlugPolicy::new(3);
        assert!(policy.validate_format("abcdef").is_ok());
        assert!(policy.validate_format("ab cd").is_err());
        assert!(policy.validate_format("").is_err());
    }

    #[test]
    fn test_for_new_section_rejects_label_without_slug_characters() {
        let policy = SlugPolicy::default();
        assert!(policy.for_new_section("!!!", None).is_err());
        assert_eq!(policy.for_new_section("!!!", Some("bang")).unwrap(), "bang");
    }
}
