//! Subdomain and icon validation
//!
//! Subdomains are canonicalized before every directory lookup so keys are
//! stable no matter how the identifier arrived (host parsing, user input).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{TenantError, TenantResult};

/// Maximum icon length, counted in UTF-16 code units
pub const MAX_ICON_LENGTH: usize = 10;

/// Maximum subdomain length (a single DNS label)
pub const MAX_SUBDOMAIN_LENGTH: usize = 63;

/// Subdomains that cannot be registered by tenants
pub const RESERVED_SUBDOMAINS: &[&str] = &[
    "www", "api", "admin", "app", "mail", "static", "assets", "cdn", "status", "docs",
];

/// Lowercase the input and drop every character outside `[a-z0-9-]`.
///
/// Idempotent: `sanitize_subdomain(sanitize_subdomain(x)) == sanitize_subdomain(x)`.
pub fn sanitize_subdomain(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        .collect()
}

/// Validate a subdomain submitted for registration.
///
/// Unlike lookups, registration refuses input that sanitization would alter,
/// so the tenant gets exactly the subdomain they typed.
pub fn validate_new_subdomain(input: &str) -> TenantResult<String> {
    let trimmed = input.trim();
    let sanitized = sanitize_subdomain(trimmed);

    if sanitized.is_empty() {
        return Err(TenantError::InvalidSubdomain(
            "subdomain must not be empty".to_string(),
        ));
    }
    if sanitized != trimmed {
        return Err(TenantError::InvalidSubdomain(
            "subdomain can only have lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    if sanitized.len() > MAX_SUBDOMAIN_LENGTH {
        return Err(TenantError::InvalidSubdomain(format!(
            "subdomain must be at most {MAX_SUBDOMAIN_LENGTH} characters"
        )));
    }
    if sanitized.starts_with('-') || sanitized.ends_with('-') {
        return Err(TenantError::InvalidSubdomain(
            "subdomain cannot start or end with a hyphen".to_string(),
        ));
    }
    if RESERVED_SUBDOMAINS.contains(&sanitized.as_str()) {
        return Err(TenantError::ReservedSubdomain(sanitized));
    }

    Ok(sanitized)
}

/// Compiled `\p{Emoji}` pattern, or `None` when this build of the regex
/// engine has no Unicode property tables.
fn emoji_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    PATTERN
        .get_or_init(|| match Regex::new(r"\p{Emoji}") {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Emoji regex validation failed, using fallback validation"
                );
                None
            }
        })
        .as_ref()
}

/// Validates tenant icons.
///
/// Accepts up to [`MAX_ICON_LENGTH`] code units containing at least one emoji.
/// Without emoji support any string of 1..=10 code units passes.
#[derive(Debug, Clone, Copy)]
pub struct IconValidator {
    emoji: Option<&'static Regex>,
}

impl Default for IconValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl IconValidator {
    pub fn new() -> Self {
        Self {
            emoji: emoji_pattern(),
        }
    }

    /// A validator that always takes the length-only path
    pub fn without_emoji_support() -> Self {
        Self { emoji: None }
    }

    pub fn supports_emoji(&self) -> bool {
        self.emoji.is_some()
    }

    pub fn is_valid(&self, icon: &str) -> bool {
        let len = icon.encode_utf16().count();
        if len > MAX_ICON_LENGTH {
            return false;
        }

        match self.emoji {
            Some(pattern) => pattern.is_match(icon),
            None => len >= 1,
        }
    }

    pub fn validate(&self, icon: &str) -> TenantResult<()> {
        if self.is_valid(icon) {
            Ok(())
        } else {
            Err(TenantError::InvalidIcon(
                "icon must be a short string containing an emoji".to_string(),
            ))
        }
    }
}

/// Shorthand for `IconValidator::new().is_valid(icon)`
pub fn is_valid_icon(icon: &str) -> bool {
    IconValidator::new().is_valid(icon)
}
