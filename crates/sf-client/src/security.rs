//! Input hygiene for values that end up in request paths.
//!
//! Object names and job ids come from callers and are spliced into URLs.
//! Object names are checked against the platform's API-name grammar and ids
//! are percent-encoded so neither can escape its path segment.
//!
//! ```rust
//! use sfkit_client::security::{names, url};
//!
//! assert!(names::is_safe_sobject_name("Custom_Object__c"));
//! assert_eq!(url::encode_param("750/../x"), "750%2F..%2Fx");
//! ```

/// API-name validation.
pub mod names {
    /// Check that a name follows the API-name grammar: an ASCII letter
    /// followed by ASCII letters, digits or underscores.
    #[must_use]
    pub fn is_safe_api_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// Validate that an SObject name is safe to place in a URL path.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_api_name(name)
    }
}

/// URL encoding utilities for parameter safety.
pub mod url {
    /// Percent-encode a single path segment or query value.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}
