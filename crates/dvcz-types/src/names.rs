//! Identifier grammar shared by project, store, login, handle and language
//! names.
//!
//! A valid name:
//! - Must be non-empty
//! - Must start with an ASCII letter or `_`
//! - May otherwise contain only ASCII letters, digits and `_`
//!
//! So no dots, dashes, whitespace or path separators: a name is always safe
//! to use as a single file name and never collides with the `::` descriptor
//! delimiter.

use crate::error::TypeError;

/// Returns `true` if `name` satisfies the identifier grammar.
///
/// # Examples
///
/// ```
/// use dvcz_types::names::is_valid_name;
///
/// assert!(is_valid_name("dvcz"));
/// assert!(is_valid_name("_build_2"));
/// assert!(!is_valid_name("2fast"));
/// assert!(!is_valid_name("my-project"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate `name`, naming the role it plays (`"project name"`, `"login"`,
/// ...) in the error.
pub fn validate_name(kind: &'static str, name: &str) -> Result<(), TypeError> {
    if is_valid_name(name) {
        return Ok(());
    }
    let reason = match name.chars().next() {
        None => "must not be empty".to_string(),
        Some(c) if c.is_ascii_digit() => "must not start with a digit".to_string(),
        Some(_) => match name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            Some(bad) => format!("contains forbidden character: {bad:?}"),
            None => "invalid".to_string(),
        },
    };
    Err(TypeError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    })
}
