//! Name canonicalization utilities for the Tapestry backend
//!
//! The backend stores every content-type and field name in a canonical
//! lowercase-with-underscores form. Declared schemas may use any casing
//! (PascalCase, camelCase, spaces, hyphens); these routines convert between
//! the authored form and the canonical form.

/// Convert an arbitrary name to canonical lowercase-with-underscores form.
///
/// An underscore is inserted at each lower-to-upper (or digit-to-upper)
/// transition, whitespace and hyphens become underscores, any other
/// non-alphanumeric character is dropped, repeated underscores collapse to
/// one, and leading/trailing underscores are trimmed.
///
/// The function is idempotent: `to_snake_case(to_snake_case(x))` equals
/// `to_snake_case(x)` for all inputs.
pub fn to_snake_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;

    for ch in raw.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            out.push('_');
            prev = Some('_');
            continue;
        }
        if !ch.is_ascii_alphanumeric() {
            // Stripped entirely; does not create a word boundary
            continue;
        }
        if ch.is_ascii_uppercase() {
            if let Some(p) = prev {
                if p.is_ascii_lowercase() || p.is_ascii_digit() {
                    out.push('_');
                }
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }

    // Collapse repeated underscores and trim the ends
    let mut result = String::with_capacity(out.len());
    let mut last_was_underscore = true;
    for ch in out.chars() {
        if ch == '_' {
            if !last_was_underscore {
                result.push('_');
            }
            last_was_underscore = true;
        } else {
            result.push(ch);
            last_was_underscore = false;
        }
    }
    if result.ends_with('_') {
        result.pop();
    }
    result
}

/// Convert a canonical lowercase-with-underscores name to camelCase.
///
/// The inverse direction of [`to_snake_case`], used when rendering a remote
/// schema back into an authorable manifest.
pub fn to_camel_case(canonical: &str) -> String {
    let mut out = String::with_capacity(canonical.len());
    let mut capitalize_next = false;

    for ch in canonical.chars() {
        if ch == '_' {
            // A leading underscore does not capitalize the first segment
            capitalize_next = !out.is_empty();
            continue;
        }
        if capitalize_next {
            out.push(ch.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
