//! Policy line formatting.
//!
//! A policy line is the textual form of a rule: `ptype, v0, v1, ...`, the
//! shape of a policy CSV file. Tokens that contain commas, quotes or edge
//! whitespace are wrapped in double quotes, with `""` standing for a literal
//! quote.

use std::borrow::Cow;

fn needs_quoting(token: &str) -> bool {
    token.contains(',')
        || token.contains('"')
        || token.starts_with(char::is_whitespace)
        || token.ends_with(char::is_whitespace)
}

/// Quotes a token if it would not otherwise survive tokenization.
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if needs_quoting(token) {
        Cow::Owned(format!("\"{}\"", token.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(token)
    }
}

/// Formats a policy type and its values as a policy line.
pub fn format_policy_line<S: AsRef<str>>(ptype: &str, values: &[S]) -> String {
    let mut line = escape_token(ptype).into_owned();
    for value in values {
        line.push_str(", ");
        line.push_str(&escape_token(value.as_ref()));
    }
    line
}
