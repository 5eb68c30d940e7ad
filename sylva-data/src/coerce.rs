//! String-to-value coercion for filter tokens.
//!
//! The order of the checks is part of the token contract: identifier columns
//! stay text, then boolean literals, then digit strings, then floats, then text.

use crate::value::SqlValue;

const TRUE_LITERALS: [&str; 2] = ["true", "t"];
const FALSE_LITERALS: [&str; 2] = ["false", "f"];

/// Coerce the raw value of a filter token on `column`.
///
/// `id_column` is the identifier column of the record type; its values are
/// opaque keys and never become numbers.
pub fn coerce(id_column: &str, column: &str, raw: &str) -> SqlValue {
    if column == id_column {
        return SqlValue::Text(raw.to_string());
    }

    let lowered = raw.to_lowercase();
    if TRUE_LITERALS.contains(&lowered.as_str()) {
        return SqlValue::Bool(true);
    }
    if FALSE_LITERALS.contains(&lowered.as_str()) {
        return SqlValue::Bool(false);
    }

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        // Too large for i64: fall through to the float attempt.
        if let Ok(i) = raw.parse::<i64>() {
            return SqlValue::Int(i);
        }
    }

    match raw.parse::<f64>() {
        Ok(x) => SqlValue::Float(x),
        Err(_) => SqlValue::Text(raw.to_string()),
    }
}
