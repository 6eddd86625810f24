//! Decoding of JSON sub-documents embedded in CSV fields.
//!
//! The movie dataset writes these in Python literal notation
//! (`[{'id': 16, 'name': 'Animation'}]`, `None`, `True`). Strict JSON is tried
//! first; on failure the text is normalised to JSON and decoded again.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A sub-document that could not be interpreted.
#[derive(Debug, Error)]
#[error("{reason} (input: {snippet})")]
pub struct NestedError {
    pub reason: String,
    pub snippet: String,
}

impl NestedError {
    fn new(reason: impl Into<String>, input: &str) -> Self {
        let snippet: String = input.chars().take(80).collect();
        Self {
            reason: reason.into(),
            snippet,
        }
    }
}

/// Decodes a list-valued field. Missing or blank fields are an empty list.
pub fn decode_list<T: DeserializeOwned>(field: Option<&str>) -> Result<Vec<T>, NestedError> {
    match non_blank(field) {
        None => Ok(Vec::new()),
        Some(text) => decode::<Option<Vec<T>>>(text).map(Option::unwrap_or_default),
    }
}

/// Decodes an object-valued field that may be absent, blank or `null`.
pub fn decode_optional<T: DeserializeOwned>(field: Option<&str>) -> Result<Option<T>, NestedError> {
    match non_blank(field) {
        None => Ok(None),
        Some(text) => decode::<Option<T>>(text),
    }
}

fn non_blank(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, NestedError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            let normalized = normalize_python_literal(text)
                .ok_or_else(|| NestedError::new(strict_err.to_string(), text))?;
            serde_json::from_str(&normalized).map_err(|e| NestedError::new(e.to_string(), text))
        }
    }
}

/// Rewrites Python literal notation to JSON.
///
/// Single-quoted strings become double-quoted (escaping embedded `"`), and the
/// bare words `None`, `True`, `False` outside strings become `null`, `true`,
/// `false`. Returns `None` on an unterminated string.
pub fn normalize_python_literal(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push('"');
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            // \' is only an escape inside single quotes; JSON has no such escape
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => return None,
                        },
                        '"' if quote == '\'' => out.push_str("\\\""),
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        ch => out.push(ch),
                    }
                }
                if !closed {
                    return None;
                }
                out.push('"');
            }
            ch if ch.is_ascii_alphabetic() => {
                let mut word = String::from(ch);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "None" => "null",
                    "True" => "true",
                    "False" => "false",
                    _ => &word,
                });
            }
            ch => out.push(ch),
        }
    }

    Some(out)
}
