//! Route pattern grammar
//!
//! Registered patterns are stored in normalized form: every `:name` and
//! `*name` token is replaced by its introducing byte alone, and the names
//! are collected in declaration order. `denormalize` is the inverse and is
//! only used to render a stored route for conflict diagnostics; it plays
//! no part in matching.

use crate::error::RouteError;

/// Replaces wildcard tokens with single-byte sentinels and extracts their
/// names in left-to-right order.
pub(crate) fn normalize(pattern: &str) -> Result<(String, Vec<String>), RouteError> {
    let bytes = pattern.as_bytes();
    let mut normalized = String::with_capacity(pattern.len());
    let mut names = Vec::new();

    let mut start = 0;
    while start < bytes.len() {
        let c = bytes[start];
        if c != b':' && c != b'*' {
            // copy the literal run up to the next wildcard introducer
            let run = pattern[start..]
                .find(&[':', '*'][..])
                .map_or(bytes.len(), |i| start + i);
            normalized.push_str(&pattern[start..run]);
            start = run;
            continue;
        }

        normalized.push(c as char);

        // the name runs until the next '/' or the end of the pattern
        let mut token_end = bytes.len();
        for (i, &b) in bytes[start + 1..].iter().enumerate() {
            match b {
                b'/' => {
                    token_end = start + 1 + i;
                    break;
                }
                b':' | b'*' => {
                    return Err(RouteError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: "only one wildcard per path segment is allowed",
                    });
                }
                _ => {}
            }
        }

        if token_end == start + 1 {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "wildcards must be named with a non-empty name",
            });
        }

        if c == b'*' {
            if start > 1 && bytes[start - 1] != b'/' {
                return Err(RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "catch-all may not appear within a segment",
                });
            }
            if token_end != bytes.len() {
                return Err(RouteError::CatchAllNotTerminal(pattern.to_string()));
            }
        }

        names.push(pattern[start + 1..token_end].to_string());
        start = token_end;
    }

    Ok((normalized, names))
}

/// Rebuilds a readable path from a normalized pattern by substituting each
/// sentinel with the next unused name. Sentinels beyond the supplied names
/// are kept as-is rather than failing; this output only ever lands in
/// error messages.
pub(crate) fn denormalize(normalized: &str, names: &[String]) -> String {
    let mut path = String::with_capacity(normalized.len());
    let mut names = names.iter();
    for c in normalized.chars() {
        match c {
            ':' | '*' => match names.next() {
                Some(name) => path.push_str(name),
                None => path.push(c),
            },
            _ => path.push(c),
        }
    }
    path
}
