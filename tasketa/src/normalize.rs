//! Rewrites a hand-pasted task-status payload into strict JSON text.
//!
//! Tolerated deviations: a request line (or any other junk) before the first
//! `{`, `"""block"""` string values, and `//` line comments outside strings.

use std::sync::LazyLock;

use log::{debug, trace};
use regex::{Captures, Regex};

static BLOCK_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"([^"]+)"\s*:\s*"""(.*?)""""#).expect("block string pattern compiles")
});

/// Never fails: anything it cannot make sense of is passed through for the
/// decoder to reject.
pub fn normalize(raw: &str) -> String {
    let body = strip_leading_junk(raw);
    let body = rewrite_block_strings(body);
    let body = strip_line_comments(&body);
    let normalized = body.replace('\n', " ");
    debug!(
        "Normalized input: {} bytes in, {} bytes out",
        raw.len(),
        normalized.len()
    );
    normalized
}

fn strip_leading_junk(raw: &str) -> &str {
    match raw.find('{') {
        Some(start) if start > 0 => {
            trace!("Dropping {} bytes before the first brace", start);
            &raw[start..]
        }
        _ => raw,
    }
}

fn rewrite_block_strings(text: &str) -> String {
    BLOCK_STRING
        .replace_all(text, |caps: &Captures| {
            format!("\"{}\": \"{}\"", &caps[1], escape_block_content(&caps[2]))
        })
        .into_owned()
}

// Backslashes first so later substitutions are not escaped twice.
fn escape_block_content(content: &str) -> String {
    content
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escape_next = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if escape_next {
            out.push(ch);
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => {
                out.push(ch);
                if in_string {
                    escape_next = true;
                }
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            '/' if !in_string && chars.peek() == Some(&'/') => {
                // Drop the comment body but keep its line terminator.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
