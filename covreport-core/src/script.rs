//! Reader for producer data scripts
//!
//! The producer writes page data as a script of `var NAME = VALUE;`
//! statements. Values are JSON except that arrays and objects may carry a
//! trailing comma before the closing bracket.

use anyhow::{Context, Result};
use serde_json::Value;

/// Parse every `var NAME = VALUE;` statement, in source order
pub fn parse_assignments(src: &str) -> Result<Vec<(String, Value)>> {
    let bytes = src.as_bytes();
    let mut pos = 0;
    let mut out = Vec::new();

    loop {
        pos = skip_trivia(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        if bytes[pos] == b';' {
            pos += 1;
            continue;
        }

        let keyword_end = scan_identifier(bytes, pos);
        let keyword = &src[pos..keyword_end];
        if !matches!(keyword, "var" | "let" | "const") {
            anyhow::bail!(
                "expected `var` at line {}, found {:?}",
                line_of(src, pos),
                snippet(src, pos)
            );
        }
        pos = skip_trivia(bytes, keyword_end);

        let name_end = scan_identifier(bytes, pos);
        if name_end == pos {
            anyhow::bail!("expected variable name at line {}", line_of(src, pos));
        }
        let name = src[pos..name_end].to_string();
        pos = skip_trivia(bytes, name_end);

        if bytes.get(pos) != Some(&b'=') {
            anyhow::bail!("expected `=` after `{}` at line {}", name, line_of(src, pos));
        }
        pos += 1;

        let value_end = scan_value(bytes, pos)
            .with_context(|| format!("unterminated value for `{}`", name))?;
        let raw = &src[pos..value_end];
        let cleaned = strip_trailing_commas(raw);
        let line = line_of(src, pos);
        let value: Value = serde_json::from_str(cleaned.trim())
            .with_context(|| format!("invalid value for `{}` at line {}", name, line))?;
        out.push((name, value));

        pos = value_end;
    }

    Ok(out)
}

fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                while pos + 1 < bytes.len() && !(bytes[pos] == b'*' && bytes[pos + 1] == b'/') {
                    pos += 1;
                }
                pos = (pos + 2).min(bytes.len());
            }
            _ => break,
        }
    }
    pos
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < bytes.len() {
        let b = bytes[pos];
        let ok = b == b'_'
            || b == b'$'
            || b.is_ascii_alphabetic()
            || (pos > start && b.is_ascii_digit());
        if !ok {
            break;
        }
        pos += 1;
    }
    pos
}

/// End offset (exclusive) of a value: the first `;` outside strings and
/// brackets, or end of input
fn scan_value(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut pos = start;

    while pos < bytes.len() {
        let b = bytes[pos];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'[' | b'{' => depth += 1,
                b']' | b'}' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => return Some(pos),
                _ => {}
            }
        }
        pos += 1;
    }

    if in_string || depth > 0 {
        None
    } else {
        Some(pos)
    }
}

/// Drop commas that directly precede `]` or `}` (outside strings)
fn strip_trailing_commas(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn line_of(src: &str, pos: usize) -> usize {
    src[..pos.min(src.len())].matches('\n').count() + 1
}

fn snippet(src: &str, pos: usize) -> String {
    src[pos..].chars().take(16).collect()
}

/// Whether text looks like a data script rather than a JSON document
pub fn looks_like_script(src: &str) -> bool {
    let start = skip_trivia(src.as_bytes(), 0);
    let rest = &src[start..];
    ["var", "let", "const"].iter().any(|kw| {
        rest.strip_prefix(kw)
            .and_then(|r| r.chars().next())
            .map(|c| c.is_whitespace())
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_producer_header() {
        let src = "var percent_low = 25;var percent_high = 75;\n\
                   var header = { \"command\" : \"a.out\", \"date\" : \"2024-01-01 10:00:00\", \"instrumented\" : 10, \"covered\" : 4,};\n\
                   var merged_data = [];\n";
        let vars = parse_assignments(src).unwrap();
        let names: Vec<&str> = vars.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["percent_low", "percent_high", "header", "merged_data"]);
        assert_eq!(vars[0].1, json!(25));
        assert_eq!(vars[2].1["covered"], json!(4));
        assert_eq!(vars[3].1, json!([]));
    }

    #[test]
    fn test_trailing_commas_in_arrays() {
        let src = "var data = [\n{\"title\":\"a\",\"covered\":\"10.0\"},\n{\"title\":\"b\"},\n];";
        let vars = parse_assignments(src).unwrap();
        assert_eq!(vars[0].1.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_strings_may_contain_delimiters() {
        let src = r#"var data = [{"line":"for (;;) { x[\"k\"] = ']'; }",},];"#;
        let vars = parse_assignments(src).unwrap();
        assert_eq!(
            vars[0].1[0]["line"],
            json!("for (;;) { x[\"k\"] = ']'; }")
        );
    }

    #[test]
    fn test_comma_inside_string_before_bracket_is_kept() {
        let src = r#"var data = [{"line":"f(a, ]",}];"#;
        let vars = parse_assignments(src).unwrap();
        assert_eq!(vars[0].1[0]["line"], json!("f(a, ]"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// generated\n/* block */ var x = 1; // trailing\n";
        let vars = parse_assignments(src).unwrap();
        assert_eq!(vars, vec![("x".to_string(), json!(1))]);
    }

    #[test]
    fn test_final_statement_without_semicolon() {
        let vars = parse_assignments("var x = {\"a\": 1}").unwrap();
        assert_eq!(vars[0].1, json!({"a": 1}));
    }

    #[test]
    fn test_errors() {
        assert!(parse_assignments("x = 1;").is_err());
        assert!(parse_assignments("var = 1;").is_err());
        assert!(parse_assignments("var x 1;").is_err());
        assert!(parse_assignments("var x = [1, 2").is_err());
        assert!(parse_assignments("var x = \"open;").is_err());
        assert!(parse_assignments("var x = nope;").is_err());
    }

    #[test]
    fn test_looks_like_script() {
        assert!(looks_like_script("var data = [];"));
        assert!(looks_like_script("\n  // c\nvar data = [];"));
        assert!(!looks_like_script("{\"data\": []}"));
        assert!(!looks_like_script("variable"));
    }
}
