//! Brace-aware scanning primitives shared by every transcoder.
//!
//! All functions work on byte indices into the input `&str`. The structural
//! delimiters (`{ } [ ] , = \`) are ASCII, so byte scanning never splits a
//! UTF-8 sequence at a point we slice on.

/// Escape character that turns a following brace into a literal.
const ESCAPE: u8 = b'\\';

fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    // An even run of backslashes (`\\{`) escapes itself, not the brace.
    let mut run = 0;
    let mut i = idx;
    while i > 0 && bytes[i - 1] == ESCAPE {
        run += 1;
        i -= 1;
    }
    run % 2 == 1
}

/// Find the `}` that closes the `{` at `open_idx`.
///
/// Escaped braces (`\{`, `\}`) are literal. On unbalanced input the last
/// index of the string is returned.
pub fn find_matching_brace(text: &str, open_idx: usize) -> usize {
    find_matching_delim(text, open_idx, b'{', b'}')
}

/// Find the `]` that closes the `[` at `open_idx`. Brackets inside a brace
/// group do not count, so `[label={[x]}]` closes at the final bracket.
pub fn find_matching_bracket(text: &str, open_idx: usize) -> usize {
    let bytes = text.as_bytes();
    let last = bytes.len().saturating_sub(1);
    let mut depth = 0usize;
    let mut braces = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open_idx) {
        if is_escaped(bytes, i) {
            continue;
        }
        match b {
            b'{' => braces += 1,
            b'}' => braces = braces.saturating_sub(1),
            b'[' if braces == 0 => depth += 1,
            b']' if braces == 0 && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    last
}

fn find_matching_delim(text: &str, open_idx: usize, open: u8, close: u8) -> usize {
    let bytes = text.as_bytes();
    let last = bytes.len().saturating_sub(1);
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open_idx) {
        if b != open && b != close {
            continue;
        }
        if is_escaped(bytes, i) {
            continue;
        }
        if b == open {
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    last
}

/// Find the next `{` at or after `from` and return its content plus the
/// index just past the matching `}`.
pub fn extract_group(text: &str, from: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let open = (from..bytes.len()).find(|&i| bytes[i] == b'{' && !is_escaped(bytes, i))?;
    let close = find_matching_brace(text, open);
    if close <= open || bytes[close] != b'}' {
        // Unbalanced: everything after the brace is the content.
        return Some((text[open + 1..].to_string(), text.len()));
    }
    Some((text[open + 1..close].to_string(), close + 1))
}

/// Like [`extract_group`], but the group must start at `from` after optional
/// whitespace. Used for arguments that must directly follow a command.
pub fn extract_group_at(text: &str, from: usize) -> Option<(String, usize)> {
    let start = skip_whitespace(text, from);
    if text.as_bytes().get(start) != Some(&b'{') {
        return None;
    }
    extract_group(text, start)
}

/// Read an optional `[...]` argument starting at `from` (after whitespace).
pub fn extract_optional_arg(text: &str, from: usize) -> Option<(String, usize)> {
    let start = skip_whitespace(text, from);
    if text.as_bytes().get(start) != Some(&b'[') {
        return None;
    }
    let close = find_matching_bracket(text, start);
    if text.as_bytes().get(close) != Some(&b']') {
        return Some((text[start + 1..].to_string(), text.len()));
    }
    Some((text[start + 1..close].to_string(), close + 1))
}

pub fn skip_whitespace(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = from.min(bytes.len());
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Find `needle` at or after `from` where it is a whole control sequence,
/// i.e. not followed by another letter (`\int` does not match `\intercal`).
pub fn find_command(text: &str, name: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while search <= text.len() {
        let rel = text[search..].find(name)?;
        let at = search + rel;
        let end = at + name.len();
        let followed_by_letter = text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !followed_by_letter {
            return Some(at);
        }
        search = end;
    }
    None
}

/// Split a comma-separated option list. `{}` and `[]` spans are atomic;
/// segments are trimmed and empty ones dropped.
pub fn split_options(text: &str) -> Vec<String> {
    split_top_level(text, b',')
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split at every top-level occurrence of `sep` (outside `{}`/`[]`).
/// Segments are returned untrimmed.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'{' || b == b'}' || b == b'[' || b == b']') && is_escaped(bytes, i) {
            continue;
        }
        match b {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ if b == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split a top-level string separator such as `\\` or `&`, respecting groups.
pub fn split_top_level_str<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let sep_bytes = sep.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if depth == 0 && bytes[i..].starts_with(sep_bytes) && !is_escaped(bytes, i) {
            parts.push(&text[start..i]);
            i += sep_bytes.len();
            start = i;
            continue;
        }
        if b == ESCAPE {
            // Skip the escaped character so `\{` and `\&` stay literal.
            i += 2;
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start.min(text.len())..]);
    parts
}

/// Split an option at its first `=`. The value loses one pair of
/// surrounding braces; a bare token is a flag with an empty value.
pub fn split_key_value(option: &str) -> (String, String) {
    match option.find('=') {
        Some(eq) => {
            let key = option[..eq].trim().to_string();
            let value = strip_braces_once(option[eq + 1..].trim()).to_string();
            (key, value)
        }
        None => (option.trim().to_string(), String::new()),
    }
}

/// Format a value for a `key=value` option list so that
/// [`split_options`] and [`split_key_value`] read it back unchanged.
/// Values with `,` or `=`, or that are themselves one braced group, get an
/// extra pair of braces.
pub fn option_value(value: &str) -> String {
    let value = value.trim();
    if value.contains([',', '=']) || is_fully_braced(value) {
        format!("{{{}}}", value)
    } else {
        value.to_string()
    }
}

/// Remove one pair of braces when they enclose the whole string.
pub fn strip_braces_once(text: &str) -> &str {
    let trimmed = text.trim();
    if is_fully_braced(trimmed) {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// True when `text` is a single `{...}` group from first to last byte.
pub fn is_fully_braced(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('{')
        && text.ends_with('}')
        && find_matching_brace(text, 0) == text.len() - 1
}
