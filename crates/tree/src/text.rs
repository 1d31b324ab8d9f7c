//! Small text codecs shared by serialization and editors
//!
//! Quoted token lists look like `"first" "second \"quoted\""`. Attribute
//! strings look like `min=0;max=10;help=Some text`.

use memchr::{memchr, memchr2};

/// Join items as space separated double-quoted tokens
pub fn join_quoted(items: &[String]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push('"');
        for ch in item.chars() {
            if ch == '"' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
    }
    out
}

/// Split a quoted token list. Text outside quotes is ignored, an unterminated
/// final token is still returned.
pub fn split_quoted(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(open) = memchr(b'"', &bytes[pos..]) {
        let mut i = pos + open + 1;
        let mut token = String::new();
        let mut chunk_start = i;
        loop {
            match memchr2(b'"', b'\\', &bytes[i..]) {
                Some(off) => {
                    let at = i + off;
                    token.push_str(&text[chunk_start..at]);
                    if bytes[at] == b'\\' && at + 1 < bytes.len() {
                        // Escaped byte is always ASCII here (`"` or `\`), anything else is kept literally
                        let next = at + 1;
                        let ch_len = text[next..].chars().next().map_or(1, char::len_utf8);
                        token.push_str(&text[next..next + ch_len]);
                        i = next + ch_len;
                        chunk_start = i;
                    } else if bytes[at] == b'\\' {
                        i = at + 1;
                        chunk_start = i;
                    } else {
                        tokens.push(token);
                        pos = at + 1;
                        break;
                    }
                }
                None => {
                    token.push_str(&text[chunk_start..]);
                    tokens.push(token);
                    return tokens;
                }
            }
        }
    }
    tokens
}

/// Parse `key=value;key=value`. Keys are trimmed, values keep inner spaces.
/// `;;` escapes a literal semicolon inside a value.
pub fn parse_attributes(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut pos = 0;
    let mut current = String::new();

    loop {
        match memchr(b';', &bytes[pos..]) {
            Some(off) => {
                let at = pos + off;
                current.push_str(&text[pos..at]);
                if bytes.get(at + 1) == Some(&b';') {
                    current.push(';');
                    pos = at + 2;
                    continue;
                }
                push_pair(&mut out, &current);
                current.clear();
                pos = at + 1;
            }
            None => {
                current.push_str(&text[pos..]);
                push_pair(&mut out, &current);
                return out;
            }
        }
    }
}

fn push_pair(out: &mut Vec<(String, String)>, entry: &str) {
    if entry.trim().is_empty() {
        return;
    }
    match memchr(b'=', entry.as_bytes()) {
        Some(eq) => out.push((entry[..eq].trim().to_string(), entry[eq + 1..].to_string())),
        None => out.push((entry.trim().to_string(), String::new())),
    }
}

/// Inverse of `parse_attributes`
pub fn format_attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(&value.replace(';', ";;"));
    }
    out
}
