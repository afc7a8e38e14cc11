/*!
 * Properties Parser
 * Reader for line-oriented `key=value` property files
 *
 * Follows the usual properties conventions: `#` and `!` comments, a key
 * ending at the first unescaped `=`, `:` or whitespace, trailing-backslash
 * line continuation, and `\t`, `\n`, `\uXXXX` style escapes in keys and
 * values. Later keys override earlier ones.
 */

use ahash::HashMap;
use log::warn;

/// Parsed key/value properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub fn parse(input: &str) -> Self {
        let mut entries = HashMap::default();
        let mut pending = String::new();

        for raw in input.lines() {
            let line = raw.trim_start_matches(is_blank);
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if let Some(stripped) = continued(line) {
                pending.push_str(stripped);
                continue;
            }
            pending.push_str(line);

            let (key, value) = split_entry(&pending);
            entries.insert(key, value);
            pending.clear();
        }

        if !pending.is_empty() {
            let (key, value) = split_entry(&pending);
            entries.insert(key, value);
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[inline]
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Line body without its continuation backslash, if it has one
fn continued(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

/// Split a logical line into its unescaped key and value
fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (at, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = at;
            break;
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = match rest.strip_prefix(|c: char| c == '=' || c == ':') {
        Some(after) => after.trim_start_matches(is_blank),
        None => rest,
    };

    (unescape(&line[..key_end]), unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == 4 => out.push(decoded),
                    _ => {
                        warn!("Malformed \\u escape '\\u{}' kept literally", digits);
                        out.push('u');
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
