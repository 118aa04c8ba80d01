//! `.properties` reader, following `java.util.Properties.load` line syntax.

use std::collections::BTreeMap;

/// Parse properties text into a key/value map. Later duplicates win.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let mut lines = text.lines();
    while let Some(first) = lines.next() {
        let first = first.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }
        let mut logical = String::from(first);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key), unescape(value));
    }
    entries
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_and_comments() {
        let props = parse_properties(
            "# comment\n! also comment\ntitle=Hello\nbody : World\nfooter Bye\n\n  indented = yes\nempty\n",
        );
        assert_eq!(props["title"], "Hello");
        assert_eq!(props["body"], "World");
        assert_eq!(props["footer"], "Bye");
        assert_eq!(props["indented"], "yes");
        assert_eq!(props["empty"], "");
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_continuation_lines() {
        let props = parse_properties("long = one \\\n    two\\\n three\nnext=1\n");
        assert_eq!(props["long"], "one twothree");
        assert_eq!(props["next"], "1");
    }

    #[test]
    fn test_escapes() {
        let props = parse_properties("a\\=b = c\\:d\nkey\\ with\\ spaces=v\numlaut=\\u00fc\nslash=C:\\\\\n");
        assert_eq!(props["a=b"], "c:d");
        assert_eq!(props["key with spaces"], "v");
        assert_eq!(props["umlaut"], "ü");
        assert_eq!(props["slash"], "C:\\");
    }
}
