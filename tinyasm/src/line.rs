//! Splitting of one source line into label, opcode, operands and comment.

#[cfg(test)]
mod test;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Line {
    pub label: Option<String>,
    /// Opcode followed by its operands.
    pub parts: Vec<String>,
    /// Kept with its leading `;` or `//`.
    pub comment: Option<String>,
}

pub fn split(src: &str) -> Line {
    let mut text = src.trim();
    let mut comment = None;
    for marker in [";", "//"] {
        if let Some(i) = find_unquoted(text, marker) {
            comment = Some(text[i..].to_owned());
            text = text[..i].trim();
        }
    }
    let mut label = None;
    if let Some(i) = find_unquoted(text, ":") {
        let name = text[..i].trim();
        if is_label(name) {
            label = Some(name.to_owned());
            text = text[i + 1..].trim();
        }
    }
    Line {
        label,
        parts: parts(text),
        comment,
    }
}

/// The first word is the opcode, the rest is split on commas.
pub fn parts(text: &str) -> Vec<String> {
    let text = condense(text);
    let (op, rest) = text.split_once(" ").unwrap_or((text.as_str(), ""));
    if op.is_empty() {
        return Vec::new();
    }
    let mut out = vec![op.to_owned()];
    out.extend(
        split_unquoted(rest, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
    );
    out
}

fn is_label(name: &str) -> bool {
    name.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.'))
}

fn find_unquoted(s: &str, pat: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted && s[i..].starts_with(pat) {
            return Some(i);
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if c == sep && !quoted {
            out.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    out.push(&s[start..]);
    out
}

// runs of whitespace outside quotes become one space
fn condense(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut quoted = false;
    for c in s.trim().chars() {
        if c == '\'' {
            quoted = !quoted;
        }
        if c.is_whitespace() && !quoted {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}
