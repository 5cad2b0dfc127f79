// Display-name decomposition.
//
// Producers attach source attribution inline for code/closure objects:
// `<path>#<fn-name>(line:<n>)<module>`, e.g.
// `pages/Index.ets#Custom1Component(line:7)[entry]`. The split feeds the
// line numbers reported in result chains, so the boundary rules are load
// bearing: only the first `#` splits, names starting with `#` or `=` are
// never decomposed, and the line segment must be delimited by the exact
// `(line:` token and a closing `)`.

use serde::{Deserialize, Serialize};

/// A node's resolved display name, decomposed when the raw text carries
/// source attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    pub name: String,
    pub path: String,
    pub line: u32,
    pub module: String,
}

impl DisplayName {
    /// Decompose a raw display name.
    ///
    /// Names without `#`, or starting with `#` or `=`, pass through whole
    /// with `line = 0` and empty `path`/`module`.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('#') || raw.starts_with('=') {
            return Self::plain(raw);
        }
        let Some((path, rest)) = raw.split_once('#') else {
            return Self::plain(raw);
        };
        match split_line_suffix(rest) {
            Some((name, line, module)) => Self {
                name: name.to_string(),
                path: path.to_string(),
                line,
                module: module.to_string(),
            },
            // No line attribution in the right half: keep the split path
            // but leave the remainder intact as the name.
            None => Self {
                name: rest.to_string(),
                path: path.to_string(),
                line: 0,
                module: String::new(),
            },
        }
    }

    fn plain(raw: &str) -> Self {
        Self {
            name: raw.to_string(),
            ..Self::default()
        }
    }

    /// True when the raw name carried a `path#...` decomposition.
    pub fn has_source_attribution(&self) -> bool {
        !self.path.is_empty()
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

const LINE_TOKEN: &str = "(line:";

/// Match `<name>(line:<digits>)<module>` against the right half of a
/// decomposed name. Anchors on the last `(line:` occurrence and the last
/// `)` after it, mirroring the producer's greedy pattern.
fn split_line_suffix(rest: &str) -> Option<(&str, u32, &str)> {
    let open = rest.rfind(LINE_TOKEN)?;
    let name = &rest[..open];
    let after = &rest[open + LINE_TOKEN.len()..];
    let close = after.rfind(')')?;
    let digits = &after[..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let line = digits.parse().ok()?;
    Some((name, line, &after[close + 1..]))
}
