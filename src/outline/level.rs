use std::fmt;

/// Nesting level parsed from a heading's level string (`"H2"` → 2).
///
/// Strings that are not an optional `H`/`h` prefix followed by decimal digits
/// parse to [`HeadingLevel::Malformed`], which sorts as depth 0: shallower
/// than any real heading, so a malformed entry always starts a new root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Numbered(u32),
    Malformed,
}

pub const MALFORMED_DEPTH: u32 = 0;

impl HeadingLevel {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('H')
            .or_else(|| trimmed.strip_prefix('h'))
            .unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::Malformed;
        }
        digits.parse().map(Self::Numbered).unwrap_or(Self::Malformed)
    }

    pub fn depth(&self) -> u32 {
        match self {
            Self::Numbered(depth) => *depth,
            Self::Malformed => MALFORMED_DEPTH,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed)
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(depth) => write!(f, "H{depth}"),
            Self::Malformed => f.write_str("H?"),
        }
    }
}
