//! printf-style numeric save file names (`Save%d`, `Save%02d.rvdata2`)

use std::fmt;
use std::path::{Component, Path};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Padding {
    /// `%5d`
    Space,
    /// `%05d`
    Zero,
    /// `%-5d`
    Left,
}

/// A file name template with exactly one integer placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePattern {
    raw: String,
    prefix: String,
    suffix: String,
    padding: Padding,
    width: usize,
}

impl SavePattern {
    /// Parse a pattern. Supports `%d`/`%i` with an optional `0` or `-` flag
    /// and a width, plus `%%` for a literal percent sign.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason| ValidationError::InvalidSavePattern {
            pattern: raw.to_string(),
            reason,
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut directive: Option<(Padding, usize)> = None;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if directive.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }

            let mut padding = Padding::Space;
            while let Some(&flag) = chars.peek() {
                match flag {
                    '0' if padding != Padding::Left => padding = Padding::Zero,
                    '0' => {}
                    '-' => padding = Padding::Left,
                    _ => break,
                }
                chars.next();
            }

            let mut width = 0usize;
            while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                width = width
                    .checked_mul(10)
                    .and_then(|w| w.checked_add(digit as usize))
                    .filter(|w| *w <= 64)
                    .ok_or_else(|| invalid("field width is too large"))?;
                chars.next();
            }

            match chars.next() {
                Some('d') | Some('i') => {}
                Some(_) => return Err(invalid("only integer placeholders (%d) are supported")),
                None => return Err(invalid("pattern ends inside a placeholder")),
            }
            if directive.is_some() {
                return Err(invalid("more than one placeholder"));
            }
            directive = Some((padding, width));
        }

        let (padding, width) = directive.ok_or_else(|| invalid("missing %d placeholder"))?;

        // The number never adds separators, so one sample covers every slot
        let sample = format!("{}0{}", prefix, suffix);
        if let Some(reason) = escape_reason(&sample) {
            return Err(invalid(reason));
        }
        if prefix.is_empty() && suffix.is_empty() {
            crate::logging::log_warning(&format!(
                "Save pattern '{}' has no literal text; files will be named by number only",
                raw
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            prefix,
            suffix,
            padding,
            width,
        })
    }

    /// Render the file name for slot `n`.
    pub fn format(&self, n: i64) -> String {
        let width = self.width;
        let number = match self.padding {
            Padding::Space => format!("{:>width$}", n),
            Padding::Zero => format!("{:0width$}", n),
            Padding::Left => format!("{:<width$}", n),
        };
        format!("{}{}{}", self.prefix, number, self.suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Why `name` cannot be used as a path inside the game directory.
fn escape_reason(name: &str) -> Option<&'static str> {
    if name.ends_with('/') {
        return Some("must name a file, not a directory");
    }
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Some("must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => {
                return Some("must be relative to the game directory")
            }
        }
    }
    None
}

impl fmt::Display for SavePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pattern: &str, n: i64) -> String {
        SavePattern::parse(pattern).unwrap().format(n)
    }

    #[test]
    fn plain_placeholder() {
        assert_eq!(fmt("Save%d", 3), "Save3");
        assert_eq!(fmt("slot%i.sav", 12), "slot12.sav");
    }

    #[test]
    fn zero_padded_placeholder() {
        assert_eq!(fmt("Save%02d.rvdata2", 1), "Save01.rvdata2");
        assert_eq!(fmt("Save%02d.rvdata2", 123), "Save123.rvdata2");
        assert_eq!(fmt("Save%03d", -1), "Save-01");
    }

    #[test]
    fn space_and_left_padding() {
        assert_eq!(fmt("[%3d]", 7), "[  7]");
        assert_eq!(fmt("[%-3d]", 7), "[7  ]");
        assert_eq!(fmt("[%-03d]", 7), "[7  ]");
    }

    #[test]
    fn escaped_percent_is_literal() {
        assert_eq!(fmt("100%%_%d", 5), "100%_5");
        assert_eq!(fmt("%d%%", 5), "5%");
    }

    #[test]
    fn rejects_malformed_patterns() {
        for bad in ["Save", "Save%s", "Save%d_%d", "Save%", "Save%02", "%%"] {
            assert!(
                matches!(
                    SavePattern::parse(bad),
                    Err(ValidationError::InvalidSavePattern { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_names_outside_the_game() {
        for bad in ["/tmp/x%d", "../x%d", "saves/../../x%d", "%d/..", "Save%d/"] {
            assert!(
                matches!(
                    SavePattern::parse(bad),
                    Err(ValidationError::InvalidSavePattern { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn nested_and_dotted_names_are_allowed() {
        assert_eq!(fmt("www/save/file%d.rpgsave", 2), "www/save/file2.rpgsave");
        assert_eq!(fmt("..%d", 2), "..2");
        assert_eq!(fmt("./Save%d", 2), "./Save2");
    }

    #[test]
    fn display_keeps_original_text() {
        assert_eq!(SavePattern::parse("Save%02d").unwrap().to_string(), "Save%02d");
    }
}
