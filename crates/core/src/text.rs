//! Word lookup over [`TextDocument`] lines.

use once_cell::sync::Lazy;
use regex::Regex;
use symtree_api::{Position, Range, TextDocument};

/// Identifier-like runs and numbers, the usual editor notion of a word.
pub static DEFAULT_WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(-?\d*\.\d\w*)|([^`~!@#$%^&*()\-=+\[{\]}\\|;:'",.<>/?\s]+)"#)
        .expect("default word pattern is valid")
});

pub static NON_WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\s]+").expect("non-whitespace pattern is valid"));

pub fn utf16_col_to_byte_col(line: &str, utf16_col: usize) -> usize {
    let mut curr_utf16 = 0;
    let mut curr_byte = 0;

    for c in line.chars() {
        if curr_utf16 >= utf16_col {
            break;
        }
        curr_utf16 += c.len_utf16();
        curr_byte += c.len_utf8();
    }
    curr_byte
}

pub fn byte_col_to_utf16_col(line: &str, byte_col: usize) -> usize {
    line[..byte_col.min(line.len())]
        .chars()
        .map(char::len_utf16)
        .sum()
}

/// Range of the `pattern` match touching `position`, if any.
///
/// A position directly after a word still belongs to that word.
pub fn word_range_at(doc: &dyn TextDocument, position: Position, pattern: &Regex) -> Option<Range> {
    let line = doc.line_text(position.line)?;
    let col = utf16_col_to_byte_col(&line, position.character as usize);

    pattern
        .find_iter(&line)
        .filter(|m| !m.as_str().is_empty())
        .find(|m| m.start() <= col && col <= m.end())
        .map(|m| {
            Range::new(
                Position::new(position.line, byte_col_to_utf16_col(&line, m.start()) as u32),
                Position::new(position.line, byte_col_to_utf16_col(&line, m.end()) as u32),
            )
        })
}

/// Text covered by `range`; lines are joined with `\n`.
pub fn text_in_range(doc: &dyn TextDocument, range: Range) -> String {
    let mut out = String::new();
    for line_no in range.start.line..=range.end.line {
        let Some(line) = doc.line_text(line_no) else {
            break;
        };
        let start = if line_no == range.start.line {
            utf16_col_to_byte_col(&line, range.start.character as usize)
        } else {
            0
        };
        let end = if line_no == range.end.line {
            utf16_col_to_byte_col(&line, range.end.character as usize)
        } else {
            line.len()
        };
        if line_no != range.start.line {
            out.push('\n');
        }
        if start < end {
            out.push_str(&line[start..end]);
        }
    }
    out
}

/// Word at `position`: the default word pattern first, then any non-whitespace run.
pub fn word_at(doc: &dyn TextDocument, position: Position) -> Option<String> {
    word_range_at(doc, position, &DEFAULT_WORD_PATTERN)
        .or_else(|| word_range_at(doc, position, &NON_WHITESPACE_RUN))
        .map(|range| text_in_range(doc, range))
        .filter(|word| !word.is_empty())
}
