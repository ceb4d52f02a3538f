use crate::text;
use std::sync::Arc;
use symtree_api::{Position, TextDocument};

/// How far up and down a moved word is searched for.
const SEARCH_RADIUS: u32 = 100;

/// Remembers the word at a position so the position can be found again after edits.
pub struct WordAnchor {
    doc: Arc<dyn TextDocument>,
    position: Position,
    version: i32,
    word: Option<String>,
}

impl WordAnchor {
    pub fn new(doc: Arc<dyn TextDocument>, position: Position) -> Self {
        let version = doc.version();
        let word = text::word_at(doc.as_ref(), position);
        Self {
            doc,
            position,
            version,
            word,
        }
    }

    pub fn document(&self) -> &Arc<dyn TextDocument> {
        &self.doc
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    /// Best guess of where the anchored word is now.
    pub fn guessed_position(&self) -> Position {
        let Some(word) = self.word.as_deref() else {
            return self.position;
        };
        if self.doc.version() == self.version {
            return self.position;
        }
        if text::word_at(self.doc.as_ref(), self.position).as_deref() == Some(word) {
            return self.position;
        }

        let start_line = self.position.line;
        let line_count = self.doc.line_count();
        let mut i = 0;
        loop {
            let mut checked = false;

            let down = start_line + i;
            if down < line_count {
                checked = true;
                if let Some(found) = self.find_in_line(down, word) {
                    return found;
                }
            }

            i += 1;

            if let Some(up) = start_line.checked_sub(i) {
                checked = true;
                if let Some(found) = self.find_in_line(up, word) {
                    return found;
                }
            }

            if i >= SEARCH_RADIUS || !checked {
                break;
            }
        }
        self.position
    }

    fn find_in_line(&self, line: u32, word: &str) -> Option<Position> {
        let content = self.doc.line_text(line)?;
        let byte = content.find(word)?;
        Some(Position::new(
            line,
            text::byte_col_to_utf16_col(&content, byte) as u32,
        ))
    }
}
