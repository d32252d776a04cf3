use serde::Serialize;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabularyError {
    #[error("word cannot be empty")]
    EmptyWord,

    #[error("meaning cannot be empty")]
    EmptyMeaning,
}

/// Failure to read a `word : meaning` list, with the 1-based line it occurred on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabularyParseError {
    #[error("line {line}: expected `word : meaning`")]
    MissingSeparator { line: usize },

    #[error("line {line}: {source}")]
    InvalidEntry {
        line: usize,
        #[source]
        source: VocabularyError,
    },
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// A single word paired with its meaning.
///
/// Both fields are trimmed and non-empty. Entries are never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VocabularyEntry {
    word: String,
    meaning: String,
}

impl VocabularyEntry {
    /// Build an entry from raw text.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError` if either side is blank after trimming.
    pub fn new(
        word: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<Self, VocabularyError> {
        let word = word.into().trim().to_owned();
        let meaning = meaning.into().trim().to_owned();
        if word.is_empty() {
            return Err(VocabularyError::EmptyWord);
        }
        if meaning.is_empty() {
            return Err(VocabularyError::EmptyMeaning);
        }
        Ok(Self { word, meaning })
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }
}

//
// ─── TEXT FORMAT ───────────────────────────────────────────────────────────────
//

const SEPARATOR: char = ':';

/// Parse a `word : meaning` list, one pair per line.
///
/// Blank lines and lines starting with `#` are skipped. Each line is split at the
/// first `:`, so meanings may themselves contain colons.
///
/// # Errors
///
/// Returns `VocabularyParseError` naming the first offending line.
pub fn parse_word_list(text: &str) -> Result<Vec<VocabularyEntry>, VocabularyParseError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((word, meaning)) = trimmed.split_once(SEPARATOR) else {
            return Err(VocabularyParseError::MissingSeparator { line });
        };
        let entry = VocabularyEntry::new(word, meaning)
            .map_err(|source| VocabularyParseError::InvalidEntry { line, source })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Render entries back into the `word : meaning` text format.
#[must_use]
pub fn format_word_list(entries: &[VocabularyEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{} {SEPARATOR} {}", e.word(), e.meaning()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_trims_and_rejects_blank_fields() {
        let entry = VocabularyEntry::new("  hello ", " xin chào ").unwrap();
        assert_eq!(entry.word(), "hello");
        assert_eq!(entry.meaning(), "xin chào");

        assert_eq!(
            VocabularyEntry::new("   ", "x").unwrap_err(),
            VocabularyError::EmptyWord
        );
        assert_eq!(
            VocabularyEntry::new("x", "").unwrap_err(),
            VocabularyError::EmptyMeaning
        );
    }

    #[test]
    fn parses_lines_and_skips_comments() {
        let text = "# greetings\nhello : xin chào\n\nworld: thế giới\ntime : 10:30 meeting\n";
        let entries = parse_word_list(text).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].word(), "hello");
        assert_eq!(entries[1].meaning(), "thế giới");
        assert_eq!(entries[2].meaning(), "10:30 meeting");
    }

    #[test]
    fn reports_line_of_malformed_entry() {
        let err = parse_word_list("hello : xin chào\nworld\n").unwrap_err();
        assert_eq!(err, VocabularyParseError::MissingSeparator { line: 2 });

        let err = parse_word_list("\n : nothing").unwrap_err();
        assert!(matches!(
            err,
            VocabularyParseError::InvalidEntry {
                line: 2,
                source: VocabularyError::EmptyWord
            }
        ));
    }

    #[test]
    fn entry_serializes_trimmed_fields() {
        let entry = VocabularyEntry::new(" cat ", "con mèo ").unwrap();
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({ "word": "cat", "meaning": "con mèo" })
        );
    }

    #[test]
    fn format_uses_spaced_separator() {
        let entries = parse_word_list("a:b\nc : d").unwrap();
        assert_eq!(format_word_list(&entries), "a : b\nc : d");
    }
}
