//! CSV import/export for song records
//!
//! Export writes a header row followed by one fully quoted row per song.
//! Import reads the same format back: a header row naming the columns
//! (case-insensitive, any order) and one row per song. Quoted fields may
//! contain commas, doubled quotes and line breaks.

use std::collections::HashMap;

use crate::song::{Song, SongCategory, SongDraft};
use crate::{Error, Result};

/// Column names written by [`export_songs`]
pub const EXPORT_HEADER: [&str; 5] = ["title", "category", "mnemonic", "lyrics", "mediaLink"];

/// File name offered for downloads
pub const EXPORT_FILE_NAME: &str = "chants-capoeira.csv";

const DELIMITER: char = ',';
const QUOTE: char = '"';
/// Byte order mark written by spreadsheet exports
const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Unquoted,
    Quoted,
}

/// A parsed field and whether it opened with a quote in the source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Field {
    value: String,
    quoted: bool,
}

/// Split `text` into rows of fields
///
/// Line endings (`\n` or `\r\n`) close a row unless they appear inside a
/// quoted field. A blank line produces no row.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    scan(text)
        .into_iter()
        .map(|row| row.into_iter().map(|field| field.value).collect())
        .collect()
}

fn scan(text: &str) -> Vec<Vec<Field>> {
    let mut rows = Vec::new();
    let mut row: Vec<Field> = Vec::new();
    let mut field = Field::default();
    let mut state = ScanState::Unquoted;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (state, c) {
            (ScanState::Quoted, QUOTE) if chars.peek() == Some(&QUOTE) => {
                field.value.push(QUOTE);
                chars.next();
            }
            (ScanState::Quoted, QUOTE) => state = ScanState::Unquoted,
            (ScanState::Unquoted, QUOTE) => {
                state = ScanState::Quoted;
                if field.value.is_empty() {
                    field.quoted = true;
                }
            }
            (ScanState::Quoted, '\r' | '\n') => {
                field.value.push(c);
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                    field.value.push('\n');
                }
            }
            (ScanState::Unquoted, '\r' | '\n') => {
                if !field.value.is_empty() || !row.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            (ScanState::Unquoted, DELIMITER) => row.push(std::mem::take(&mut field)),
            (_, other) => field.value.push(other),
        }
    }

    if !field.value.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Undo a second layer of quoting left by tools that quote twice
///
/// Fields that were quoted in the file are taken as parsed; only a bare
/// value still wrapped in quotes is unwrapped.
fn clean_value(field: &Field) -> String {
    if field.quoted {
        return field.value.clone();
    }
    match field
        .value
        .strip_prefix(QUOTE)
        .and_then(|inner| inner.strip_suffix(QUOTE))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.value.clone(),
    }
}

/// Parse an import file into validated song drafts
///
/// The first row is the header. Any invalid row rejects the whole file; the
/// error cites the row's 1-based line number (the header is line 1).
pub fn parse_songs(text: &str) -> Result<Vec<SongDraft>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let rows = scan(text);
    if rows.len() < 2 {
        return Err(Error::validation(
            "CSV file must contain a header and at least one row",
        ));
    }

    let headers: Vec<String> = rows[0]
        .iter()
        .map(|h| h.value.trim().to_lowercase())
        .collect();

    rows[1..]
        .iter()
        .enumerate()
        .map(|(index, values)| {
            let line = index + 2;
            let record: HashMap<&str, String> = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).map(clean_value).unwrap_or_default();
                    (header.as_str(), value)
                })
                .collect();
            draft_from_record(&record, line)
        })
        .collect()
}

fn draft_from_record(record: &HashMap<&str, String>, line: usize) -> Result<SongDraft> {
    let field = |name: &str| record.get(name).cloned().unwrap_or_default();

    let title = field("title");
    let mnemonic = field("mnemonic");
    if title.is_empty() && mnemonic.is_empty() {
        return Err(Error::validation_at(line, "Title or mnemonic required"));
    }

    let category_name = field("category");
    let category: SongCategory = category_name.parse().map_err(|_| {
        Error::validation_at(line, format!("Invalid category '{}'", category_name))
    })?;

    SongDraft {
        title,
        category,
        mnemonic: Some(mnemonic),
        lyrics: Some(field("lyrics")),
        media_link: Some(field("medialink")),
    }
    .validate()
    .map_err(|e| match e {
        Error::Validation { message, .. } => Error::validation_at(line, message),
        other => other,
    })
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Serialize songs to the import format
pub fn export_songs(songs: &[Song]) -> String {
    let mut lines = Vec::with_capacity(songs.len() + 1);
    lines.push(EXPORT_HEADER.join(","));

    for song in songs {
        let fields = [
            song.title.as_str(),
            song.category.as_str(),
            song.mnemonic.as_deref().unwrap_or(""),
            song.lyrics.as_deref().unwrap_or(""),
            song.media_link.as_deref().unwrap_or(""),
        ];
        lines.push(
            fields
                .iter()
                .map(|f| quote(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored(draft: SongDraft) -> Song {
        let now = Utc::now();
        Song {
            id: Uuid::new_v4(),
            title: draft.title,
            category: draft.category,
            mnemonic: draft.mnemonic,
            lyrics: draft.lyrics,
            media_link: draft.media_link,
            owner_id: Uuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_parse_header_and_row() {
        let rows = parse("title,category\nA,angola\n");
        assert_eq!(
            rows,
            vec![
                vec!["title".to_string(), "category".to_string()],
                vec!["A".to_string(), "angola".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_quoted_delimiter_and_escaped_quote() {
        let rows = parse("\"a,b\",\"c\"\"d\"\n");
        assert_eq!(rows, vec![vec!["a,b".to_string(), "c\"d".to_string()]]);
    }

    #[test]
    fn test_parse_newline_inside_quotes() {
        let rows = parse("\"line one\nline two\",x\r\n\"crlf\r\ninside\",y");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "line one\nline two");
        assert_eq!(rows[1][0], "crlf\r\ninside");
        assert_eq!(rows[1][1], "y");
    }

    #[test]
    fn test_parse_crlf_is_single_terminator() {
        let rows = parse("a,b\r\nc,d\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let rows = parse("a\n\n\nb\n");
        assert_eq!(rows, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn test_parse_keeps_trailing_empty_field() {
        let rows = parse("a,\n");
        assert_eq!(rows, vec![vec!["a".to_string(), String::new()]]);
    }

    #[test]
    fn test_parse_songs_maps_headers_case_insensitively() {
        let text = "Title , CATEGORY,MediaLink\nParanauê,saoBentoGrande,https://example.org/v\n";
        let drafts = parse_songs(text).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Paranauê");
        assert_eq!(drafts[0].category, SongCategory::SaoBentoGrande);
        assert_eq!(drafts[0].media_link.as_deref(), Some("https://example.org/v"));
        assert_eq!(drafts[0].mnemonic, None);
    }

    #[test]
    fn test_parse_songs_requires_a_data_row() {
        let err = parse_songs("title,category\n").unwrap_err();
        assert!(err.to_string().contains("at least one row"));
    }

    #[test]
    fn test_parse_songs_missing_title_and_mnemonic_cites_line() {
        let text = "title,category,mnemonic\nA,angola,\n,angola,\n";
        match parse_songs(text) {
            Err(Error::Validation { line, .. }) => assert_eq!(line, Some(3)),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_songs_invalid_category_cites_line() {
        let text = "title,category\nA,regional\n";
        match parse_songs(text) {
            Err(Error::Validation { line, message }) => {
                assert_eq!(line, Some(2));
                assert!(message.contains("regional"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_double_quoted_value_is_unwrapped() {
        let bare = |value: &str| Field {
            value: value.to_string(),
            quoted: false,
        };
        assert_eq!(clean_value(&bare("say \"hi\"")), "say \"hi\"");
        assert_eq!(clean_value(&bare("\"a \"\"b\"\"\"")), "a \"b\"");
        assert_eq!(clean_value(&bare("\"")), "\"");
    }

    #[test]
    fn test_quoted_field_keeps_surrounding_quotes() {
        let drafts = parse_songs("title,category\n\"\"\"Paranauê\"\"\",angola\n").unwrap();
        assert_eq!(drafts[0].title, "\"Paranauê\"");
    }

    #[test]
    fn test_parse_songs_ignores_byte_order_mark() {
        let drafts = parse_songs("\u{feff}title,category\nA,angola\n").unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "A");
        assert_eq!(drafts[0].category, SongCategory::Angola);
    }

    #[test]
    fn test_export_quotes_every_field() {
        let mut draft = SongDraft::new("Say \"hi\"", SongCategory::Angola);
        draft.lyrics = Some("a,b".to_string());
        let csv = export_songs(&[stored(draft)]);

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,category,mnemonic,lyrics,mediaLink"));
        assert_eq!(lines.next(), Some("\"Say \"\"hi\"\"\",\"angola\",\"\",\"a,b\",\"\""));
    }

    #[test]
    fn test_export_then_import_round_trips() {
        let mut tricky = SongDraft::new("Comma, \"quote\"", SongCategory::Maculele);
        tricky.mnemonic = Some("Mnemo, with \"\"doubled\"\"".to_string());
        tricky.lyrics = Some("Line one\nCoro: line, two\r\n\"three\"".to_string());
        tricky.media_link = Some("https://example.org/?a=1,b=2".to_string());

        let mut plain = SongDraft::new("Plain", SongCategory::Autre);
        plain.mnemonic = Some("only mnemonic".to_string());

        let songs = vec![stored(tricky.clone()), stored(plain.clone())];
        let drafts = parse_songs(&export_songs(&songs)).unwrap();

        assert_eq!(drafts, vec![tricky, plain]);
    }

    #[test]
    fn test_export_then_import_keeps_quote_wrapped_content() {
        let mut draft = SongDraft::new("\"Paranauê\"", SongCategory::Angola);
        draft.mnemonic = Some("\"\"".to_string());

        let drafts = parse_songs(&export_songs(&[stored(draft.clone())])).unwrap();

        assert_eq!(drafts[0].title, "\"Paranauê\"");
        assert_eq!(drafts[0].mnemonic.as_deref(), Some("\"\""));
        assert_eq!(drafts, vec![draft]);
    }
}
