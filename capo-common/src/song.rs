//! Song records and categories
//!
//! A song is owned by exactly one user and belongs to one of seven fixed
//! categories. Categories drive grouping on the home screen, card colors
//! and the default reading tempo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Song-style tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SongCategory {
    Angola,
    SaoBentoPequeno,
    SaoBentoGrande,
    SambaDeRoda,
    Maculele,
    PuxadaDeRede,
    Autre,
}

impl SongCategory {
    /// Every category, in display order
    pub const ALL: [SongCategory; 7] = [
        SongCategory::Angola,
        SongCategory::SaoBentoPequeno,
        SongCategory::SaoBentoGrande,
        SongCategory::SambaDeRoda,
        SongCategory::Maculele,
        SongCategory::PuxadaDeRede,
        SongCategory::Autre,
    ];

    /// Categories shown as sections on the home screen and rotated by the prompter
    pub const PRACTICE: [SongCategory; 3] = [
        SongCategory::Angola,
        SongCategory::SaoBentoPequeno,
        SongCategory::SaoBentoGrande,
    ];

    /// Wire name, as stored in the database and CSV files
    pub fn as_str(&self) -> &'static str {
        match self {
            SongCategory::Angola => "angola",
            SongCategory::SaoBentoPequeno => "saoBentoPequeno",
            SongCategory::SaoBentoGrande => "saoBentoGrande",
            SongCategory::SambaDeRoda => "sambaDeRoda",
            SongCategory::Maculele => "maculele",
            SongCategory::PuxadaDeRede => "puxadaDeRede",
            SongCategory::Autre => "autre",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SongCategory::Angola => "Angola",
            SongCategory::SaoBentoPequeno => "São Bento Pequeno",
            SongCategory::SaoBentoGrande => "São Bento Grande",
            SongCategory::SambaDeRoda => "Samba de Roda",
            SongCategory::Maculele => "Maculelê",
            SongCategory::PuxadaDeRede => "Puxada de Rede",
            SongCategory::Autre => "Autre",
        }
    }

    /// Category color (hex); `vivid` selects the saturated tile palette
    pub fn color(&self, vivid: bool) -> &'static str {
        match (self, vivid) {
            (SongCategory::Angola, false) => "#E8DF24",
            (SongCategory::SaoBentoPequeno, false) => "#03A501",
            (SongCategory::SaoBentoGrande, false) => "#0467B0",
            (SongCategory::SambaDeRoda, false) => "#FF6347",
            (SongCategory::Maculele, false) => "#8A2BE2",
            (SongCategory::PuxadaDeRede, false) => "#FFD700",
            (SongCategory::Autre, false) => "#A9A9A9",
            (SongCategory::Angola, true) => "#FFD700",
            (SongCategory::SaoBentoPequeno, true) => "#32CD32",
            (SongCategory::SaoBentoGrande, true) => "#1E90FF",
            (SongCategory::SambaDeRoda, true) => "#FF4500",
            (SongCategory::Maculele, true) => "#9932CC",
            (SongCategory::PuxadaDeRede, true) => "#FFC107",
            (SongCategory::Autre, true) => "#778899",
        }
    }

    /// Reading tempo a song of this category opens with
    pub fn default_tempo(&self) -> u32 {
        match self {
            SongCategory::Angola => 60,
            SongCategory::SaoBentoPequeno => 85,
            SongCategory::SaoBentoGrande => 120,
            SongCategory::SambaDeRoda => 90,
            SongCategory::Maculele => 110,
            SongCategory::PuxadaDeRede => 70,
            SongCategory::Autre => 80,
        }
    }
}

impl fmt::Display for SongCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SongCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Invalid category: {}", s)))
    }
}

/// Stored song record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub category: SongCategory,
    pub mnemonic: Option<String>,
    pub lyrics: Option<String>,
    pub media_link: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Text shown on a prompter card: the mnemonic when there is one, else the title
    pub fn display_text(&self) -> &str {
        match self.mnemonic.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => &self.title,
        }
    }

    /// Case-insensitive substring match over title, mnemonic and lyrics.
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .mnemonic
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(&query))
            || self
                .lyrics
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(&query))
    }

    /// Editable fields of this record
    pub fn to_draft(&self) -> SongDraft {
        SongDraft {
            title: self.title.clone(),
            category: self.category,
            mnemonic: self.mnemonic.clone(),
            lyrics: self.lyrics.clone(),
            media_link: self.media_link.clone(),
        }
    }
}

/// User-entered song fields (form submit, import row, legacy migration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDraft {
    #[serde(default)]
    pub title: String,
    pub category: SongCategory,
    #[serde(default)]
    pub mnemonic: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub media_link: Option<String>,
}

impl SongDraft {
    pub fn new(title: impl Into<String>, category: SongCategory) -> Self {
        Self {
            title: title.into(),
            category,
            mnemonic: None,
            lyrics: None,
            media_link: None,
        }
    }

    /// Enforce "title or mnemonic" and turn blank optionals into `None`
    pub fn validate(mut self) -> Result<Self> {
        self.mnemonic = non_blank(self.mnemonic);
        self.lyrics = non_blank(self.lyrics);
        self.media_link = non_blank(self.media_link);

        if self.title.trim().is_empty() && self.mnemonic.is_none() {
            return Err(Error::validation("Title or mnemonic is required"));
        }
        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Lower-cased, accent-folded key for title ordering
pub fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Title ordering used by every listing
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// One home-screen section
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySection {
    pub category: SongCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub songs: Vec<Song>,
}

/// Group `songs` into one section per requested category, keeping only
/// songs matching `query`, sorted by title
pub fn group_by_category(
    songs: &[Song],
    categories: &[SongCategory],
    query: &str,
    vivid: bool,
) -> Vec<CategorySection> {
    categories
        .iter()
        .map(|&category| {
            let mut matching: Vec<Song> = songs
                .iter()
                .filter(|s| s.category == category && s.matches_query(query))
                .cloned()
                .collect();
            matching.sort_by(|a, b| compare_titles(&a.title, &b.title));

            CategorySection {
                category,
                label: category.label(),
                color: category.color(vivid),
                count: matching.len(),
                songs: matching,
            }
        })
        .collect()
}

/// A lyric line, flagged when it is a chorus line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricLine {
    pub text: String,
    pub chorus: bool,
}

/// Split lyrics into lines; lines mentioning "coro" are chorus lines
pub fn format_lyrics(lyrics: &str, upper_case: bool) -> Vec<LyricLine> {
    lyrics
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            LyricLine {
                chorus: line.to_lowercase().contains("coro"),
                text: if upper_case {
                    line.to_uppercase()
                } else {
                    line.to_string()
                },
            }
        })
        .collect()
}
