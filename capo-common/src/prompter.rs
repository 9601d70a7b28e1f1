//! Prompter rotation
//!
//! The prompter shows one random song per practice category and redraws
//! when the rotation countdown runs out.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::settings::{AppSettings, PrompterSettings};
use crate::song::{Song, SongCategory};

/// Pick a random song of `category`, or `None` when the category is empty
pub fn random_song_by_category<'a, R: Rng + ?Sized>(
    songs: &'a [Song],
    category: SongCategory,
    rng: &mut R,
) -> Option<&'a Song> {
    let candidates: Vec<&Song> = songs.iter().filter(|s| s.category == category).collect();
    candidates.choose(rng).copied()
}

/// One prompter tile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrompterCard {
    pub category: SongCategory,
    pub color: &'static str,
    /// `None` when the category has no songs
    pub song: Option<CardSong>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSong {
    pub id: uuid::Uuid,
    /// Mnemonic or title, upper-cased if requested
    pub text: String,
    pub font_size: &'static str,
    /// Text color; only forced when high contrast is on
    pub text_color: &'static str,
}

fn card_song(song: &Song, settings: &PrompterSettings) -> CardSong {
    let text = if settings.upper_case {
        song.display_text().to_uppercase()
    } else {
        song.display_text().to_string()
    };
    let text_color = if settings.use_high_contrast && settings.is_dark_mode {
        "#FFFFFF"
    } else {
        "#000000"
    };

    CardSong {
        id: song.id,
        text,
        font_size: settings.font_size.css(),
        text_color,
    }
}

/// Draw one card per practice category
pub fn draw_cards<R: Rng + ?Sized>(
    songs: &[Song],
    prompter: &PrompterSettings,
    app: &AppSettings,
    rng: &mut R,
) -> Vec<PrompterCard> {
    SongCategory::PRACTICE
        .iter()
        .map(|&category| PrompterCard {
            category,
            color: category.color(app.use_vivid_colors),
            song: random_song_by_category(songs, category, rng).map(|s| card_song(s, prompter)),
        })
        .collect()
}

/// Seconds-based rotation countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    interval: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(interval: u32) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            remaining: interval,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// One second passed; returns true when the cards must be redrawn
    pub fn tick(&mut self) -> bool {
        if self.remaining <= 1 {
            self.remaining = self.interval;
            true
        } else {
            self.remaining -= 1;
            false
        }
    }

    /// `m:ss`
    pub fn display(&self) -> String {
        format_clock(self.remaining())
    }
}

/// Format seconds as `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FontSize;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn song(title: &str, mnemonic: Option<&str>, category: SongCategory) -> Song {
        let now = Utc::now();
        Song {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category,
            mnemonic: mnemonic.map(str::to_string),
            lyrics: None,
            media_link: None,
            owner_id: Uuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_random_song_stays_in_category() {
        let songs = vec![
            song("a", None, SongCategory::Angola),
            song("b", None, SongCategory::Angola),
            song("c", None, SongCategory::Maculele),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = random_song_by_category(&songs, SongCategory::Angola, &mut rng).unwrap();
            assert_eq!(picked.category, SongCategory::Angola);
        }
        assert!(random_song_by_category(&songs, SongCategory::Autre, &mut rng).is_none());
    }

    #[test]
    fn test_draw_cards_one_per_practice_category() {
        let songs = vec![
            song("Iê", Some("iê viva"), SongCategory::Angola),
            song("Paranauê", None, SongCategory::SaoBentoGrande),
        ];
        let prompter = PrompterSettings {
            upper_case: true,
            font_size: FontSize::Large,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let cards = draw_cards(&songs, &prompter, &AppSettings::default(), &mut rng);

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].category, SongCategory::Angola);
        let angola = cards[0].song.as_ref().unwrap();
        assert_eq!(angola.text, "IÊ VIVA");
        assert_eq!(angola.font_size, "2.5rem");
        assert!(cards[1].song.is_none());
        assert_eq!(cards[2].song.as_ref().unwrap().text, "PARANAUÊ");
    }

    #[test]
    fn test_high_contrast_text_color() {
        let s = song("x", None, SongCategory::Angola);
        let mut settings = PrompterSettings::default();
        assert_eq!(card_song(&s, &settings).text_color, "#000000");
        settings.use_high_contrast = true;
        assert_eq!(card_song(&s, &settings).text_color, "#FFFFFF");
        settings.is_dark_mode = false;
        assert_eq!(card_song(&s, &settings).text_color, "#000000");
    }

    #[test]
    fn test_countdown_rotates_at_zero() {
        let mut c = Countdown::new(3);
        assert_eq!(c.display(), "0:03");
        assert!(!c.tick());
        assert!(!c.tick());
        assert_eq!(c.remaining(), 1);
        assert!(c.tick());
        assert_eq!(c.remaining(), 3);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(120), "2:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(0), "0:00");
    }
}
