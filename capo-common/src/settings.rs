//! Prompter and app display settings
//!
//! Both blobs are read once at startup, changed through partial updates and
//! written back after every change (see [`crate::db::settings`]).

use serde::{Deserialize, Serialize};

/// Shortest prompter rotation (seconds)
pub const MIN_ROTATION_INTERVAL: u32 = 30;
/// Longest prompter rotation (seconds)
pub const MAX_ROTATION_INTERVAL: u32 = 300;

/// Prompter card text size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// CSS size for prompter cards
    pub fn css(&self) -> &'static str {
        match self {
            FontSize::Small => "1.5rem",
            FontSize::Medium => "2rem",
            FontSize::Large => "2.5rem",
        }
    }
}

/// Font size used for full-screen lyric reading
pub const READING_FONT_SIZE: &str = "4.5rem";

/// Prompter screen settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrompterSettings {
    /// Seconds between card rotations
    pub rotation_interval: u32,
    pub font_size: FontSize,
    pub is_dark_mode: bool,
    pub use_high_contrast: bool,
    pub upper_case: bool,
}

impl Default for PrompterSettings {
    fn default() -> Self {
        Self {
            rotation_interval: 120,
            font_size: FontSize::Medium,
            is_dark_mode: true,
            use_high_contrast: false,
            upper_case: false,
        }
    }
}

/// Partial update of [`PrompterSettings`]; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrompterSettingsPatch {
    pub rotation_interval: Option<u32>,
    pub font_size: Option<FontSize>,
    pub is_dark_mode: Option<bool>,
    pub use_high_contrast: Option<bool>,
    pub upper_case: Option<bool>,
}

impl PrompterSettings {
    /// Force every value into its allowed range
    pub fn normalized(mut self) -> Self {
        self.rotation_interval = self
            .rotation_interval
            .clamp(MIN_ROTATION_INTERVAL, MAX_ROTATION_INTERVAL);
        self
    }

    pub fn apply(&self, patch: &PrompterSettingsPatch) -> Self {
        Self {
            rotation_interval: patch.rotation_interval.unwrap_or(self.rotation_interval),
            font_size: patch.font_size.unwrap_or(self.font_size),
            is_dark_mode: patch.is_dark_mode.unwrap_or(self.is_dark_mode),
            use_high_contrast: patch.use_high_contrast.unwrap_or(self.use_high_contrast),
            upper_case: patch.upper_case.unwrap_or(self.upper_case),
        }
        .normalized()
    }
}

/// App-wide display settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub is_app_dark_mode: bool,
    pub use_vivid_colors: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsPatch {
    pub is_app_dark_mode: Option<bool>,
    pub use_vivid_colors: Option<bool>,
}

impl AppSettings {
    pub fn apply(&self, patch: &AppSettingsPatch) -> Self {
        Self {
            is_app_dark_mode: patch.is_app_dark_mode.unwrap_or(self.is_app_dark_mode),
            use_vivid_colors: patch.use_vivid_colors.unwrap_or(self.use_vivid_colors),
        }
    }
}

/// Both settings blobs as held in memory by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub prompter: PrompterSettings,
    pub app: AppSettings,
}
