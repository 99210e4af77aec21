//! Stage settings value object
//!
//! Mirrors the world-scoped options the GM configures for the stage. The
//! host owns registration and persistence; this type only carries values
//! and their allowed ranges.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub const TYPING_SPEED_RANGE_MS: RangeInclusive<u64> = 50..=150;
pub const TEXT_CLEAR_DELAY_RANGE_SECS: RangeInclusive<u64> = 0..=30;
pub const TYPING_SOUND_VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const CHARACTER_NAME_FONT_SIZE_RANGE: RangeInclusive<u32> = 32..=50;
pub const DIALOGUE_FONT_SIZE_RANGE: RangeInclusive<u32> = 12..=20;

/// All configurable stage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageSettings {
    // ============================================================================
    // Typing
    // ============================================================================
    /// Milliseconds per revealed character
    pub typing_speed_ms: u64,

    /// Seconds after typing completes before the text fades out. 0 disables.
    pub text_clear_delay_secs: u64,

    /// Sound played per revealed non-whitespace character. Empty = silent.
    pub typing_sound_path: String,

    pub typing_sound_volume: f32,

    // ============================================================================
    // Fonts (applied by the host stylesheet)
    // ============================================================================
    /// Empty = host default font
    pub character_name_font: String,
    pub character_name_font_size: u32,
    pub dialogue_font: String,
    pub dialogue_font_size: u32,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            typing_speed_ms: 100,
            text_clear_delay_secs: 0,
            typing_sound_path: String::new(),
            typing_sound_volume: 0.5,
            character_name_font: String::new(),
            character_name_font_size: 36,
            dialogue_font: String::new(),
            dialogue_font_size: 16,
        }
    }
}

impl StageSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            typing_speed_ms: env_or("SPEAKER_STAGE_TYPING_SPEED_MS", defaults.typing_speed_ms),
            text_clear_delay_secs: env_or(
                "SPEAKER_STAGE_TEXT_CLEAR_DELAY_SECS",
                defaults.text_clear_delay_secs,
            ),
            typing_sound_path: env_or("SPEAKER_STAGE_TYPING_SOUND", defaults.typing_sound_path),
            typing_sound_volume: env_or(
                "SPEAKER_STAGE_TYPING_SOUND_VOLUME",
                defaults.typing_sound_volume,
            ),
            character_name_font: env_or(
                "SPEAKER_STAGE_CHARACTER_NAME_FONT",
                defaults.character_name_font,
            ),
            character_name_font_size: env_or(
                "SPEAKER_STAGE_CHARACTER_NAME_FONT_SIZE",
                defaults.character_name_font_size,
            ),
            dialogue_font: env_or("SPEAKER_STAGE_DIALOGUE_FONT", defaults.dialogue_font),
            dialogue_font_size: env_or(
                "SPEAKER_STAGE_DIALOGUE_FONT_SIZE",
                defaults.dialogue_font_size,
            ),
        }
        .clamped()
    }

    /// Force every numeric field into its allowed range
    pub fn clamped(mut self) -> Self {
        self.typing_speed_ms = clamp(self.typing_speed_ms, &TYPING_SPEED_RANGE_MS);
        self.text_clear_delay_secs = clamp(self.text_clear_delay_secs, &TEXT_CLEAR_DELAY_RANGE_SECS);
        self.typing_sound_volume = if self.typing_sound_volume.is_nan() {
            Self::default().typing_sound_volume
        } else {
            clamp(self.typing_sound_volume, &TYPING_SOUND_VOLUME_RANGE)
        };
        self.character_name_font_size =
            clamp(self.character_name_font_size, &CHARACTER_NAME_FONT_SIZE_RANGE);
        self.dialogue_font_size = clamp(self.dialogue_font_size, &DIALOGUE_FONT_SIZE_RANGE);
        self
    }

    /// The typing sound, if one is configured
    pub fn typing_sound(&self) -> Option<&str> {
        let path = self.typing_sound_path.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Whether completed dialogue fades out on its own
    pub fn auto_clear_enabled(&self) -> bool {
        self.text_clear_delay_secs > 0
    }
}

fn clamp<T: PartialOrd + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    if value < *range.start() {
        *range.start()
    } else if value > *range.end() {
        *range.end()
    } else {
        value
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
