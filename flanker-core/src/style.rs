use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Straight RGBA colour, parsed from a colour name or `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("unknown colour `{0}`")]
    Unknown(String),
    #[error("malformed hex colour `{0}`")]
    Hex(String),
}

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const DIM_GRAY: Color = Color([105, 105, 105, 255]);

    pub fn rgba(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(ColorError::Hex(s.to_string()));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorError::Hex(s.to_string()))
            };
            return Ok(Color([channel(0)?, channel(2)?, channel(4)?, 255]));
        }
        let rgb = match name.as_str() {
            "black" => [0, 0, 0],
            "white" => [255, 255, 255],
            "gray" | "grey" => [128, 128, 128],
            "dimgray" | "dimgrey" => [105, 105, 105],
            "lightgray" | "lightgrey" => [211, 211, 211],
            "darkgray" | "darkgrey" => [169, 169, 169],
            "silver" => [192, 192, 192],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "blue" => [0, 0, 255],
            "yellow" => [255, 255, 0],
            "orange" => [255, 165, 0],
            _ => return Err(ColorError::Unknown(s.to_string())),
        };
        Ok(Color([rgb[0], rgb[1], rgb[2], 255]))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, _] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Display fields of the config file; only the renderer reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(rename = "BACKGROUND_COLOR", default = "default_background")]
    pub background_color: Color,
    #[serde(rename = "FIX_CROSS_SIZE", default = "default_fix_cross_size")]
    pub fix_cross_size: f32,
    #[serde(rename = "FIX_CROSS_COLOR", default = "default_foreground")]
    pub fix_cross_color: Color,
    #[serde(rename = "STIM_SIZE", default = "default_stim_size")]
    pub stim_size: f32,
    #[serde(rename = "STIM_COLOR", default = "default_foreground")]
    pub stim_color: Color,
    #[serde(rename = "FEEDBACK_SIZE", default = "default_feedback_size")]
    pub feedback_size: f32,
    #[serde(rename = "TEXT_SIZE", default = "default_text_size")]
    pub text_size: f32,
    #[serde(rename = "REMINDER_TEXT", default = "default_reminder_text")]
    pub reminder_text: String,
    #[serde(rename = "REMINDER_SIZE", default = "default_reminder_size")]
    pub reminder_size: f32,
    #[serde(rename = "FONT_PATH", default = "default_font_path")]
    pub font_path: String,
}

fn default_background() -> Color {
    Color([192, 192, 192, 255])
}

fn default_foreground() -> Color {
    Color::BLACK
}

fn default_fix_cross_size() -> f32 {
    40.0
}

fn default_stim_size() -> f32 {
    60.0
}

fn default_feedback_size() -> f32 {
    40.0
}

fn default_text_size() -> f32 {
    30.0
}

fn default_reminder_text() -> String {
    "X lub C   \t\t\t\t   V lub B".to_string()
}

fn default_reminder_size() -> f32 {
    25.0
}

fn default_font_path() -> String {
    "assets/DejaVuSans.ttf".to_string()
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: default_background(),
            fix_cross_size: default_fix_cross_size(),
            fix_cross_color: default_foreground(),
            stim_size: default_stim_size(),
            stim_color: default_foreground(),
            feedback_size: default_feedback_size(),
            text_size: default_text_size(),
            reminder_text: default_reminder_text(),
            reminder_size: default_reminder_size(),
            font_path: default_font_path(),
        }
    }
}
