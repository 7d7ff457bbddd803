use std::collections::BTreeMap;

use serde::Deserialize;

use crate::normalize::OTHER_POLLUTANT;
use crate::records::AqiCategory;

/// Colours and font handed to the presentation layer. The data pipeline
/// never reads it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub accent_color: String,
    pub text_color: String,
    pub subtle_text_color: String,
    pub background_color: String,
    pub card_background_color: String,
    pub border_color: String,
    pub font_family: String,
    pub category_colors: BTreeMap<String, String>,
    pub pollutant_colors: BTreeMap<String, String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let category_colors = [
            (AqiCategory::Severe, "#D32F2F"),
            (AqiCategory::VeryPoor, "#F57C00"),
            (AqiCategory::Poor, "#FFA000"),
            (AqiCategory::Moderate, "#FBC02D"),
            (AqiCategory::Satisfactory, "#7CB342"),
            (AqiCategory::Good, "#388E3C"),
            (AqiCategory::Unknown, "#475569"),
        ]
        .into_iter()
        .map(|(category, color)| (category.as_str().to_string(), color.to_string()))
        .collect();

        let pollutant_colors = [
            ("PM2.5", "#FF6E40"),
            ("PM10", "#29B6F6"),
            ("NO2", "#7E57C2"),
            ("SO2", "#FFEE58"),
            ("CO", "#FFA726"),
            ("O3", "#66BB6A"),
            (OTHER_POLLUTANT, "#BDBDBD"),
        ]
        .into_iter()
        .map(|(code, color)| (code.to_string(), color.to_string()))
        .collect();

        Self {
            accent_color: "#00B0FF".to_string(),
            text_color: "#F0F2F6".to_string(),
            subtle_text_color: "#A0AEC0".to_string(),
            background_color: "#0F172A".to_string(),
            card_background_color: "#1E293B".to_string(),
            border_color: "#334155".to_string(),
            font_family: "Inter, sans-serif".to_string(),
            category_colors,
            pollutant_colors,
        }
    }
}

impl ThemeConfig {
    pub fn category_color(&self, category: AqiCategory) -> &str {
        self.category_colors
            .get(category.as_str())
            .or_else(|| self.category_colors.get(AqiCategory::Unknown.as_str()))
            .map(String::as_str)
            .unwrap_or(self.subtle_text_color.as_str())
    }

    pub fn pollutant_color(&self, pollutant: &str) -> &str {
        self.pollutant_colors
            .get(pollutant)
            .or_else(|| self.pollutant_colors.get(OTHER_POLLUTANT))
            .map(String::as_str)
            .unwrap_or(self.subtle_text_color.as_str())
    }
}

/// Parses `#RRGGBB` (leading `#` optional).
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
