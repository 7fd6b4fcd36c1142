//! Enum types shared by consumers and the persisted store

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colour scheme preference.
///
/// `System` defers to the platform preference and is the default when
/// nothing has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Resolve to a concrete scheme given the platform preference.
    pub fn resolve(&self, platform_prefers_dark: bool) -> Theme {
        match self {
            Theme::System if platform_prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            other => *other,
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Light, Theme::Dark, Theme::System]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Risk category assigned to a permutation by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    #[serde(rename = "Unknown", alias = "unknown")]
    Unknown,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

/// Sidebar placement derived from the persisted layout flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SidebarMode {
    Floating,
    Horizontal,
}

impl SidebarMode {
    pub fn from_horizontal(enabled: bool) -> Self {
        if enabled {
            SidebarMode::Horizontal
        } else {
            SidebarMode::Floating
        }
    }
}
