//! User preferences stored beside the board: theme and onboarding.

use crate::storage::{KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Key of the onboarding flag.
pub const ONBOARDING_KEY: &str = "onboarding_complete";

/// Key of the theme name.
pub const THEME_KEY: &str = "theme";

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
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
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Preference flags external to the board itself.
pub struct Preferences<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stored theme, or the default when missing or unrecognised.
    pub fn theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring stored theme: {}", e);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::error!("Failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> StorageResult<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Switch between dark and light, returning the new theme.
    pub fn toggle_theme(&self) -> StorageResult<Theme> {
        let theme = self.theme().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    /// Whether the user has finished onboarding.
    pub fn onboarding_complete(&self) -> bool {
        match self.store.get(ONBOARDING_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                log::error!("Failed to read onboarding flag: {}", e);
                false
            }
        }
    }

    pub fn complete_onboarding(&self) -> StorageResult<()> {
        self.store.set(ONBOARDING_KEY, "true")
    }

    /// Forget onboarding so it shows again.
    pub fn reset_onboarding(&self) -> StorageResult<()> {
        self.store.remove(ONBOARDING_KEY)
    }
}
