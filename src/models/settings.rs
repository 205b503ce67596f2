use serde::{Deserialize, Serialize};

/// Smallest accepted `max_returns`.
pub const MIN_RETURNS: u32 = 1;
/// Largest accepted `max_returns`.
pub const MAX_RETURNS: u32 = 15;

/// Per-session limits for retrieval and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of articles requested per search.
    pub max_returns: u32,
    /// Abstracts longer than this many characters are truncated on display.
    pub max_abstract_len: usize,
    /// Length bound handed to the summarization service.
    pub max_summary_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_returns: 5,
            max_abstract_len: 500,
            max_summary_len: 150,
        }
    }
}

impl Settings {
    /// Returns a copy with every field clamped into its accepted range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            max_returns: self.max_returns.clamp(MIN_RETURNS, MAX_RETURNS),
            max_abstract_len: self.max_abstract_len.max(1),
            max_summary_len: self.max_summary_len.max(1),
        }
    }

    /// Merges a partial update, clamping out-of-range values.
    #[must_use]
    pub fn merged(self, update: &SettingsUpdate) -> Self {
        Self {
            max_returns: update.max_returns.unwrap_or(self.max_returns),
            max_abstract_len: update.max_abstract_len.unwrap_or(self.max_abstract_len),
            max_summary_len: update.max_summary_len.unwrap_or(self.max_summary_len),
        }
        .clamped()
    }
}

/// Partial settings change; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub max_returns: Option<u32>,
    pub max_abstract_len: Option<usize>,
    pub max_summary_len: Option<usize>,
}

impl SettingsUpdate {
    /// Returns `true` if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.max_returns.is_none()
            && self.max_abstract_len.is_none()
            && self.max_summary_len.is_none()
    }
}
