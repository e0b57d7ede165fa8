//! Data models for the Focusbar application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The phase the timer is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimerMode {
    /// Focused work interval.
    #[default]
    Work,
    /// Short break between work intervals.
    ShortBreak,
    /// Long break after a full cycle of work intervals.
    LongBreak,
}

impl TimerMode {
    /// Returns true for either kind of break.
    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }

    /// Human readable name used in menus and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }

    /// Glyph shown in the tray title for this mode.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Work => "🍅",
            Self::ShortBreak => "☕",
            Self::LongBreak => "🌴",
        }
    }
}

/// Whether the countdown for the current mode is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerStatus {
    /// Countdown is loaded but not started.
    #[default]
    Idle,
    /// Countdown is ticking once per second.
    Running,
    /// Countdown was suspended by the user.
    Paused,
    /// Countdown reached zero and auto-start is off; waiting for the user to
    /// advance to the next phase.
    Pulsing,
}

impl TimerStatus {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// User-configurable settings for the timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Duration of a work session in minutes.
    pub work_mins: u32,
    /// Duration of a short break in minutes.
    pub short_break_mins: u32,
    /// Duration of a long break in minutes.
    pub long_break_mins: u32,
    /// Number of completed work sessions before a long break.
    pub workflow_count: u32,
    /// Whether the next phase starts on its own when a countdown ends.
    pub auto_start_next_session: bool,
    /// Whether to play sounds on phase completion.
    pub sound_enabled: bool,
    /// Whether to show system notifications.
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_mins: 25,
            short_break_mins: 5,
            long_break_mins: 15,
            workflow_count: 4,
            auto_start_next_session: false,
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Configured length of `mode` in minutes, never less than one.
    pub fn duration_mins(&self, mode: TimerMode) -> u32 {
        let mins = match mode {
            TimerMode::Work => self.work_mins,
            TimerMode::ShortBreak => self.short_break_mins,
            TimerMode::LongBreak => self.long_break_mins,
        };
        mins.max(1)
    }

    /// Configured length of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u32 {
        self.duration_mins(mode).saturating_mul(60)
    }

    /// Work sessions required before a long break, never less than one.
    pub fn long_break_threshold(&self) -> u32 {
        self.workflow_count.max(1)
    }
}

/// One day of the weekly overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub minutes: u32,
    pub day_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.work_mins, 25);
        assert_eq!(settings.short_break_mins, 5);
        assert_eq!(settings.long_break_mins, 15);
        assert_eq!(settings.workflow_count, 4);
        assert!(!settings.auto_start_next_session);
        assert!(settings.sound_enabled);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn test_duration_per_mode() {
        let settings = Settings::default();
        assert_eq!(settings.duration_secs(TimerMode::Work), 1500);
        assert_eq!(settings.duration_secs(TimerMode::ShortBreak), 300);
        assert_eq!(settings.duration_secs(TimerMode::LongBreak), 900);
    }

    #[test]
    fn test_zero_settings_are_clamped() {
        let settings = Settings {
            work_mins: 0,
            workflow_count: 0,
            ..Settings::default()
        };
        assert_eq!(settings.duration_secs(TimerMode::Work), 60);
        assert_eq!(settings.long_break_threshold(), 1);
    }

    #[test]
    fn test_settings_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"work_mins": 50}"#).unwrap();
        assert_eq!(settings.work_mins, 50);
        assert_eq!(settings.short_break_mins, 5);
        assert_eq!(settings.workflow_count, 4);
    }

    #[test]
    fn test_mode_helpers() {
        assert!(!TimerMode::Work.is_break());
        assert!(TimerMode::ShortBreak.is_break());
        assert!(TimerMode::LongBreak.is_break());
        assert_eq!(TimerMode::default(), TimerMode::Work);
        assert_eq!(TimerStatus::default(), TimerStatus::Idle);
        assert!(TimerStatus::Running.is_running());
        assert!(!TimerStatus::Pulsing.is_running());
    }
}
