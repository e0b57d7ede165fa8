//! System notifications for phase ends and goal milestones.

use crate::engine::{Notifier, SettingsProvider};
use crate::models::TimerMode;
use notify_rust::Notification;
use std::thread;
use tracing::warn;

/// [`Notifier`] that shows desktop notifications when they are enabled in
/// the settings.
pub struct DesktopNotifier {
    settings: Box<dyn SettingsProvider>,
}

impl DesktopNotifier {
    pub fn new(settings: Box<dyn SettingsProvider>) -> Self {
        Self { settings }
    }

    fn enabled(&self) -> bool {
        self.settings.settings().notifications_enabled
    }
}

impl Notifier for DesktopNotifier {
    fn notify_phase_end(&self, mode: TimerMode) {
        if self.enabled() {
            let (summary, body) = phase_end_message(mode);
            show(summary, body);
        }
    }

    fn notify_milestone(&self, percent: u32) {
        if self.enabled() {
            let (summary, body) = milestone_message(percent);
            show(summary, body);
        }
    }
}

/// Title and body announcing the end of `mode`.
pub fn phase_end_message(mode: TimerMode) -> (String, String) {
    let (summary, body) = match mode {
        TimerMode::Work => ("Work Session Complete! 🍅", "Great work! Time for a break."),
        TimerMode::ShortBreak => ("Break Over! ☕", "Ready to get back to work?"),
        TimerMode::LongBreak => (
            "Long Break Over! 🌴",
            "Feeling refreshed? Time to start a new cycle.",
        ),
    };
    (summary.to_string(), body.to_string())
}

/// Title and body announcing that `percent` of the daily goal is done.
pub fn milestone_message(percent: u32) -> (String, String) {
    match percent {
        100 => (
            "Daily Goal Reached! 🎉".to_string(),
            "You've hit 100% of today's focus goal.".to_string(),
        ),
        p if p > 100 => (
            "Above and Beyond! 🚀".to_string(),
            format!("You're at {}% of today's focus goal.", p),
        ),
        p => (
            format!("{}% of Daily Goal", p),
            format!("Keep going, {}% of today's focus goal is done.", p),
        ),
    }
}

/// Shows a notification on a background thread to avoid blocking.
fn show(summary: String, body: String) {
    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(&summary)
            .body(&body)
            .sound_name("default")
            .show()
        {
            warn!(error = %e, "Failed to show notification");
        }
    });
}

#[cfg(test)]
mod tests {
    // Note: showing notifications interacts with the system and may hang
    // waiting for user interaction. Those tests are ignored by default.
    // Run with `cargo test -- --ignored` to execute them.

    use super::*;
    use crate::models::Settings;

    #[test]
    fn test_phase_end_messages_differ_per_mode() {
        let work = phase_end_message(TimerMode::Work);
        let short = phase_end_message(TimerMode::ShortBreak);
        let long = phase_end_message(TimerMode::LongBreak);
        assert!(work.0.contains("Work"));
        assert!(short.0.contains("Break Over"));
        assert!(long.0.contains("Long Break"));
        assert_ne!(short, long);
    }

    #[test]
    fn test_milestone_messages() {
        assert_eq!(milestone_message(25).0, "25% of Daily Goal");
        assert!(milestone_message(75).1.contains("75%"));
        assert_eq!(milestone_message(100).0, "Daily Goal Reached! 🎉");
        assert!(milestone_message(125).1.contains("125%"));
    }

    #[test]
    fn test_disabled_notifier_stays_quiet() {
        let notifier = DesktopNotifier::new(Box::new(Settings {
            notifications_enabled: false,
            ..Settings::default()
        }));
        assert!(!notifier.enabled());
        notifier.notify_phase_end(TimerMode::Work);
        notifier.notify_milestone(50);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_phase_end_notification() {
        let notifier = DesktopNotifier::new(Box::new(Settings::default()));
        notifier.notify_phase_end(TimerMode::Work);
    }

    #[test]
    #[ignore = "Requires system notification interaction"]
    fn test_milestone_notification() {
        let notifier = DesktopNotifier::new(Box::new(Settings::default()));
        notifier.notify_milestone(100);
    }
}
