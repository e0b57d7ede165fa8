//! Session state machine.
//!
//! [`SessionEngine`] owns the current mode, the countdown and the work/break
//! cycle. It is driven from one thread: user actions call the public methods,
//! and the [`TickScheduler`] delivers ticks that the host forwards to
//! [`SessionEngine::tick`]. Every whole minute of work is reported to the
//! [`GoalTracker`]; milestones it returns go to the [`Notifier`].
//!
//! ```text
//!            toggle               countdown hits 0
//!   Idle ──────────────► Running ─────────────────► Pulsing  (auto-start off)
//!    ▲  ◄────────────────  │ ▲                         │
//!    │      toggle        ▼ │ toggle                   │ continue
//!    │                  Paused                         ▼
//!    └── reset / end ───────────────────────── Running (next mode)
//! ```
//!
//! Toggling out of `Pulsing` resumes the finished mode without switching.

use crate::goals::GoalTracker;
use crate::models::{Settings, TimerMode, TimerStatus};
use crate::timer::{TickScheduler, AUTO_START_DELAY};
use std::rc::Rc;
use tracing::{debug, info};

/// Read access to the user's timer settings. Queried on every use so that
/// changes apply from the next reset or mode switch.
pub trait SettingsProvider {
    fn settings(&self) -> Settings;
}

impl<T: SettingsProvider + ?Sized> SettingsProvider for Rc<T> {
    fn settings(&self) -> Settings {
        (**self).settings()
    }
}

impl SettingsProvider for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}

/// Receives the user-facing announcements produced by the engine.
pub trait Notifier {
    /// A phase ended, either by running out or by being ended early.
    fn notify_phase_end(&self, mode: TimerMode);

    /// Today's work crossed `percent` of the daily goal.
    fn notify_milestone(&self, percent: u32);
}

/// State changes published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Started { mode: TimerMode },
    Paused { mode: TimerMode },
    Ticked { mode: TimerMode, remaining_secs: u32 },
    PhaseCompleted { mode: TimerMode },
    ModeChanged { from: TimerMode, to: TimerMode },
    Reset { mode: TimerMode },
    MilestoneReached { percent: u32 },
}

pub type Observer = Box<dyn FnMut(&EngineEvent)>;

pub struct SessionEngine {
    mode: TimerMode,
    status: TimerStatus,
    remaining_secs: u32,
    completed_workflows: u32,
    seconds_worked: u32,
    auto_start_pending: bool,
    settings: Box<dyn SettingsProvider>,
    scheduler: Box<dyn TickScheduler>,
    notifier: Box<dyn Notifier>,
    goals: GoalTracker,
    observers: Vec<Observer>,
}

impl SessionEngine {
    /// Creates an idle engine loaded with a full work countdown.
    pub fn new(
        settings: Box<dyn SettingsProvider>,
        scheduler: Box<dyn TickScheduler>,
        notifier: Box<dyn Notifier>,
        goals: GoalTracker,
    ) -> Self {
        let remaining_secs = settings.settings().duration_secs(TimerMode::Work);
        Self {
            mode: TimerMode::Work,
            status: TimerStatus::Idle,
            remaining_secs,
            completed_workflows: 0,
            seconds_worked: 0,
            auto_start_pending: false,
            settings,
            scheduler,
            notifier,
            goals,
            observers: Vec::new(),
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Full length of the current mode under the current settings.
    pub fn total_secs(&self) -> u32 {
        self.settings.settings().duration_secs(self.mode)
    }

    /// Elapsed fraction of the current countdown, 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        let total = self.total_secs();
        if total == 0 || self.remaining_secs >= total {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f32 / total as f32)
    }

    pub fn completed_workflows(&self) -> u32 {
        self.completed_workflows
    }

    #[cfg(test)]
    pub fn seconds_worked_this_session(&self) -> u32 {
        self.seconds_worked
    }

    pub fn is_auto_start_pending(&self) -> bool {
        self.auto_start_pending
    }

    pub fn settings(&self) -> Settings {
        self.settings.settings()
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut GoalTracker {
        &mut self.goals
    }

    /// Registers a callback invoked for every [`EngineEvent`].
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Starts the countdown if it is not running, pauses it if it is.
    ///
    /// Never changes the mode. From `Pulsing` the finished phase is marked
    /// running again; only [`continue_to_next_phase`](Self::continue_to_next_phase)
    /// advances past it.
    pub fn toggle_start_pause(&mut self) {
        match self.status {
            TimerStatus::Running => {
                self.scheduler.stop();
                self.status = TimerStatus::Paused;
                debug!(mode = ?self.mode, remaining = self.remaining_secs, "Paused");
                self.emit(EngineEvent::Paused { mode: self.mode });
            }
            TimerStatus::Idle | TimerStatus::Paused | TimerStatus::Pulsing => {
                self.start_ticking()
            }
        }
    }

    /// Stops the countdown and reloads the full duration of the current mode.
    pub fn reset_current_mode(&mut self) {
        self.halt();
        self.status = TimerStatus::Idle;
        self.remaining_secs = self.total_secs();
        self.seconds_worked = 0;
        debug!(mode = ?self.mode, "Reset");
        self.emit(EngineEvent::Reset { mode: self.mode });
    }

    /// Moves on from a finished countdown. Does nothing unless `Pulsing`.
    pub fn continue_to_next_phase(&mut self) {
        if self.status != TimerStatus::Pulsing {
            return;
        }
        self.switch_to_next_mode();
        self.start_ticking();
    }

    /// Finishes the current phase now, as if its countdown had run out, and
    /// leaves the next phase idle.
    pub fn end_current_session(&mut self) {
        self.halt();
        let finished = self.mode;
        self.announce_phase_end(finished);
        self.switch_to_next_mode();
        self.status = TimerStatus::Idle;
    }

    /// Starts the next phase after an auto-start delay. Does nothing unless
    /// an auto-start is still pending.
    pub fn resume_auto_start(&mut self) {
        if !self.auto_start_pending || self.status != TimerStatus::Idle {
            return;
        }
        self.start_ticking();
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) {
        if !self.status.is_running() || self.remaining_secs == 0 {
            return;
        }

        self.remaining_secs -= 1;

        if self.mode == TimerMode::Work {
            self.seconds_worked += 1;
            if self.seconds_worked >= 60 {
                self.seconds_worked = 0;
                if let Some(percent) = self.goals.record_work_session(1) {
                    self.notifier.notify_milestone(percent);
                    self.emit(EngineEvent::MilestoneReached { percent });
                }
            }
        }

        self.emit(EngineEvent::Ticked {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
        });

        if self.remaining_secs == 0 {
            self.complete_phase();
        }
    }

    fn complete_phase(&mut self) {
        let finished = self.mode;
        self.scheduler.stop();
        self.announce_phase_end(finished);

        if self.settings.settings().auto_start_next_session {
            self.switch_to_next_mode();
            self.status = TimerStatus::Idle;
            self.auto_start_pending = true;
            self.scheduler.schedule_resume(AUTO_START_DELAY);
        } else {
            self.status = TimerStatus::Pulsing;
        }
    }

    fn announce_phase_end(&mut self, mode: TimerMode) {
        info!(?mode, "Phase complete");
        self.notifier.notify_phase_end(mode);
        self.emit(EngineEvent::PhaseCompleted { mode });
    }

    fn switch_to_next_mode(&mut self) {
        let settings = self.settings.settings();
        let from = self.mode;

        let next = match from {
            TimerMode::Work => {
                self.completed_workflows += 1;
                if self.completed_workflows >= settings.long_break_threshold() {
                    self.completed_workflows = 0;
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        };

        self.mode = next;
        self.remaining_secs = settings.duration_secs(next);
        self.seconds_worked = 0;
        debug!(?from, to = ?next, workflows = self.completed_workflows, "Mode switched");
        self.emit(EngineEvent::ModeChanged { from, to: next });
    }

    fn start_ticking(&mut self) {
        self.auto_start_pending = false;
        self.status = TimerStatus::Running;
        self.scheduler.start();
        debug!(mode = ?self.mode, remaining = self.remaining_secs, "Started");
        self.emit(EngineEvent::Started { mode: self.mode });
    }

    fn halt(&mut self) {
        self.scheduler.stop();
        self.auto_start_pending = false;
    }

    fn emit(&mut self, event: EngineEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}
