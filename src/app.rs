//! Main application state and wiring of the engine's collaborators.

use crate::engine::SessionEngine;
use crate::goals::GoalTracker;
use crate::models::{Settings, TimerStatus};
use crate::notifications::DesktopNotifier;
use crate::persistence::{Database, DatabaseError};
use crate::timer::TickScheduler;
use std::rc::Rc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Main application state (audio and UI handles live on the event loop).
pub struct App {
    pub engine: SessionEngine,
    db: Rc<Database>,
}

impl App {
    /// Creates a new application instance backed by the user's database.
    pub fn new(scheduler: Box<dyn TickScheduler>) -> Result<Self, AppError> {
        let db = Rc::new(Database::new()?);
        Ok(Self::with_db(db, scheduler))
    }

    /// Creates an app over an already opened database.
    pub fn with_db(db: Rc<Database>, scheduler: Box<dyn TickScheduler>) -> Self {
        let goals = GoalTracker::load(Box::new(Rc::clone(&db)));
        let notifier = DesktopNotifier::new(Box::new(Rc::clone(&db)));
        let engine = SessionEngine::new(
            Box::new(Rc::clone(&db)),
            scheduler,
            Box::new(notifier),
            goals,
        );

        Self { engine, db }
    }

    pub fn settings(&self) -> Settings {
        self.engine.settings()
    }

    /// Updates a setting and saves it to the database.
    ///
    /// A countdown that is idle and untouched is reloaded so a new duration
    /// shows up right away; anything in progress keeps its current length.
    pub fn update_setting<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        let untouched = self.engine.status() == TimerStatus::Idle
            && !self.engine.is_auto_start_pending()
            && self.engine.remaining_secs() == self.engine.total_secs();

        let mut settings = self.settings();
        updater(&mut settings);
        if let Err(e) = self.db.save_settings(&settings) {
            warn!(error = %e, "Failed to save settings");
        }

        if untouched && self.engine.remaining_secs() != self.engine.total_secs() {
            self.engine.reset_current_mode();
        }
    }

    /// Sets the daily goal in hours; zero turns the goal off.
    pub fn set_daily_goal(&mut self, hours: f64) {
        self.engine.goals_mut().set_daily_goal(hours);
    }
}
