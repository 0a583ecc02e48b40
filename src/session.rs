//src/session.rs
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::{Workout, WorkoutSession, WorkoutTemplate};
use crate::{parse_count, parse_weight};

/// Idle -> Running -> Ended. There is no pause state and an ended session
/// cannot be resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Ended,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session is not running.")]
    NotRunning,
    #[error("Session was already started.")]
    AlreadyStarted,
    #[error("Session has already ended.")]
    AlreadyEnded,
    #[error("No exercise with id '{0}' in this session.")]
    UnknownExercise(String),
}

/// A workout session in progress, driven by caller-supplied clock instants.
/// Ticks recompute elapsed time as `now - start` from the wall clock, so a
/// missed tick never loses time.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    template_id: String,
    name: String,
    exercises: Vec<Workout>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    elapsed_ms: i64,
}

impl ActiveSession {
    pub fn from_template(template: &WorkoutTemplate) -> Self {
        Self {
            template_id: template.id.clone(),
            name: template.name.clone(),
            exercises: template.exercises.clone(),
            state: SessionState::Idle,
            started_at: None,
            elapsed_ms: 0,
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exercises(&self) -> &[Workout] {
        &self.exercises
    }

    pub const fn elapsed_ms(&self) -> i64 {
        self.elapsed_ms
    }

    /// Starts the timer. Elapsed time resets to zero.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {
                self.started_at = Some(now);
                self.elapsed_ms = 0;
                self.state = SessionState::Running;
                Ok(())
            }
            SessionState::Running => Err(SessionError::AlreadyStarted),
            SessionState::Ended => Err(SessionError::AlreadyEnded),
        }
    }

    /// Recomputes elapsed time from the start instant. Returns the new
    /// elapsed milliseconds.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<i64, SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let started = self.started_at.ok_or(SessionError::NotRunning)?;
        self.elapsed_ms = (now - started).num_milliseconds().max(0);
        Ok(self.elapsed_ms)
    }

    /// Per-exercise fields are only editable while running. Invalid numeric
    /// input defaults to 0.
    pub fn set_sets(&mut self, workout_id: &str, raw: &str) -> Result<(), SessionError> {
        let value = parse_count(raw);
        self.edit_exercise(workout_id, |w| w.sets = value)
    }

    pub fn set_reps(&mut self, workout_id: &str, raw: &str) -> Result<(), SessionError> {
        let value = parse_count(raw);
        self.edit_exercise(workout_id, |w| w.reps = value)
    }

    pub fn set_weight(&mut self, workout_id: &str, raw: &str) -> Result<(), SessionError> {
        let value = parse_weight(raw);
        self.edit_exercise(workout_id, |w| w.weight = value)
    }

    fn edit_exercise<F: FnOnce(&mut Workout)>(
        &mut self,
        workout_id: &str,
        apply: F,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let workout = self
            .exercises
            .iter_mut()
            .find(|w| w.id == workout_id)
            .ok_or_else(|| SessionError::UnknownExercise(workout_id.to_string()))?;
        apply(workout);
        Ok(())
    }

    /// Stops the timer and builds the session record for persisting. The
    /// session id is `"{template_id}-{millis}"`.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<WorkoutSession, SessionError> {
        self.tick(now)?;
        self.state = SessionState::Ended;
        Ok(WorkoutSession {
            id: format!("{}-{}", self.template_id, now.timestamp_millis()),
            name: self.name.clone(),
            date: now,
            duration: self.elapsed_ms,
            exercises: self.exercises.clone(),
        })
    }
}

/// Formats elapsed milliseconds as zero-padded `HH:MM:SS`.
pub fn format_elapsed(milliseconds: i64) -> String {
    let total_seconds = milliseconds.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
