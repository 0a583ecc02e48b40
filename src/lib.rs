// src/lib.rs
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

// --- Declare modules ---
mod config;
pub mod history;
pub mod session;
pub mod store;
pub mod template;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util,
    load_config as load_config_util,
    parse_color,
    save_config as save_config_util,
    Config,
    ConfigError,
    StandardColor,
    Theme,
    ThemePreference,
    Units,
};
pub use history::{SessionHistory, HISTORY_PAGE_SIZE};
pub use session::{format_elapsed, ActiveSession, SessionError, SessionState};
pub use store::{
    default_exercise_catalog,
    generate_record_id,
    get_db_path as get_db_path_util,
    Collection,
    CurrentMeasurement,
    Exercise,
    Measurement,
    MeasurementEntry,
    StoreError,
    WeightEntry,
    Workout,
    WorkoutSession,
    WorkoutTemplate,
};
pub use template::{DraftError, TemplateDraft};

pub struct AppService {
    pub config: Config,
    pub conn: Connection,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let db_path = store::get_db_path().context("Failed to determine database path")?;
        let conn = store::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        store::init_db(&conn).context("Failed to initialize database schema")?;

        Ok(Self {
            config,
            conn,
            db_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    pub const fn theme_preference(&self) -> ThemePreference {
        self.config.theme_preference
    }

    /// Sets the light/dark preference.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_theme_preference(&mut self, preference: ThemePreference) -> Result<(), ConfigError> {
        self.config.theme_preference = preference;
        self.save_config()
    }

    /// Sets the measurement units.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    // --- Exercise catalog ---

    /// Loads the exercise catalog. The built-in defaults are seeded once at
    /// initialization, so a deliberately emptied catalog stays empty. A
    /// catalog that cannot be read yields the defaults; storage errors are
    /// logged, never surfaced.
    pub fn load_exercises(&self) -> Vec<Exercise> {
        match store::load_collection::<Exercise>(&self.conn, Collection::Exercises) {
            Ok(exercises) => exercises,
            Err(e) => {
                eprintln!("Error loading exercises: {e}");
                default_exercise_catalog()
            }
        }
    }

    /// Replaces the whole exercise catalog.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_exercises(&mut self, exercises: &[Exercise]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::Exercises, exercises)
            .context("Failed to save exercises")
    }

    /// Adds a catalog exercise. Name uniqueness is checked case-insensitively.
    /// # Errors
    /// Returns `anyhow::Error` if the name is empty or already taken.
    pub fn add_exercise(&mut self, name: &str) -> Result<Exercise> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!("Exercise name cannot be empty.");
        }
        let mut exercises = self.load_exercises();
        if exercises
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(trimmed))
        {
            bail!(StoreError::ExerciseNameNotUnique(trimmed.to_string()));
        }
        let exercise = Exercise {
            id: generate_record_id(),
            name: trimmed.to_string(),
        };
        exercises.push(exercise.clone());
        self.save_exercises(&exercises)?;
        Ok(exercise)
    }

    /// Renames a catalog exercise, keeping the uniqueness check.
    /// # Errors
    /// Returns `anyhow::Error` if the id is unknown or the name is taken.
    pub fn rename_exercise(&mut self, id: &str, new_name: &str) -> Result<()> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            bail!("Exercise name cannot be empty.");
        }
        let mut exercises = self.load_exercises();
        if exercises
            .iter()
            .any(|e| e.id != id && e.name.eq_ignore_ascii_case(trimmed))
        {
            bail!(StoreError::ExerciseNameNotUnique(trimmed.to_string()));
        }
        let exercise = exercises
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::ExerciseNotFound(id.to_string()))?;
        exercise.name = trimmed.to_string();
        self.save_exercises(&exercises)
    }

    /// Removes a catalog exercise by id. Template and session copies keep
    /// their name strings; there is no referential integrity to maintain.
    /// # Errors
    /// Returns `anyhow::Error` if the id is unknown.
    pub fn delete_exercise(&mut self, id: &str) -> Result<()> {
        let exercises = self.load_exercises();
        if !exercises.iter().any(|e| e.id == id) {
            bail!(StoreError::ExerciseNotFound(id.to_string()));
        }
        let remaining: Vec<Exercise> = exercises.into_iter().filter(|e| e.id != id).collect();
        self.save_exercises(&remaining)
    }

    // --- Workout templates ---

    /// Loads all templates; storage failure logs and yields an empty list.
    pub fn load_workout_templates(&self) -> Vec<WorkoutTemplate> {
        load_or_empty::<WorkoutTemplate>(&self.conn, Collection::WorkoutTemplates)
    }

    /// Replaces the whole template collection.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_workout_templates(&mut self, templates: &[WorkoutTemplate]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::WorkoutTemplates, templates)
            .context("Failed to save workout templates")
    }

    /// Fetches one template by id.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `StoreError::TemplateNotFound` if absent.
    pub fn get_template(&self, id: &str) -> Result<WorkoutTemplate> {
        store::get_record::<WorkoutTemplate>(&self.conn, Collection::WorkoutTemplates, id)
            .context("Failed to read workout template")?
            .ok_or_else(|| StoreError::TemplateNotFound(id.to_string()).into())
    }

    /// Inserts or updates a single template.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_template(&self, template: &WorkoutTemplate) -> Result<()> {
        store::put_record(&self.conn, Collection::WorkoutTemplates, template)
            .with_context(|| format!("Failed to save template '{}'", template.name))
    }

    /// Deletes a template by id.
    /// # Errors
    /// Returns `anyhow::Error` if the id is unknown.
    pub fn delete_template(&self, id: &str) -> Result<()> {
        store::delete_record(&self.conn, Collection::WorkoutTemplates, id)
            .map(|_| ())
            .map_err(|e| match e {
                StoreError::RecordNotFound { .. } => {
                    StoreError::TemplateNotFound(id.to_string()).into()
                }
                other => anyhow::Error::new(other).context("Failed to delete template"),
            })
    }

    // --- Workout sessions ---

    /// Loads all recorded sessions; storage failure logs and yields an empty
    /// list rather than stale data.
    pub fn load_workout_sessions(&self) -> Vec<WorkoutSession> {
        load_or_empty::<WorkoutSession>(&self.conn, Collection::WorkoutSessions)
    }

    /// Appends one finished session to the history.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_workout_session(&self, session: &WorkoutSession) -> Result<()> {
        store::append_record(&self.conn, Collection::WorkoutSessions, session)
            .context("Failed to save workout session")
    }

    /// Replaces the whole session collection.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_workout_sessions(&mut self, sessions: &[WorkoutSession]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::WorkoutSessions, sessions)
            .context("Failed to save workout sessions")
    }

    /// Empties the session history. Idempotent.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn clear_workout_sessions(&self) -> Result<()> {
        store::clear_collection(&self.conn, Collection::WorkoutSessions)
            .context("Failed to clear workout sessions")
    }

    /// Builds a pager over the current session history, newest first.
    pub fn session_history(&self) -> SessionHistory {
        let mut pager = SessionHistory::new();
        pager.refresh(self.load_workout_sessions());
        pager
    }

    // --- Weight log ---

    /// Loads the weight history in insertion order; storage failure logs and
    /// yields an empty list.
    pub fn load_weight_history(&self) -> Vec<WeightEntry> {
        load_or_empty::<WeightEntry>(&self.conn, Collection::WeightHistory)
    }

    /// Appends a weight entry.
    /// # Errors
    /// Returns `anyhow::Error` if the weight is not positive or the store fails.
    pub fn add_weight_entry(&self, weight: f64, date: DateTime<Utc>) -> Result<WeightEntry> {
        if weight <= 0.0 {
            bail!("Weight must be a positive number.");
        }
        let entry = WeightEntry {
            id: generate_record_id(),
            date,
            weight,
        };
        store::append_record(&self.conn, Collection::WeightHistory, &entry)
            .context("Failed to add weight entry")?;
        Ok(entry)
    }

    /// Replaces the whole weight history.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_weight_history(&mut self, history: &[WeightEntry]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::WeightHistory, history)
            .context("Failed to save weight history")
    }

    /// The current weight is the temporally last entry of insertion order,
    /// not the max of date comparisons.
    pub fn current_weight(&self) -> Option<f64> {
        self.load_weight_history().last().map(|e| e.weight)
    }

    /// Change from the previous entry to the current one. `None` with fewer
    /// than two entries.
    pub fn weight_change(&self) -> Option<f64> {
        weight_change(&self.load_weight_history())
    }

    // --- Measurements ---

    /// Loads the current-measurement scratchpad; storage failure logs and
    /// yields an empty list.
    pub fn load_current_measurements(&self) -> Vec<CurrentMeasurement> {
        load_or_empty::<CurrentMeasurement>(&self.conn, Collection::CurrentMeasurements)
    }

    /// Upserts the scratchpad value for one body part.
    /// # Errors
    /// Returns `anyhow::Error` if the part is empty or the store fails.
    pub fn set_current_measurement(&self, part: &str, measure: &str) -> Result<()> {
        let part = part.trim();
        if part.is_empty() {
            bail!("Body part cannot be empty.");
        }
        let measurement = CurrentMeasurement {
            part: part.to_string(),
            measure: measure.trim().to_string(),
        };
        store::put_record(&self.conn, Collection::CurrentMeasurements, &measurement)
            .with_context(|| format!("Failed to save measurement for '{part}'"))
    }

    /// Replaces the whole scratchpad.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_current_measurements(&mut self, measurements: &[CurrentMeasurement]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::CurrentMeasurements, measurements)
            .context("Failed to save current measurements")
    }

    /// Loads the measurement snapshot history; storage failure logs and
    /// yields an empty list.
    pub fn load_measurements_history(&self) -> Vec<MeasurementEntry> {
        load_or_empty::<MeasurementEntry>(&self.conn, Collection::MeasurementsHistory)
    }

    /// Snapshots every current measurement into one history entry.
    /// # Errors
    /// Returns `anyhow::Error` if the scratchpad is empty or the store fails.
    pub fn save_measurement_snapshot(&self, date: DateTime<Utc>) -> Result<MeasurementEntry> {
        let current = self.load_current_measurements();
        if current.is_empty() {
            bail!("No measurements to save.");
        }
        let entry = MeasurementEntry {
            id: generate_record_id(),
            date,
            measurements: current
                .into_iter()
                .map(|m| Measurement {
                    part: m.part,
                    measure: m.measure,
                })
                .collect(),
        };
        store::append_record(&self.conn, Collection::MeasurementsHistory, &entry)
            .context("Failed to save measurement snapshot")?;
        Ok(entry)
    }

    /// Replaces the whole snapshot history.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn save_measurements_history(&mut self, history: &[MeasurementEntry]) -> Result<()> {
        store::save_collection(&mut self.conn, Collection::MeasurementsHistory, history)
            .context("Failed to save measurements history")
    }

    /// Empties the measurement snapshot history. Idempotent.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn clear_measurement_history(&self) -> Result<()> {
        store::clear_collection(&self.conn, Collection::MeasurementsHistory)
            .context("Failed to clear measurement history")
    }

    // --- Settings ---

    /// Resets every collection: all emptied, the exercise catalog re-seeded
    /// with the built-in defaults.
    /// # Errors
    /// Returns `anyhow::Error` wrapping store errors.
    pub fn clear_all_data(&mut self) -> Result<()> {
        store::clear_all_data(&mut self.conn).context("Failed to clear all data")
    }
}

// --- Helper Functions ---

fn load_or_empty<T: store::Record>(conn: &Connection, collection: Collection) -> Vec<T> {
    match store::load_collection::<T>(conn, collection) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error loading {collection}: {e}");
            Vec::new()
        }
    }
}

/// Parses an integer count field; input that does not parse defaults to 0.
/// Negative numbers pass through unchanged.
pub fn parse_count(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

/// Parses a weight field; input that does not parse to a finite number
/// defaults to 0. Negative numbers pass through unchanged.
pub fn parse_weight(raw: &str) -> f64 {
    let value = raw.trim().parse::<f64>().unwrap_or(0.0);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Change from the previous weight entry to the last one, in insertion
/// order. `None` with fewer than two entries.
pub fn weight_change(history: &[WeightEntry]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let current = history[history.len() - 1].weight;
    let previous = history[history.len() - 2].weight;
    Some(current - previous)
}

/// Formats a weight change as e.g. `+2.5 kg` or `-1.0 kg`.
pub fn format_weight_change(change: f64, units: Units) -> String {
    let sign = if change > 0.0 { "+" } else { "" };
    format!("{sign}{change:.1} {}", units.weight_abbr())
}
