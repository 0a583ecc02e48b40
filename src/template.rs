//src/template.rs
use thiserror::Error;

use crate::store::{generate_record_id, Workout, WorkoutTemplate};
use crate::{parse_count, parse_weight};

const DEFAULT_SETS: i64 = 3;
const DEFAULT_REPS: i64 = 10;
const DEFAULT_WEIGHT: f64 = 0.0;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Please enter a workout name.")]
    EmptyName,
    #[error("Please add at least one exercise.")]
    NoExercises,
    #[error("No exercise with id '{0}' in this draft.")]
    UnknownExercise(String),
}

/// An in-progress workout template, distinct from the persisted exercise
/// catalog. Nothing is saved until `build` validates the whole draft.
#[derive(Debug, Clone, Default)]
pub struct TemplateDraft {
    pub name: String,
    exercises: Vec<Workout>,
}

impl TemplateDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the draft from an existing template for editing.
    pub fn from_template(template: &WorkoutTemplate) -> Self {
        Self {
            name: template.name.clone(),
            exercises: template.exercises.clone(),
        }
    }

    pub fn exercises(&self) -> &[Workout] {
        &self.exercises
    }

    /// Adds a catalog exercise to the draft with a fresh id and the default
    /// 3 sets x 10 reps at 0 weight.
    pub fn add_exercise(&mut self, exercise_name: &str) -> &Workout {
        self.exercises.push(Workout {
            id: generate_record_id(),
            exercise: exercise_name.to_string(),
            sets: DEFAULT_SETS,
            reps: DEFAULT_REPS,
            weight: DEFAULT_WEIGHT,
        });
        self.exercises.last().expect("just pushed")
    }

    pub fn set_sets(&mut self, workout_id: &str, raw: &str) -> Result<(), DraftError> {
        let value = parse_count(raw);
        self.edit_exercise(workout_id, |w| w.sets = value)
    }

    pub fn set_reps(&mut self, workout_id: &str, raw: &str) -> Result<(), DraftError> {
        let value = parse_count(raw);
        self.edit_exercise(workout_id, |w| w.reps = value)
    }

    pub fn set_weight(&mut self, workout_id: &str, raw: &str) -> Result<(), DraftError> {
        let value = parse_weight(raw);
        self.edit_exercise(workout_id, |w| w.weight = value)
    }

    pub fn remove_exercise(&mut self, workout_id: &str) -> Result<(), DraftError> {
        let before = self.exercises.len();
        self.exercises.retain(|w| w.id != workout_id);
        if self.exercises.len() == before {
            Err(DraftError::UnknownExercise(workout_id.to_string()))
        } else {
            Ok(())
        }
    }

    fn edit_exercise<F: FnOnce(&mut Workout)>(
        &mut self,
        workout_id: &str,
        apply: F,
    ) -> Result<(), DraftError> {
        let workout = self
            .exercises
            .iter_mut()
            .find(|w| w.id == workout_id)
            .ok_or_else(|| DraftError::UnknownExercise(workout_id.to_string()))?;
        apply(workout);
        Ok(())
    }

    /// Validates the draft and produces a template with a fresh id. Requires
    /// a non-empty trimmed name and at least one exercise; no partial save.
    pub fn build(&self) -> Result<WorkoutTemplate, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }
        if self.exercises.is_empty() {
            return Err(DraftError::NoExercises);
        }
        Ok(WorkoutTemplate {
            id: generate_record_id(),
            name: name.to_string(),
            exercises: self.exercises.clone(),
        })
    }
}
