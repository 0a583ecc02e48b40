//src/store.rs
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// One logical collection per legacy storage key. Earlier data dumps kept each
// collection as a single JSON array under one key; here every record is its
// own row so single-record mutation does not rewrite the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Exercises,
    WorkoutTemplates,
    WorkoutSessions,
    WeightHistory,
    MeasurementsHistory,
    CurrentMeasurements,
}

impl Collection {
    pub const ALL: [Self; 6] = [
        Self::Exercises,
        Self::WorkoutTemplates,
        Self::WorkoutSessions,
        Self::WeightHistory,
        Self::MeasurementsHistory,
        Self::CurrentMeasurements,
    ];

    /// Storage key, unchanged from the legacy JSON-per-key layout.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Exercises => "exercises_list",
            Self::WorkoutTemplates => "workout_templates",
            Self::WorkoutSessions => "workout_sessions",
            Self::WeightHistory => "weight_history",
            Self::MeasurementsHistory => "measurements_history",
            Self::CurrentMeasurements => "current_measurements",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// --- Domain records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
}

/// One exercise instance inside a template or session, with its target or
/// realized numbers. A denormalized name copy, not a reference into the
/// exercise catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub exercise: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Workout>,
}

/// A completed, timestamped workout. Created once at session end; only
/// mutable via a full-collection overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    /// Elapsed session time in milliseconds.
    pub duration: i64,
    pub exercises: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub part: String,
    pub measure: String,
}

/// Snapshot of every current measurement at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub measurements: Vec<Measurement>,
}

/// Mutable "latest value" scratchpad for one body part, distinct from the
/// historical snapshots. Keyed by part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMeasurement {
    pub part: String,
    pub measure: String,
}

/// Anything the record store can hold: serializable with a stable string id.
pub trait Record: Serialize + DeserializeOwned {
    fn record_id(&self) -> &str;
}

impl Record for Exercise {
    fn record_id(&self) -> &str {
        &self.id
    }
}
impl Record for WorkoutTemplate {
    fn record_id(&self) -> &str {
        &self.id
    }
}
impl Record for WorkoutSession {
    fn record_id(&self) -> &str {
        &self.id
    }
}
impl Record for WeightEntry {
    fn record_id(&self) -> &str {
        &self.id
    }
}
impl Record for MeasurementEntry {
    fn record_id(&self) -> &str {
        &self.id
    }
}
impl Record for CurrentMeasurement {
    // The scratchpad has no synthetic id; the body part is the identity.
    fn record_id(&self) -> &str {
        &self.part
    }
}

/// Client-generated record id: epoch milliseconds plus a random hex suffix.
pub fn generate_record_id() -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{millis}-{:08x}", rand::random::<u32>())
}

// Custom Error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize record for collection '{0}'")]
    Serialize(Collection, #[source] serde_json::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
    #[error("Record '{id}' not found in collection '{collection}'")]
    RecordNotFound { collection: Collection, id: String },
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),
    #[error("Exercise name must be unique (case-insensitive): '{0}' already exists.")]
    ExerciseNameNotUnique(String),
}

const DB_FILE_NAME: &str = "journal.sqlite";
const APP_DATA_DIR: &str = "gym-journal";
const DB_ENV_VAR: &str = "GYM_JOURNAL_DB_DIR";
const CATALOG_SEEDED_KEY: &str = "catalog_seeded";

/// Gets the path to the SQLite database file within the app's data directory.
pub fn get_db_path() -> Result<PathBuf, StoreError> {
    let app_dir = if let Ok(dir_override) = std::env::var(DB_ENV_VAR) {
        PathBuf::from(dir_override)
    } else {
        let data_dir = dirs::data_dir().ok_or(StoreError::DataDir)?;
        data_dir.join(APP_DATA_DIR)
    };
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(StoreError::Connection)?;
    Ok(conn)
}

/// Initializes the schema if needed and seeds the built-in exercise catalog
/// on the very first run. The seed marker in `meta` keeps a deliberately
/// emptied catalog empty across restarts.
pub fn init_db(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            seq INTEGER NOT NULL, -- insertion order within the collection
            payload TEXT NOT NULL, -- JSON, same shape as the legacy array elements
            PRIMARY KEY (collection, id)
        )",
        [],
    )
    .map_err(StoreError::Connection)?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_collection_seq ON records(collection, seq)",
        [],
    )
    .map_err(StoreError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(StoreError::Connection)?;

    let seeded: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![CATALOG_SEEDED_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::QueryFailed)?;
    if seeded.is_none() {
        seed_default_catalog(conn)?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, '1')",
            params![CATALOG_SEEDED_KEY],
        )
        .map_err(StoreError::InsertFailed)?;
    }

    Ok(())
}

fn seed_default_catalog(conn: &Connection) -> Result<(), StoreError> {
    for (seq, exercise) in default_exercise_catalog().iter().enumerate() {
        let payload = serde_json::to_string(exercise)
            .map_err(|e| StoreError::Serialize(Collection::Exercises, e))?;
        conn.execute(
            "INSERT OR REPLACE INTO records (collection, id, seq, payload) VALUES (?1, ?2, ?3, ?4)",
            params![Collection::Exercises.key(), exercise.id, seq as i64, payload],
        )
        .map_err(StoreError::InsertFailed)?;
    }
    Ok(())
}

/// Loads every record of a collection in insertion order.
///
/// A row whose payload no longer deserializes is skipped with a warning
/// instead of failing the whole collection.
pub fn load_collection<T: Record>(
    conn: &Connection,
    collection: Collection,
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT id, payload FROM records WHERE collection = ?1 ORDER BY seq ASC")
        .map_err(StoreError::QueryFailed)?;
    let rows = stmt
        .query_map(params![collection.key()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(StoreError::QueryFailed)?;

    let mut items = Vec::new();
    for row in rows {
        let (id, payload) = row.map_err(StoreError::QueryFailed)?;
        match serde_json::from_str::<T>(&payload) {
            Ok(item) => items.push(item),
            Err(e) => {
                eprintln!("Warning: Skipping malformed record '{id}' in '{collection}': {e}");
            }
        }
    }
    Ok(items)
}

/// Replaces the full contents of a collection, preserving the order of
/// `items`. This is the "whole list in" half of the legacy contract.
pub fn save_collection<T: Record>(
    conn: &mut Connection,
    collection: Collection,
    items: &[T],
) -> Result<(), StoreError> {
    let tx = conn.transaction().map_err(StoreError::Connection)?;
    tx.execute(
        "DELETE FROM records WHERE collection = ?1",
        params![collection.key()],
    )
    .map_err(StoreError::DeleteFailed)?;
    for (seq, item) in items.iter().enumerate() {
        let payload =
            serde_json::to_string(item).map_err(|e| StoreError::Serialize(collection, e))?;
        tx.execute(
            "INSERT OR REPLACE INTO records (collection, id, seq, payload)
             VALUES (:collection, :id, :seq, :payload)",
            named_params! {
                ":collection": collection.key(),
                ":id": item.record_id(),
                ":seq": seq as i64,
                ":payload": payload,
            },
        )
        .map_err(StoreError::InsertFailed)?;
    }
    tx.commit().map_err(StoreError::Connection)?;
    Ok(())
}

/// Appends one record at the end of a collection's insertion order.
/// Backs the legacy "append one entry, then save whole list" helpers.
pub fn append_record<T: Record>(
    conn: &Connection,
    collection: Collection,
    item: &T,
) -> Result<(), StoreError> {
    let payload = serde_json::to_string(item).map_err(|e| StoreError::Serialize(collection, e))?;
    conn.execute(
        "INSERT OR REPLACE INTO records (collection, id, seq, payload)
         VALUES (:collection, :id,
                 (SELECT COALESCE(MAX(seq), -1) + 1 FROM records WHERE collection = :collection),
                 :payload)",
        named_params! {
            ":collection": collection.key(),
            ":id": item.record_id(),
            ":payload": payload,
        },
    )
    .map_err(StoreError::InsertFailed)?;
    Ok(())
}

/// Inserts or updates a single record. An existing record keeps its place
/// in insertion order; a new one is appended.
pub fn put_record<T: Record>(
    conn: &Connection,
    collection: Collection,
    item: &T,
) -> Result<(), StoreError> {
    let payload = serde_json::to_string(item).map_err(|e| StoreError::Serialize(collection, e))?;
    conn.execute(
        "INSERT INTO records (collection, id, seq, payload)
         VALUES (:collection, :id,
                 (SELECT COALESCE(MAX(seq), -1) + 1 FROM records WHERE collection = :collection),
                 :payload)
         ON CONFLICT(collection, id) DO UPDATE SET payload = excluded.payload",
        named_params! {
            ":collection": collection.key(),
            ":id": item.record_id(),
            ":payload": payload,
        },
    )
    .map_err(StoreError::InsertFailed)?;
    Ok(())
}

/// Fetches a single record by id.
pub fn get_record<T: Record>(
    conn: &Connection,
    collection: Collection,
    id: &str,
) -> Result<Option<T>, StoreError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM records WHERE collection = ?1 AND id = ?2",
            params![collection.key(), id],
            |row| row.get(0),
        )
        .optional()
        .map_err(StoreError::QueryFailed)?;
    match payload {
        Some(payload) => match serde_json::from_str::<T>(&payload) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                eprintln!("Warning: Skipping malformed record '{id}' in '{collection}': {e}");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Deletes a record by id. Errors if the id is absent.
pub fn delete_record(
    conn: &Connection,
    collection: Collection,
    id: &str,
) -> Result<u64, StoreError> {
    let rows_affected = conn
        .execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![collection.key(), id],
        )
        .map_err(StoreError::DeleteFailed)?;
    if rows_affected == 0 {
        Err(StoreError::RecordNotFound {
            collection,
            id: id.to_string(),
        })
    } else {
        Ok(rows_affected as u64)
    }
}

/// Empties a collection. Idempotent.
pub fn clear_collection(conn: &Connection, collection: Collection) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM records WHERE collection = ?1",
        params![collection.key()],
    )
    .map_err(StoreError::DeleteFailed)?;
    Ok(())
}

/// Resets every collection to its initial state: all empty except the
/// exercise catalog, which is re-seeded with the built-in defaults.
pub fn clear_all_data(conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn.transaction().map_err(StoreError::Connection)?;
    tx.execute("DELETE FROM records", [])
        .map_err(StoreError::DeleteFailed)?;
    seed_default_catalog(&tx)?;
    tx.commit().map_err(StoreError::Connection)?;
    Ok(())
}

/// Counts the records in a collection.
pub fn record_count(conn: &Connection, collection: Collection) -> Result<u64, StoreError> {
    conn.query_row(
        "SELECT COUNT(*) FROM records WHERE collection = ?1",
        params![collection.key()],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(StoreError::QueryFailed)
}

// --- Built-in exercise catalog ---

const DEFAULT_EXERCISE_NAMES: [&str; 50] = [
    // Chest
    "Bench Press",
    "Incline Bench Press",
    "Decline Bench Press",
    "Dumbbell Press",
    "Incline Dumbbell Press",
    "Dumbbell Flyes",
    "Push-ups",
    "Chest Dips",
    // Back
    "Pull-ups",
    "Chin-ups",
    "Lat Pulldown",
    "Seated Cable Row",
    "Barbell Row",
    "Dumbbell Row",
    "T-Bar Row",
    "Deadlift",
    // Shoulders
    "Overhead Press",
    "Dumbbell Shoulder Press",
    "Lateral Raises",
    "Front Raises",
    "Rear Delt Flyes",
    "Arnold Press",
    "Upright Row",
    "Shrugs",
    // Arms
    "Bicep Curls",
    "Hammer Curls",
    "Preacher Curls",
    "Tricep Dips",
    "Tricep Pushdown",
    "Overhead Tricep Extension",
    "Close Grip Bench Press",
    "Cable Curls",
    // Legs
    "Squats",
    "Front Squats",
    "Leg Press",
    "Lunges",
    "Romanian Deadlift",
    "Leg Curls",
    "Leg Extensions",
    "Calf Raises",
    "Bulgarian Split Squats",
    "Hip Thrusts",
    // Core
    "Plank",
    "Crunches",
    "Russian Twists",
    "Mountain Climbers",
    "Bicycle Crunches",
    "Dead Bug",
    "Hanging Leg Raises",
    "Ab Wheel Rollout",
];

/// The catalog a fresh install starts with, ids "1".."50".
pub fn default_exercise_catalog() -> Vec<Exercise> {
    DEFAULT_EXERCISE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Exercise {
            id: (i + 1).to_string(),
            name: (*name).to_string(),
        })
        .collect()
}
