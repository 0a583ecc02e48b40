use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use gym_journal_lib::{
    format_elapsed, format_weight_change, store, weight_change, ActiveSession, AppService,
    Collection, Config, CurrentMeasurement, Exercise, SessionHistory, SessionState, TemplateDraft,
    ThemePreference, Units, WeightEntry, Workout, WorkoutSession, WorkoutTemplate,
    HISTORY_PAGE_SIZE,
};

// Helper function to create a test service with an in-memory database
fn create_test_service() -> Result<AppService> {
    let conn = Connection::open_in_memory()?;
    store::init_db(&conn)?;

    Ok(AppService {
        config: Config::default(),
        conn,
        db_path: ":memory:".into(),
        config_path: "test_config.toml".into(),
    })
}

fn make_workout(exercise: &str, sets: i64, reps: i64, weight: f64) -> Workout {
    Workout {
        id: store::generate_record_id(),
        exercise: exercise.to_string(),
        sets,
        reps,
        weight,
    }
}

fn make_template(name: &str) -> WorkoutTemplate {
    WorkoutTemplate {
        id: store::generate_record_id(),
        name: name.to_string(),
        exercises: vec![
            make_workout("Bench Press", 3, 10, 60.0),
            make_workout("Squats", 5, 5, 100.0),
        ],
    }
}

fn make_session(name: &str, days_ago: i64) -> WorkoutSession {
    let date = Utc::now() - Duration::days(days_ago);
    WorkoutSession {
        id: format!("tpl-{}", date.timestamp_millis()),
        name: name.to_string(),
        date,
        duration: 30 * 60 * 1000,
        exercises: vec![make_workout("Deadlift", 3, 5, 120.0)],
    }
}

// --- Persistence round trips ---

#[test]
fn test_template_round_trip() -> Result<()> {
    let mut service = create_test_service()?;
    let templates = vec![make_template("Push Day"), make_template("Pull Day")];
    service.save_workout_templates(&templates)?;

    let loaded = service.load_workout_templates();
    assert_eq!(loaded, templates);
    Ok(())
}

#[test]
fn test_session_round_trip_preserves_insertion_order() -> Result<()> {
    let mut service = create_test_service()?;
    let sessions = vec![
        make_session("Monday", 3),
        make_session("Wednesday", 2),
        make_session("Friday", 1),
    ];
    service.save_workout_sessions(&sessions)?;

    let loaded = service.load_workout_sessions();
    assert_eq!(loaded, sessions);
    Ok(())
}

#[test]
fn test_weight_and_measurement_round_trips() -> Result<()> {
    let mut service = create_test_service()?;

    let weights = vec![
        WeightEntry {
            id: store::generate_record_id(),
            date: Utc::now(),
            weight: 80.0,
        },
        WeightEntry {
            id: store::generate_record_id(),
            date: Utc::now(),
            weight: 82.5,
        },
    ];
    service.save_weight_history(&weights)?;
    assert_eq!(service.load_weight_history(), weights);

    let current = vec![
        CurrentMeasurement {
            part: "Waist".to_string(),
            measure: "84 cm".to_string(),
        },
        CurrentMeasurement {
            part: "Chest".to_string(),
            measure: "102 cm".to_string(),
        },
    ];
    service.save_current_measurements(&current)?;
    assert_eq!(service.load_current_measurements(), current);
    Ok(())
}

#[test]
fn test_load_unset_collections() -> Result<()> {
    let service = create_test_service()?;

    assert!(service.load_workout_templates().is_empty());
    assert!(service.load_workout_sessions().is_empty());
    assert!(service.load_weight_history().is_empty());
    assert!(service.load_measurements_history().is_empty());
    assert!(service.load_current_measurements().is_empty());

    // The exercise catalog is seeded with the built-in defaults at init
    let exercises = service.load_exercises();
    assert_eq!(exercises.len(), 50);
    assert_eq!(exercises[0].id, "1");
    assert_eq!(exercises[0].name, "Bench Press");
    Ok(())
}

#[test]
fn test_delete_template_by_id() -> Result<()> {
    let mut service = create_test_service()?;
    let templates = vec![
        make_template("A"),
        make_template("B"),
        make_template("C"),
    ];
    service.save_workout_templates(&templates)?;

    service.delete_template(&templates[1].id)?;
    let remaining = service.load_workout_templates();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|t| t.id != templates[1].id));

    // Deleting again reports not found
    let result = service.delete_template(&templates[1].id);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Template not found"));
    Ok(())
}

#[test]
fn test_get_template_not_found() -> Result<()> {
    let service = create_test_service()?;
    let result = service.get_template("nope");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Template not found"));
    Ok(())
}

#[test]
fn test_malformed_record_is_skipped_on_load() -> Result<()> {
    let mut service = create_test_service()?;
    let sessions = vec![make_session("Good", 1)];
    service.save_workout_sessions(&sessions)?;

    // Corrupt a second row directly; its exercises field is not an array
    service.conn.execute(
        "INSERT INTO records (collection, id, seq, payload) VALUES (?1, 'bad', 99, ?2)",
        rusqlite::params![
            Collection::WorkoutSessions.key(),
            r#"{"id":"bad","name":"x","date":"2024-01-01T00:00:00Z","duration":0,"exercises":"oops"}"#
        ],
    )?;

    let loaded = service.load_workout_sessions();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "Good");
    Ok(())
}

// --- Exercise catalog ---

#[test]
fn test_add_exercise_unique_name_case_insensitive() -> Result<()> {
    let mut service = create_test_service()?;

    // "Bench Press" is already in the default catalog
    let result = service.add_exercise("bench press");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Exercise name must be unique"));

    let added = service.add_exercise("Pallof Press")?;
    let exercises = service.load_exercises();
    assert_eq!(exercises.len(), 51);
    assert!(exercises.iter().any(|e| e.id == added.id));
    Ok(())
}

#[test]
fn test_rename_and_delete_exercise() -> Result<()> {
    let mut service = create_test_service()?;

    service.rename_exercise("1", "Paused Bench Press")?;
    let exercises = service.load_exercises();
    assert_eq!(
        exercises.iter().find(|e| e.id == "1").unwrap().name,
        "Paused Bench Press"
    );

    // Renaming onto an existing name is rejected, case-insensitively
    let result = service.rename_exercise("2", "paused bench press");
    assert!(result.is_err());

    service.delete_exercise("1")?;
    let exercises = service.load_exercises();
    assert_eq!(exercises.len(), 49);
    assert!(exercises.iter().all(|e| e.id != "1"));

    let result = service.delete_exercise("1");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Exercise not found"));
    Ok(())
}

// --- Template draft ---

#[test]
fn test_template_draft_defaults_and_validation() {
    let mut draft = TemplateDraft::new();

    // Empty name and empty exercise list both block the save
    assert!(draft.build().is_err());
    draft.name = "Leg Day".to_string();
    let err = draft.build().unwrap_err();
    assert!(err.to_string().contains("at least one exercise"));

    let workout_id = draft.add_exercise("Squats").id.clone();
    let built = draft.build().unwrap();
    assert_eq!(built.exercises.len(), 1);
    assert_eq!(built.exercises[0].sets, 3);
    assert_eq!(built.exercises[0].reps, 10);
    assert_eq!(built.exercises[0].weight, 0.0);

    // Unparseable input defaults to 0; negative numbers pass through
    draft.set_reps(&workout_id, "abc").unwrap();
    draft.set_weight(&workout_id, "-5").unwrap();
    draft.set_sets(&workout_id, "4").unwrap();
    let built = draft.build().unwrap();
    assert_eq!(built.exercises[0].reps, 0);
    assert_eq!(built.exercises[0].weight, -5.0);
    assert_eq!(built.exercises[0].sets, 4);

    draft.remove_exercise(&workout_id).unwrap();
    assert!(draft.build().is_err());
}

#[test]
fn test_template_draft_whitespace_name_rejected() {
    let mut draft = TemplateDraft::new();
    draft.name = "   ".to_string();
    draft.add_exercise("Plank");
    let err = draft.build().unwrap_err();
    assert!(err.to_string().contains("workout name"));
}

// --- History pagination ---

#[test]
fn test_history_pagination() -> Result<()> {
    let mut service = create_test_service()?;
    let sessions: Vec<WorkoutSession> = (0..25).map(|i| make_session(&format!("S{i}"), i)).collect();
    service.save_workout_sessions(&sessions)?;

    let mut pager = service.session_history();
    assert_eq!(pager.total(), 25);
    assert_eq!(pager.displayed().len(), HISTORY_PAGE_SIZE);
    assert!(pager.has_more());
    assert_eq!(pager.current_page(), 1);

    // First page holds the 10 most recent sessions, newest first
    let newest: Vec<&str> = pager.displayed().iter().map(|s| s.name.as_str()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
    assert_eq!(newest, expected.iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(pager.load_more(), 10);
    assert_eq!(pager.load_more(), 5);
    assert_eq!(pager.displayed().len(), 25);
    assert!(!pager.has_more());

    // A third call is a no-op
    assert_eq!(pager.load_more(), 0);
    assert_eq!(pager.displayed().len(), 25);
    Ok(())
}

#[test]
fn test_history_refresh_resets_to_first_page() {
    let mut pager = SessionHistory::new();
    pager.refresh((0..15).map(|i| make_session(&format!("S{i}"), i)).collect());
    pager.load_more();
    assert_eq!(pager.displayed().len(), 15);

    pager.refresh((0..12).map(|i| make_session(&format!("R{i}"), i)).collect());
    assert_eq!(pager.current_page(), 1);
    assert_eq!(pager.displayed().len(), 10);
    assert!(pager.has_more());
}

#[test]
fn test_history_smaller_than_one_page() {
    let mut pager = SessionHistory::new();
    pager.refresh(vec![make_session("Only", 0)]);
    assert_eq!(pager.displayed().len(), 1);
    assert!(!pager.has_more());
    assert_eq!(pager.load_more(), 0);
}

// --- Active session ---

#[test]
fn test_session_lifecycle() -> Result<()> {
    let service = create_test_service()?;
    let template = make_template("Push Day");

    let mut session = ActiveSession::from_template(&template);
    assert_eq!(session.state(), SessionState::Idle);

    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap();
    session.start(t0).unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(session.elapsed_ms(), 0);

    // Simulate 65 seconds of ticks
    for s in 1..=65 {
        session.tick(t0 + Duration::seconds(s)).unwrap();
    }
    assert_eq!(format_elapsed(session.elapsed_ms()), "00:01:05");

    // Edit realized numbers while running
    let workout_id = template.exercises[0].id.clone();
    session.set_reps(&workout_id, "8").unwrap();
    session.set_weight(&workout_id, "62.5").unwrap();

    let finished = session.finish(t0 + Duration::seconds(65)).unwrap();
    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(finished.duration, 65_000);
    assert_eq!(finished.name, "Push Day");
    assert!(finished.id.starts_with(&template.id));
    let edited = finished
        .exercises
        .iter()
        .find(|w| w.id == workout_id)
        .unwrap();
    assert_eq!(edited.reps, 8);
    assert_eq!(edited.weight, 62.5);

    // Ending produces exactly one new stored session
    service.save_workout_session(&finished)?;
    assert_eq!(service.load_workout_sessions().len(), 1);
    Ok(())
}

#[test]
fn test_session_rejects_out_of_state_transitions() {
    let template = make_template("Pull Day");
    let mut session = ActiveSession::from_template(&template);
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap();

    // Not editable and not finishable while idle
    assert!(session.tick(t0).is_err());
    assert!(session
        .set_sets(&template.exercises[0].id, "4")
        .is_err());
    assert!(session.finish(t0).is_err());

    session.start(t0).unwrap();
    assert!(session.start(t0).is_err());
    assert!(session.set_sets("no-such-id", "4").is_err());

    session.finish(t0 + Duration::seconds(10)).unwrap();
    // No resume and no edits after the end
    assert!(session.start(t0).is_err());
    assert!(session.tick(t0).is_err());
    assert!(session
        .set_reps(&template.exercises[0].id, "12")
        .is_err());
}

#[test]
fn test_format_elapsed() {
    assert_eq!(format_elapsed(0), "00:00:00");
    assert_eq!(format_elapsed(999), "00:00:00");
    assert_eq!(format_elapsed(65_000), "00:01:05");
    assert_eq!(format_elapsed(3_600_000), "01:00:00");
    assert_eq!(format_elapsed(7_325_000), "02:02:05");
    assert_eq!(format_elapsed(-500), "00:00:00");
}

// --- Weight log ---

#[test]
fn test_weight_change_indicator() -> Result<()> {
    let service = create_test_service()?;

    assert!(service.current_weight().is_none());
    assert!(service.weight_change().is_none());

    service.add_weight_entry(80.0, Utc::now())?;
    // A single entry has no change
    assert_eq!(service.current_weight(), Some(80.0));
    assert!(service.weight_change().is_none());

    service.add_weight_entry(82.5, Utc::now())?;
    assert_eq!(service.current_weight(), Some(82.5));
    let change = service.weight_change().unwrap();
    assert!((change - 2.5).abs() < f64::EPSILON);
    assert_eq!(format_weight_change(change, Units::Metric), "+2.5 kg");

    service.add_weight_entry(81.5, Utc::now())?;
    let change = service.weight_change().unwrap();
    assert_eq!(format_weight_change(change, Units::Metric), "-1.0 kg");
    Ok(())
}

#[test]
fn test_add_weight_entry_rejects_non_positive() -> Result<()> {
    let service = create_test_service()?;
    assert!(service.add_weight_entry(0.0, Utc::now()).is_err());
    assert!(service.add_weight_entry(-3.0, Utc::now()).is_err());
    assert!(service.load_weight_history().is_empty());
    Ok(())
}

#[test]
fn test_weight_change_helper() {
    let entries: Vec<WeightEntry> = [80.0, 82.5]
        .iter()
        .map(|w| WeightEntry {
            id: store::generate_record_id(),
            date: Utc::now(),
            weight: *w,
        })
        .collect();
    assert_eq!(weight_change(&entries), Some(2.5));
    assert_eq!(weight_change(&entries[..1]), None);
    assert_eq!(weight_change(&[]), None);
}

// --- Measurements ---

#[test]
fn test_measurement_scratchpad_and_snapshot() -> Result<()> {
    let service = create_test_service()?;

    // Snapshotting an empty scratchpad is rejected
    assert!(service.save_measurement_snapshot(Utc::now()).is_err());

    service.set_current_measurement("Waist", "84 cm")?;
    service.set_current_measurement("Chest", "102 cm")?;
    // Upsert replaces the value for an existing part
    service.set_current_measurement("Waist", "83 cm")?;

    let current = service.load_current_measurements();
    assert_eq!(current.len(), 2);
    assert_eq!(
        current.iter().find(|m| m.part == "Waist").unwrap().measure,
        "83 cm"
    );

    let entry = service.save_measurement_snapshot(Utc::now())?;
    assert_eq!(entry.measurements.len(), 2);

    let history = service.load_measurements_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].measurements.len(), 2);

    // The scratchpad is unchanged by a snapshot
    assert_eq!(service.load_current_measurements().len(), 2);
    Ok(())
}

// --- Clearing ---

#[test]
fn test_clear_history_is_idempotent() -> Result<()> {
    let mut service = create_test_service()?;
    service.save_workout_sessions(&[make_session("S", 0)])?;

    service.clear_workout_sessions()?;
    assert!(service.load_workout_sessions().is_empty());
    service.clear_workout_sessions()?;
    assert!(service.load_workout_sessions().is_empty());

    service.clear_measurement_history()?;
    service.clear_measurement_history()?;
    assert!(service.load_measurements_history().is_empty());
    Ok(())
}

#[test]
fn test_clear_all_data_restores_default_catalog() -> Result<()> {
    let mut service = create_test_service()?;

    service.add_exercise("Pallof Press")?;
    service.save_workout_templates(&[make_template("T")])?;
    service.save_workout_sessions(&[make_session("S", 0)])?;
    service.add_weight_entry(80.0, Utc::now())?;
    service.set_current_measurement("Waist", "84 cm")?;
    service.save_measurement_snapshot(Utc::now())?;

    service.clear_all_data()?;

    assert!(service.load_workout_templates().is_empty());
    assert!(service.load_workout_sessions().is_empty());
    assert!(service.load_weight_history().is_empty());
    assert!(service.load_measurements_history().is_empty());
    assert!(service.load_current_measurements().is_empty());

    let exercises = service.load_exercises();
    assert_eq!(exercises.len(), 50);
    assert!(exercises.iter().all(|e| e.name != "Pallof Press"));
    Ok(())
}

// --- Store primitives ---

#[test]
fn test_put_record_preserves_insertion_order() -> Result<()> {
    let mut service = create_test_service()?;
    let mut templates = vec![make_template("First"), make_template("Second")];
    service.save_workout_templates(&templates)?;

    // Updating the first record must not move it to the end
    templates[0].name = "First (edited)".to_string();
    service.save_template(&templates[0])?;

    let loaded = service.load_workout_templates();
    assert_eq!(loaded[0].name, "First (edited)");
    assert_eq!(loaded[1].name, "Second");
    Ok(())
}

#[test]
fn test_generated_ids_are_unique() {
    let a = store::generate_record_id();
    let b = store::generate_record_id();
    assert_ne!(a, b);
    // Epoch millis followed by a random suffix
    assert!(a.contains('-'));
}

// --- Config ---

#[test]
fn test_config_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("config.toml");

    // First load writes defaults back
    let config = gym_journal_lib::load_config_util(&config_path)?;
    assert_eq!(config.theme_preference, ThemePreference::System);
    assert!(config_path.exists());

    let mut config = config;
    config.theme_preference = ThemePreference::Dark;
    config.units = Units::Imperial;
    gym_journal_lib::save_config_util(&config_path, &config)?;

    let reloaded = gym_journal_lib::load_config_util(&config_path)?;
    assert_eq!(reloaded.theme_preference, ThemePreference::Dark);
    assert_eq!(reloaded.units, Units::Imperial);
    Ok(())
}

#[test]
fn test_theme_preference_parsing() {
    assert_eq!(
        "dark".parse::<ThemePreference>().unwrap(),
        ThemePreference::Dark
    );
    assert_eq!(
        " Light ".parse::<ThemePreference>().unwrap(),
        ThemePreference::Light
    );
    assert!("blue".parse::<ThemePreference>().is_err());
}

// --- Catalog seeding ---

#[test]
fn test_catalog_seeded_once_at_init() -> Result<()> {
    let mut service = create_test_service()?;
    // The defaults are persisted rows from the start
    assert_eq!(store::record_count(&service.conn, Collection::Exercises)?, 50);

    service.add_exercise("Pallof Press")?;
    assert_eq!(store::record_count(&service.conn, Collection::Exercises)?, 51);

    // Re-running initialization must not re-seed on top of user edits
    store::init_db(&service.conn)?;
    let loaded: Vec<Exercise> = store::load_collection(&service.conn, Collection::Exercises)?;
    assert_eq!(loaded.len(), 51);
    Ok(())
}

#[test]
fn test_emptied_catalog_stays_empty() -> Result<()> {
    let mut service = create_test_service()?;
    let only = Exercise {
        id: store::generate_record_id(),
        name: "Pallof Press".to_string(),
    };
    service.save_exercises(&[only.clone()])?;
    assert_eq!(service.load_exercises().len(), 1);

    // Deleting the last catalog entry must not resurrect the defaults
    service.delete_exercise(&only.id)?;
    assert!(service.load_exercises().is_empty());

    // Not even across a restart
    store::init_db(&service.conn)?;
    assert!(service.load_exercises().is_empty());
    Ok(())
}

#[test]
fn test_delete_exercise_persists_across_reload() -> Result<()> {
    let mut service = create_test_service()?;
    service.delete_exercise("1")?;
    assert_eq!(service.load_exercises().len(), 49);
    assert_eq!(store::record_count(&service.conn, Collection::Exercises)?, 49);
    Ok(())
}

// --- Numeric field parsing ---

#[test]
fn test_numeric_field_parsing() {
    use gym_journal_lib::{parse_count, parse_weight};

    assert_eq!(parse_count("4"), 4);
    assert_eq!(parse_count(" 12 "), 12);
    assert_eq!(parse_count("-2"), -2);
    assert_eq!(parse_count("abc"), 0);
    assert_eq!(parse_count(""), 0);

    assert_eq!(parse_weight("62.5"), 62.5);
    assert_eq!(parse_weight("-5"), -5.0);
    assert_eq!(parse_weight("oops"), 0.0);
    assert_eq!(parse_weight("NaN"), 0.0);
}
