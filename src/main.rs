//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};

use gym_journal_lib::{
    format_elapsed, format_weight_change, weight_change, ActiveSession, AppService,
    CurrentMeasurement, Exercise, MeasurementEntry, TemplateDraft, ThemePreference, Units,
    WeightEntry, WorkoutSession, WorkoutTemplate,
};

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command(); // Get the command structure
        let bin_name = cmd.get_name().to_string(); // Get the binary name

        eprintln!("Generating completion script for {}...", shell); // Print to stderr
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout()); // Print script to stdout
        return Ok(()); // Exit after generating script
    }

    // Initialize the application service (loads config, opens the store)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let units = service.config.units;
    let header_color = header_color(&service);

    // --- Execute Commands using AppService ---
    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            // This case is handled above, but keep it exhaustive
            unreachable!("Completion generation should have exited already");
        }

        // --- Exercise catalog commands ---
        cli::Commands::CreateExercise { name } => match service.add_exercise(&name) {
            Ok(exercise) => println!(
                "Successfully added exercise '{}' Id: {}",
                exercise.name, exercise.id
            ),
            Err(e) => bail!("Error adding exercise: {}", e),
        },
        cli::Commands::RenameExercise { id, name } => {
            match service.rename_exercise(&id, &name) {
                Ok(()) => println!("Successfully renamed exercise '{}' to '{}'.", id, name.trim()),
                Err(e) => bail!("Error renaming exercise '{}': {}", id, e),
            }
        }
        cli::Commands::DeleteExercise { id } => match service.delete_exercise(&id) {
            Ok(()) => println!(
                "Successfully removed exercise '{}'. Template and session copies keep the name.",
                id
            ),
            Err(e) => bail!("Error removing exercise '{}': {}", id, e),
        },
        cli::Commands::ListExercises => {
            let exercises = service.load_exercises();
            if export_csv {
                print_exercise_csv(exercises)?;
            } else {
                print_exercise_table(exercises, header_color);
            }
        }

        // --- Template commands ---
        cli::Commands::CreateTemplate { name, exercises } => {
            let mut draft = TemplateDraft::new();
            draft.name = name;
            for entry in &exercises {
                add_draft_entry(&mut draft, entry);
            }
            match draft.build() {
                Ok(template) => {
                    service.save_template(&template)?;
                    println!(
                        "Successfully saved template '{}' ({} exercise(s)) Id: {}",
                        template.name,
                        template.exercises.len(),
                        template.id
                    );
                }
                Err(e) => bail!("Cannot save template: {}", e),
            }
        }
        cli::Commands::ListTemplates => {
            let templates = service.load_workout_templates();
            if templates.is_empty() {
                println!("No templates saved yet.");
            } else {
                print_template_table(templates, header_color);
            }
        }
        cli::Commands::ShowTemplate { id } => match service.get_template(&id) {
            Ok(template) => {
                println!("Template '{}' (Id: {})", template.name, template.id);
                print_planned_exercise_table(&template, header_color, units);
            }
            Err(e) => bail!("Error showing template '{}': {}", id, e),
        },
        cli::Commands::DeleteTemplate { id } => match service.delete_template(&id) {
            Ok(()) => println!("Successfully deleted template '{}'.", id),
            Err(e) => bail!("Error deleting template '{}': {}", id, e),
        },

        // --- Session commands ---
        cli::Commands::LogSession {
            template,
            duration,
            sets,
        } => {
            if duration < 0 {
                bail!("Session duration cannot be negative.");
            }
            let template = match service.get_template(&template) {
                Ok(t) => t,
                Err(e) => bail!("Error starting session: {}", e),
            };
            let now = Utc::now();
            let mut session = ActiveSession::from_template(&template);
            // Backdate the start so the recorded duration matches the flag.
            session
                .start(now - Duration::seconds(duration))
                .context("Failed to start session")?;
            for edit in &sets {
                apply_session_edit(&mut session, edit)?;
            }
            let finished = session.finish(now).context("Failed to end session")?;
            service.save_workout_session(&finished)?;
            println!(
                "Workout Saved. Duration: {}",
                format_elapsed(finished.duration)
            );
        }
        cli::Commands::History { pages, all } => {
            let mut pager = service.session_history();
            if all {
                while pager.has_more() {
                    pager.load_more();
                }
            } else {
                for _ in 1..pages {
                    pager.load_more();
                }
            }
            if pager.total() == 0 {
                println!("No workout sessions recorded yet.");
            } else if export_csv {
                print_session_csv(pager.displayed(), units)?;
            } else {
                print_session_table(pager.displayed(), header_color, units);
                println!(
                    "Showing {} of {} session(s).{}",
                    pager.displayed().len(),
                    pager.total(),
                    if pager.has_more() {
                        " Use --pages or --all for more."
                    } else {
                        ""
                    }
                );
            }
        }
        cli::Commands::ClearHistory => {
            service.clear_workout_sessions()?;
            println!("All workout sessions cleared.");
        }

        // --- Weight commands ---
        cli::Commands::AddWeight { weight } => {
            match service.add_weight_entry(weight, Utc::now()) {
                Ok(entry) => {
                    print!(
                        "Logged weight {:.1} {}",
                        entry.weight,
                        units.weight_abbr()
                    );
                    match service.weight_change() {
                        Some(change) => println!(" ({})", format_weight_change(change, units)),
                        None => println!(),
                    }
                }
                Err(e) => bail!("Error logging weight: {}", e),
            }
        }
        cli::Commands::ListWeights => {
            let history = service.load_weight_history();
            if history.is_empty() {
                println!("No weight entries logged yet.");
            } else if export_csv {
                print_weight_csv(&history, units)?;
            } else {
                let current = history.last().map_or(0.0, |e| e.weight);
                print!("Current: {:.1} {}", current, units.weight_abbr());
                match weight_change(&history) {
                    Some(change) => println!(" ({})", format_weight_change(change, units)),
                    None => println!(),
                }
                print_weight_table(&history, header_color, units);
            }
        }

        // --- Measurement commands ---
        cli::Commands::SetMeasurement { part, measure } => {
            match service.set_current_measurement(&part, &measure) {
                Ok(()) => println!("Set current measurement '{}' = '{}'.", part.trim(), measure.trim()),
                Err(e) => bail!("Error setting measurement: {}", e),
            }
        }
        cli::Commands::SaveMeasurements => match service.save_measurement_snapshot(Utc::now()) {
            Ok(entry) => println!(
                "Saved measurement snapshot with {} value(s).",
                entry.measurements.len()
            ),
            Err(e) => bail!("Error saving measurements: {}", e),
        },
        cli::Commands::ListMeasurements => {
            let current = service.load_current_measurements();
            let history = service.load_measurements_history();
            if current.is_empty() && history.is_empty() {
                println!("No measurements recorded yet.");
            } else {
                if !current.is_empty() {
                    println!("Current measurements:");
                    print_current_measurement_table(&current, header_color);
                }
                if !history.is_empty() {
                    println!("History ({} snapshot(s)):", history.len());
                    print_measurement_history_table(&history, header_color);
                }
            }
        }
        cli::Commands::ClearMeasurements => {
            service.clear_measurement_history()?;
            println!("Measurement history cleared.");
        }

        // --- Settings commands ---
        cli::Commands::ClearAllData => {
            service.clear_all_data()?;
            println!("Data reset to initial empty values (exercise catalog restored to defaults).");
        }
        cli::Commands::SetTheme { preference } => {
            let preference = match preference {
                cli::ThemePreferenceCli::Light => ThemePreference::Light,
                cli::ThemePreferenceCli::Dark => ThemePreference::Dark,
                cli::ThemePreferenceCli::System => ThemePreference::System,
            };
            service.set_theme_preference(preference)?;
            println!("Theme preference set to {}.", preference);
        }
        cli::Commands::SetUnits { units } => {
            let units = match units {
                cli::UnitsCli::Metric => Units::Metric,
                cli::UnitsCli::Imperial => Units::Imperial,
            };
            service.set_units(units)?;
            println!("Units set to {:?}.", units);
        }
        cli::Commands::DbPath => {
            println!("{}", service.get_db_path().display());
        }
        cli::Commands::ConfigPath => {
            println!("{}", service.get_config_path().display());
        }
    }

    Ok(())
}

/// Parses a `NAME[:SETS[:REPS[:WEIGHT]]]` CLI entry into the draft. Missing
/// fields keep the draft defaults, invalid numbers fall back to 0.
fn add_draft_entry(draft: &mut TemplateDraft, entry: &str) {
    let mut parts = entry.splitn(4, ':');
    let name = parts.next().unwrap_or("").trim();
    let workout_id = draft.add_exercise(name).id.clone();
    if let Some(sets) = parts.next() {
        let _ = draft.set_sets(&workout_id, sets);
    }
    if let Some(reps) = parts.next() {
        let _ = draft.set_reps(&workout_id, reps);
    }
    if let Some(weight) = parts.next() {
        let _ = draft.set_weight(&workout_id, weight);
    }
}

/// Applies one `EXERCISE_ID:SETS:REPS:WEIGHT` edit to a running session.
fn apply_session_edit(session: &mut ActiveSession, edit: &str) -> Result<()> {
    let mut parts = edit.splitn(4, ':');
    let workout_id = parts.next().unwrap_or("").trim().to_string();
    if workout_id.is_empty() {
        bail!("--set requires EXERCISE_ID:SETS:REPS:WEIGHT, got '{}'", edit);
    }
    if let Some(sets) = parts.next() {
        session
            .set_sets(&workout_id, sets)
            .with_context(|| format!("Cannot edit exercise '{}'", workout_id))?;
    }
    if let Some(reps) = parts.next() {
        session
            .set_reps(&workout_id, reps)
            .with_context(|| format!("Cannot edit exercise '{}'", workout_id))?;
    }
    if let Some(weight) = parts.next() {
        session
            .set_weight(&workout_id, weight)
            .with_context(|| format!("Cannot edit exercise '{}'", workout_id))?;
    }
    Ok(())
}

fn header_color(service: &AppService) -> Color {
    gym_journal_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green) // Fallback
}

fn print_exercise_table(exercises: Vec<Exercise>, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
        ]);
    for exercise in exercises {
        table.add_row(vec![Cell::new(exercise.id), Cell::new(exercise.name)]);
    }
    println!("{table}");
}

fn print_template_table(templates: Vec<WorkoutTemplate>, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Exercises").fg(header_color),
        ]);
    for template in templates {
        table.add_row(vec![
            Cell::new(template.id),
            Cell::new(template.name),
            Cell::new(template.exercises.len().to_string()),
        ]);
    }
    println!("{table}");
}

fn print_planned_exercise_table(template: &WorkoutTemplate, header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Weight ({})", units.weight_abbr())).fg(header_color),
        ]);
    for workout in &template.exercises {
        table.add_row(vec![
            Cell::new(&workout.id),
            Cell::new(&workout.exercise),
            Cell::new(workout.sets.to_string()),
            Cell::new(workout.reps.to_string()),
            Cell::new(format!("{:.1}", workout.weight)),
        ]);
    }
    println!("{table}");
}

fn print_session_table(sessions: &[WorkoutSession], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date (Local)").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new(format!("Exercises (sets x reps @ {})", units.weight_abbr()))
                .fg(header_color),
        ]);
    for session in sessions {
        let exercises = session
            .exercises
            .iter()
            .map(|w| format!("{} {}x{} @ {:.1}", w.exercise, w.sets, w.reps, w.weight))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(
                session
                    .date
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(&session.name),
            Cell::new(format_elapsed(session.duration)),
            Cell::new(exercises),
        ]);
    }
    println!("{table}");
}

fn print_weight_table(history: &[WeightEntry], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date (Local)").fg(header_color),
            Cell::new(format!("Weight ({})", units.weight_abbr())).fg(header_color),
        ]);
    // Newest first for display; insertion order still defines "current".
    for entry in history.iter().rev() {
        table.add_row(vec![
            Cell::new(
                entry
                    .date
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(format!("{:.1}", entry.weight)),
        ]);
    }
    println!("{table}");
}

fn print_current_measurement_table(current: &[CurrentMeasurement], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Body Part").fg(header_color),
            Cell::new("Measure").fg(header_color),
        ]);
    for measurement in current {
        table.add_row(vec![
            Cell::new(&measurement.part),
            Cell::new(&measurement.measure),
        ]);
    }
    println!("{table}");
}

fn print_measurement_history_table(history: &[MeasurementEntry], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date (Local)").fg(header_color),
            Cell::new("Measurements").fg(header_color),
        ]);
    for entry in history.iter().rev() {
        let values = entry
            .measurements
            .iter()
            .map(|m| format!("{}: {}", m.part, m.measure))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(
                entry
                    .date
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(values),
        ]);
    }
    println!("{table}");
}

fn print_exercise_csv(exercises: Vec<Exercise>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Name"])?;
    for exercise in exercises {
        writer.write_record([exercise.id, exercise.name])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_session_csv(sessions: &[WorkoutSession], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let weight_header = format!("Weight_{}", units.weight_abbr());
    writer.write_record([
        "Session_ID",
        "Workout",
        "Date",
        "Duration_ms",
        "Exercise",
        "Sets",
        "Reps",
        weight_header.as_str(),
    ])?;
    // One row per exercise entry, session fields repeated
    for session in sessions {
        for workout in &session.exercises {
            writer.write_record([
                session.id.clone(),
                session.name.clone(),
                session.date.to_rfc3339(),
                session.duration.to_string(),
                workout.exercise.clone(),
                workout.sets.to_string(),
                workout.reps.to_string(),
                format!("{:.2}", workout.weight),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_weight_csv(history: &[WeightEntry], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let weight_header = format!("Weight_{}", units.weight_abbr());
    writer.write_record(["ID", "Date", weight_header.as_str()])?;
    for entry in history {
        writer.write_record([
            entry.id.clone(),
            entry.date.to_rfc3339(),
            format!("{:.1}", entry.weight),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
