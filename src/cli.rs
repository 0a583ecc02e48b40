// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "A local-only fitness tracker", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Export tabular output as CSV instead of a formatted table
    #[arg(long, global = true)]
    pub export_csv: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemePreferenceCli {
    Light,
    Dark,
    System,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an exercise to the catalog
    CreateExercise {
        /// Name of the exercise (must be unique, case-insensitive)
        #[arg(short, long)]
        name: String,
    },
    /// Rename a catalog exercise
    RenameExercise {
        /// Id of the exercise to rename
        id: String,
        /// New name (must be unique, case-insensitive)
        name: String,
    },
    /// Remove an exercise from the catalog
    DeleteExercise {
        /// Id of the exercise to remove
        id: String,
    },
    /// List the exercise catalog
    ListExercises,
    /// Create a workout template from catalog exercise names
    CreateTemplate {
        /// Name of the template
        #[arg(short, long)]
        name: String,
        /// Exercise entry as NAME[:SETS[:REPS[:WEIGHT]]]; repeatable.
        /// Missing fields default to 3:10:0, invalid numbers to 0.
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<String>,
    },
    /// List saved templates
    ListTemplates,
    /// Delete a template by id
    DeleteTemplate { id: String },
    /// Show one template with its planned exercises
    ShowTemplate { id: String },
    /// Run a session from a template and record it with the given duration
    LogSession {
        /// Id of the template to run
        template: String,
        /// Session length in seconds
        #[arg(short, long)]
        duration: i64,
        /// Realized numbers as EXERCISE_ID:SETS:REPS:WEIGHT; repeatable.
        /// Unedited exercises keep the template targets.
        #[arg(long = "set")]
        sets: Vec<String>,
    },
    /// Browse recorded sessions, newest first, one page at a time
    History {
        /// Number of pages to show (each page is 10 sessions, minimum 1)
        #[arg(
            short,
            long,
            default_value_t = 1,
            conflicts_with = "all",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        pages: u32,
        /// Show the full history
        #[arg(long)]
        all: bool,
    },
    /// Delete all recorded sessions
    ClearHistory,
    /// Log a body-weight entry
    AddWeight {
        /// Weight in the configured units
        weight: f64,
    },
    /// Show the weight history with the latest change indicator
    ListWeights,
    /// Set the current measurement for a body part
    SetMeasurement {
        /// Body part (e.g. "Waist")
        part: String,
        /// Measured value, free-form (e.g. "84 cm")
        measure: String,
    },
    /// Snapshot all current measurements into the history
    SaveMeasurements,
    /// Show current measurements and the snapshot history
    ListMeasurements,
    /// Delete the measurement snapshot history
    ClearMeasurements,
    /// Reset every collection to its initial state
    ClearAllData,
    /// Set the light/dark preference
    SetTheme {
        #[arg(value_enum)]
        preference: ThemePreferenceCli,
    },
    /// Set the measurement units
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

// Function to get the clap command structure (for completions)
pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
