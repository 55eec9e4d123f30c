use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vax",
    about = "Vaccine appointment scheduler",
    version,
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Persist state in this directory instead of memory
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One line typed at the shell prompt.
#[derive(Parser, Debug)]
#[command(
    name = "vax",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true,
)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

impl Line {
    /// Split `line` on whitespace and parse it as a shell command.
    pub fn parse_line(line: &str) -> Result<Command, clap::Error> {
        Self::try_parse_from(line.split_whitespace()).map(|l| l.command)
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Register a patient account and log in
    #[command(name = "create_patient")]
    CreatePatient {
        username: String,
        #[arg(allow_hyphen_values = true)]
        password: String,
    },
    /// Register a caregiver account and log in
    #[command(name = "create_caregiver")]
    CreateCaregiver {
        username: String,
        #[arg(allow_hyphen_values = true)]
        password: String,
    },
    #[command(name = "login_patient")]
    LoginPatient {
        username: String,
        #[arg(allow_hyphen_values = true)]
        password: String,
    },
    #[command(name = "login_caregiver")]
    LoginCaregiver {
        username: String,
        #[arg(allow_hyphen_values = true)]
        password: String,
    },
    /// List caregivers available on a date with current dose counts
    #[command(name = "search_caregiver_schedule")]
    SearchCaregiverSchedule { date: String },
    /// Book an appointment (patients only)
    Reserve { date: String, vaccine: String },
    /// Offer a date (caregivers only)
    #[command(name = "upload_availability")]
    UploadAvailability { date: String },
    /// Cancel one of your appointments
    Cancel { appointment_id: u64 },
    /// Add delivered doses (caregivers only)
    #[command(name = "add_doses")]
    AddDoses { vaccine: String, count: u64 },
    #[command(name = "show_appointments")]
    ShowAppointments,
    Logout,
    /// Audit ledger invariants
    Verify,
    Help,
    Quit,
}

impl Command {
    /// Usage lines printed by the start-up menu and `help`.
    pub const MENU: &'static [&'static str] = &[
        "create_patient <username> <password>",
        "create_caregiver <username> <password>",
        "login_patient <username> <password>",
        "login_caregiver <username> <password>",
        "search_caregiver_schedule <date>",
        "reserve <date> <vaccine>",
        "upload_availability <date>",
        "cancel <appointment_id>",
        "add_doses <vaccine> <number>",
        "show_appointments",
        "logout",
        "verify",
        "help",
        "quit",
    ];
}
