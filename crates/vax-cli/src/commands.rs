use std::io::{BufRead, Write};

use clap::error::ErrorKind;
use colored::Colorize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use vax_core::{
    AppointmentId, AppointmentView, Reservation, Role, ScheduleRow, Scheduler, SchedulerError,
    SchedulingStore, Session, SlotDate, ValidationReport, VaccineName,
};

use crate::cli::{Command, Line, OutputFormat};

const WELCOME: &str = "Welcome to the COVID-19 Vaccine Reservation Scheduling Application!";
const NOT_YOUR_APPOINTMENT: &str = "This is not your appointment, please log in as the \
    Caregiver or Patient to cancel this Appointment";

/// Result of one shell line.
#[derive(Debug)]
pub enum Reply {
    Message(String),
    Schedule {
        date: SlotDate,
        rows: Vec<ScheduleRow>,
    },
    Reserved(Reservation),
    Cancelled(Reservation),
    Appointments(Vec<AppointmentView>),
    Verified(ValidationReport),
    Menu,
    Failed {
        kind: &'static str,
        message: String,
    },
    Quit,
}

impl Reply {
    fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    fn invalid_operation() -> Self {
        Self::Failed {
            kind: "invalid_operation",
            message: "Invalid operation name!".into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Lines to print for this reply.
    pub fn render(&self, format: OutputFormat) -> Vec<String> {
        match format {
            OutputFormat::Text => self.render_text(),
            OutputFormat::Json => match self {
                Self::Quit => Vec::new(),
                _ => vec![self.to_json().to_string()],
            },
        }
    }

    fn render_text(&self) -> Vec<String> {
        match self {
            Self::Message(text) => vec![text.clone()],
            Self::Schedule { date, rows } if rows.is_empty() => {
                vec![format!("No caregiver is available on {date}.")]
            }
            Self::Schedule { rows, .. } => rows
                .iter()
                .map(|r| {
                    format!(
                        "Current Availability: {}, {}, {}",
                        r.provider, r.vaccine, r.doses
                    )
                })
                .collect(),
            Self::Reserved(r) => vec![format!(
                "Appointment ID: {} Caregiver username: {}",
                r.appointment_id, r.provider
            )],
            Self::Cancelled(r) => vec![format!(
                "Appointment {} on {} has been cancelled.",
                r.appointment_id, r.date
            )],
            Self::Appointments(views) if views.is_empty() => vec!["No appointments.".into()],
            Self::Appointments(views) => views
                .iter()
                .map(|v| {
                    format!(
                        "Current Appointment: {}, {}, {}, {}",
                        v.id, v.vaccine, v.date, v.counterpart
                    )
                })
                .collect(),
            Self::Verified(report) => {
                let mut lines = vec![format!(
                    "{} appointments, {} open slots, {} vaccines",
                    report.appointment_count, report.open_slot_count, report.vaccine_count
                )];
                if report.is_valid() {
                    lines.push("All invariants hold.".into());
                } else {
                    lines.extend(
                        report
                            .violations
                            .iter()
                            .map(|v| format!("{:?}: {}", v.kind, v.description)),
                    );
                }
                lines
            }
            Self::Menu => {
                let mut lines = vec!["*** Please enter one of the following commands ***".into()];
                lines.extend(Command::MENU.iter().map(|usage| format!("> {usage}")));
                lines
            }
            Self::Failed { message, .. } => vec![message.clone()],
            Self::Quit => Vec::new(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Message(text) => json!({ "status": "ok", "message": text }),
            Self::Schedule { date, rows } => json!({ "status": "ok", "date": date, "rows": rows }),
            Self::Reserved(r) => json!({ "status": "ok", "reservation": r }),
            Self::Cancelled(r) => json!({ "status": "ok", "cancelled": r }),
            Self::Appointments(views) => json!({ "status": "ok", "appointments": views }),
            Self::Verified(report) => json!({
                "status": "ok",
                "valid": report.is_valid(),
                "appointments": report.appointment_count,
                "open_slots": report.open_slot_count,
                "vaccines": report.vaccine_count,
                "violations": report
                    .violations
                    .iter()
                    .map(|v| {
                        json!({ "kind": format!("{:?}", v.kind), "description": v.description })
                    })
                    .collect::<Vec<_>>(),
            }),
            Self::Menu => json!({ "status": "ok", "commands": Command::MENU }),
            Self::Failed { kind, message } => {
                json!({ "status": "error", "kind": kind, "message": message })
            }
            Self::Quit => json!({ "status": "ok" }),
        }
    }
}

impl From<SchedulerError> for Reply {
    fn from(err: SchedulerError) -> Self {
        let (kind, message): (&'static str, String) = match &err {
            SchedulerError::AuthenticationFailed => {
                ("authentication_failed", "Login failed.".into())
            }
            SchedulerError::AlreadyLoggedIn => {
                ("already_logged_in", "User already logged in.".into())
            }
            SchedulerError::NotLoggedIn | SchedulerError::NoActiveSession => {
                ("not_logged_in", "Please login first!".into())
            }
            SchedulerError::WrongRole { required: Role::Provider } => {
                ("wrong_role", "Please login as a caregiver first!".into())
            }
            SchedulerError::WrongRole { required: Role::Recipient } => {
                ("wrong_role", "Please login as a patient first!".into())
            }
            SchedulerError::UsernameTaken { .. } => {
                ("username_taken", "Username taken, try again!".into())
            }
            SchedulerError::InvalidDate(_) => ("invalid_date", "Please enter a valid date!".into()),
            SchedulerError::InvalidInput(_) => ("invalid_input", "Please try again!".into()),
            SchedulerError::NoAvailability { .. } => {
                ("no_availability", "No Caregiver is available!".into())
            }
            SchedulerError::InsufficientDoses { .. } => {
                ("insufficient_doses", "Not enough available doses!".into())
            }
            SchedulerError::NoSuchSlot { .. } => ("no_such_slot", err.to_string()),
            SchedulerError::SlotExists { provider, date } => (
                "slot_exists",
                format!("{provider} already has an appointment on {date}"),
            ),
            SchedulerError::NotFound(id) => {
                ("not_found", format!("Appointment {id} does not exist."))
            }
            SchedulerError::NotAuthorized(_) => ("not_authorized", NOT_YOUR_APPOINTMENT.into()),
            SchedulerError::StoreUnavailable(source) => {
                warn!(error = %source, "store unavailable");
                ("store_unavailable", "Please try again!".into())
            }
        };
        Self::Failed { kind, message }
    }
}

/// An interactive session over one scheduler.
pub struct Shell<S> {
    scheduler: Scheduler<S>,
    session: Session,
}

impl<S: SchedulingStore> Shell<S> {
    pub fn new(scheduler: Scheduler<S>) -> Self {
        Self {
            scheduler,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one input line. Blank lines yield `None`.
    pub fn execute(&mut self, line: &str) -> Option<Reply> {
        if line.trim().is_empty() {
            return None;
        }
        let reply = match Line::parse_line(line) {
            Ok(command) => self.dispatch(command).unwrap_or_else(Reply::from),
            Err(err) if err.kind() == ErrorKind::InvalidSubcommand => Reply::invalid_operation(),
            Err(err) => {
                debug!(kind = ?err.kind(), "unparsable command line");
                Reply::from(SchedulerError::InvalidInput(format!("{:?}", err.kind())))
            }
        };
        Some(reply)
    }

    fn dispatch(&mut self, command: Command) -> Result<Reply, SchedulerError> {
        let scheduler = &self.scheduler;
        let session = &mut self.session;

        let reply = match command {
            Command::CreatePatient { username, password } => {
                let user = scheduler.register_recipient(session, &username, &password)?;
                Reply::message(format!("Created user {user}"))
            }
            Command::CreateCaregiver { username, password } => {
                let user = scheduler.register_provider(session, &username, &password)?;
                Reply::message(format!("Created user {user}"))
            }
            Command::LoginPatient { username, password } => {
                let user = scheduler.login_recipient(session, &username, &password)?;
                Reply::message(format!("Logged in as: {user}"))
            }
            Command::LoginCaregiver { username, password } => {
                let user = scheduler.login_provider(session, &username, &password)?;
                Reply::message(format!("Logged in as: {user}"))
            }
            Command::SearchCaregiverSchedule { date } => {
                let date = SlotDate::parse(&date)?;
                let rows = scheduler.search_schedule(session, date)?;
                Reply::Schedule { date, rows }
            }
            Command::Reserve { date, vaccine } => {
                let date = SlotDate::parse(&date)?;
                let vaccine = VaccineName::new(&vaccine)?;
                Reply::Reserved(scheduler.reserve(session, date, &vaccine)?)
            }
            Command::UploadAvailability { date } => {
                let date = SlotDate::parse(&date)?;
                scheduler.upload_availability(session, date)?;
                Reply::message("Availability uploaded!")
            }
            Command::Cancel { appointment_id } => {
                Reply::Cancelled(scheduler.cancel(session, AppointmentId::new(appointment_id))?)
            }
            Command::AddDoses { vaccine, count } => {
                let vaccine = VaccineName::new(&vaccine)?;
                scheduler.add_doses(session, &vaccine, count)?;
                Reply::message("Doses updated!")
            }
            Command::ShowAppointments => Reply::Appointments(scheduler.appointments(session)?),
            Command::Logout => {
                scheduler.logout(session)?;
                Reply::message("Successfully logged out!")
            }
            Command::Verify => Reply::Verified(scheduler.verify()?),
            Command::Help => Reply::Menu,
            Command::Quit => Reply::Quit,
        };
        Ok(reply)
    }
}

/// Read commands from `input` until `quit` or end of input.
pub fn run<S, R, W>(
    shell: &mut Shell<S>,
    input: R,
    mut output: W,
    format: OutputFormat,
) -> anyhow::Result<()>
where
    S: SchedulingStore,
    R: BufRead,
    W: Write,
{
    if format == OutputFormat::Text {
        writeln!(output)?;
        writeln!(output, "{WELCOME}")?;
        print_reply(&mut output, &Reply::Menu, format)?;
    }

    for line in input.lines() {
        let line = line?;
        let Some(reply) = shell.execute(&line) else {
            continue;
        };
        print_reply(&mut output, &reply, format)?;
        if matches!(reply, Reply::Quit) {
            break;
        }
    }
    if let Some(identity) = shell.session().current() {
        debug!(username = %identity.username(), "shell closed with an active session");
    }
    output.flush()?;
    Ok(())
}

fn print_reply<W: Write>(
    output: &mut W,
    reply: &Reply,
    format: OutputFormat,
) -> anyhow::Result<()> {
    for line in reply.render(format) {
        if format == OutputFormat::Text && reply.is_failure() {
            writeln!(output, "{}", line.red())?;
        } else {
            writeln!(output, "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_core::{InMemoryStore, SchedulerConfig};

    fn shell() -> Shell<InMemoryStore> {
        let config = SchedulerConfig {
            hash_rounds: 2,
            ..SchedulerConfig::default()
        };
        Shell::new(Scheduler::from_config(InMemoryStore::new(), &config).unwrap())
    }

    fn text(shell: &mut Shell<InMemoryStore>, line: &str) -> Vec<String> {
        shell.execute(line).unwrap().render(OutputFormat::Text)
    }

    fn one(shell: &mut Shell<InMemoryStore>, line: &str) -> String {
        let mut lines = text(shell, line);
        assert_eq!(lines.len(), 1, "{lines:?}");
        lines.remove(0)
    }

    fn caregiver_with_slot(shell: &mut Shell<InMemoryStore>) {
        one(shell, "create_caregiver p1 pw");
        one(shell, "add_doses Pfizer 10");
        one(shell, "upload_availability 2021-05-01");
        one(shell, "logout");
    }

    #[test]
    fn account_messages() {
        let mut shell = shell();
        assert_eq!(one(&mut shell, "create_patient r1 pw"), "Created user r1");
        assert_eq!(one(&mut shell, "logout"), "Successfully logged out!");
        assert_eq!(one(&mut shell, "create_patient r1 other"), "Username taken, try again!");
        assert_eq!(one(&mut shell, "login_patient r1 nope"), "Login failed.");
        assert_eq!(one(&mut shell, "login_patient r1 pw"), "Logged in as: r1");
        assert_eq!(one(&mut shell, "login_caregiver r1 pw"), "User already logged in.");
        assert!(shell.session().is_active());
    }

    #[test]
    fn reserve_flow() {
        let mut shell = shell();
        caregiver_with_slot(&mut shell);
        one(&mut shell, "create_patient r1 pw");

        assert_eq!(
            text(&mut shell, "search_caregiver_schedule 2021-05-01"),
            vec!["Current Availability: p1, Pfizer, 10"]
        );
        assert_eq!(
            one(&mut shell, "reserve 2021-05-01 Pfizer"),
            "Appointment ID: 1 Caregiver username: p1"
        );
        assert_eq!(one(&mut shell, "reserve 2021-05-01 Pfizer"), "No Caregiver is available!");
        assert_eq!(
            one(&mut shell, "show_appointments"),
            "Current Appointment: 1, Pfizer, 2021-05-01, p1"
        );
        assert_eq!(
            one(&mut shell, "cancel 1"),
            "Appointment 1 on 2021-05-01 has been cancelled."
        );
        assert_eq!(one(&mut shell, "show_appointments"), "No appointments.");
    }

    #[test]
    fn role_messages() {
        let mut shell = shell();
        assert_eq!(one(&mut shell, "show_appointments"), "Please login first!");
        assert_eq!(one(&mut shell, "logout"), "Please login first!");
        one(&mut shell, "create_patient r1 pw");
        assert_eq!(
            one(&mut shell, "add_doses Pfizer 5"),
            "Please login as a caregiver first!"
        );
        one(&mut shell, "logout");
        one(&mut shell, "create_caregiver p1 pw");
        assert_eq!(
            one(&mut shell, "reserve 2021-05-01 Pfizer"),
            "Please login as a patient first!"
        );
    }

    #[test]
    fn input_errors() {
        let mut shell = shell();
        one(&mut shell, "create_caregiver p1 pw");
        assert_eq!(one(&mut shell, "upload_availability 2021-13-01"), "Please enter a valid date!");
        assert_eq!(one(&mut shell, "add_doses Pfizer"), "Please try again!");
        assert_eq!(one(&mut shell, "add_doses Pfizer 0"), "Please try again!");
        assert_eq!(one(&mut shell, "add_doses Pfizer -3"), "Please try again!");
        assert_eq!(one(&mut shell, "vaccinate everyone"), "Invalid operation name!");
        assert!(shell.execute("   ").is_none());
    }

    #[test]
    fn booked_date_reupload_message() {
        let mut shell = shell();
        caregiver_with_slot(&mut shell);
        one(&mut shell, "create_patient r1 pw");
        one(&mut shell, "reserve 2021-05-01 Pfizer");
        one(&mut shell, "logout");
        one(&mut shell, "login_caregiver p1 pw");
        assert_eq!(
            one(&mut shell, "upload_availability 2021-05-01"),
            "p1 already has an appointment on 2021-05-01"
        );
        assert_eq!(
            one(&mut shell, "show_appointments"),
            "Current Appointment: 1, Pfizer, 2021-05-01, r1"
        );
    }

    #[test]
    fn cancel_by_stranger() {
        let mut shell = shell();
        caregiver_with_slot(&mut shell);
        one(&mut shell, "create_patient r1 pw");
        one(&mut shell, "reserve 2021-05-01 Pfizer");
        one(&mut shell, "logout");
        one(&mut shell, "create_patient r2 pw");
        assert!(one(&mut shell, "cancel 1").starts_with("This is not your appointment"));
        assert_eq!(one(&mut shell, "cancel 9"), "Appointment 9 does not exist.");
    }

    #[test]
    fn verify_reports_counts() {
        let mut shell = shell();
        caregiver_with_slot(&mut shell);
        assert_eq!(
            text(&mut shell, "verify"),
            vec!["0 appointments, 1 open slots, 1 vaccines", "All invariants hold."]
        );
    }

    #[test]
    fn json_replies() {
        let mut shell = shell();
        caregiver_with_slot(&mut shell);
        one(&mut shell, "create_patient r1 pw");

        let reply = shell.execute("reserve 2021-05-01 Pfizer").unwrap();
        let lines = reply.render(OutputFormat::Json);
        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["reservation"]["appointment_id"], 1);
        assert_eq!(value["reservation"]["provider"], "p1");
        assert_eq!(value["reservation"]["date"], "2021-05-01");

        let reply = shell.execute("reserve 2021-05-01 Pfizer").unwrap();
        let value: Value = serde_json::from_str(&reply.render(OutputFormat::Json)[0]).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["kind"], "no_availability");
    }

    #[test]
    fn run_stops_at_quit() {
        let mut shell = shell();
        let input = "create_patient r1 pw\nquit\nlogout\n";
        let mut output = Vec::new();
        run(&mut shell, input.as_bytes(), &mut output, OutputFormat::Json).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Created user r1"));
        assert!(shell.session().is_active());
    }

    #[test]
    fn run_prints_menu_in_text_mode() {
        let mut shell = shell();
        let mut output = Vec::new();
        run(&mut shell, "help\n".as_bytes(), &mut output, OutputFormat::Text).unwrap();

        let out = String::from_utf8(output).unwrap();
        assert!(out.contains(WELCOME));
        assert_eq!(out.matches("> reserve <date> <vaccine>").count(), 2);
    }
}
