//! Line-oriented command shell.
//!
//! Each input line is split on whitespace and parsed with clap. The shell
//! owns the `Session` for its client; the scheduler never sees stdin.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use vax_core::*;

#[derive(Parser)]
#[command(name = "vaxsched", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
enum ShellCommand {
    /// Create a patient account
    CreatePatient { username: String, password: String },

    /// Create a caregiver account
    CreateCaregiver { username: String, password: String },

    /// Log in as a patient
    LoginPatient { username: String, password: String },

    /// Log in as a caregiver
    LoginCaregiver { username: String, password: String },

    /// Show caregivers free on a date and the vaccine stock
    SearchCaregiverSchedule { date: String },

    /// Book a vaccination on a date (patients)
    Reserve { date: String, vaccine: String },

    /// Open a slot on a date (caregivers)
    UploadAvailability { date: String },

    /// Add doses of a vaccine (caregivers)
    AddDoses { vaccine: String, number: String },

    /// List your appointments
    ShowAppointments,

    /// Write your appointments to a CSV file
    ExportAppointments { path: PathBuf },

    /// Log out
    Logout,

    /// Leave the shell
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Run the shell until `quit` or end of input
pub fn run<S: Store>(scheduler: &Scheduler<S>, input: impl BufRead) -> Result<()> {
    let mut session = Session::new();
    greetings();

    let mut lines = input.lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                println!();
                break;
            }
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(tokens.iter().copied()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                match e.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        print!("{}", e.render())
                    }
                    ErrorKind::InvalidSubcommand => println!("Invalid operation name!"),
                    _ => println!("Please try again! Usage: {}", usage_hint(tokens[0])),
                }
                continue;
            }
        };

        match dispatch(scheduler, &mut session, command) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => report(&e),
        }
    }

    if let Some((kind, name)) = session.principal() {
        tracing::debug!("Shell closed with {} {:?} still logged in", kind, name);
    }
    Ok(())
}

fn dispatch<S: Store>(
    scheduler: &Scheduler<S>,
    session: &mut Session,
    command: ShellCommand,
) -> Result<Flow> {
    match command {
        ShellCommand::CreatePatient { username, password } => {
            cmd_create(scheduler, PrincipalKind::Patient, &username, &password)?
        }
        ShellCommand::CreateCaregiver { username, password } => {
            cmd_create(scheduler, PrincipalKind::Caregiver, &username, &password)?
        }
        ShellCommand::LoginPatient { username, password } => {
            cmd_login(scheduler, session, PrincipalKind::Patient, &username, &password)?
        }
        ShellCommand::LoginCaregiver { username, password } => {
            cmd_login(scheduler, session, PrincipalKind::Caregiver, &username, &password)?
        }
        ShellCommand::SearchCaregiverSchedule { date } => {
            let schedule = scheduler.search_schedule(parse_date(&date)?)?;
            display_schedule(&schedule);
        }
        ShellCommand::Reserve { date, vaccine } => {
            let appt = scheduler.reserve(session, parse_date(&date)?, &vaccine)?;
            println!(
                "Appointment reserved! id: {}, caregiver: {}",
                appt.id, appt.caregiver
            );
        }
        ShellCommand::UploadAvailability { date } => {
            scheduler.upload_availability(session, parse_date(&date)?)?;
            println!("Availability uploaded!");
        }
        ShellCommand::AddDoses { vaccine, number } => {
            let count = parse_dose_count(&number)?;
            let stock = scheduler.add_doses(session, &vaccine, count)?;
            println!(
                "Doses updated! {} now has {} doses",
                stock.name, stock.available_doses
            );
        }
        ShellCommand::ShowAppointments => {
            let appointments = scheduler.show_appointments(session)?;
            display_appointments(&appointments);
        }
        ShellCommand::ExportAppointments { path } => {
            let count = scheduler.export_appointments(session, &path)?;
            println!("Exported {} appointments to {}", count, path.display());
        }
        ShellCommand::Logout => {
            scheduler.logout(session);
            println!("*** You are now logged out ***");
        }
        ShellCommand::Quit => {
            println!("Bye!");
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

fn cmd_create<S: Store>(
    scheduler: &Scheduler<S>,
    kind: PrincipalKind,
    username: &str,
    password: &str,
) -> Result<()> {
    let credential = scheduler.create_account(kind, username, password)?;
    println!("*** Account created successfully: {} {} ***", kind, credential.username);
    Ok(())
}

fn cmd_login<S: Store>(
    scheduler: &Scheduler<S>,
    session: &mut Session,
    kind: PrincipalKind,
    username: &str,
    password: &str,
) -> Result<()> {
    let credential = scheduler.login(session, kind, username, password)?;
    let label = match kind {
        PrincipalKind::Patient => "Patient",
        PrincipalKind::Caregiver => "Caregiver",
    };
    println!("{} logged in as: {}", label, credential.username);
    Ok(())
}

fn display_schedule(schedule: &DaySchedule) {
    println!("Available caregivers on {}:", schedule.date);
    if schedule.caregivers.is_empty() {
        println!("  (none)");
    }
    for caregiver in &schedule.caregivers {
        println!("> Caregiver: {}", caregiver);
    }
    println!("Available vaccines:");
    if schedule.vaccines.is_empty() {
        println!("  (none)");
    }
    for vaccine in &schedule.vaccines {
        println!(
            "> Vaccine: {}, doses left: {}",
            vaccine.name, vaccine.available_doses
        );
    }
}

fn display_appointments(appointments: &[Appointment]) {
    println!("Appointments:");
    if appointments.is_empty() {
        println!("  (none)");
    }
    for appt in appointments {
        println!(
            "id: {}, vaccine: {}, date: {}, patient: {}, caregiver: {}",
            appt.id, appt.vaccine, appt.date, appt.patient, appt.caregiver
        );
    }
}

fn report(err: &Error) {
    match err {
        Error::Validation(ValidationError::WeakPassword(reason)) => {
            println!("Password is too weak: {}. Please try again!", reason)
        }
        Error::Validation(e) => println!("Please try again! {}", e),
        e if e.is_storage() => {
            tracing::error!("Storage failure: {}", e);
            println!("Error occurred, please retry: {}", e)
        }
        e => println!("{}", e),
    }
}

fn usage_hint(operation: &str) -> &'static str {
    match operation {
        "create_patient" => "create_patient <username> <password>",
        "create_caregiver" => "create_caregiver <username> <password>",
        "login_patient" => "login_patient <username> <password>",
        "login_caregiver" => "login_caregiver <username> <password>",
        "search_caregiver_schedule" => "search_caregiver_schedule <date>",
        "reserve" => "reserve <date> <vaccine>",
        "upload_availability" => "upload_availability <date>",
        "add_doses" => "add_doses <vaccine> <number>",
        "export_appointments" => "export_appointments <path>",
        _ => "type 'help' for the list of commands",
    }
}

fn greetings() {
    println!();
    println!("Welcome to the Vaccine Reservation Scheduling Application!");
    println!("*** Please enter one of the following commands ***");
    println!("> create_patient <username> <password>");
    println!("> create_caregiver <username> <password>");
    println!("> login_patient <username> <password>");
    println!("> login_caregiver <username> <password>");
    println!("> search_caregiver_schedule <date>");
    println!("> reserve <date> <vaccine>");
    println!("> upload_availability <date>");
    println!("> add_doses <vaccine> <number>");
    println!("> show_appointments");
    println!("> export_appointments <path>");
    println!("> logout");
    println!("> quit");
    println!();
}
