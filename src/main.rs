use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::config::{Config, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::models::AttendanceStatus;
use crate::pages::students::{StudentEdits, StudentForm};
use crate::pages::{AssumeYes, Confirm, Flash, StdinConfirm};
use crate::store::{AttendanceStore, StudentStore};

mod api;
mod config;
mod import;
mod models;
mod pages;
mod report;
mod stats;
mod store;
mod validation;

#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(name = "attendance-desk")]
#[command(about = "Student attendance desk for a REST attendance service", long_about = None)]
struct Cli {
    /// Base URL of the attendance service
    #[arg(
        long,
        global = true,
        env = "ATTENDANCE_API_URL",
        default_value = DEFAULT_API_URL
    )]
    api_url: String,
    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "ATTENDANCE_API_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout_secs: u64,
    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's headline numbers
    Dashboard,
    /// Manage students
    #[command(subcommand)]
    Students(StudentsCommand),
    /// Record and review attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    /// Print a student's attendance history, optionally as markdown
    Report {
        roll: String,
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct StudentDetails {
    #[arg(long)]
    name: String,
    #[arg(long)]
    roll: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    department: String,
    #[arg(long)]
    year: u8,
}

#[derive(Subcommand)]
enum StudentsCommand {
    /// List students
    List {
        #[arg(long)]
        active_only: bool,
    },
    /// Show one student by id or roll number
    #[command(group(
        ArgGroup::new("lookup")
            .args(["id", "roll"])
            .required(true)
            .multiple(false)
    ))]
    Show {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        roll: Option<String>,
    },
    /// Find students by name
    Search { name: String },
    /// List students in a department
    Department { name: String },
    /// Count active students
    Count,
    /// Add a student
    Add(StudentDetails),
    /// Change a student's details; the roll number stays fixed
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        year: Option<u8>,
    },
    /// Permanently delete a student
    Delete { id: String },
    /// Mark a student inactive
    Deactivate { id: String },
    /// Import students from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(Subcommand)]
enum AttendanceCommand {
    /// List records for a date (defaults to today)
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List today's records
    Today,
    /// Mark a student present or absent
    Mark {
        roll: String,
        #[arg(long)]
        status: AttendanceStatus,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rewrite an existing record
    Edit {
        id: String,
        #[arg(long)]
        roll: String,
        #[arg(long)]
        status: AttendanceStatus,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a record
    Delete {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List records between two dates
    Range {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// List records with one status between two dates
    Status {
        status: AttendanceStatus,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Show a student's attendance statistics
    Stats {
        roll: String,
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new(&cli.api_url, cli.timeout_secs)?;
    let api = ApiClient::from_config(&config)?;
    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };

    match cli.command {
        Commands::Dashboard => {
            let mut students = StudentStore::new(false);
            students.fetch_students(&api).await;
            let mut attendance = AttendanceStore::default();
            attendance.fetch_today(&api).await;
            print!("{}", pages::dashboard::render(&students, &attendance));
        }
        Commands::Students(command) => run_students(&api, command, confirm.as_mut()).await?,
        Commands::Attendance(command) => run_attendance(&api, command, confirm.as_mut()).await?,
        Commands::Report {
            roll,
            start,
            end,
            out,
        } => {
            let query = pages::reports::ReportQuery::new(&roll, start, end);
            let mut state = pages::reports::ReportsState::default();
            state
                .search(&api, &query)
                .await
                .context("invalid report query")?;
            if let Some(error) = state.error.take() {
                bail!(error);
            }
            print!("{}", pages::reports::render(&state));

            if let (Some(out), Some(history)) = (out, &state.history) {
                let report = report::build_report(history, query.range, stats::today());
                std::fs::write(&out, report)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
            }
        }
    }

    Ok(())
}

fn finish(flash: Flash) -> anyhow::Result<()> {
    if flash.is_error() {
        bail!(flash.text);
    }
    println!("{flash}");
    Ok(())
}

fn finish_confirmed(flash: Option<Flash>) -> anyhow::Result<()> {
    match flash {
        Some(flash) => finish(flash),
        None => {
            println!("Cancelled.");
            Ok(())
        }
    }
}

async fn run_students(
    api: &ApiClient,
    command: StudentsCommand,
    confirm: &mut dyn Confirm,
) -> anyhow::Result<()> {
    let mut store = StudentStore::default();

    match command {
        StudentsCommand::List { active_only } => {
            store.active_only = active_only;
            store.fetch_students(api).await;
            if let Some(error) = store.error.take() {
                bail!(error);
            }
            print!("{}", pages::students::render(&store));
        }
        StudentsCommand::Show { id, roll } => {
            let response = match (id, roll) {
                (Some(id), _) => api.students().get_by_id(&id).await,
                (None, Some(roll)) => {
                    let roll = validation::sanitize_roll_number(&roll);
                    api.students().get_by_roll_number(&roll).await
                }
                (None, None) => bail!("either --id or --roll is required"),
            };
            let student = response
                .into_result("Failed to load student")
                .map_err(anyhow::Error::msg)?;
            print!("{}", pages::students::render_student(&student));
        }
        StudentsCommand::Search { name } => {
            let students = api
                .students()
                .search(&name)
                .await
                .into_result(store::students::FETCH_FAILED)
                .map_err(anyhow::Error::msg)?;
            let title = format!("Students matching '{name}'");
            print!("{}", pages::students::render_list(&title, &students));
        }
        StudentsCommand::Department { name } => {
            let students = api
                .students()
                .by_department(&name)
                .await
                .into_result(store::students::FETCH_FAILED)
                .map_err(anyhow::Error::msg)?;
            let title = format!("Students in {name}");
            print!("{}", pages::students::render_list(&title, &students));
        }
        StudentsCommand::Count => {
            let count = api
                .students()
                .active_count()
                .await
                .into_result("Failed to count students")
                .map_err(anyhow::Error::msg)?;
            println!("Active students: {count}");
        }
        StudentsCommand::Add(details) => {
            let form = StudentForm {
                name: details.name,
                roll_number: details.roll,
                email: details.email,
                phone: details.phone,
                department: details.department,
                year: Some(details.year),
            }
            .sanitized();
            let flash = pages::students::create(api, &mut store, form)
                .await
                .context("invalid student details")?;
            finish(flash)?;
            print!("{}", pages::students::render(&store));
        }
        StudentsCommand::Edit {
            id,
            name,
            email,
            phone,
            department,
            year,
        } => {
            let edits = StudentEdits {
                name,
                email,
                phone,
                department,
                year,
            };
            let flash = pages::students::edit(api, &mut store, &id, edits)
                .await
                .context("invalid student details")?;
            finish(flash)?;
        }
        StudentsCommand::Delete { id } => {
            finish_confirmed(pages::students::delete(api, &mut store, &id, confirm).await)?;
        }
        StudentsCommand::Deactivate { id } => {
            finish_confirmed(pages::students::deactivate(api, &mut store, &id, confirm).await)?;
        }
        StudentsCommand::Import { csv } => {
            let rows = import::read_file(&csv)?;
            let summary = import::import_students(api, &mut store, rows).await;
            println!(
                "Imported {} of {} students from {}.",
                summary.imported,
                summary.total,
                csv.display()
            );
            for rejected in &summary.rejected {
                println!(
                    "- line {} ({}): {}",
                    rejected.line,
                    pages::or_missing(Some(rejected.roll_number.as_str())),
                    rejected.reason
                );
            }
        }
    }

    Ok(())
}

/// Selects `date` on the store, or today when none is given.
async fn open_date(
    api: &ApiClient,
    store: &mut AttendanceStore,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    match date {
        Some(date) => {
            if let Some(flash) = pages::attendance::change_date(api, store, date).await {
                finish(flash)?;
            }
        }
        None => {
            let date = store.selected_date;
            store.fetch_for_date(api, date).await;
        }
    }
    if let Some(error) = store.error.take() {
        bail!(error);
    }
    Ok(())
}

async fn run_attendance(
    api: &ApiClient,
    command: AttendanceCommand,
    confirm: &mut dyn Confirm,
) -> anyhow::Result<()> {
    let mut store = AttendanceStore::default();

    match command {
        AttendanceCommand::List { date } => {
            open_date(api, &mut store, date).await?;
            print!("{}", pages::attendance::render(&store));
        }
        AttendanceCommand::Today => {
            store.fetch_today(api).await;
            if let Some(error) = store.error.take() {
                bail!(error);
            }
            print!(
                "{}",
                pages::attendance::render_records(
                    "Today's attendance",
                    &store.records,
                    "No attendance has been recorded today.",
                )
            );
        }
        AttendanceCommand::Mark { roll, status, date } => {
            open_date(api, &mut store, date).await?;
            let flash = pages::attendance::mark(api, &mut store, &roll, status)
                .await
                .context("invalid attendance entry")?;
            finish(flash)?;
            print!("{}", pages::attendance::render(&store));
        }
        AttendanceCommand::Edit {
            id,
            roll,
            status,
            date,
        } => {
            open_date(api, &mut store, date).await?;
            let flash = pages::attendance::edit(api, &mut store, &id, &roll, status)
                .await
                .context("invalid attendance entry")?;
            finish(flash)?;
            print!("{}", pages::attendance::render(&store));
        }
        AttendanceCommand::Delete { id, date } => {
            open_date(api, &mut store, date).await?;
            finish_confirmed(pages::attendance::delete(api, &mut store, &id, confirm).await)?;
        }
        AttendanceCommand::Range { start, end } => {
            if start > end {
                bail!("start date {start} is after end date {end}");
            }
            let records = api
                .attendance()
                .by_range(start, end)
                .await
                .into_result(store::attendance::FETCH_FAILED)
                .map_err(anyhow::Error::msg)?;
            print!(
                "{}",
                pages::attendance::render_records(
                    &format!("Attendance from {start} to {end}"),
                    &records,
                    "No attendance records in this range.",
                )
            );
        }
        AttendanceCommand::Status { status, start, end } => {
            if start > end {
                bail!("start date {start} is after end date {end}");
            }
            let records = api
                .attendance()
                .by_status(status, start, end)
                .await
                .into_result(store::attendance::FETCH_FAILED)
                .map_err(anyhow::Error::msg)?;
            print!(
                "{}",
                pages::attendance::render_records(
                    &format!("{} from {start} to {end}", status.label()),
                    &records,
                    "No attendance records in this range.",
                )
            );
        }
        AttendanceCommand::Stats { roll, start, end } => {
            let query = pages::reports::ReportQuery::new(&roll, start, end);
            query.validate().context("invalid statistics query")?;
            let response = match query.range {
                Some((start, end)) => {
                    api.attendance()
                        .student_stats_by_range(&query.roll_number, start, end)
                        .await
                }
                None => api.attendance().student_stats(&query.roll_number).await,
            };
            let stats = response
                .into_result("Failed to fetch statistics")
                .map_err(anyhow::Error::msg)?;
            println!("Statistics for {}", query.roll_number);
            print!("{}", pages::reports::render_statistics(&stats));
        }
    }

    Ok(())
}
