use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hms_core::config::{db_path_from_env_value, fee_from_env_value};
use hms_core::validation::{parse_amount, parse_days_stayed};
use hms_core::{
    CoreConfig, ErrorKind, FeeSchedule, PatientError, PatientFilter, PatientId, PatientRecord,
    PatientRegistry, PatientStatus,
};

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital admission registry and discharge billing")]
struct Cli {
    /// Patient database file (overrides HMS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Admit a new patient
    Admit {
        /// Patient name
        #[arg(long)]
        name: String,
        /// Age in whole years
        #[arg(long)]
        age: String,
        /// Gender: M, F or O
        #[arg(long, default_value = "M")]
        gender: String,
        /// Presenting condition
        #[arg(long)]
        condition: String,
    },
    /// List patients, newest first
    List {
        /// Only show patients whose name or ID contains this text
        #[arg(long)]
        search: Option<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one patient record
    Show {
        /// Patient ID
        id: PatientId,
    },
    /// Change a patient's status (Admitted, Stable or Critical)
    Status {
        /// Patient ID
        id: PatientId,
        /// New status
        status: String,
    },
    /// Discharge a patient and print the invoice
    Discharge {
        /// Patient ID
        id: PatientId,
        /// Days stayed (defaults to whole days since admission, minimum 1)
        #[arg(long)]
        days: Option<String>,
        /// Room rate per day
        #[arg(long)]
        room_rate: Option<String>,
        /// Fixed doctor fee
        #[arg(long)]
        doctor_fee: Option<String>,
        /// Medicine and lab cost
        #[arg(long)]
        misc_cost: Option<String>,
    },
    /// Permanently delete a patient record
    Delete {
        /// Patient ID
        id: PatientId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Entry point for the HMS operator console.
///
/// Opens the patient store once, runs a single command against it and closes the store.
/// Failing to open the store is fatal. Input and not-found errors are reported and exit
/// with status 2 without touching the store.
///
/// # Environment Variables
/// - `HMS_DB_PATH`: patient database file (default: "hms.db")
/// - `HMS_ROOM_RATE`, `HMS_DOCTOR_FEE`, `HMS_MISC_COST`: discharge fee defaults
/// - `RUST_LOG`: log filter (default: "hms=info,hms_core=info")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hms=info".parse()?)
                .add_directive("hms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'hms --help' for commands");
        return Ok(());
    };

    let cfg = resolve_config(cli.db)?;
    let mut registry = PatientRegistry::open(&cfg).map_err(|e| {
        tracing::error!("fatal: {e}");
        e
    })?;

    let outcome = run(&mut registry, &cfg, command);
    registry.close().context("failed to close patient store")?;

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<PatientError>().map(PatientError::kind) {
            Some(ErrorKind::Validation) | Some(ErrorKind::NotFound) => {
                eprintln!("Error: {err}");
                std::process::exit(2);
            }
            _ => Err(err),
        },
    }
}

fn resolve_config(db_override: Option<PathBuf>) -> anyhow::Result<CoreConfig> {
    let db_path =
        db_override.unwrap_or_else(|| db_path_from_env_value(std::env::var("HMS_DB_PATH").ok()));

    let defaults = FeeSchedule::default();
    let fee_schedule = FeeSchedule {
        room_rate_per_day: fee_from_env_value(
            "HMS_ROOM_RATE",
            std::env::var("HMS_ROOM_RATE").ok(),
            defaults.room_rate_per_day,
        )?,
        doctor_fee: fee_from_env_value(
            "HMS_DOCTOR_FEE",
            std::env::var("HMS_DOCTOR_FEE").ok(),
            defaults.doctor_fee,
        )?,
        misc_cost: fee_from_env_value(
            "HMS_MISC_COST",
            std::env::var("HMS_MISC_COST").ok(),
            defaults.misc_cost,
        )?,
    };

    Ok(CoreConfig::new(db_path, fee_schedule)?)
}

fn run(registry: &mut PatientRegistry, cfg: &CoreConfig, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Admit {
            name,
            age,
            gender,
            condition,
        } => {
            let record = registry.admit(&name, &age, &gender, &condition)?;
            println!("Admitted patient {} with ID: {}", record.name, record.id);
        }
        Commands::List { search, json } => {
            let filter = search.as_deref().and_then(|query| PatientFilter::new(query));
            let records = registry.list(filter.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No patients found.");
            } else {
                print_table(&records);
            }
        }
        Commands::Show { id } => {
            let record = registry.get(id)?;
            print_table(std::slice::from_ref(&record));
        }
        Commands::Status { id, status } => {
            let status: PatientStatus = status.parse().map_err(PatientError::from)?;
            let record = registry.update_status(id, status)?;
            println!("Patient {} is now {}", record.id, record.status);
        }
        Commands::Discharge {
            id,
            days,
            room_rate,
            doctor_fee,
            misc_cost,
        } => {
            let mut params = cfg.default_billing_params();
            if let Some(days) = days {
                params.days_stayed = Some(parse_days_stayed(&days)?);
            }
            if let Some(rate) = room_rate {
                params.room_rate_per_day = parse_amount("room rate", &rate)?;
            }
            if let Some(fee) = doctor_fee {
                params.doctor_fee = parse_amount("doctor fee", &fee)?;
            }
            if let Some(cost) = misc_cost {
                params.misc_cost = parse_amount("medical/lab cost", &cost)?;
            }

            let (record, invoice) = registry.discharge_with_invoice(id, &params)?;
            print!("{}", invoice.render(&record));
        }
        Commands::Delete { id, yes } => {
            let record = registry.get(id)?;
            if !yes && !confirm(&format!(
                "Delete record {} ({}) permanently? [y/N] ",
                record.id, record.name
            ))? {
                println!("Cancelled.");
                return Ok(());
            }
            registry.delete(id)?;
            println!("Deleted patient record {id}");
        }
    }

    Ok(())
}

fn print_table(records: &[PatientRecord]) {
    println!(
        "{:>5}  {:<24} {:>4}  {:<6} {:<28} {:<10}  {:<10}",
        "ID", "Name", "Age", "Gender", "Condition", "Admitted", "Status"
    );
    for record in records {
        println!(
            "{:>5}  {:<24} {:>4}  {:<6} {:<28} {:<10}  {:<10}",
            record.id,
            record.name,
            record.age,
            record.gender,
            record.condition,
            record.admitted_at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            record.status
        );
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}
