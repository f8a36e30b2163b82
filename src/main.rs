use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qflow_appointments::logger::init_logger;
use qflow_appointments::{Client, QflowConfig, QflowServices};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "qflow-appointments")]
#[command(about = "Query the Qflow scheduling backend")]
struct Cli {
    #[arg(long, default_value = "qflow.toml")]
    config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,

    #[arg(long, help = "Print results and logs as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Available start times for a calendar
    AvailableTimes {
        #[arg(long)]
        calendar_id: String,
        #[arg(long)]
        appointment_type_id: String,
    },
    /// Id, address and time zone of a unit
    UnitDetails {
        #[arg(long)]
        unit_id: String,
    },
    /// Current local time at a unit
    UnitLocalTime {
        #[arg(long)]
        unit_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.json);

    let config = QflowConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let services = QflowServices::from_config(&config)?;

    match cli.command {
        Command::AvailableTimes {
            calendar_id,
            appointment_type_id,
        } => {
            let client = Client {
                client_id: "cli".to_string(),
                customer_id: String::new(),
                service_id: String::new(),
                appointment_type_id,
            };
            let by_date = services
                .available_times
                .get_available_times_with_calendar_date(&client, &calendar_id)
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&by_date)?);
            } else {
                for (date, times) in &by_date {
                    println!("{}: {}", date, times.join(", "));
                }
            }
        }
        Command::UnitDetails { unit_id } => {
            let details = services.unit_details.get_unit_details(&unit_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                println!("{} | {} | {}", details.id, details.address, details.time_zone);
            }
        }
        Command::UnitLocalTime { unit_id } => {
            let local_time = services
                .unit_details
                .get_unit_current_local_time(&unit_id)
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string(&local_time)?);
            } else {
                println!("{}", local_time);
            }
        }
    }

    Ok(())
}
