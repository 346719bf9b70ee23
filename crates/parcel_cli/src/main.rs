//! Parcel tracker command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Own the database connection for the lifetime of one command.
//! - Run the demonstration lifecycle or a single parcel operation.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use parcel_core::db::{open_db, open_db_in_memory};
use parcel_core::{
    default_log_level, init_logging, ClientId, ParcelNumber, ParcelRepository, ParcelService,
    SqliteParcelRepository,
};
use rusqlite::Connection;
use std::io::Write;
use std::path::PathBuf;

const DEMO_ADDRESS: &str = "Pskov, Pushkin st. 5";
const DEMO_NEW_ADDRESS: &str = "Saratov, Kozlov st. 25";

/// Track parcels from registration to delivery.
#[derive(Parser, Debug)]
#[command(name = "parcel-tracker", version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "PARCEL_TRACKER_DB", default_value = "tracker.db")]
    db: PathBuf,

    /// Use a throwaway in-memory database instead of `--db`
    #[arg(long)]
    in_memory: bool,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "PARCEL_TRACKER_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    /// Absolute directory for rolling log files; file logging is off when unset
    #[arg(long, env = "PARCEL_TRACKER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk one client through the full parcel lifecycle (default)
    Demo(DemoArgs),
    /// Register a new parcel
    Register {
        #[arg(long)]
        client: ClientId,
        #[arg(long)]
        address: String,
    },
    /// Advance a parcel to its next status
    Advance { number: ParcelNumber },
    /// Change the address of a registered parcel
    Address { number: ParcelNumber, address: String },
    /// Delete a registered parcel
    Delete { number: ParcelNumber },
    /// List all parcels of a client
    List { client: ClientId },
}

#[derive(Args, Debug)]
struct DemoArgs {
    #[arg(long, default_value_t = 1)]
    client: ClientId,
    #[arg(long, default_value = DEMO_ADDRESS)]
    address: String,
    #[arg(long, default_value = DEMO_NEW_ADDRESS)]
    new_address: String,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            client: 1,
            address: DEMO_ADDRESS.to_string(),
            new_address: DEMO_NEW_ADDRESS.to_string(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        init_logging(&cli.log_level, log_dir)
            .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    }

    let conn = open_connection(&cli)?;
    let repo = SqliteParcelRepository::try_new(&conn).context("database is not ready")?;
    let mut service = ParcelService::new(&repo);

    match cli.command.unwrap_or_else(|| Command::Demo(DemoArgs::default())) {
        Command::Demo(args) => run_demo(&mut service, &args)?,
        Command::Register { client, address } => {
            service.register(client, &address)?;
        }
        Command::Advance { number } => service.next_status(number)?,
        Command::Address { number, address } => service.change_address(number, &address)?,
        Command::Delete { number } => service.delete(number)?,
        Command::List { client } => service.print_client_parcels(client)?,
    }

    Ok(())
}

fn open_connection(cli: &Cli) -> Result<Connection> {
    if cli.in_memory {
        return open_db_in_memory().context("failed to open in-memory database");
    }
    open_db(&cli.db).with_context(|| format!("failed to open database `{}`", cli.db.display()))
}

/// Registers, edits, advances and deletes parcels, printing the client's
/// parcels between steps. Stops at the first error.
fn run_demo<R, W>(service: &mut ParcelService<R, W>, args: &DemoArgs) -> Result<()>
where
    R: ParcelRepository,
    W: Write,
{
    info!("event=demo module=cli status=start client={}", args.client);

    let parcel = service.register(args.client, &args.address)?;
    service.change_address(parcel.number, &args.new_address)?;
    service.next_status(parcel.number)?;
    service.print_client_parcels(args.client)?;

    // Already sent, so the store keeps it.
    service.delete(parcel.number)?;
    service.print_client_parcels(args.client)?;

    let parcel = service.register(args.client, &args.address)?;
    service.delete(parcel.number)?;
    service.print_client_parcels(args.client)?;

    info!("event=demo module=cli status=ok client={}", args.client);
    Ok(())
}
