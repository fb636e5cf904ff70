//! letitsleep entrypoint.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use letitsleep::{run, BookingConfig, ClientConfig, LisError};
use tracing::Level;

/// Let It Sleep: books a slot on the group's resource schedule
#[derive(Parser, Debug)]
#[command(name = "letitsleep", version = env!("CARGO_PKG_VERSION"), long_about = None)]
struct Cli {
    /// Endpoint of the API
    #[arg(short = 'e', long)]
    endpoint: Option<String>,

    #[arg(short = 'u', long)]
    username: Option<String>,

    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Group name in the login form
    #[arg(short = 'g', long)]
    group: Option<String>,

    /// Day to try to book the slot on (Sun, Mon, ...)
    #[arg(short = 'd', long)]
    day: Option<String>,

    /// Time slot to try to book, as labelled on the schedule
    #[arg(short = 't', long)]
    time: Option<String>,

    /// Comment for your booking
    #[arg(short = 's', long)]
    description: Option<String>,

    /// Build the schedule for this date instead of today (YYYY-MM-DD)
    #[arg(long = "as-of")]
    as_of: Option<String>,

    /// JSON file with any of the values above; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the availability grid
    #[arg(long)]
    show: bool,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<BookingConfig, LisError> {
        let mut config = match &self.config {
            Some(path) => BookingConfig::load_from_file(path)?,
            None => BookingConfig::default(),
        };

        let overrides = [
            (self.endpoint, &mut config.endpoint),
            (self.username, &mut config.username),
            (self.password, &mut config.password),
            (self.group, &mut config.group),
            (self.day, &mut config.day),
            (self.time, &mut config.time),
            (self.description, &mut config.description),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value;
            }
        }
        if self.as_of.is_some() {
            config.as_of = self.as_of;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let show = cli.show;
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => return fail(e),
    };

    match run(&config, &ClientConfig::default()).await {
        Ok(report) => {
            if show {
                print!("{}", report.grid);
            }
            match report.reservation {
                Some(reservation) => {
                    println!("Booked: {}", reservation);
                    ExitCode::SUCCESS
                }
                None => fail(LisError::NoAvailableSlot {
                    day: config.day,
                    time: config.time,
                }),
            }
        }
        Err(e) => fail(e),
    }
}

fn fail(e: LisError) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::from(e.exit_code() as u8)
}
