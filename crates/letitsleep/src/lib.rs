//! Client for an e-allocator style booking API: log in, pull the week's
//! schedule, render the availability grid and book the first free slot.

pub mod booking;
pub mod clock;
pub mod config;
pub mod error;
pub mod schedule;
pub mod session;

pub use booking::{BookingExecutor, Reservation};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BookingConfig, ClientConfig, Credentials};
pub use error::{LisError, LisResult};
pub use schedule::{Schedule, ScheduleGrid};
pub use session::Session;

use tracing::info;

/// What a single run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub grid: ScheduleGrid,
    pub reservation: Option<Reservation>,
}

/// Authenticates, refreshes the schedule, renders it and tries to book once.
///
/// The date override is checked before any request goes out.
pub async fn run(config: &BookingConfig, client_config: &ClientConfig) -> LisResult<RunReport> {
    let (endpoint, day) = config.validate()?;
    let clock = clock::clock_for(config.as_of.as_deref())?;

    let mut session = Session::connect_with_config(endpoint, config.credentials(), client_config)?;
    session.authenticate().await?;

    let mut schedule = Schedule::with_clock(&session, clock)?;
    schedule.refresh().await?;
    let grid = schedule.render().clone();

    let executor = BookingExecutor::new(&schedule)?;
    let reservation = executor
        .book_if_possible(day, &config.time, &config.description)
        .await;

    info!(booked = reservation.is_some(), "Run finished");
    Ok(RunReport { grid, reservation })
}
