//! Books the first free grid cell matching a day and time.
//!
//! A reservation takes two writes, mirroring the API's model:
//! 1. POST `booked_time_slots` creates the week's instance of the time slot
//! 2. POST `bookings` attaches the resource and the booker to that instance

use std::fmt;

use chrono::Weekday;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::clock::DATE_FORMAT;
use crate::error::{LisError, LisResult};
use crate::schedule::grid::{day_label, GridCell, GridRow};
use crate::schedule::types::{BookedTimeSlotRequest, BookingRequest, Created};
use crate::schedule::Schedule;

const BOOKED_TIME_SLOTS_PATH: &str = "booked_time_slots";
const BOOKINGS_PATH: &str = "bookings";

/// A booking that went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub resource_id: u64,
    pub resource_name: String,
    pub day: String,
    pub time: String,
    pub time_slot_id: u64,
    pub booked_time_slot_id: u64,
    pub booking_id: u64,
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} at {} (booking {})",
            self.resource_name, self.day, self.time, self.booking_id
        )
    }
}

/// Scans a rendered schedule and makes at most one booking.
pub struct BookingExecutor<'a, 's> {
    schedule: &'a Schedule<'s>,
}

impl<'a, 's> BookingExecutor<'a, 's> {
    /// Fails with [`LisError::NotRendered`] until the schedule has been rendered.
    pub fn new(schedule: &'a Schedule<'s>) -> LisResult<Self> {
        if schedule.grid().is_none() {
            return Err(LisError::NotRendered);
        }
        Ok(Self { schedule })
    }

    /// Books the first free cell labelled `time` on `day`.
    ///
    /// Rows are scanned in grid order and cells that are already booked are
    /// passed over, so another resource offering the same slot still gets a
    /// chance. The scan ends at the first free cell: if its reservation
    /// fails, nothing is booked and `None` is returned.
    pub async fn book_if_possible(
        &self,
        day: Weekday,
        time: &str,
        description: &str,
    ) -> Option<Reservation> {
        let correlation_id = attempt_id(self.schedule.session().user_id(), day);
        let grid = self.schedule.grid()?;

        for (row, cell) in grid.matching_cells(day, time) {
            if cell.booked {
                debug!(
                    correlation_id = %correlation_id,
                    resource_id = row.resource_id,
                    time_slot_id = cell.time_slot_id,
                    "Slot already booked, trying next resource"
                );
                continue;
            }

            info!(
                correlation_id = %correlation_id,
                resource = %row.name,
                day = day_label(day),
                time = %cell.time,
                "Found free slot, booking"
            );

            return match self.reserve(row, cell, day, description).await {
                Ok(reservation) => {
                    info!(
                        correlation_id = %correlation_id,
                        booking_id = reservation.booking_id,
                        "Booking confirmed"
                    );
                    Some(reservation)
                }
                Err(e) => {
                    error!(
                        correlation_id = %correlation_id,
                        error = %e,
                        "Booking failed"
                    );
                    None
                }
            };
        }

        info!(
            correlation_id = %correlation_id,
            day = day_label(day),
            time = %time,
            "No free slot matched"
        );
        None
    }

    async fn reserve(
        &self,
        row: &GridRow,
        cell: &GridCell,
        day: Weekday,
        description: &str,
    ) -> LisResult<Reservation> {
        let session = self.schedule.session();
        let date = self
            .schedule
            .reference_date()
            .format(DATE_FORMAT)
            .to_string();

        let slot: Created = session
            .post_json(
                BOOKED_TIME_SLOTS_PATH,
                &BookedTimeSlotRequest {
                    time_slot_id: cell.time_slot_id,
                    booking_date: date.clone(),
                },
            )
            .await?;
        debug!(booked_time_slot_id = slot.id, "Created booked time slot");

        let booking: Created = session
            .post_json(
                BOOKINGS_PATH,
                &BookingRequest {
                    resource_id: row.resource_id,
                    description: description.to_string(),
                    booked_time_slot_id: slot.id,
                    booked_by_user_id: session.user_id(),
                    booked_when: date,
                    secondary_resource_ids: Vec::new(),
                    ical: false,
                },
            )
            .await?;

        Ok(Reservation {
            resource_id: row.resource_id,
            resource_name: row.name.clone(),
            day: day_label(day).to_string(),
            time: cell.time.clone(),
            time_slot_id: cell.time_slot_id,
            booked_time_slot_id: slot.id,
            booking_id: booking.id,
        })
    }
}

/// Correlation id of one booking attempt: `<user>-<day>-<random>`,
/// e.g. `123-sat-0c4f2a91`.
fn attempt_id(user_id: u64, day: Weekday) -> String {
    let nonce: u32 = rand::thread_rng().gen();
    format!(
        "{}-{}-{:08x}",
        user_id,
        day_label(day).to_ascii_lowercase(),
        nonce
    )
}
