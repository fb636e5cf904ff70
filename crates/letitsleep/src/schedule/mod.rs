//! Schedule repository: fetches the week's collections and keeps a snapshot

pub mod grid;
pub mod types;

pub use grid::{DayBucket, GridCell, GridRow, ScheduleGrid};
pub use types::*;

use std::collections::HashMap;

use types::{
    BookedTimeSlotsResponse, BookingsResponse, ResourcesResponse, TimeSlotsResponse,
    UsersResponse,
};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{LisError, LisResult};
use crate::session::Session;

/// One consistent set of collections fetched for a single reference date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub resources: Vec<Resource>,
    pub time_slots: Vec<TimeSlot>,
    pub bookings: Vec<Booking>,
    pub booked_time_slots: Vec<BookedTimeSlot>,
    /// BookedTimeSlot id -> TimeSlot id
    pub slot_index: HashMap<u64, u64>,
}

impl Snapshot {
    /// Assembles a snapshot and builds the booked-time-slot index.
    pub fn new(
        users: Vec<User>,
        resources: Vec<Resource>,
        time_slots: Vec<TimeSlot>,
        bookings: Vec<Booking>,
        booked_time_slots: Vec<BookedTimeSlot>,
    ) -> Self {
        let slot_index = booked_time_slots
            .iter()
            .map(|bts| (bts.id, bts.time_slot_id))
            .collect();

        Self {
            users,
            resources,
            time_slots,
            bookings,
            booked_time_slots,
            slot_index,
        }
    }

    /// Translates a booking's BookedTimeSlot id into the TimeSlot it occupies.
    pub fn time_slot_for(&self, booked_time_slot_id: u64) -> Option<u64> {
        self.slot_index.get(&booked_time_slot_id).copied()
    }
}

/// Path segment `YYYY/MM/DD` used by the week-scoped endpoints.
pub fn week_path(date: NaiveDate) -> String {
    format!("{}/{:02}/{:02}", date.year(), date.month(), date.day())
}

/// The schedule of an authenticated session.
pub struct Schedule<'s> {
    session: &'s Session,
    clock: Box<dyn Clock>,
    snapshot: Snapshot,
    rendered: Option<ScheduleGrid>,
}

impl<'s> Schedule<'s> {
    /// Creates an empty schedule that uses the wall clock.
    pub fn new(session: &'s Session) -> LisResult<Self> {
        Self::with_clock(session, Box::new(SystemClock))
    }

    /// Creates an empty schedule with an explicit reference-date source.
    pub fn with_clock(session: &'s Session, clock: Box<dyn Clock>) -> LisResult<Self> {
        if !session.is_authenticated() {
            return Err(LisError::NotAuthorized);
        }

        Ok(Self {
            session,
            clock,
            snapshot: Snapshot::default(),
            rendered: None,
        })
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Fetches every collection for the reference week.
    ///
    /// The snapshot is swapped in only when all five fetches succeed, so a
    /// failed refresh leaves the previous state untouched.
    pub async fn refresh(&mut self) -> LisResult<()> {
        let date = self.reference_date();
        let week = week_path(date);
        info!(date = %date, "Refreshing schedule");

        let users: UsersResponse = self.fetch("users").await?;
        let resources: ResourcesResponse = self.fetch("resources").await?;
        let time_slots: TimeSlotsResponse = self.fetch("time_slots").await?;
        let bookings: BookingsResponse = self.fetch(&format!("bookings/week/{}", week)).await?;
        let booked: BookedTimeSlotsResponse = self
            .fetch(&format!("booked_time_slots/week/{}", week))
            .await?;

        self.snapshot = Snapshot::new(
            users.users,
            resources.resources,
            time_slots.time_slots,
            bookings.bookings,
            booked.booked_time_slots,
        );
        self.rendered = None;

        info!(
            users = self.snapshot.users.len(),
            resources = self.snapshot.resources.len(),
            time_slots = self.snapshot.time_slots.len(),
            bookings = self.snapshot.bookings.len(),
            booked_time_slots = self.snapshot.booked_time_slots.len(),
            "Schedule refreshed"
        );
        Ok(())
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> LisResult<T> {
        debug!(path = %path, "Requesting collection");
        self.session.get_json(path).await
    }

    /// Builds the grid from the current snapshot, or returns the cached one.
    pub fn render(&mut self) -> &ScheduleGrid {
        let snapshot = &self.snapshot;
        self.rendered
            .get_or_insert_with(|| ScheduleGrid::build(snapshot))
    }

    /// The last rendered grid, if any.
    pub fn grid(&self) -> Option<&ScheduleGrid> {
        self.rendered.as_ref()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn users(&self) -> &[User] {
        &self.snapshot.users
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.snapshot.users.iter().find(|u| u.id == id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.snapshot.resources
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.snapshot.time_slots
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.snapshot.bookings
    }

    pub fn booked_time_slots(&self) -> &[BookedTimeSlot] {
        &self.snapshot.booked_time_slots
    }
}
