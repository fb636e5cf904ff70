//! Weekly availability grid: primary resources x days x time slots.

use std::collections::HashSet;
use std::fmt;

use chrono::Weekday;
use serde::Serialize;
use tracing::{debug, warn};

use super::Snapshot;

/// Day buckets in grid order, indexed by the API's `day_of_week - 1`.
pub const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Short label used for day buckets ("Sun" ... "Sat").
pub fn day_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

/// Maps the API's 1 (Sunday) ..= 7 (Saturday) onto a bucket index.
fn day_index(day_of_week: u8) -> Option<usize> {
    match day_of_week {
        1..=7 => Some(day_of_week as usize - 1),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    resource_id: u64,
    time_slot_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Time slot label, e.g. "9am - 2pm"
    pub time: String,
    pub time_slot_id: u64,
    pub booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    #[serde(serialize_with = "serialize_day")]
    pub day: Weekday,
    pub cells: Vec<GridCell>,
}

impl DayBucket {
    pub fn label(&self) -> &'static str {
        day_label(self.day)
    }
}

fn serialize_day<S: serde::Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(day_label(*day))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub resource_id: u64,
    pub name: String,
    /// Always seven buckets, Sunday first
    pub days: Vec<DayBucket>,
}

impl GridRow {
    pub fn day(&self, day: Weekday) -> Option<&DayBucket> {
        self.days.iter().find(|bucket| bucket.day == day)
    }
}

/// Read-only projection of one schedule snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleGrid {
    pub rows: Vec<GridRow>,
}

impl ScheduleGrid {
    /// Projects resources, time slots and bookings into the grid.
    ///
    /// Bookings whose booked time slot is missing from the snapshot's index
    /// are left out of the booked mask.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut booked = HashSet::new();
        for booking in &snapshot.bookings {
            match snapshot.time_slot_for(booking.booked_time_slot_id) {
                Some(time_slot_id) => {
                    booked.insert(SlotKey {
                        resource_id: booking.resource_id,
                        time_slot_id,
                    });
                }
                None => debug!(
                    booking_id = booking.id,
                    booked_time_slot_id = booking.booked_time_slot_id,
                    "Booking references an unknown booked time slot, ignoring"
                ),
            }
        }

        let mut placed = Vec::with_capacity(snapshot.time_slots.len());
        for slot in &snapshot.time_slots {
            match day_index(slot.day_of_week) {
                Some(index) => placed.push((index, slot)),
                None => warn!(
                    time_slot_id = slot.id,
                    day_of_week = slot.day_of_week,
                    "Time slot has no valid day of week, skipping"
                ),
            }
        }

        let rows = snapshot
            .resources
            .iter()
            .filter(|resource| resource.primary)
            .map(|resource| {
                let mut days: Vec<DayBucket> = WEEK
                    .iter()
                    .map(|&day| DayBucket {
                        day,
                        cells: Vec::new(),
                    })
                    .collect();

                for &(index, slot) in &placed {
                    days[index].cells.push(GridCell {
                        time: slot.description.clone(),
                        time_slot_id: slot.id,
                        booked: booked.contains(&SlotKey {
                            resource_id: resource.id,
                            time_slot_id: slot.id,
                        }),
                    });
                }

                GridRow {
                    resource_id: resource.id,
                    name: resource.description.clone(),
                    days,
                }
            })
            .collect();

        Self { rows }
    }

    pub fn row(&self, resource_id: u64) -> Option<&GridRow> {
        self.rows.iter().find(|row| row.resource_id == resource_id)
    }

    /// Cells labelled `time` on `day`, in scan order: rows, then days, then slots.
    pub fn matching_cells<'a>(
        &'a self,
        day: Weekday,
        time: &'a str,
    ) -> impl Iterator<Item = (&'a GridRow, &'a GridCell)> + 'a {
        self.rows.iter().flat_map(move |row| {
            row.days
                .iter()
                .filter(move |bucket| bucket.day == day)
                .flat_map(|bucket| bucket.cells.iter())
                .filter(move |cell| cell.time == time)
                .map(move |cell| (row, cell))
        })
    }
}

impl fmt::Display for ScheduleGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{} ({})", row.name, row.resource_id)?;
            for bucket in &row.days {
                write!(f, "  {}:", bucket.label())?;
                if bucket.cells.is_empty() {
                    write!(f, " -")?;
                }
                for cell in &bucket.cells {
                    let mark = if cell.booked { "[x]" } else { "[ ]" };
                    write!(f, " {} {}", mark, cell.time)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
