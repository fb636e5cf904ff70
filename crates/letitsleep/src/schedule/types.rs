//! Entities of the booking API, using the API's own field names

use serde::{Deserialize, Serialize};

/// Identity returned by the sessions endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub group_id: u64,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub last_login: String,
    pub user_id: u64,
}

/// Body of `GET /sessions` for a live session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest<'a> {
    pub groupname: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub group_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub administrator: bool,
    #[serde(default)]
    pub last_login: Option<String>,
}

/// A bookable entity, e.g. an aircraft or an instructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group_id: u64,
    /// Only primary resources get a row in the grid
    #[serde(rename = "primary_flag", default)]
    pub primary: bool,
    #[serde(default)]
    pub sequence_num: i64,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Weekly recurring slot template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: u64,
    /// 1 = Sunday ... 7 = Saturday
    pub day_of_week: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group_id: u64,
    #[serde(default)]
    pub prime: bool,
    #[serde(default)]
    pub sequence_num: i64,
}

/// A time slot instantiated for one calendar week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedTimeSlot {
    pub id: u64,
    pub time_slot_id: u64,
    #[serde(default)]
    pub booking_date: String,
    #[serde(default)]
    pub group_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: u64,
    pub resource_id: u64,
    /// Points at a [`BookedTimeSlot`], not at a [`TimeSlot`]
    pub booked_time_slot_id: u64,
    #[serde(default)]
    pub booked_by_user_id: u64,
    #[serde(default)]
    pub booked_when: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_booking_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookedTimeSlotRequest {
    pub time_slot_id: u64,
    pub booking_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub resource_id: u64,
    pub description: String,
    pub booked_time_slot_id: u64,
    pub booked_by_user_id: u64,
    pub booked_when: String,
    pub secondary_resource_ids: Vec<u64>,
    pub ical: bool,
}

/// Minimal view of a freshly created record
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourcesResponse {
    pub resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeSlotsResponse {
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookingsResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookedTimeSlotsResponse {
    pub booked_time_slots: Vec<BookedTimeSlot>,
}
