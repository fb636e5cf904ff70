//! In-process fixture of the booking API, served by axum on an ephemeral port.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::{self as mw, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use letitsleep::{Credentials, FixedClock, Session};

pub const FIXTURE_DATE: &str = "2022-11-29";
pub const FIXTURE_WEEK: &str = "2022/11/29";
pub const NEW_BOOKED_TIME_SLOT_ID: u64 = 7805733;
pub const NEW_BOOKING_ID: u64 = 11764276;

/// A request as the fixture saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub accept: Option<String>,
    pub user_agent: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct FixtureState {
    log: Arc<Mutex<Vec<Recorded>>>,
    bookings: Arc<Vec<Value>>,
    reject_writes: bool,
    withhold_cookie: bool,
    session_check_error: bool,
    broken_time_slots: Arc<AtomicBool>,
    failing_resources: Arc<AtomicBool>,
}

impl FixtureState {
    fn record_body(&self, body: Value) {
        if let Some(last) = self.log.lock().unwrap().last_mut() {
            last.body = Some(body);
        }
    }
}

/// Knobs for a fixture instance.
pub struct FixtureOptions {
    pub bookings: Vec<Value>,
    /// `POST /booked_time_slots` answers 500
    pub reject_writes: bool,
    /// Login succeeds but sets no session cookie
    pub withhold_cookie: bool,
    /// `GET /sessions` answers 500
    pub session_check_error: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            bookings: vec![booking(11764275, 77787, 7805732)],
            reject_writes: false,
            withhold_cookie: false,
            session_check_error: false,
        }
    }
}

pub struct Fixture {
    pub endpoint: String,
    log: Arc<Mutex<Vec<Recorded>>>,
    broken_time_slots: Arc<AtomicBool>,
    failing_resources: Arc<AtomicBool>,
}

impl Fixture {
    pub async fn start() -> Self {
        Self::start_with(FixtureOptions::default()).await
    }

    pub async fn start_with(options: FixtureOptions) -> Self {
        let state = FixtureState {
            log: Arc::new(Mutex::new(Vec::new())),
            bookings: Arc::new(options.bookings),
            reject_writes: options.reject_writes,
            withhold_cookie: options.withhold_cookie,
            session_check_error: options.session_check_error,
            broken_time_slots: Arc::new(AtomicBool::new(false)),
            failing_resources: Arc::new(AtomicBool::new(false)),
        };

        let app = Router::new()
            .route("/sessions", get(get_sessions).post(post_sessions))
            .route("/users", get(get_users))
            .route("/resources", get(get_resources))
            .route("/time_slots", get(get_time_slots))
            .route("/bookings/week/:y/:m/:d", get(get_bookings))
            .route(
                "/booked_time_slots/week/:y/:m/:d",
                get(get_booked_time_slots),
            )
            .route(
                "/booked_time_slots",
                axum::routing::post(post_booked_time_slot),
            )
            .route("/bookings", axum::routing::post(post_booking))
            .layer(mw::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}", addr),
            log: state.log,
            broken_time_slots: state.broken_time_slots,
            failing_resources: state.failing_resources,
        }
    }

    pub fn session(&self, username: &str, password: &str, group: &str) -> Session {
        Session::connect(
            self.endpoint.parse().unwrap(),
            Credentials::new(username, password, group),
        )
        .unwrap()
    }

    pub async fn authenticated_session(&self) -> Session {
        let mut session = self.session("TEST", "TEST", "TEST");
        session.authenticate().await.unwrap();
        session
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::POST && r.path != "/sessions")
            .collect()
    }

    /// Makes `/time_slots` answer with malformed JSON from now on.
    pub fn break_time_slots(&self) {
        self.broken_time_slots.store(true, Ordering::SeqCst);
    }

    /// Makes `/resources` answer 500 from now on.
    pub fn fail_resources(&self) {
        self.failing_resources.store(true, Ordering::SeqCst);
    }
}

pub fn fixed_clock() -> Box<FixedClock> {
    Box::new(FIXTURE_DATE.parse().unwrap())
}

pub fn booking(id: u64, resource_id: u64, booked_time_slot_id: u64) -> Value {
    json!({
        "block_uuid": null,
        "booked_by_user_id": 360847,
        "booked_time_slot_id": booked_time_slot_id,
        "booked_when": "2022-11-29 00:00:00",
        "description": "1234",
        "id": id,
        "primary_booking_id": null,
        "resource_id": resource_id,
        "secondary_bookings": []
    })
}

async fn record(State(state): State<FixtureState>, request: Request, next: Next) -> Response {
    // The borrow of the request must end before it moves into `next`.
    let entry = {
        let headers = request.headers();
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Recorded {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            accept: header_value(header::ACCEPT),
            user_agent: header_value(header::USER_AGENT),
            body: None,
        }
    };
    state.log.lock().unwrap().push(entry);
    next.run(request).await
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split(';').any(|c| c.trim() == "session=.session1"))
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"error": "Forbidden"}))).into_response()
}

fn session_info() -> Value {
    json!({
        "group_id": 1234,
        "id": "user-id-1",
        "last_login": "2022-01-01 10:11:12",
        "user_id": 123
    })
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))).into_response()
}

async fn get_sessions(State(state): State<FixtureState>, headers: HeaderMap) -> Response {
    if state.session_check_error {
        return server_error();
    }
    if !has_session(&headers) {
        return forbidden();
    }
    Json(json!({ "sessions": [session_info()] })).into_response()
}

async fn post_sessions(State(state): State<FixtureState>, Json(body): Json<Value>) -> Response {
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default();
    if field("groupname") != "TEST" || field("username") != "TEST" || field("password") != "TEST"
    {
        return forbidden();
    }
    if state.withhold_cookie {
        return Json(session_info()).into_response();
    }
    (
        [(header::SET_COOKIE, "session=.session1; HttpOnly; Path=/")],
        Json(session_info()),
    )
        .into_response()
}

async fn get_users(headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return forbidden();
    }
    Json(json!({
        "users": [
            {
                "administrator": true, "allow_alter_others": true, "allow_edits": true,
                "booking_change_emails": false, "confirmation_email_sent": false,
                "email": "admin@e-allocator.com", "email_confirmed": false,
                "email_messages": false, "email_preferences": true, "group_id": 19618,
                "id": 359235, "last_login": "2007-12-20 03:49:00",
                "member_details_private": false, "name": "Demo Administrator",
                "username": "ADMIN"
            },
            {
                "administrator": false, "allow_alter_others": true, "allow_edits": true,
                "booking_change_emails": true, "confirmation_email_sent": false,
                "email": "demo@e-allocator.com", "email_confirmed": true,
                "email_messages": true, "email_preferences": true, "group_id": 19618,
                "id": 360847, "last_login": "2022-11-29 19:37:32",
                "member_details_private": false, "name": "Demo User",
                "username": "DEMO"
            }
        ]
    }))
    .into_response()
}

async fn get_resources(State(state): State<FixtureState>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return forbidden();
    }
    if state.failing_resources.load(Ordering::SeqCst) {
        return server_error();
    }
    let resources: Vec<Value> = [
        (77790, "Instructor John Doe", false, 1, "diapur"),
        (77787, "Cessna 172", true, 1, "none"),
        (77789, "Instructor Fred Bloggs", false, 2, "diayel"),
        (77791, "Piper Archer", true, 2, "none"),
        (77788, "Club Life Raft", false, 3, "square_light_green"),
    ]
    .into_iter()
    .map(|(id, description, primary, seq, symbol)| {
        json!({
            "description": description, "group_id": 19618, "id": id,
            "primary_flag": primary, "redact_booking_text": false,
            "sequence_num": seq, "symbol": symbol
        })
    })
    .collect();
    Json(json!({ "resources": resources })).into_response()
}

/// The 18 weekly slots: (id, day_of_week, description, sequence_num).
pub const TIME_SLOTS: [(u64, u8, &str, i64); 18] = [
    (759160, 2, "9am - 2pm", 1),
    (759161, 2, "2pm - 7pm", 2),
    (759162, 3, "9am - 2pm", 3),
    (759163, 3, "2pm - 7pm", 4),
    (759164, 4, "9am - 2pm", 5),
    (759165, 4, "2pm - 7pm", 6),
    (759166, 5, "9am - 2pm", 7),
    (759167, 5, "2pm - 7pm", 8),
    (759168, 6, "9am - 2pm", 9),
    (759169, 6, "2pm - 7pm", 10),
    (759170, 7, "9am - 11:30pm", 11),
    (759171, 7, "11:30am - 2pm", 12),
    (759172, 7, "2pm - 4:30pm", 13),
    (759173, 7, "4:30pm - 7pm", 14),
    (759174, 1, "9am - 11:30pm", 15),
    (759175, 1, "11:30am - 2pm", 16),
    (759176, 1, "2pm - 4:30pm", 17),
    (759177, 1, "4:30pm - 7pm", 18),
];

async fn get_time_slots(State(state): State<FixtureState>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return forbidden();
    }
    if state.broken_time_slots.load(Ordering::SeqCst) {
        return ([(header::CONTENT_TYPE, "application/json")], "{\"time_slots\": [").into_response();
    }
    let slots: Vec<Value> = TIME_SLOTS
        .iter()
        .map(|(id, day, description, seq)| {
            json!({
                "day_of_week": day, "description": description, "group_id": 19618,
                "id": id, "prime": false, "sequence_num": seq
            })
        })
        .collect();
    Json(json!({ "time_slots": slots })).into_response()
}

fn is_fixture_week(y: &str, m: &str, d: &str) -> bool {
    format!("{}/{}/{}", y, m, d) == FIXTURE_WEEK
}

async fn get_bookings(
    State(state): State<FixtureState>,
    Path((y, m, d)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !has_session(&headers) {
        return forbidden();
    }
    let bookings: Vec<Value> = if is_fixture_week(&y, &m, &d) {
        state.bookings.as_ref().clone()
    } else {
        Vec::new()
    };
    Json(json!({ "bookings": bookings })).into_response()
}

async fn get_booked_time_slots(
    Path((y, m, d)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !has_session(&headers) {
        return forbidden();
    }
    let slots = if is_fixture_week(&y, &m, &d) {
        vec![json!({
            "booking_date": "2022-12-03", "group_id": 19618,
            "id": 7805732, "time_slot_id": 759170
        })]
    } else {
        Vec::new()
    };
    Json(json!({ "booked_time_slots": slots })).into_response()
}

async fn post_booked_time_slot(
    State(state): State<FixtureState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_body(body.clone());
    if !has_session(&headers) {
        return forbidden();
    }
    if state.reject_writes {
        return server_error();
    }
    Json(json!({
        "booking_date": body["booking_date"], "group_id": 19618,
        "id": NEW_BOOKED_TIME_SLOT_ID, "time_slot_id": body["time_slot_id"]
    }))
    .into_response()
}

async fn post_booking(
    State(state): State<FixtureState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_body(body.clone());
    if !has_session(&headers) {
        return forbidden();
    }
    let mut created = body.clone();
    created["id"] = json!(NEW_BOOKING_ID);
    Json(created).into_response()
}
