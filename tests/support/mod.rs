#![allow(dead_code)]

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize)]
pub struct PersonRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordRow {
    pub id: i64,
    pub date: String,
    pub person: String,
    pub count: i64,
    pub time: Option<String>,
}

#[derive(Default)]
pub struct MockData {
    pub persons: Vec<PersonRow>,
    pub records: Vec<RecordRow>,
    next_person_id: i64,
    next_record_id: i64,
    pub fail_create_records: bool,
    pub fail_delete_records: bool,
}

type Shared = Arc<Mutex<MockData>>;

/// In-process stand-in for the tracker API, with switches to make record
/// creation or deletion fail so rollback paths can be driven.
pub struct MockApi {
    pub url: String,
    state: Shared,
}

impl MockApi {
    pub fn add_person(&self, name: &str) -> i64 {
        let mut data = self.state.lock().unwrap();
        data.next_person_id += 1;
        let id = data.next_person_id;
        data.persons.push(PersonRow {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_record(&self, date: &str, person: &str, count: i64) -> i64 {
        let mut data = self.state.lock().unwrap();
        data.next_record_id += 1;
        let id = data.next_record_id;
        data.records.push(RecordRow {
            id,
            date: date.to_string(),
            person: person.to_string(),
            count,
            time: None,
        });
        id
    }

    pub fn remove_record(&self, id: i64) {
        let mut data = self.state.lock().unwrap();
        data.records.retain(|record| record.id != id);
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn record_sum(&self, date: &str, person: &str) -> i64 {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|record| record.date == date && record.person == person)
            .map(|record| record.count)
            .sum()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create_records = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete_records = fail;
    }
}

pub async fn spawn_mock_api() -> MockApi {
    let state: Shared = Arc::new(Mutex::new(MockData::default()));
    let app = Router::new()
        .route("/api/persons", get(list_persons).post(create_person))
        .route("/api/persons/:id", put(rename_person).delete(delete_person))
        .route("/api/records", get(list_records).post(create_record))
        .route("/api/records/:id", delete(delete_record))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock api");
    let addr = listener.local_addr().expect("mock api addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock api");
    });

    MockApi {
        url: format!("http://{addr}"),
        state,
    }
}

pub fn temp_cache_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "quickrecord_{tag}_{}_{nanos}.json",
        std::process::id()
    ));
    path
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": message }))).into_response()
}

#[derive(Debug, Deserialize)]
struct NameForm {
    name: String,
}

async fn list_persons(State(state): State<Shared>) -> Json<Vec<PersonRow>> {
    Json(state.lock().unwrap().persons.clone())
}

async fn create_person(State(state): State<Shared>, Form(form): Form<NameForm>) -> Response {
    let mut data = state.lock().unwrap();
    if data.persons.iter().any(|person| person.name == form.name) {
        return detail(StatusCode::BAD_REQUEST, "Person already exists");
    }
    data.next_person_id += 1;
    let row = PersonRow {
        id: data.next_person_id,
        name: form.name,
    };
    data.persons.push(row.clone());
    Json(row).into_response()
}

async fn rename_person(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Form(form): Form<NameForm>,
) -> Response {
    let mut data = state.lock().unwrap();
    let Some(person) = data.persons.iter_mut().find(|person| person.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Person not found");
    };
    person.name = form.name;
    let row = person.clone();
    Json(row).into_response()
}

async fn delete_person(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = state.lock().unwrap();
    let Some(index) = data.persons.iter().position(|person| person.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Person not found");
    };
    let name = data.persons[index].name.clone();
    if data.records.iter().any(|record| record.person == name) {
        return detail(StatusCode::BAD_REQUEST, "Cannot delete a person with records");
    }
    data.persons.remove(index);
    Json(serde_json::json!({ "message": "Person deleted successfully" })).into_response()
}

#[derive(Debug, Deserialize)]
struct RecordParams {
    person: Option<String>,
    date: Option<String>,
    date_gte: Option<String>,
    date_lte: Option<String>,
    limit: Option<usize>,
    skip: Option<usize>,
}

async fn list_records(
    State(state): State<Shared>,
    Query(params): Query<RecordParams>,
) -> Json<Vec<RecordRow>> {
    let data = state.lock().unwrap();
    let mut rows: Vec<RecordRow> = data
        .records
        .iter()
        .filter(|record| {
            params
                .person
                .as_deref()
                .is_none_or(|person| record.person == person)
        })
        .filter(|record| params.date.as_deref().is_none_or(|date| record.date == date))
        .filter(|record| {
            params
                .date_gte
                .as_deref()
                .is_none_or(|date| record.date.as_str() >= date)
        })
        .filter(|record| {
            params
                .date_lte
                .as_deref()
                .is_none_or(|date| record.date.as_str() <= date)
        })
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(100);
    Json(rows.into_iter().skip(skip).take(limit).collect())
}

#[derive(Debug, Deserialize)]
struct NewRecordForm {
    date: String,
    person: String,
    count: i64,
    time: Option<String>,
}

async fn create_record(State(state): State<Shared>, Form(form): Form<NewRecordForm>) -> Response {
    let mut data = state.lock().unwrap();
    if data.fail_create_records {
        return (StatusCode::INTERNAL_SERVER_ERROR, "create disabled").into_response();
    }
    data.next_record_id += 1;
    let row = RecordRow {
        id: data.next_record_id,
        date: form.date,
        person: form.person,
        count: form.count,
        time: form.time,
    };
    data.records.push(row.clone());
    Json(row).into_response()
}

async fn delete_record(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = state.lock().unwrap();
    if data.fail_delete_records {
        return (StatusCode::INTERNAL_SERVER_ERROR, "delete disabled").into_response();
    }
    let before = data.records.len();
    data.records.retain(|record| record.id != id);
    if data.records.len() == before {
        return detail(StatusCode::NOT_FOUND, "Record not found");
    }
    Json(serde_json::json!({ "message": "Record deleted successfully" })).into_response()
}
