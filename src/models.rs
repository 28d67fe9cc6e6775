use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

/// A record as owned by the server; ids are never assigned client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub date: NaiveDate,
    pub person: String,
    pub count: i64,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

/// Form payload for `POST /api/records`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub person: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
}
