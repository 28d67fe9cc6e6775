use crate::errors::{AppError, AppResult};
use crate::models::{NewRecord, Person, Record};
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ApiDetail {
    detail: String,
}

/// Query parameters for `GET /api/records`.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub person: Option<String>,
    pub date: Option<NaiveDate>,
    pub date_gte: Option<NaiveDate>,
    pub date_lte: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl RecordQuery {
    pub fn for_person_on(person: &str, date: NaiveDate) -> Self {
        Self {
            person: Some(person.to_string()),
            date: Some(date),
            ..Self::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(person) = &self.person {
            params.push(("person", person.clone()));
        }
        if let Some(date) = self.date {
            params.push(("date", date.to_string()));
        }
        if let Some(date_gte) = self.date_gte {
            params.push(("date_gte", date_gte.to_string()));
        }
        if let Some(date_lte) = self.date_lte {
            params.push(("date_lte", date_lte.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn persons(&self) -> AppResult<Vec<Person>> {
        let response = self
            .http
            .get(format!("{}/api/persons", self.base))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_person(&self, name: &str) -> AppResult<Person> {
        let response = self
            .http
            .post(format!("{}/api/persons", self.base))
            .form(&[("name", name)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn rename_person(&self, id: i64, name: &str) -> AppResult<Person> {
        let response = self
            .http
            .put(format!("{}/api/persons/{id}", self.base))
            .form(&[("name", name)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_person(&self, id: i64) -> AppResult<()> {
        let response = self
            .http
            .delete(format!("{}/api/persons/{id}", self.base))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn records(&self, query: &RecordQuery) -> AppResult<Vec<Record>> {
        let response = self
            .http
            .get(format!("{}/api/records", self.base))
            .query(&query.params())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_record(&self, record: &NewRecord) -> AppResult<Record> {
        let response = self
            .http
            .post(format!("{}/api/records", self.base))
            .form(record)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_record(&self, id: i64) -> AppResult<()> {
        let response = self
            .http
            .delete(format!("{}/api/records/{id}", self.base))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = match response.json::<ApiDetail>().await {
            Ok(body) => body.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(AppError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
