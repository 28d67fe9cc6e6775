use crate::api::{ApiClient, RecordQuery};
use crate::errors::{AppError, AppResult};
use crate::models::Record;
use crate::stats::{DailyTotal, PersonTotal, ReportStats, build_stats, daily_series, person_series};
use chrono::NaiveDate;

/// Cap on the statistics fetch; the table itself is paginated separately.
const STATS_FETCH_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub person: Option<String>,
    pub date_gte: Option<NaiveDate>,
    pub date_lte: Option<NaiveDate>,
}

impl ReportFilter {
    fn query(&self) -> RecordQuery {
        RecordQuery {
            person: self.person.clone(),
            date_gte: self.date_gte,
            date_lte: self.date_lte,
            ..RecordQuery::default()
        }
    }
}

/// One report session: filter, pagination state, the current table page,
/// and statistics/chart series computed over the whole filtered range.
/// Statistics come from an unbounded fetch and the table from a paginated
/// one, so the numbers cover the full range no matter the page size.
#[derive(Debug)]
pub struct ReportView {
    api: ApiClient,
    filter: ReportFilter,
    page: usize,
    page_size: usize,
    all_records: Vec<Record>,
    page_records: Vec<Record>,
    stats: ReportStats,
    daily: Vec<DailyTotal>,
    by_person: Vec<PersonTotal>,
}

impl ReportView {
    pub fn new(api: ApiClient, filter: ReportFilter, page_size: usize) -> Self {
        Self {
            api,
            filter,
            page: 1,
            page_size: page_size.max(1),
            all_records: Vec::new(),
            page_records: Vec::new(),
            stats: ReportStats::default(),
            daily: Vec::new(),
            by_person: Vec::new(),
        }
    }

    /// Reloads both halves of the report: the range-wide statistics fetch
    /// and the visible table page.
    pub async fn refresh(&mut self) -> AppResult<()> {
        self.page = 1;
        self.load_stats().await?;
        self.load_page().await
    }

    async fn load_stats(&mut self) -> AppResult<()> {
        let mut query = self.filter.query();
        query.limit = Some(STATS_FETCH_LIMIT);
        let records = self.api.records(&query).await?;
        self.apply_stats(records);
        Ok(())
    }

    async fn load_page(&mut self) -> AppResult<()> {
        let mut query = self.filter.query();
        query.limit = Some(self.page_size);
        let skip = (self.page - 1) * self.page_size;
        if skip > 0 {
            query.skip = Some(skip);
        }
        let mut records = self.api.records(&query).await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        self.page_records = records;
        Ok(())
    }

    fn apply_stats(&mut self, records: Vec<Record>) {
        self.stats = build_stats(&records);
        self.daily = daily_series(&records);
        self.by_person = person_series(&records);
        self.all_records = records;
    }

    pub fn filter(&self) -> &ReportFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_records(&self) -> usize {
        self.all_records.len()
    }

    pub fn total_pages(&self) -> usize {
        self.total_records().div_ceil(self.page_size)
    }

    /// 1-based positions of the first and last row on the current page.
    pub fn page_range(&self) -> (usize, usize) {
        if self.total_records() == 0 {
            return (0, 0);
        }
        let start = (self.page - 1) * self.page_size + 1;
        let end = (self.page * self.page_size).min(self.total_records());
        (start, end)
    }

    pub fn page_records(&self) -> &[Record] {
        &self.page_records
    }

    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }

    pub fn daily(&self) -> &[DailyTotal] {
        &self.daily
    }

    pub fn by_person(&self) -> &[PersonTotal] {
        &self.by_person
    }

    /// Moves to `page` and fetches its rows. Out-of-range requests are
    /// refused; returns whether the page changed.
    pub async fn set_page(&mut self, page: usize) -> AppResult<bool> {
        if page < 1 || page > self.total_pages() || page == self.page {
            return Ok(false);
        }
        self.page = page;
        self.load_page().await?;
        Ok(true)
    }

    pub async fn next_page(&mut self) -> AppResult<bool> {
        self.set_page(self.page + 1).await
    }

    pub async fn prev_page(&mut self) -> AppResult<bool> {
        if self.page <= 1 {
            return Ok(false);
        }
        self.set_page(self.page - 1).await
    }

    pub async fn set_page_size(&mut self, size: usize) -> AppResult<()> {
        if size == 0 {
            return Err(AppError::InvalidInput("page size must be positive".into()));
        }
        self.page_size = size;
        self.page = 1;
        self.load_page().await
    }

    /// Deletes the record on the server, drops it from the in-memory
    /// buffers, and recomputes statistics/series from what remains — no
    /// second statistics fetch. Returns the affected person's name so the
    /// caller can announce the removal to the reconciliation engine.
    pub async fn delete_record(&mut self, id: i64) -> AppResult<Option<String>> {
        self.api.delete_record(id).await?;

        let person = self
            .all_records
            .iter()
            .chain(self.page_records.iter())
            .find(|record| record.id == id)
            .map(|record| record.person.clone());

        self.page_records.retain(|record| record.id != id);
        let remaining: Vec<Record> = self
            .all_records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        self.apply_stats(remaining);

        let pages = self.total_pages();
        if pages > 0 && self.page > pages {
            self.page = pages;
            self.load_page().await?;
        }
        Ok(person)
    }
}
