use crate::api::{ApiClient, RecordQuery};
use crate::cache::CounterCache;
use crate::clock::RefClock;
use crate::errors::{AppError, AppResult};
use crate::models::NewRecord;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    Idle,
    /// Displayed value changed locally, network request in flight.
    OptimisticallyUpdated,
    /// A correcting fetch for this counter is in flight.
    Reconciling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterHandle {
    pub displayed: u32,
    pub state: CounterState,
}

impl Default for CounterHandle {
    fn default() -> Self {
        Self {
            displayed: 0,
            state: CounterState::Idle,
        }
    }
}

/// View-model for the quick-record panel: one handle per tracked person,
/// addressed by name instead of reconstructed element ids.
#[derive(Debug, Default)]
pub struct CounterBoard {
    counters: BTreeMap<String, CounterHandle>,
}

impl CounterBoard {
    pub fn track(&mut self, person: &str) {
        self.counters.entry(person.to_string()).or_default();
    }

    /// Drops persons that are no longer on the server.
    pub fn retain_named(&mut self, names: &[String]) {
        self.counters.retain(|name, _| names.contains(name));
    }

    pub fn get(&self, person: &str) -> Option<&CounterHandle> {
        self.counters.get(person)
    }

    pub fn persons(&self) -> Vec<String> {
        self.counters.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<(String, CounterHandle)> {
        self.counters
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect()
    }

    fn update(&mut self, person: &str, displayed: u32, state: CounterState) {
        let handle = self.counters.entry(person.to_string()).or_default();
        handle.displayed = displayed;
        handle.state = state;
    }

    fn set_state(&mut self, person: &str, state: CounterState) {
        if let Some(handle) = self.counters.get_mut(person) {
            handle.state = state;
        }
    }
}

/// Emitted by mutation-performing operations; consumed by the reconciler
/// task, which answers with a full resync of the named counter.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// A quick action changed this person's records on the server.
    Mutated { person: String },
    /// A record for this person was removed from another view.
    Removed { person: String },
}

impl RecordEvent {
    fn person(self) -> String {
        match self {
            RecordEvent::Mutated { person } | RecordEvent::Removed { person } => person,
        }
    }
}

/// What a quick increment/decrement settled into; `count` is the counter
/// value shown after the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickOutcome {
    /// Counter already at zero; nothing was sent.
    AtFloor,
    Added { person: String, count: u32 },
    Deleted { person: String, count: u32 },
    /// The counter was ahead of the server; compensated back up.
    NothingToDelete { person: String, count: u32 },
    /// The mutation failed and the counter was rolled back.
    Failed { person: String, count: u32, detail: String },
}

#[derive(Debug)]
struct EngineInner {
    cache: CounterCache,
    board: CounterBoard,
}

impl EngineInner {
    async fn persist(&self) {
        if let Err(err) = self.cache.persist().await {
            warn!("failed to persist counter cache: {err}");
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    api: ApiClient,
    clock: RefClock,
    inner: Arc<Mutex<EngineInner>>,
    events: mpsc::UnboundedSender<RecordEvent>,
    resync_delay: Duration,
}

impl Engine {
    pub fn new(
        api: ApiClient,
        clock: RefClock,
        cache: CounterCache,
        resync_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<RecordEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            api,
            clock,
            inner: Arc::new(Mutex::new(EngineInner {
                cache,
                board: CounterBoard::default(),
            })),
            events,
            resync_delay,
        };
        (engine, receiver)
    }

    pub fn clock(&self) -> RefClock {
        self.clock
    }

    /// Optimistic `+1`: bump cache and display, create the record, roll
    /// back if the server rejects it.
    pub async fn increment(&self, person: &str) -> QuickOutcome {
        let today = self.clock.today();
        let (previous, bumped) = {
            let mut inner = self.inner.lock().await;
            let previous = inner.cache.count(today, person);
            let bumped = previous.saturating_add(1);
            inner.cache.set_count(today, person, bumped);
            inner
                .board
                .update(person, bumped, CounterState::OptimisticallyUpdated);
            inner.persist().await;
            (previous, bumped)
        };

        let record = NewRecord {
            date: today,
            person: person.to_string(),
            count: 1,
            time: Some(self.clock.time()),
        };
        match self.api.create_record(&record).await {
            Ok(_) => {
                self.settle(person, bumped).await;
                self.emit(RecordEvent::Mutated {
                    person: person.to_string(),
                });
                QuickOutcome::Added {
                    person: person.to_string(),
                    count: bumped,
                }
            }
            Err(err) => self.roll_back(today, person, previous, err).await,
        }
    }

    /// Optimistic `-1`: decrementing maps to "delete the most recent
    /// record for this person today", so it takes two round trips
    /// (lookup-latest, then delete) and every failure path restores the
    /// pre-action value.
    pub async fn decrement(&self, person: &str) -> QuickOutcome {
        let today = self.clock.today();
        let previous = {
            let mut inner = self.inner.lock().await;
            let previous = inner.cache.count(today, person);
            if previous == 0 {
                return QuickOutcome::AtFloor;
            }
            inner.cache.set_count(today, person, previous - 1);
            inner
                .board
                .update(person, previous - 1, CounterState::OptimisticallyUpdated);
            inner.persist().await;
            previous
        };

        let mut query = RecordQuery::for_person_on(person, today);
        query.limit = Some(1);
        let latest = match self.api.records(&query).await {
            Ok(records) => records.into_iter().next(),
            Err(err) => return self.roll_back(today, person, previous, err).await,
        };

        let Some(latest) = latest else {
            // Counter claimed more than the server holds; put the unit
            // back so cache and reality stay aligned.
            self.restore(today, person, previous).await;
            return QuickOutcome::NothingToDelete {
                person: person.to_string(),
                count: previous,
            };
        };

        match self.api.delete_record(latest.id).await {
            Ok(()) => {
                self.settle(person, previous - 1).await;
                self.emit(RecordEvent::Mutated {
                    person: person.to_string(),
                });
                QuickOutcome::Deleted {
                    person: person.to_string(),
                    count: previous - 1,
                }
            }
            Err(err) => self.roll_back(today, person, previous, err).await,
        }
    }

    /// Full resync: overwrite cache and display with the authoritative
    /// sum of today's records. The overwrite only happens on a fully
    /// successful fetch.
    pub async fn resync_person(&self, person: &str) -> AppResult<u32> {
        let today = self.clock.today();
        {
            let mut inner = self.inner.lock().await;
            inner.board.set_state(person, CounterState::Reconciling);
        }

        let fetched = self
            .api
            .records(&RecordQuery::for_person_on(person, today))
            .await;

        let mut inner = self.inner.lock().await;
        match fetched {
            Ok(records) => {
                let total = records
                    .iter()
                    .map(|record| record.count)
                    .sum::<i64>()
                    .max(0) as u32;
                inner.cache.set_count(today, person, total);
                inner.board.update(person, total, CounterState::Idle);
                inner.persist().await;
                Ok(total)
            }
            Err(err) => {
                inner.board.set_state(person, CounterState::Idle);
                Err(err)
            }
        }
    }

    pub async fn resync_all(&self) {
        let persons = {
            let inner = self.inner.lock().await;
            inner.board.persons()
        };
        for person in persons {
            if let Err(err) = self.resync_person(&person).await {
                warn!("resync for {person} failed: {err}");
            }
        }
    }

    /// Page-load equivalent: fetch the person list, track each person on
    /// the board, and bring every counter up to the server truth.
    pub async fn refresh_persons(&self) -> AppResult<Vec<String>> {
        let persons = self.api.persons().await?;
        let names: Vec<String> = persons.into_iter().map(|person| person.name).collect();
        {
            let mut inner = self.inner.lock().await;
            inner.board.retain_named(&names);
            for name in &names {
                inner.board.track(name);
            }
        }
        for name in &names {
            if let Err(err) = self.resync_person(name).await {
                warn!("initial sync for {name} failed: {err}");
            }
        }
        Ok(names)
    }

    /// Sweeps stale counters out of the cache; safe to call repeatedly.
    pub async fn purge_stale(&self) {
        let today = self.clock.today();
        let mut inner = self.inner.lock().await;
        if inner.cache.purge_stale(today) {
            inner.persist().await;
            info!("daily counters reset for {today}");
        }
    }

    /// Midnight rollover: purge yesterday's counters, then resync every
    /// tracked counter from the server of record.
    pub async fn rollover(&self) {
        self.purge_stale().await;
        self.resync_all().await;
    }

    /// Tells the engine that a record was removed by another view, so the
    /// affected counter gets reconciled.
    pub fn record_removed(&self, person: &str) {
        self.emit(RecordEvent::Removed {
            person: person.to_string(),
        });
    }

    pub async fn board_snapshot(&self) -> Vec<(String, CounterHandle)> {
        self.inner.lock().await.board.snapshot()
    }

    pub async fn displayed(&self, person: &str) -> Option<u32> {
        self.inner
            .lock()
            .await
            .board
            .get(person)
            .map(|handle| handle.displayed)
    }

    pub async fn cached(&self, person: &str) -> u32 {
        let today = self.clock.today();
        self.inner.lock().await.cache.count(today, person)
    }

    fn emit(&self, event: RecordEvent) {
        // Receiver may be gone during shutdown; nothing left to correct.
        let _ = self.events.send(event);
    }

    async fn settle(&self, person: &str, value: u32) {
        let mut inner = self.inner.lock().await;
        inner.board.update(person, value, CounterState::Idle);
    }

    async fn restore(&self, date: NaiveDate, person: &str, value: u32) {
        let mut inner = self.inner.lock().await;
        inner.cache.set_count(date, person, value);
        inner.board.update(person, value, CounterState::Idle);
        inner.persist().await;
    }

    async fn roll_back(
        &self,
        date: NaiveDate,
        person: &str,
        value: u32,
        err: AppError,
    ) -> QuickOutcome {
        self.restore(date, person, value).await;
        QuickOutcome::Failed {
            person: person.to_string(),
            count: value,
            detail: err.to_string(),
        }
    }
}

/// Runs the reconciliation loop: waits for record events, debounces by a
/// short delay so click bursts collapse, then resyncs each affected
/// counter. Failed cycles are logged and abandoned; the next event tries
/// again.
pub fn spawn_reconciler(
    engine: Engine,
    mut events: mpsc::UnboundedReceiver<RecordEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tokio::time::sleep(engine.resync_delay).await;
            let mut pending = BTreeSet::new();
            pending.insert(event.person());
            while let Ok(event) = events.try_recv() {
                pending.insert(event.person());
            }
            for person in pending {
                if let Err(err) = engine.resync_person(&person).await {
                    warn!("reconciliation for {person} failed: {err}");
                }
            }
        }
    })
}
