use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use jokes_core::{
    update, Effect, FetchError, JokeViewMapper, Msg, ProgressSignal, Query, ScreenState,
    SearchCycle,
};
use jokes_logging::{jokes_debug, jokes_error, jokes_info, jokes_trace, jokes_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::fetch::ReqwestJokeFetcher;
use crate::ports::{JokeFetchPort, RandomJokeFetchPort};
use crate::store::{ProgressEvents, ScreenStateStore, ScreenStateWatch};

pub const DEFAULT_RANDOM_COUNT: usize = 10;

/// What happens to failures that have no screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Return them from [`JokesEngine::search`] as [`UnhandledFailure`].
    Propagate,
    /// Log at error level and carry on.
    Log,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            FaultPolicy::Propagate
        } else {
            FaultPolicy::Log
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fault_policy: FaultPolicy,
    pub random_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::default(),
            random_count: DEFAULT_RANDOM_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unhandled failure while searching for {query:?}: {source}")]
pub struct UnhandledFailure {
    pub query: String,
    pub source: FetchError,
}

type CycleId = u64;

struct ActiveCycle {
    id: CycleId,
    token: CancellationToken,
    progress_visible: bool,
}

/// Per-engine mutable context. Everything here is overwritten, never merged.
#[derive(Default)]
struct Session {
    last_query: Option<Query>,
    active: Option<ActiveCycle>,
    next_id: CycleId,
}

impl Session {
    fn set_progress(&mut self, id: CycleId, visible: bool) {
        if let Some(active) = self.active.as_mut().filter(|active| active.id == id) {
            active.progress_visible = visible;
        }
    }
}

/// Registration of a running search. Dropping it ends the cycle, including when
/// the `search` future itself is dropped before finishing.
struct CycleHandle<'a> {
    engine: &'a JokesEngine,
    id: CycleId,
    token: CancellationToken,
}

impl Drop for CycleHandle<'_> {
    fn drop(&mut self) {
        self.engine.end_cycle(self.id);
    }
}

/// Drives joke sources and folds their results into the screen-state store.
pub struct JokesEngine {
    pages: Arc<dyn JokeFetchPort>,
    random: Arc<dyn RandomJokeFetchPort>,
    store: ScreenStateStore,
    session: Mutex<Session>,
    config: EngineConfig,
}

impl JokesEngine {
    pub fn new(
        pages: Arc<dyn JokeFetchPort>,
        random: Arc<dyn RandomJokeFetchPort>,
        config: EngineConfig,
    ) -> (Self, ProgressEvents) {
        let (store, progress) = ScreenStateStore::new();
        let engine = Self {
            pages,
            random,
            store,
            session: Mutex::new(Session::default()),
            config,
        };
        (engine, progress)
    }

    /// Engine backed by one HTTP fetcher for both searches and random batches.
    pub fn with_fetcher(fetcher: ReqwestJokeFetcher, config: EngineConfig) -> (Self, ProgressEvents) {
        let fetcher = Arc::new(fetcher);
        Self::new(fetcher.clone(), fetcher, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn last_query(&self) -> Option<Query> {
        self.lock_session().last_query.clone()
    }

    pub fn current_state(&self) -> Option<ScreenState> {
        self.store.current()
    }

    pub fn subscribe(&self) -> ScreenStateWatch {
        self.store.subscribe()
    }

    /// Runs one search cycle to completion.
    ///
    /// Pages are folded in delivery order, most recent page first. Classified
    /// failures become screen states only while nothing has been shown. A newer
    /// search supersedes this one; the superseded cycle stops publishing.
    pub async fn search(&self, query: Query) -> Result<(), UnhandledFailure> {
        let mut escalated = None;
        let (handle, mut cycle) = self.begin_cycle(&query, &mut escalated);

        let mut pages = self.pages.fetch_pages(&query);
        loop {
            let msg = tokio::select! {
                biased;
                _ = handle.token.cancelled() => {
                    jokes_info!("search cycle {} cancelled", handle.id);
                    Msg::Cancelled
                }
                next = pages.next() => match next {
                    Some(Ok(page)) => {
                        jokes_debug!(
                            "search cycle {} received page {} with {} jokes",
                            handle.id,
                            cycle.pages_received() + 1,
                            page.len()
                        );
                        Msg::PageReceived(page)
                    }
                    Some(Err(err)) => {
                        if !cycle.is_empty() {
                            jokes_warn!(
                                "search cycle {} keeps {} jokes after failure: {}",
                                handle.id,
                                cycle.jokes().len(),
                                err
                            );
                        }
                        Msg::Failed(err)
                    }
                    None => Msg::Completed,
                },
            };

            let terminal = msg.is_terminal();
            cycle = self.apply(cycle, msg, &handle, &mut escalated);
            if terminal {
                break;
            }
        }

        jokes_debug!(
            "search cycle {} finished with {} jokes",
            handle.id,
            cycle.jokes().len()
        );
        drop(handle);

        match escalated {
            Some(source) => self.escalate(query, source),
            None => Ok(()),
        }
    }

    /// Re-runs the most recent search. Returns `Ok(false)` when there is none.
    pub async fn retry_last_search(&self) -> Result<bool, UnhandledFailure> {
        let Some(query) = self.last_query() else {
            return Ok(false);
        };
        self.search(query).await?;
        Ok(true)
    }

    /// Publishes one random batch as-is. Failures go straight back to the caller.
    pub async fn retrieve_random(&self, count: usize) -> Result<(), FetchError> {
        jokes_info!("retrieving {} random jokes", count);
        let jokes = self.random.fetch_random(count).await?;
        self.store
            .publish(ScreenState::Result(JokeViewMapper::to_views(&jokes)));
        Ok(())
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new cycle and shows progress for it in one step, so a
    /// concurrent search can never slip between the two.
    fn begin_cycle(
        &self,
        query: &Query,
        escalated: &mut Option<FetchError>,
    ) -> (CycleHandle<'_>, SearchCycle) {
        let mut session = self.lock_session();
        session.last_query = Some(query.clone());

        if let Some(previous) = session.active.take() {
            jokes_info!("search cycle {} superseded", previous.id);
            previous.token.cancel();
            if previous.progress_visible {
                self.store.emit(ProgressSignal::Hide);
            }
        }

        let id = session.next_id;
        session.next_id += 1;
        let token = CancellationToken::new();
        session.active = Some(ActiveCycle {
            id,
            token: token.clone(),
            progress_visible: false,
        });
        jokes_info!("search cycle {} started for {:?}", id, query.as_str());

        let handle = CycleHandle {
            engine: self,
            id,
            token,
        };
        let (cycle, effects) = update(SearchCycle::new(query.clone()), Msg::Started);
        self.run_effects(&mut session, &handle, effects, escalated);
        (handle, cycle)
    }

    fn apply(
        &self,
        cycle: SearchCycle,
        msg: Msg,
        handle: &CycleHandle<'_>,
        escalated: &mut Option<FetchError>,
    ) -> SearchCycle {
        let (cycle, effects) = update(cycle, msg);
        let mut session = self.lock_session();
        self.run_effects(&mut session, handle, effects, escalated);
        cycle
    }

    fn run_effects(
        &self,
        session: &mut Session,
        handle: &CycleHandle<'_>,
        effects: Vec<Effect>,
        escalated: &mut Option<FetchError>,
    ) {
        // Cancellation happens under the session lock, so this check cannot go stale.
        let superseded = handle.token.is_cancelled();
        for effect in effects {
            match effect {
                Effect::Escalate(err) => *escalated = Some(err),
                effect if superseded => {
                    jokes_trace!("search cycle {} dropped {:?}", handle.id, effect);
                }
                Effect::ShowProgress => {
                    session.set_progress(handle.id, true);
                    self.store.emit(ProgressSignal::Show);
                }
                Effect::HideProgress => {
                    session.set_progress(handle.id, false);
                    self.store.emit(ProgressSignal::Hide);
                }
                Effect::Publish(state) => self.store.publish(state),
            }
        }
    }

    /// Clears the active cycle if it is still `id`, hiding progress it left shown.
    fn end_cycle(&self, id: CycleId) {
        let mut session = self.lock_session();
        if !session
            .active
            .as_ref()
            .is_some_and(|active| active.id == id)
        {
            return;
        }
        if let Some(active) = session.active.take() {
            if active.progress_visible {
                jokes_info!("search cycle {} abandoned while loading", id);
                self.store.emit(ProgressSignal::Hide);
            }
        }
    }

    fn escalate(&self, query: Query, source: FetchError) -> Result<(), UnhandledFailure> {
        match self.config.fault_policy {
            FaultPolicy::Propagate => {
                jokes_debug!("escalating failure for {:?}: {}", query.as_str(), source);
                Err(UnhandledFailure {
                    query: query.as_str().to_string(),
                    source,
                })
            }
            FaultPolicy::Log => {
                jokes_error!(
                    "unhandled failure while searching for {:?}: {}",
                    query.as_str(),
                    source
                );
                Ok(())
            }
        }
    }
}
