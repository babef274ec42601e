use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use futures_util::{stream, StreamExt};
use jokes_engine::{
    EngineConfig, FailureKind, FaultPolicy, FetchError, Joke, JokeFetchPort, JokesEngine,
    PageStream, ProgressEvents, ProgressSignal, Query, RandomJokeFetchPort, ScreenState,
    UnhandledFailure,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jokes_logging::initialize_for_tests);
}

type PageResult = Result<Vec<Joke>, FetchError>;

/// Hands out one pre-built stream per `fetch_pages` call, in order.
#[derive(Default)]
struct QueuedPages {
    streams: Mutex<VecDeque<PageStream>>,
    queries: Mutex<Vec<String>>,
    /// When set, records the progress signals already emitted at fetch time.
    probe: Mutex<Option<ProgressEvents>>,
    seen_at_fetch: Mutex<Vec<ProgressSignal>>,
}

impl QueuedPages {
    fn push(&self, pages: Vec<PageResult>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(stream::iter(pages).boxed());
    }

    /// Pages are delivered only when the test sends them.
    fn push_gated(&self) -> mpsc::UnboundedSender<PageResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        let pages = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|page| (page, rx))
        });
        self.streams.lock().unwrap().push_back(pages.boxed());
        tx
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl JokeFetchPort for QueuedPages {
    fn fetch_pages(&self, query: &Query) -> PageStream {
        self.queries.lock().unwrap().push(query.as_str().to_string());
        if let Some(events) = self.probe.lock().unwrap().as_mut() {
            self.seen_at_fetch.lock().unwrap().extend(events.drain());
        }
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| stream::empty().boxed())
    }
}

struct NoRandom;

#[async_trait::async_trait]
impl RandomJokeFetchPort for NoRandom {
    async fn fetch_random(&self, _count: usize) -> Result<Vec<Joke>, FetchError> {
        Err(FetchError::new(FailureKind::Other, "not used"))
    }
}

fn engine_with(
    pages: Arc<QueuedPages>,
    fault_policy: FaultPolicy,
) -> (Arc<JokesEngine>, ProgressEvents) {
    let config = EngineConfig {
        fault_policy,
        ..EngineConfig::default()
    };
    let (engine, events) = JokesEngine::new(pages, Arc::new(NoRandom), config);
    (Arc::new(engine), events)
}

fn joke(id: &str) -> Joke {
    Joke::new(id, format!("joke {id}"))
}

fn page(ids: &[&str]) -> Vec<Joke> {
    ids.iter().map(|id| joke(id)).collect()
}

fn query(text: &str) -> Query {
    Query::new(text).unwrap()
}

fn shown_ids(engine: &JokesEngine) -> Vec<String> {
    engine
        .current_state()
        .expect("a state was published")
        .jokes()
        .iter()
        .map(|view| view.id.clone())
        .collect()
}

fn network_failure() -> FetchError {
    FetchError::new(FailureKind::Network, "connection refused")
}

async fn next_signal(events: &mut ProgressEvents) -> ProgressSignal {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("progress signal in time")
        .expect("store alive")
}

#[tokio::test]
async fn search_aggregates_pages_most_recent_first() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![
        Ok(page(&["a1", "a2"])),
        Ok(page(&["b1"])),
        Ok(page(&["c1", "c2"])),
    ]);
    let (engine, mut events) = engine_with(pages.clone(), FaultPolicy::Propagate);

    engine.search(query("kick")).await.unwrap();

    assert_eq!(shown_ids(&engine), vec!["c1", "c2", "b1", "a1", "a2"]);
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
    assert_eq!(pages.queries(), vec!["kick"]);
}

#[tokio::test]
async fn show_is_emitted_before_the_first_fetch() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Ok(page(&["a"]))]);
    let (engine, events) = engine_with(pages.clone(), FaultPolicy::Propagate);
    *pages.probe.lock().unwrap() = Some(events);

    engine.search(query("kick")).await.unwrap();

    assert_eq!(
        *pages.seen_at_fetch.lock().unwrap(),
        vec![ProgressSignal::Show]
    );
}

#[tokio::test]
async fn search_overwrites_last_query_regardless_of_outcome() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Ok(page(&["a"]))]);
    pages.push(vec![Err(FetchError::new(FailureKind::HttpStatus(500), "boom"))]);
    pages.push(vec![Err(FetchError::new(FailureKind::InvalidResponse, "bad"))]);
    let (engine, _events) = engine_with(pages, FaultPolicy::Propagate);
    assert_eq!(engine.last_query(), None);

    engine.search(query("first")).await.unwrap();
    assert_eq!(engine.last_query(), Some(query("first")));

    engine.search(query("second")).await.unwrap();
    assert_eq!(engine.last_query(), Some(query("second")));

    let _ = engine.search(query("third")).await;
    assert_eq!(engine.last_query(), Some(query("third")));
}

#[tokio::test]
async fn empty_first_page_ends_empty_with_single_hide() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Ok(Vec::new())]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("nothing")).await.unwrap();

    assert_eq!(engine.current_state(), Some(ScreenState::Empty));
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}

#[tokio::test]
async fn empty_first_page_then_transport_failure_is_network_error() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Ok(Vec::new()), Err(network_failure())]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("nothing")).await.unwrap();

    // Nothing was shown yet, so the failure is classified and replaces Empty.
    assert_eq!(engine.current_state(), Some(ScreenState::NetworkError));
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}

#[tokio::test]
async fn partial_success_survives_later_transport_failure() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let gate = pages.push_gated();
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);
    let mut states = engine.subscribe();

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.search(query("kick")).await }
    });
    assert_eq!(next_signal(&mut events).await, ProgressSignal::Show);

    gate.send(Ok(page(&["a"]))).unwrap();
    states.changed().await.unwrap();
    assert_eq!(next_signal(&mut events).await, ProgressSignal::Hide);

    gate.send(Err(network_failure())).unwrap();
    running.await.unwrap().unwrap();

    assert_eq!(shown_ids(&engine), vec!["a"]);
    assert!(!states.has_changed().unwrap());
    assert!(events.drain().is_empty());
}

#[tokio::test]
async fn first_transport_failure_is_network_error() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Err(network_failure())]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("offline")).await.unwrap();

    assert_eq!(engine.current_state(), Some(ScreenState::NetworkError));
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}

#[tokio::test]
async fn first_status_failure_is_http_error() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Err(FetchError::new(
        FailureKind::HttpStatus(503),
        "Service Unavailable",
    ))]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("down")).await.unwrap();

    assert_eq!(engine.current_state(), Some(ScreenState::HttpError));
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}

#[tokio::test]
async fn unclassified_failure_propagates_without_state() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let failure = FetchError::new(FailureKind::InvalidResponse, "expected value");
    pages.push(vec![Err(failure.clone())]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    let err = engine.search(query("weird")).await.unwrap_err();

    assert_eq!(
        err,
        UnhandledFailure {
            query: "weird".to_string(),
            source: failure,
        }
    );
    assert_eq!(engine.current_state(), None);
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}

#[tokio::test]
async fn unclassified_failure_is_logged_under_log_policy() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Err(FetchError::new(FailureKind::Other, "surprise"))]);
    let (engine, _events) = engine_with(pages, FaultPolicy::Log);

    engine.search(query("weird")).await.unwrap();

    assert_eq!(engine.current_state(), None);
}

#[tokio::test]
async fn unclassified_failure_after_partial_success_is_dropped() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![
        Ok(page(&["a"])),
        Err(FetchError::new(FailureKind::InvalidResponse, "bad")),
    ]);
    let (engine, _events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("kick")).await.unwrap();

    assert_eq!(shown_ids(&engine), vec!["a"]);
}

#[tokio::test]
async fn each_search_starts_from_a_fresh_aggregate() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Ok(page(&["a"]))]);
    pages.push(vec![Ok(page(&["b"]))]);
    let (engine, _events) = engine_with(pages, FaultPolicy::Propagate);

    engine.search(query("same")).await.unwrap();
    engine.search(query("same")).await.unwrap();

    assert_eq!(shown_ids(&engine), vec!["b"]);
}

#[tokio::test]
async fn retry_reuses_last_query() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    pages.push(vec![Err(network_failure())]);
    pages.push(vec![Ok(page(&["a"]))]);
    let (engine, _events) = engine_with(pages.clone(), FaultPolicy::Propagate);

    assert!(!engine.retry_last_search().await.unwrap());
    assert!(pages.queries().is_empty());

    engine.search(query("kick")).await.unwrap();
    assert_eq!(engine.current_state(), Some(ScreenState::NetworkError));

    assert!(engine.retry_last_search().await.unwrap());
    assert_eq!(pages.queries(), vec!["kick", "kick"]);
    assert_eq!(shown_ids(&engine), vec!["a"]);
}

#[tokio::test]
async fn newer_search_supersedes_running_one() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let stale_gate = pages.push_gated();
    pages.push(vec![Ok(page(&["fresh"]))]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    let stale = tokio::spawn({
        let engine = engine.clone();
        async move { engine.search(query("old")).await }
    });
    assert_eq!(next_signal(&mut events).await, ProgressSignal::Show);

    engine.search(query("new")).await.unwrap();
    stale.await.unwrap().unwrap();

    // Late pages for the superseded search go nowhere.
    let _ = stale_gate.send(Ok(page(&["stale"])));

    assert_eq!(shown_ids(&engine), vec!["fresh"]);
    assert_eq!(engine.last_query(), Some(query("new")));
    assert_eq!(
        events.drain(),
        vec![
            ProgressSignal::Hide,
            ProgressSignal::Show,
            ProgressSignal::Hide
        ]
    );
}

#[tokio::test]
async fn aborted_search_still_hides_progress() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let gate = pages.push_gated();
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.search(query("kick")).await }
    });
    assert_eq!(next_signal(&mut events).await, ProgressSignal::Show);

    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());

    assert_eq!(events.drain(), vec![ProgressSignal::Hide]);
    assert!(gate.send(Ok(page(&["late"]))).is_err());
    assert_eq!(engine.current_state(), None);
}

#[tokio::test]
async fn search_after_abort_does_not_hide_twice() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let _gate = pages.push_gated();
    pages.push(vec![Ok(page(&["a"]))]);
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    let running = tokio::spawn({
        let engine = engine.clone();
        async move { engine.search(query("slow")).await }
    });
    assert_eq!(next_signal(&mut events).await, ProgressSignal::Show);
    running.abort();
    let _ = running.await;

    engine.search(query("fast")).await.unwrap();

    assert_eq!(
        events.drain(),
        vec![
            ProgressSignal::Hide,
            ProgressSignal::Show,
            ProgressSignal::Hide
        ]
    );
    assert_eq!(shown_ids(&engine), vec!["a"]);
}

#[tokio::test]
async fn search_dropped_by_timeout_hides_progress() {
    init_logging();
    let pages = Arc::new(QueuedPages::default());
    let _gate = pages.push_gated();
    let (engine, mut events) = engine_with(pages, FaultPolicy::Propagate);

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), engine.search(query("kick"))).await;

    assert!(timed_out.is_err());
    assert_eq!(
        events.drain(),
        vec![ProgressSignal::Show, ProgressSignal::Hide]
    );
}
