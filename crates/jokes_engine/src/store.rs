use jokes_core::{ProgressSignal, ScreenState};
use tokio::sync::{mpsc, watch};

/// Receiver side of the screen state. `None` until the first state is published.
pub type ScreenStateWatch = watch::Receiver<Option<ScreenState>>;

/// Single source of truth for the presentation layer.
///
/// The screen state has replace-on-write semantics: observers only ever see the
/// latest value. Progress signals are discrete events, each delivered once.
#[derive(Debug)]
pub struct ScreenStateStore {
    state: watch::Sender<Option<ScreenState>>,
    progress: mpsc::UnboundedSender<ProgressSignal>,
}

impl ScreenStateStore {
    pub fn new() -> (Self, ProgressEvents) {
        let (state, _) = watch::channel(None);
        let (progress, rx) = mpsc::unbounded_channel();
        (Self { state, progress }, ProgressEvents { rx })
    }

    pub fn publish(&self, state: ScreenState) {
        self.state.send_replace(Some(state));
    }

    pub fn current(&self) -> Option<ScreenState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> ScreenStateWatch {
        self.state.subscribe()
    }

    pub fn emit(&self, signal: ProgressSignal) {
        // Nobody listening is fine; the signal is transient.
        let _ = self.progress.send(signal);
    }
}

/// Consumer side of the progress channel.
#[derive(Debug)]
pub struct ProgressEvents {
    rx: mpsc::UnboundedReceiver<ProgressSignal>,
}

impl ProgressEvents {
    /// Waits for the next signal. Returns `None` once the store is dropped.
    pub async fn recv(&mut self) -> Option<ProgressSignal> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressSignal> {
        self.rx.try_recv().ok()
    }

    /// Takes every signal emitted so far.
    pub fn drain(&mut self) -> Vec<ProgressSignal> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
