//! Async driver for an autosuggest controller
//!
//! A picker is a single task that owns one controller and applies its
//! effects: the debounce timer and the lookups. Timer expiries and lookup
//! completions are posted back to the same event queue, so the controller
//! only ever sees one event at a time.

use super::controller::{
    AutosuggestController, ControllerOptions, Effect, Key, LookupRequest, NoopHost, PickerHost,
    PickerSnapshot, RequestToken,
};
use super::source::{Candidate, SuggestError, SuggestionSource};
use crate::metrics::LookupMetrics;
use crate::report::{ErrorReporter, TracingReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

enum PickerEvent {
    Input(String),
    Key(Key),
    Select(usize),
    Clear,
    DebounceFired(String),
    LookupDone {
        token: RequestToken,
        elapsed: Duration,
        result: Result<Vec<Candidate>, SuggestError>,
    },
    Shutdown,
}

/// Picker builder
pub struct Picker {
    source: Arc<dyn SuggestionSource>,
    options: ControllerOptions,
    host: Arc<dyn PickerHost>,
    reporter: Arc<dyn ErrorReporter>,
    metrics: Arc<LookupMetrics>,
}

impl Picker {
    pub fn new(source: Arc<dyn SuggestionSource>, options: ControllerOptions) -> Self {
        Self {
            source,
            options,
            host: Arc::new(NoopHost),
            reporter: Arc::new(TracingReporter),
            metrics: Arc::new(LookupMetrics::new()),
        }
    }

    pub fn with_host(mut self, host: Arc<dyn PickerHost>) -> Self {
        self.host = host;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<LookupMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Start the picker task
    ///
    /// The task ends on [`PickerHandle::shutdown`] or once every handle
    /// has been dropped.
    pub fn spawn(self) -> (PickerHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = AutosuggestController::new(
            self.source.name(),
            self.options,
            self.host,
            self.reporter,
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let worker = PickerWorker {
            controller,
            source: self.source,
            metrics: self.metrics,
            events: events_tx.downgrade(),
            snapshot: snapshot_tx,
            timer: None,
        };
        let task = tokio::spawn(worker.run(events_rx));

        let handle = PickerHandle {
            events: events_tx,
            snapshot: snapshot_rx,
        };
        (handle, task)
    }
}

/// Host-side handle to a running picker
#[derive(Clone)]
pub struct PickerHandle {
    events: mpsc::UnboundedSender<PickerEvent>,
    snapshot: watch::Receiver<PickerSnapshot>,
}

impl PickerHandle {
    /// Returns false once the picker has stopped
    pub fn input(&self, text: impl Into<String>) -> bool {
        self.send(PickerEvent::Input(text.into()))
    }

    pub fn key(&self, key: Key) -> bool {
        self.send(PickerEvent::Key(key))
    }

    /// Pointer selection of the candidate at `index`
    pub fn select(&self, index: usize) -> bool {
        self.send(PickerEvent::Select(index))
    }

    pub fn clear(&self) -> bool {
        self.send(PickerEvent::Clear)
    }

    pub fn shutdown(&self) -> bool {
        self.send(PickerEvent::Shutdown)
    }

    /// Latest published state
    pub fn snapshot(&self) -> PickerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next state change; `None` once the picker has stopped
    pub async fn changed(&mut self) -> Option<PickerSnapshot> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }

    fn send(&self, event: PickerEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

struct PickerWorker {
    controller: AutosuggestController,
    source: Arc<dyn SuggestionSource>,
    metrics: Arc<LookupMetrics>,
    events: mpsc::WeakUnboundedSender<PickerEvent>,
    snapshot: watch::Sender<PickerSnapshot>,
    timer: Option<JoinHandle<()>>,
}

impl PickerWorker {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<PickerEvent>) {
        info!(source = %self.source.name(), "picker started");

        while let Some(event) = events.recv().await {
            if matches!(event, PickerEvent::Shutdown) {
                break;
            }
            self.handle_event(event);
            self.publish();
        }

        self.cancel_timer();
        info!(source = %self.source.name(), "picker stopped");
    }

    fn handle_event(&mut self, event: PickerEvent) {
        match event {
            PickerEvent::Input(text) => {
                let effect = self.controller.on_input_changed(text);
                self.apply(effect);
            }
            PickerEvent::Key(key) => {
                if let Some(effect) = self.controller.on_key(key) {
                    self.apply(effect);
                }
            }
            PickerEvent::Select(index) => {
                self.controller.on_select(index);
            }
            PickerEvent::Clear => {
                let effect = self.controller.on_clear();
                self.apply(effect);
            }
            PickerEvent::DebounceFired(query) => {
                if let Some(effect) = self.controller.on_debounce_fired(&query) {
                    self.apply(effect);
                }
            }
            PickerEvent::LookupDone {
                token,
                elapsed,
                result,
            } => self.complete(token, elapsed, result),
            PickerEvent::Shutdown => {}
        }
    }

    fn complete(
        &mut self,
        token: RequestToken,
        elapsed: Duration,
        result: Result<Vec<Candidate>, SuggestError>,
    ) {
        let source = self.source.name().to_string();
        self.metrics.record_response_time(&source, elapsed.as_millis() as u64);

        let failed = result.is_err();
        let applied = match result {
            Ok(candidates) => self.controller.on_lookup_result(token, candidates),
            Err(error) => self.controller.on_lookup_failed(token, error),
        };

        match (applied, failed) {
            (false, _) => self.metrics.record_stale(&source),
            (true, false) => self.metrics.record_accepted(&source),
            (true, true) => self.metrics.record_failure(&source),
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ArmTimer { query, delay } => self.arm_timer(query, delay),
            Effect::CancelTimer => self.cancel_timer(),
            Effect::Lookup(request) => self.dispatch(request),
        }
    }

    fn arm_timer(&mut self, query: String, delay: Duration) {
        self.cancel_timer();
        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = events.upgrade() {
                let _ = tx.send(PickerEvent::DebounceFired(query));
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn dispatch(&mut self, request: LookupRequest) {
        self.metrics.record_dispatch(self.source.name());
        debug!(
            source = %self.source.name(),
            token = request.token.value(),
            "spawning lookup"
        );

        let source = self.source.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = source.lookup(&request.query, request.limit).await;
            let event = PickerEvent::LookupDone {
                token: request.token,
                elapsed: started.elapsed(),
                result,
            };
            if let Some(tx) = events.upgrade() {
                let _ = tx.send(event);
            }
        });
    }

    fn publish(&self) {
        let next = self.controller.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
