//! Autosuggest state machine
//!
//! The controller performs no I/O. Operations that need a timer or a
//! lookup return an [`Effect`] for the driver to carry out; completions
//! come back through [`AutosuggestController::on_lookup_result`] and
//! [`AutosuggestController::on_lookup_failed`] tagged with the token they
//! were dispatched under.

use super::source::{Candidate, SuggestError};
use crate::report::ErrorReporter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Identifier minted for each dispatched lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Interaction state, owned exclusively by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    /// Nothing typed, nothing selected
    Empty,
    /// Waiting for the debounce timer armed for `query`
    Pending { query: String },
    /// Lookup for `query` in flight under `token`
    Fetching { query: String, token: RequestToken },
    /// Candidates for `query` are browsable
    Open {
        query: String,
        candidates: Vec<Candidate>,
        highlighted: Option<usize>,
    },
    /// A candidate has been selected
    Committed(Candidate),
}

/// Highlight movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Keyboard events routed from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

/// Value reported to the parent form
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    Selected(Candidate),
    Cleared,
}

/// Lookup the driver must dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    pub token: RequestToken,
    pub query: String,
    pub limit: usize,
}

/// Side effect requested from the driver
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Cancel any armed timer and arm a new one for `query`
    ArmTimer { query: String, delay: Duration },
    /// Cancel any armed timer
    CancelTimer,
    /// Call the suggestion source
    Lookup(LookupRequest),
}

/// Read-only view for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PickerSnapshot {
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub highlighted: Option<usize>,
    pub committed: Option<Candidate>,
    pub loading: bool,
}

impl PickerSnapshot {
    /// Labels of the visible candidates
    pub fn labels(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.label.as_str()).collect()
    }
}

/// Render-layer callbacks
pub trait PickerHost: Send + Sync {
    /// Visible state changed
    fn render(&self, _snapshot: &PickerSnapshot) {}

    /// Committed value changed
    fn selection_changed(&self, _change: &SelectionChange) {}
}

/// Host that ignores every notification
pub struct NoopHost;

impl PickerHost for NoopHost {}

/// Construction-time tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Quiet period after the last keystroke
    pub debounce: Duration,
    /// Page size passed to the source
    pub limit: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(crate::DEFAULT_DEBOUNCE_MS),
            limit: crate::DEFAULT_LIMIT,
        }
    }
}

/// Typeahead controller for one picker
pub struct AutosuggestController {
    source_name: String,
    options: ControllerOptions,
    state: SelectionState,
    last_token: u64,
    host: Arc<dyn PickerHost>,
    reporter: Arc<dyn ErrorReporter>,
}

impl AutosuggestController {
    pub fn new(
        source_name: impl Into<String>,
        options: ControllerOptions,
        host: Arc<dyn PickerHost>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            options,
            state: SelectionState::Empty,
            last_token: 0,
            host,
            reporter,
        }
    }

    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Most recently minted token, if any lookup was dispatched
    pub fn last_token(&self) -> Option<RequestToken> {
        (self.last_token > 0).then_some(RequestToken(self.last_token))
    }

    /// New text typed; always rearms the debounce timer
    pub fn on_input_changed(&mut self, text: impl Into<String>) -> Effect {
        let query = text.into();
        let was_committed = matches!(self.state, SelectionState::Committed(_));

        trace!(source = %self.source_name, query = %query, "input changed");
        self.state = SelectionState::Pending {
            query: query.clone(),
        };

        if was_committed {
            self.host.selection_changed(&SelectionChange::Cleared);
        }
        self.notify_render();

        Effect::ArmTimer {
            query,
            delay: self.options.debounce,
        }
    }

    /// Debounce timer armed for `query` expired
    pub fn on_debounce_fired(&mut self, query: &str) -> Option<Effect> {
        let pending = match &self.state {
            SelectionState::Pending { query: pending } if pending == query => pending.clone(),
            _ => return None,
        };

        self.last_token += 1;
        let token = RequestToken(self.last_token);
        debug!(
            source = %self.source_name,
            token = token.value(),
            query = %pending,
            "dispatching lookup"
        );

        self.state = SelectionState::Fetching {
            query: pending.clone(),
            token,
        };
        self.notify_render();

        Some(Effect::Lookup(LookupRequest {
            token,
            query: pending,
            limit: self.options.limit,
        }))
    }

    /// Returns the query awaiting `token`, if the token is still current
    fn awaiting(&self, token: RequestToken) -> Option<String> {
        if token.value() != self.last_token {
            return None;
        }
        match &self.state {
            SelectionState::Fetching { query, token: t } if *t == token => Some(query.clone()),
            _ => None,
        }
    }

    /// Lookup completed; returns false when the response was stale
    pub fn on_lookup_result(&mut self, token: RequestToken, candidates: Vec<Candidate>) -> bool {
        let Some(query) = self.awaiting(token) else {
            trace!(source = %self.source_name, token = token.value(), "discarding stale response");
            return false;
        };

        debug!(
            source = %self.source_name,
            token = token.value(),
            count = candidates.len(),
            "lookup accepted"
        );
        self.state = SelectionState::Open {
            query,
            candidates,
            highlighted: None,
        };
        self.notify_render();
        true
    }

    /// Lookup failed; returns false when the failure was stale
    pub fn on_lookup_failed(&mut self, token: RequestToken, error: SuggestError) -> bool {
        let Some(query) = self.awaiting(token) else {
            trace!(source = %self.source_name, token = token.value(), "discarding stale failure");
            return false;
        };

        self.state = SelectionState::Open {
            query,
            candidates: Vec::new(),
            highlighted: None,
        };
        self.reporter.report(&self.source_name, &error);
        self.notify_render();
        true
    }

    /// Move the highlight one step, clamped to the candidate bounds
    pub fn on_highlight_move(&mut self, direction: Direction) {
        let SelectionState::Open {
            candidates,
            highlighted,
            ..
        } = &mut self.state
        else {
            return;
        };
        if candidates.is_empty() {
            return;
        }

        let last = candidates.len() - 1;
        let next = match (direction, *highlighted) {
            (Direction::Down, None) => 0,
            (Direction::Up, None) => last,
            (Direction::Down, Some(i)) => (i + 1).min(last),
            (Direction::Up, Some(i)) => i.saturating_sub(1),
        };

        if *highlighted != Some(next) {
            *highlighted = Some(next);
            self.notify_render();
        }
    }

    /// Commit the highlighted candidate
    pub fn on_commit(&mut self) -> bool {
        let index = match &self.state {
            SelectionState::Open {
                highlighted: Some(index),
                ..
            } => *index,
            _ => return false,
        };
        self.on_select(index)
    }

    /// Commit the candidate at `index` (pointer selection)
    pub fn on_select(&mut self, index: usize) -> bool {
        let candidate = match &self.state {
            SelectionState::Open { candidates, .. } => match candidates.get(index) {
                Some(c) => c.clone(),
                None => return false,
            },
            _ => return false,
        };

        debug!(source = %self.source_name, label = %candidate.label, "candidate committed");
        self.state = SelectionState::Committed(candidate.clone());
        self.host.selection_changed(&SelectionChange::Selected(candidate));
        self.notify_render();
        true
    }

    /// Reset to `Empty` from any state
    pub fn on_clear(&mut self) -> Effect {
        self.state = SelectionState::Empty;
        self.host.selection_changed(&SelectionChange::Cleared);
        self.notify_render();
        Effect::CancelTimer
    }

    /// Route a keyboard event
    pub fn on_key(&mut self, key: Key) -> Option<Effect> {
        match key {
            Key::Up => self.on_highlight_move(Direction::Up),
            Key::Down => self.on_highlight_move(Direction::Down),
            Key::Enter => {
                self.on_commit();
            }
            Key::Escape => return Some(self.on_clear()),
        }
        None
    }

    /// Snapshot of what the host should render
    pub fn snapshot(&self) -> PickerSnapshot {
        match &self.state {
            SelectionState::Empty => PickerSnapshot::default(),
            SelectionState::Pending { query } => PickerSnapshot {
                query: query.clone(),
                ..Default::default()
            },
            SelectionState::Fetching { query, .. } => PickerSnapshot {
                query: query.clone(),
                loading: true,
                ..Default::default()
            },
            SelectionState::Open {
                query,
                candidates,
                highlighted,
            } => PickerSnapshot {
                query: query.clone(),
                candidates: candidates.clone(),
                highlighted: *highlighted,
                ..Default::default()
            },
            SelectionState::Committed(candidate) => PickerSnapshot {
                committed: Some(candidate.clone()),
                ..Default::default()
            },
        }
    }

    fn notify_render(&self) {
        self.host.render(&self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocomplete::testing::{candidates, RecordingHost, RecordingReporter};

    fn controller() -> (
        AutosuggestController,
        Arc<RecordingHost>,
        Arc<RecordingReporter>,
    ) {
        let host = Arc::new(RecordingHost::default());
        let reporter = Arc::new(RecordingReporter::default());
        let controller = AutosuggestController::new(
            "datacenters",
            ControllerOptions::default(),
            host.clone(),
            reporter.clone(),
        );
        (controller, host, reporter)
    }

    /// Type `query`, fire the timer and return the dispatched token
    fn dispatch(controller: &mut AutosuggestController, query: &str) -> RequestToken {
        controller.on_input_changed(query);
        match controller.on_debounce_fired(query) {
            Some(Effect::Lookup(req)) => req.token,
            other => panic!("expected lookup, got {:?}", other),
        }
    }

    fn open(controller: &mut AutosuggestController, labels: &[&str]) {
        let token = dispatch(controller, "q");
        assert!(controller.on_lookup_result(token, candidates(labels)));
    }

    #[test]
    fn test_input_arms_timer_and_goes_pending() {
        let (mut controller, _, _) = controller();
        let effect = controller.on_input_changed("par");

        assert_eq!(
            effect,
            Effect::ArmTimer {
                query: "par".to_string(),
                delay: Duration::from_millis(250)
            }
        );
        assert_eq!(
            controller.state(),
            &SelectionState::Pending {
                query: "par".to_string()
            }
        );
        assert_eq!(controller.snapshot().query, "par");
        assert!(!controller.snapshot().loading);
    }

    #[test]
    fn test_debounce_fire_dispatches_with_limit() {
        let (mut controller, _, _) = controller();
        controller.on_input_changed("par");

        let effect = controller.on_debounce_fired("par");
        assert_eq!(
            effect,
            Some(Effect::Lookup(LookupRequest {
                token: RequestToken(1),
                query: "par".to_string(),
                limit: 5
            }))
        );
        assert!(controller.snapshot().loading);
        assert_eq!(controller.last_token(), Some(RequestToken(1)));
    }

    #[test]
    fn test_debounce_fire_for_superseded_query_is_noop() {
        let (mut controller, _, _) = controller();
        controller.on_input_changed("par");
        controller.on_input_changed("paris");

        assert_eq!(controller.on_debounce_fired("par"), None);
        assert_eq!(controller.last_token(), None);
        assert!(controller.on_debounce_fired("paris").is_some());
    }

    #[test]
    fn test_debounce_fire_outside_pending_is_noop() {
        let (mut controller, _, _) = controller();
        assert_eq!(controller.on_debounce_fired(""), None);

        dispatch(&mut controller, "par");
        assert_eq!(controller.on_debounce_fired("par"), None);
        assert_eq!(controller.last_token(), Some(RequestToken(1)));
    }

    #[test]
    fn test_tokens_are_monotonic() {
        let (mut controller, _, _) = controller();
        let first = dispatch(&mut controller, "p");
        let second = dispatch(&mut controller, "pa");
        let third = dispatch(&mut controller, "par");
        assert!(first < second && second < third);
    }

    #[test]
    fn test_result_opens_candidates() {
        let (mut controller, host, _) = controller();
        let token = dispatch(&mut controller, "par");

        assert!(controller.on_lookup_result(token, candidates(&["Paris-West", "Paris-East"])));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.query, "par");
        assert_eq!(snapshot.labels(), vec!["Paris-West", "Paris-East"]);
        assert_eq!(snapshot.highlighted, None);
        assert!(!snapshot.loading);
        assert_eq!(host.last_render().unwrap(), snapshot);
    }

    #[test]
    fn test_par_paris_scenario() {
        let (mut controller, _, _) = controller();
        let par = dispatch(&mut controller, "par");
        let paris = dispatch(&mut controller, "paris");

        assert!(!controller.on_lookup_result(par, candidates(&["Paris-West", "Paris-East"])));
        assert_eq!(
            controller.state(),
            &SelectionState::Fetching {
                query: "paris".to_string(),
                token: paris
            }
        );

        assert!(controller.on_lookup_result(paris, candidates(&["Paris-Central"])));
        assert_eq!(controller.snapshot().labels(), vec!["Paris-Central"]);
    }

    #[test]
    fn test_older_response_after_newer_is_dropped() {
        let (mut controller, _, _) = controller();
        let old = dispatch(&mut controller, "par");
        let new = dispatch(&mut controller, "paris");

        assert!(controller.on_lookup_result(new, candidates(&["Paris-Central"])));
        assert!(!controller.on_lookup_result(old, candidates(&["Paris-West"])));
        assert!(!controller.on_lookup_failed(old, SuggestError::Transport("reset".into())));

        assert_eq!(controller.snapshot().labels(), vec!["Paris-Central"]);
    }

    #[test]
    fn test_response_while_retyping_is_dropped() {
        let (mut controller, _, _) = controller();
        let token = dispatch(&mut controller, "par");
        controller.on_input_changed("pari");

        assert!(!controller.on_lookup_result(token, candidates(&["Paris-West"])));
        assert!(controller.on_debounce_fired("pari").is_some());
    }

    #[test]
    fn test_stale_failure_is_silent() {
        let (mut controller, _, reporter) = controller();
        let old = dispatch(&mut controller, "par");
        dispatch(&mut controller, "paris");

        assert!(!controller.on_lookup_failed(old, SuggestError::Transport("timeout".into())));
        assert!(reporter.reports().is_empty());
        assert!(controller.snapshot().loading);
    }

    #[test]
    fn test_failure_opens_empty_and_reports() {
        let (mut controller, _, reporter) = controller();
        let token = dispatch(&mut controller, "par");
        let error = SuggestError::Status {
            status: 502,
            message: None,
        };

        assert!(controller.on_lookup_failed(token, error.clone()));

        assert_eq!(
            controller.state(),
            &SelectionState::Open {
                query: "par".to_string(),
                candidates: vec![],
                highlighted: None
            }
        );
        assert_eq!(
            reporter.reports(),
            vec![("datacenters".to_string(), error)]
        );
    }

    #[test]
    fn test_highlight_clamps_down() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &["a", "b", "c"]);

        for _ in 0..10 {
            controller.on_highlight_move(Direction::Down);
            let index = controller.snapshot().highlighted.unwrap();
            assert!(index < 3);
        }
        assert_eq!(controller.snapshot().highlighted, Some(2));
    }

    #[test]
    fn test_highlight_clamps_up() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &["a", "b", "c"]);

        controller.on_highlight_move(Direction::Down);
        controller.on_highlight_move(Direction::Down);
        for _ in 0..10 {
            controller.on_highlight_move(Direction::Up);
        }
        assert_eq!(controller.snapshot().highlighted, Some(0));
    }

    #[test]
    fn test_highlight_up_from_none_selects_last() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &["a", "b", "c"]);

        controller.on_highlight_move(Direction::Up);
        assert_eq!(controller.snapshot().highlighted, Some(2));
    }

    #[test]
    fn test_highlight_noop_when_empty_or_closed() {
        let (mut controller, _, _) = controller();
        controller.on_highlight_move(Direction::Down);
        assert_eq!(controller.state(), &SelectionState::Empty);

        open(&mut controller, &[]);
        controller.on_highlight_move(Direction::Down);
        assert_eq!(controller.snapshot().highlighted, None);
    }

    #[test]
    fn test_commit_clears_query_and_notifies() {
        let (mut controller, host, _) = controller();
        open(&mut controller, &["Paris-West", "Paris-East"]);
        controller.on_highlight_move(Direction::Down);
        controller.on_highlight_move(Direction::Down);

        assert!(controller.on_commit());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.query, "");
        assert!(snapshot.candidates.is_empty());
        assert_eq!(snapshot.committed.unwrap().label, "Paris-East");
        assert_eq!(
            host.changes().last().unwrap(),
            &SelectionChange::Selected(candidates(&["Paris-East"]).remove(0))
        );
    }

    #[test]
    fn test_commit_without_highlight_is_noop() {
        let (mut controller, host, _) = controller();
        open(&mut controller, &["a", "b"]);
        let before = controller.state().clone();

        assert!(!controller.on_commit());
        assert_eq!(controller.state(), &before);
        assert!(host.changes().is_empty());
    }

    #[test]
    fn test_commit_with_empty_candidates_is_noop() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &[]);
        controller.on_highlight_move(Direction::Down);
        let before = controller.state().clone();

        assert!(!controller.on_commit());
        assert!(!controller.on_select(0));
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn test_pointer_select() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &["a", "b", "c"]);

        assert!(!controller.on_select(3));
        assert!(controller.on_select(1));
        assert_eq!(controller.snapshot().committed.unwrap().label, "b");
    }

    #[test]
    fn test_response_after_commit_is_ignored() {
        let (mut controller, _, _) = controller();
        let token = dispatch(&mut controller, "par");
        assert!(controller.on_lookup_result(token, candidates(&["Paris-West"])));
        assert!(controller.on_select(0));

        assert!(!controller.on_lookup_result(token, candidates(&["Other"])));
        assert_eq!(controller.snapshot().committed.unwrap().label, "Paris-West");
    }

    #[test]
    fn test_typing_after_commit_uncommits() {
        let (mut controller, host, _) = controller();
        open(&mut controller, &["a"]);
        controller.on_select(0);

        controller.on_input_changed("b");

        assert_eq!(
            controller.state(),
            &SelectionState::Pending {
                query: "b".to_string()
            }
        );
        assert_eq!(controller.snapshot().committed, None);
        assert_eq!(host.changes().last().unwrap(), &SelectionChange::Cleared);
    }

    #[test]
    fn test_clear_from_fetching_invalidates_token() {
        let (mut controller, host, _) = controller();
        let token = dispatch(&mut controller, "par");

        assert_eq!(controller.on_clear(), Effect::CancelTimer);
        assert_eq!(controller.state(), &SelectionState::Empty);
        assert_eq!(host.changes(), vec![SelectionChange::Cleared]);

        assert!(!controller.on_lookup_result(token, candidates(&["Paris-West"])));
        assert_eq!(controller.state(), &SelectionState::Empty);
    }

    #[test]
    fn test_key_routing() {
        let (mut controller, _, _) = controller();
        open(&mut controller, &["a", "b"]);

        assert_eq!(controller.on_key(Key::Down), None);
        assert_eq!(controller.on_key(Key::Down), None);
        assert_eq!(controller.on_key(Key::Up), None);
        assert_eq!(controller.on_key(Key::Enter), None);
        assert_eq!(controller.snapshot().committed.unwrap().label, "a");

        assert_eq!(controller.on_key(Key::Escape), Some(Effect::CancelTimer));
        assert_eq!(controller.state(), &SelectionState::Empty);
    }
}
