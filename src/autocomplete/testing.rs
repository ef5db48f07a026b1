//! Shared fakes for picker tests

use super::controller::{PickerHost, PickerSnapshot, SelectionChange};
use super::source::{Candidate, SuggestError, SuggestionSource};
use crate::report::ErrorReporter;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Build candidates whose id equals their label
pub fn candidates(labels: &[&str]) -> Vec<Candidate> {
    labels
        .iter()
        .map(|label| Candidate::new(*label, *label))
        .collect()
}

#[derive(Default)]
pub struct RecordingHost {
    renders: Mutex<Vec<PickerSnapshot>>,
    changes: Mutex<Vec<SelectionChange>>,
}

impl RecordingHost {
    pub fn last_render(&self) -> Option<PickerSnapshot> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn changes(&self) -> Vec<SelectionChange> {
        self.changes.lock().unwrap().clone()
    }
}

impl PickerHost for RecordingHost {
    fn render(&self, snapshot: &PickerSnapshot) {
        self.renders.lock().unwrap().push(snapshot.clone());
    }

    fn selection_changed(&self, change: &SelectionChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, SuggestError)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(String, SuggestError)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, source: &str, error: &SuggestError) {
        self.reports
            .lock()
            .unwrap()
            .push((source.to_string(), error.clone()));
    }
}

/// Source answering from a script, optionally after a delay
pub struct ScriptedSource {
    name: String,
    script: HashMap<String, (Duration, Result<Vec<Candidate>, SuggestError>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, query: &str, labels: &[&str]) -> Self {
        self.respond_after(query, Duration::ZERO, labels)
    }

    pub fn respond_after(mut self, query: &str, delay: Duration, labels: &[&str]) -> Self {
        self.script.insert(query.to_string(), (delay, Ok(candidates(labels))));
        self
    }

    pub fn fail(self, query: &str, error: SuggestError) -> Self {
        self.fail_after(query, Duration::ZERO, error)
    }

    pub fn fail_after(mut self, query: &str, delay: Duration, error: SuggestError) -> Self {
        self.script.insert(query.to_string(), (delay, Err(error)));
        self
    }

    /// Queries looked up so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SuggestError> {
        self.calls.lock().unwrap().push(query.to_string());

        let Some((delay, result)) = self.script.get(query).cloned() else {
            return Ok(Vec::new());
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map(|mut c| {
            c.truncate(limit);
            c
        })
    }
}
