//! Audit trail of one migration operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened at one point of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub datetime: DateTime<Utc>,
    pub operation: String,
    #[serde(flatten)]
    pub kind: TrackKind,
}

impl TrackEvent {
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TrackKind::Error(_))
    }

    pub fn message(&self) -> &str {
        match &self.kind {
            TrackKind::Info(message) | TrackKind::Error(message) => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStatus {
    Success,
    Failed,
}

/// Append-only list of timestamped info and error events.
///
/// Every event is also emitted as a `tracing` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    operation: String,
    events: Vec<TrackEvent>,
}

impl Tracker {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            events: Vec::new(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn info(&mut self, info: impl Into<String>) {
        let info = info.into();
        tracing::info!(operation = %self.operation, "{}", info);
        self.push(TrackKind::Info(info));
    }

    pub fn error(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::warn!(operation = %self.operation, "{}", error);
        self.push(TrackKind::Error(error));
    }

    fn push(&mut self, kind: TrackKind) {
        self.events.push(TrackEvent {
            datetime: Utc::now(),
            operation: self.operation.clone(),
            kind,
        });
    }

    /// All events in the order they were recorded.
    pub fn detail(&self) -> &[TrackEvent] {
        &self.events
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(|event| event.is_error())
            .map(TrackEvent::message)
    }

    pub fn total_errors(&self) -> usize {
        self.errors().count()
    }

    pub fn status(&self) -> TrackerStatus {
        if self.total_errors() > 0 {
            TrackerStatus::Failed
        } else {
            TrackerStatus::Success
        }
    }
}
